//! `gi-engine` - C ABI of the inference engine behind the gi session bridge.
//!
//! This crate provides:
//! - The `#[repr(C)]` session config and response context types
//! - Five `extern "C"` entry points: session create/delete, sync and async
//!   predict, and response context close
//! - A loopback reference engine implementing that ABI (echo decoding,
//!   per-session cache file, worker-thread streaming)

mod decode;
mod error;
mod response;
mod session;
mod streaming;
mod types;

pub use session::LlmSession;
pub use types::*;

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};

use error::{catch_fatal, fatal};
use session::EngineConfig;
use streaming::StreamRequest;

/// Create a new engine session.
///
/// There is no failure return: a null or invalid config, or a model path
/// that does not name a file, terminates the process. The returned pointer
/// must be released exactly once with `llm_session_delete`.
#[no_mangle]
pub unsafe extern "C" fn llm_session_create(config: *const LlmSessionConfig) -> *mut LlmSession {
    catch_fatal("llm_session_create", || {
        if config.is_null() {
            fatal("session config is null");
        }
        let config = match unsafe { EngineConfig::from_raw(&*config) } {
            Ok(c) => c,
            Err(msg) => fatal(msg),
        };
        Box::into_raw(Box::new(LlmSession::open(config)))
    })
}

/// Destroy a session created by `llm_session_create`.
///
/// Blocks until every streaming request on the session has delivered its
/// final callback. Passing a null pointer is a no-op.
#[no_mangle]
pub unsafe extern "C" fn llm_session_delete(session: *mut LlmSession) {
    if session.is_null() {
        return;
    }
    let session = unsafe { Box::from_raw(session) };
    session.join_workers();
    tracing::debug!(model = %session.config().model_path.display(), "engine session closed");
}

/// Generate the full response to `input`, blocking the calling thread.
///
/// The returned context must be released with `llm_response_context_close`.
#[no_mangle]
pub unsafe extern "C" fn llm_session_predict_sync(
    session: *mut LlmSession,
    input: *const c_char,
) -> LlmResponseContext {
    if session.is_null() || input.is_null() {
        tracing::error!("llm_session_predict_sync called with a null argument");
        return LlmResponseContext::null(true);
    }
    let session = unsafe { &*session };
    let input = unsafe { CStr::from_ptr(input) }.to_string_lossy();
    response::response_context(vec![session.predict(&input)], true)
}

/// Generate a response to `input` on an engine thread, streaming partial
/// results to `callback`.
///
/// `callback` receives `callback_context` with every response; the last
/// call has `done` set. `input` must stay valid until then.
#[no_mangle]
pub unsafe extern "C" fn llm_session_predict_async(
    session: *mut LlmSession,
    callback_context: *mut c_void,
    input: *const c_char,
    callback: LlmResponseCallback,
) {
    let Some(callback) = callback else {
        tracing::error!("llm_session_predict_async called without a callback");
        return;
    };
    if session.is_null() || input.is_null() {
        tracing::error!("llm_session_predict_async called with a null argument");
        StreamRequest::reject(callback_context, callback);
        return;
    }
    let session = unsafe { &*session };
    let config = session.config();
    let request = StreamRequest::new(
        callback_context,
        input,
        callback,
        config.max_tokens,
        config.decode_steps_per_sync,
    );
    if let Err(e) = session.spawn_worker(move || request.run()) {
        fatal(format!("could not start predict worker: {}", e));
    }
}

/// Release the engine memory held by a response context.
///
/// Safe to call on a context that was already closed.
#[no_mangle]
pub unsafe extern "C" fn llm_response_context_close(response: *mut LlmResponseContext) {
    if response.is_null() {
        return;
    }
    unsafe { response::release(&mut *response) };
}
