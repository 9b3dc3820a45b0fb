use std::os::raw::{c_char, c_void};

use gi_engine::{LlmResponseCallback, LlmResponseContext, LlmSession, LlmSessionConfig};

/// The foreign engine operations the task runner consumes.
///
/// Each method mirrors one C entry point and carries the same contract;
/// implementations must be callable from any thread because streaming
/// callbacks close their responses on engine threads.
pub trait Engine: Send + Sync + 'static {
    /// Create a session. Never fails softly: either a usable session is
    /// returned or the process terminates.
    ///
    /// # Safety
    ///
    /// The strings in `config` must be valid for the duration of the call.
    unsafe fn create_session(&self, config: &LlmSessionConfig) -> *mut LlmSession;

    /// Destroy a session. Called exactly once per created session.
    ///
    /// # Safety
    ///
    /// `session` must come from `create_session` and not be used afterwards.
    unsafe fn delete_session(&self, session: *mut LlmSession);

    /// Blocking prediction.
    ///
    /// # Safety
    ///
    /// `session` must be live and `input` a valid C string.
    unsafe fn predict_sync(&self, session: *mut LlmSession, input: *const c_char) -> LlmResponseContext;

    /// Streaming prediction. `callback` is invoked with `callback_context`
    /// until a response with `done` set has been delivered.
    ///
    /// # Safety
    ///
    /// `session` must be live; `callback_context` and `input` must stay
    /// valid until the terminal callback.
    unsafe fn predict_async(
        &self,
        session: *mut LlmSession,
        callback_context: *mut c_void,
        input: *const c_char,
        callback: LlmResponseCallback,
    );

    /// Release the engine memory behind a response context.
    ///
    /// # Safety
    ///
    /// `response` must have been produced by this engine.
    unsafe fn close_response_context(&self, response: &mut LlmResponseContext);

    /// Release a response that reached a streaming callback without a
    /// callback context, and so without an engine instance to close it.
    ///
    /// # Safety
    ///
    /// `response` must have been produced by an engine of this type.
    unsafe fn close_orphaned_response(response: &mut LlmResponseContext)
    where
        Self: Sized;
}

/// The engine linked in through the `gi-engine` C ABI.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedEngine;

impl Engine for LinkedEngine {
    unsafe fn create_session(&self, config: &LlmSessionConfig) -> *mut LlmSession {
        unsafe { gi_engine::llm_session_create(config) }
    }

    unsafe fn delete_session(&self, session: *mut LlmSession) {
        unsafe { gi_engine::llm_session_delete(session) }
    }

    unsafe fn predict_sync(&self, session: *mut LlmSession, input: *const c_char) -> LlmResponseContext {
        unsafe { gi_engine::llm_session_predict_sync(session, input) }
    }

    unsafe fn predict_async(
        &self,
        session: *mut LlmSession,
        callback_context: *mut c_void,
        input: *const c_char,
        callback: LlmResponseCallback,
    ) {
        unsafe { gi_engine::llm_session_predict_async(session, callback_context, input, callback) }
    }

    unsafe fn close_response_context(&self, response: &mut LlmResponseContext) {
        unsafe { gi_engine::llm_response_context_close(response) }
    }

    unsafe fn close_orphaned_response(response: &mut LlmResponseContext) {
        unsafe { gi_engine::llm_response_context_close(response) }
    }
}
