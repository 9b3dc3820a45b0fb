use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

/// Session configuration passed to `llm_session_create`.
///
/// Both strings are borrowed for the duration of the call only; the engine
/// copies whatever it keeps.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LlmSessionConfig {
    /// Path to the model file.
    pub model_path: *const c_char,
    /// Directory the engine writes its session cache into.
    pub cache_dir: *const c_char,
    pub sequence_batch_size: usize,
    pub num_decode_steps_per_sync: usize,
    /// Total token budget of the session (input + output).
    pub max_tokens: usize,
    pub topk: usize,
    pub temperature: f32,
    pub random_seed: usize,
}

/// Responses produced by one predict call (or one streaming step).
///
/// `response_array` points at `response_count` C strings owned by the
/// engine. Every context handed out must be released with
/// `llm_response_context_close`.
#[repr(C)]
#[derive(Debug)]
pub struct LlmResponseContext {
    pub response_array: *mut *mut c_char,
    pub response_count: c_int,
    /// Set on the last response of a request.
    pub done: bool,
}

impl LlmResponseContext {
    /// A context carrying no response array at all.
    pub const fn null(done: bool) -> Self {
        Self {
            response_array: ptr::null_mut(),
            response_count: 0,
            done,
        }
    }
}

/// Callback receiving streamed responses from `llm_session_predict_async`.
///
/// Invoked with the caller's opaque `callback_context` one or more times;
/// the last invocation has `response.done == true`. The callee owns the
/// response context and must close it.
pub type LlmResponseCallback = Option<
    extern "C" fn(callback_context: *mut c_void, response: LlmResponseContext),
>;
