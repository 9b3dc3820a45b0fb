use std::ffi::CStr;
use std::os::raw::{c_char, c_void};

use crate::decode;
use crate::response;
use crate::types::LlmResponseContext;

/// Callback signature of `LlmResponseCallback` without the `Option`.
pub type ResponseFn = extern "C" fn(*mut c_void, LlmResponseContext);

/// One streaming request, moved onto an engine worker thread.
///
/// Both pointers belong to the caller. The ABI contract keeps them valid
/// until the terminal (`done`) callback has been delivered.
pub struct StreamRequest {
    callback_context: *mut c_void,
    input: *const c_char,
    callback: ResponseFn,
    max_tokens: usize,
    steps_per_sync: usize,
}

// SAFETY: the caller hands both pointers to the engine for the lifetime of
// the request; only the worker running it touches them.
unsafe impl Send for StreamRequest {}

impl StreamRequest {
    pub fn new(
        callback_context: *mut c_void,
        input: *const c_char,
        callback: ResponseFn,
        max_tokens: usize,
        steps_per_sync: usize,
    ) -> Self {
        Self {
            callback_context,
            input,
            callback,
            max_tokens,
            steps_per_sync,
        }
    }

    /// Emit one callback per chunk, the last one flagged `done`.
    pub fn run(self) {
        let mut step = 0;
        loop {
            // Re-read the caller's buffer on every step.
            let input = unsafe { CStr::from_ptr(self.input) }.to_string_lossy();
            let tokens = decode::generate(&input, self.max_tokens);
            let mut chunks = decode::render_chunks(&tokens, self.steps_per_sync);

            if step + 1 >= chunks.len() {
                let last: Vec<String> = chunks.drain(..).skip(step).take(1).collect();
                self.emit(last, true);
                return;
            }
            let chunk = std::mem::take(&mut chunks[step]);
            self.emit(vec![chunk], false);
            step += 1;
        }
    }

    fn emit(&self, responses: Vec<String>, done: bool) {
        (self.callback)(self.callback_context, response::response_context(responses, done));
    }

    /// Deliver a lone terminal callback with no response array.
    pub fn reject(callback_context: *mut c_void, callback: ResponseFn) {
        callback(callback_context, LlmResponseContext::null(true));
    }
}
