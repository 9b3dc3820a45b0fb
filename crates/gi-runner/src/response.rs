use std::ffi::CStr;

use gi_engine::LlmResponseContext;

use crate::engine::Engine;
use crate::error::{InferenceError, Result};

/// Scoped ownership of an engine response context.
///
/// The context is closed through the engine when the guard drops, on the
/// success and the error path alike.
pub(crate) struct ResponseGuard<'e, E: Engine> {
    engine: &'e E,
    context: LlmResponseContext,
}

impl<'e, E: Engine> ResponseGuard<'e, E> {
    pub(crate) fn new(engine: &'e E, context: LlmResponseContext) -> Self {
        Self { engine, context }
    }

    /// Copy the response strings out of the engine's array.
    pub(crate) fn strings(&self) -> Result<Vec<String>> {
        unsafe { response_strings(&self.context) }.ok_or(InferenceError::InvalidResponse)
    }
}

impl<E: Engine> Drop for ResponseGuard<'_, E> {
    fn drop(&mut self) {
        unsafe { self.engine.close_response_context(&mut self.context) };
    }
}

/// All strings of `context` in array order, or `None` if the array or any
/// of its first `response_count` entries is null.
///
/// # Safety
///
/// A non-null `response_array` must hold `response_count` entries, each
/// either null or a valid C string.
pub(crate) unsafe fn response_strings(context: &LlmResponseContext) -> Option<Vec<String>> {
    if context.response_array.is_null() {
        return None;
    }
    let count = usize::try_from(context.response_count).ok()?;
    let mut responses = Vec::with_capacity(count);
    for i in 0..count {
        let text = unsafe { *context.response_array.add(i) };
        if text.is_null() {
            return None;
        }
        responses.push(unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned());
    }
    Some(responses)
}
