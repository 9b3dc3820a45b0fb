//! Per-request state for streaming predictions.
//!
//! A `CallbackContext` is boxed and handed to the engine as an opaque
//! pointer that owns it. Intermediate engine callbacks only borrow it; the
//! terminal callback (`done == true`) takes the box back, fires completion,
//! and frees the context together with its copy of the input text.

use std::ffi::CString;
use std::os::raw::{c_char, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use gi_engine::LlmResponseContext;

use crate::engine::Engine;
use crate::error::Result;
use crate::in_flight::InFlight;
use crate::response::ResponseGuard;

/// Receives each streamed batch of responses, or the error that replaced it.
pub type ProgressCallback = Box<dyn FnMut(Result<Vec<String>>) + Send>;

/// Runs once, after the last progress callback of a request.
pub type CompletionCallback = Box<dyn FnOnce() + Send>;

pub(crate) struct CallbackContext<E: Engine> {
    input: CString,
    progress: ProgressCallback,
    completion: CompletionCallback,
    engine: Arc<E>,
    in_flight: InFlight,
}

impl<E: Engine> CallbackContext<E> {
    pub(crate) fn new(
        input: CString,
        progress: ProgressCallback,
        completion: CompletionCallback,
        engine: Arc<E>,
        in_flight: InFlight,
    ) -> Box<Self> {
        Box::new(Self {
            input,
            progress,
            completion,
            engine,
            in_flight,
        })
    }

    /// The request's own copy of the input; lives as long as the context.
    pub(crate) fn input_ptr(&self) -> *const c_char {
        self.input.as_ptr()
    }

    /// Give up ownership in exchange for the pointer handed to the engine.
    pub(crate) fn into_raw(self: Box<Self>) -> *mut c_void {
        Box::into_raw(self).cast()
    }

    /// # Safety
    ///
    /// `raw` must come from `into_raw` and not have been reclaimed.
    unsafe fn borrow<'a>(raw: *mut c_void) -> &'a mut Self {
        unsafe { &mut *raw.cast::<Self>() }
    }

    /// # Safety
    ///
    /// `raw` must come from `into_raw`; it is dangling afterwards.
    unsafe fn reclaim(raw: *mut c_void) -> Box<Self> {
        unsafe { Box::from_raw(raw.cast::<Self>()) }
    }

    fn deliver(&mut self, response: LlmResponseContext) {
        let result = ResponseGuard::new(self.engine.as_ref(), response).strings();
        (self.progress)(result);
    }

    fn finish(mut self: Box<Self>, response: LlmResponseContext) {
        // Completion fires even if the last progress call panics.
        if panic::catch_unwind(AssertUnwindSafe(|| self.deliver(response))).is_err() {
            tracing::error!("progress callback panicked on the final response");
        }
        let CallbackContext {
            input,
            completion,
            in_flight,
            ..
        } = *self;
        // Free the session before completion so it may issue the next request.
        drop(in_flight);
        completion();
        drop(input);
        tracing::debug!("streaming request finished");
    }
}

/// Engine-facing callback for streaming requests.
pub(crate) extern "C" fn on_response<E: Engine>(
    callback_context: *mut c_void,
    response: LlmResponseContext,
) {
    if callback_context.is_null() {
        tracing::error!(
            done = response.done,
            "engine delivered a response without a callback context; dropping it"
        );
        let mut response = response;
        unsafe { E::close_orphaned_response(&mut response) };
        return;
    }
    let done = response.done;
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
        if done {
            CallbackContext::<E>::reclaim(callback_context).finish(response);
        } else {
            CallbackContext::<E>::borrow(callback_context).deliver(response);
        }
    }));
    if outcome.is_err() {
        tracing::error!(done, "predict callback panicked");
    }
}
