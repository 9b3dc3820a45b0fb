use std::sync::Arc;

use gi_engine::LlmSession;

use crate::config::SessionConfig;
use crate::engine::Engine;

/// Exclusive owner of one engine session.
///
/// Created once from a `SessionConfig`, deleted exactly once on drop.
pub(crate) struct SessionHandle<E: Engine> {
    engine: Arc<E>,
    raw: *mut LlmSession,
}

// SAFETY: the engine session is only reached through `Engine` calls, which
// are thread-safe by the trait's contract, and the handle is never copied.
unsafe impl<E: Engine> Send for SessionHandle<E> {}
unsafe impl<E: Engine> Sync for SessionHandle<E> {}

impl<E: Engine> SessionHandle<E> {
    /// Create the engine session. Does not return on engine failure.
    pub(crate) fn create(engine: Arc<E>, config: &SessionConfig) -> Self {
        let native = config.to_native();
        // No check of the returned pointer: create-session only ever
        // returns a usable session.
        let raw = unsafe { engine.create_session(&native.as_raw()) };
        Self { engine, raw }
    }

    pub(crate) fn as_ptr(&self) -> *mut LlmSession {
        self.raw
    }
}

impl<E: Engine> Drop for SessionHandle<E> {
    fn drop(&mut self) {
        unsafe { self.engine.delete_session(self.raw) };
        tracing::debug!("engine session destroyed");
    }
}
