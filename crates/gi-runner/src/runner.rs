use std::os::raw::c_void;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gi_engine::LlmResponseContext;

use crate::cache::CacheFile;
use crate::callback::{on_response, CallbackContext};
use crate::config::{c_string, SessionConfig};
use crate::engine::{Engine, LinkedEngine};
use crate::error::{InferenceError, Result};
use crate::in_flight::InFlight;
use crate::response::ResponseGuard;
use crate::session::SessionHandle;

/// Runs predictions against one engine session.
///
/// The session is created with the runner and destroyed when it drops,
/// after which the engine's cache file for the session is removed. At most
/// one prediction can be in flight at a time; overlapping calls fail with
/// `InferenceError::IllegalMethodCall`.
pub struct LlmTaskRunner<E: Engine = LinkedEngine> {
    // Fields drop in declaration order: the session must be gone before its
    // cache file is removed, since the engine may still hold it open.
    session: SessionHandle<E>,
    cache_file: CacheFile,
    engine: Arc<E>,
    in_flight: Arc<AtomicBool>,
}

impl LlmTaskRunner {
    /// Create a runner backed by the linked engine.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        Self::with_engine(LinkedEngine, config)
    }
}

impl<E: Engine> LlmTaskRunner<E> {
    /// Create a runner on its own instance of `engine`.
    pub fn with_engine(engine: E, config: &SessionConfig) -> Result<Self> {
        Self::with_shared_engine(Arc::new(engine), config)
    }

    /// Create a runner on an engine that other runners may share.
    ///
    /// Fails with `ModelNotFound` before touching the engine if the model
    /// path does not name a file.
    pub fn with_shared_engine(engine: Arc<E>, config: &SessionConfig) -> Result<Self> {
        if !config.model_path().is_file() {
            return Err(InferenceError::ModelNotFound);
        }
        let cache_path = config
            .cache_file_path()
            .ok_or(InferenceError::ModelNotFound)?;

        let session = SessionHandle::create(Arc::clone(&engine), config);
        tracing::debug!(
            model = %config.model_path().display(),
            cache = %cache_path.display(),
            "engine session created"
        );

        Ok(Self {
            session,
            cache_file: CacheFile::new(cache_path),
            engine,
            in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Where the engine keeps this session's cache.
    pub fn cache_file(&self) -> &Path {
        self.cache_file.path()
    }

    /// Whether a prediction is currently running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Generate responses for `input_text`, blocking until the engine is done.
    ///
    /// Returns every response in engine order, or `InvalidResponse` if the
    /// engine's output was malformed.
    pub fn predict(&self, input_text: &str) -> Result<Vec<String>> {
        let _in_flight = InFlight::acquire(&self.in_flight)?;
        let input = c_string(input_text);
        let response = unsafe { self.engine.predict_sync(self.session.as_ptr(), input.as_ptr()) };
        ResponseGuard::new(self.engine.as_ref(), response).strings()
    }

    /// Start a streaming prediction and return immediately.
    ///
    /// `progress` receives each partial result (or `InvalidResponse` in its
    /// place) in engine order; `completion` runs exactly once, after the
    /// last progress call. Both run on an engine thread. The only error
    /// returned here is `IllegalMethodCall`; everything else goes through
    /// `progress`.
    pub fn predict_async<P, C>(&self, input_text: &str, progress: P, completion: C) -> Result<()>
    where
        P: FnMut(Result<Vec<String>>) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let in_flight = InFlight::acquire(&self.in_flight)?;
        let context = CallbackContext::new(
            c_string(input_text),
            Box::new(progress),
            Box::new(completion),
            Arc::clone(&self.engine),
            in_flight,
        );
        let input = context.input_ptr();
        let callback: extern "C" fn(*mut c_void, LlmResponseContext) = on_response::<E>;

        tracing::debug!("dispatching streaming request");
        unsafe {
            self.engine.predict_async(
                self.session.as_ptr(),
                context.into_raw(),
                input,
                Some(callback),
            )
        };
        Ok(())
    }
}
