use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{InferenceError, Result};

/// Marks a session as generating. Only one can exist per flag; dropping it
/// frees the session for the next request.
pub(crate) struct InFlight {
    flag: Arc<AtomicBool>,
}

impl InFlight {
    pub(crate) fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| InferenceError::IllegalMethodCall)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
