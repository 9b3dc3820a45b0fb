use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

/// Log an unrecoverable engine condition and terminate the process.
///
/// Session creation has no failure channel in the ABI: it either returns a
/// usable session or the process does not survive the call.
pub fn fatal(msg: impl Display) -> ! {
    tracing::error!("fatal engine error: {}", msg);
    std::process::abort()
}

/// Run an entry point body, treating any panic inside it as fatal.
pub fn catch_fatal<T, F: FnOnce() -> T>(entry: &str, f: F) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => fatal(format!("internal panic in {}", entry)),
    }
}
