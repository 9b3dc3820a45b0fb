//! `gi-runner` - session-lifecycle bridge between callers and the gi engine.
//!
//! This crate provides:
//! - `LlmTaskRunner`, owning one engine session and its on-disk cache
//! - Blocking (`predict`) and streaming (`predict_async`) prediction
//! - `SessionConfig` with the engine's default sampling parameters
//! - The `Engine` trait over the foreign engine calls, with `LinkedEngine`
//!   as the `gi-engine` implementation
//! - `InferenceError`, the failures surfaced to callers

mod cache;
mod callback;
pub mod config;
pub mod engine;
pub mod error;
mod in_flight;
mod response;
mod runner;
mod session;

#[cfg(test)]
mod testing;

pub use callback::{CompletionCallback, ProgressCallback};
pub use config::SessionConfig;
pub use engine::{Engine, LinkedEngine};
pub use error::{InferenceError, Result, ERROR_DOMAIN};
pub use runner::LlmTaskRunner;
