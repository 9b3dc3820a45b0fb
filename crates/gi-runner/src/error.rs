use thiserror::Error;

/// Domain reported alongside `InferenceError::code` to foreign callers.
pub const ERROR_DOMAIN: &str = "gi.genai.inference";

/// Failures surfaced by the task runner.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceError {
    /// The engine returned a null response array, or a null string inside it.
    #[error("The response returned by the model is invalid.")]
    InvalidResponse,
    /// A predict call was made while another one was still generating.
    #[error("You cannot invoke `predict` while another response generation invocation is in progress.")]
    IllegalMethodCall,
    /// No file exists at the configured model path.
    #[error("No file found at the `model_path` you provided.")]
    ModelNotFound,
}

impl InferenceError {
    /// Stable numeric code within `ERROR_DOMAIN`.
    pub fn code(&self) -> i32 {
        match self {
            InferenceError::InvalidResponse => 0,
            InferenceError::IllegalMethodCall => 1,
            InferenceError::ModelNotFound => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, InferenceError>;
