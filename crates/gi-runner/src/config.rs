use std::ffi::{CString, OsStr};
use std::path::{Path, PathBuf};

use gi_engine::LlmSessionConfig;

/// Defaults applied by `SessionConfig::new`.
pub const DEFAULT_MAX_TOKENS: usize = 512;
pub const DEFAULT_TOP_K: usize = 40;
pub const DEFAULT_TEMPERATURE: f32 = 0.8;
pub const DEFAULT_RANDOM_SEED: usize = 0;

/// Suffix the engine appends to the model file name for its session cache.
pub const CACHE_SUFFIX: &str = ".cache";

/// Configuration of one engine session. Immutable once handed to a runner.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    model_path: PathBuf,
    cache_dir: PathBuf,
    sequence_batch_size: usize,
    decode_steps_per_sync: usize,
    max_tokens: usize,
    top_k: usize,
    temperature: f32,
    random_seed: usize,
}

impl SessionConfig {
    /// Create a config with default sampling parameters.
    pub fn new(
        model_path: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
        sequence_batch_size: usize,
        decode_steps_per_sync: usize,
    ) -> Self {
        Self {
            model_path: model_path.into(),
            cache_dir: cache_dir.into(),
            sequence_batch_size,
            decode_steps_per_sync,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_k: DEFAULT_TOP_K,
            temperature: DEFAULT_TEMPERATURE,
            random_seed: DEFAULT_RANDOM_SEED,
        }
    }

    /// Total number of input + output tokens the session can hold.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Number of candidates sampled from per decoding step. 1 is greedy.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sampling randomness. 0.0 is greedy.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Fixed seed for reproducible sampling.
    pub fn with_random_seed(mut self, random_seed: usize) -> Self {
        self.random_seed = random_seed;
        self
    }

    /// Path of the model weights file.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Directory the engine writes its session cache into.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Input tokens the engine processes per batch.
    pub fn sequence_batch_size(&self) -> usize {
        self.sequence_batch_size
    }

    /// Decoding steps between two streamed responses.
    pub fn decode_steps_per_sync(&self) -> usize {
        self.decode_steps_per_sync
    }

    /// Token budget of the session, input and output together.
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Candidates sampled from per decoding step.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Sampling temperature.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Seed for the engine's sampler.
    pub fn random_seed(&self) -> usize {
        self.random_seed
    }

    /// Base file name of the model, if the path has one.
    pub fn model_name(&self) -> Option<&OsStr> {
        self.model_path.file_name()
    }

    /// `<cache_dir>/<model name>.cache`, where the engine keeps its session cache.
    pub fn cache_file_path(&self) -> Option<PathBuf> {
        let mut file_name = self.model_name()?.to_os_string();
        file_name.push(CACHE_SUFFIX);
        Some(self.cache_dir.join(file_name))
    }

    pub(crate) fn to_native(&self) -> NativeSessionConfig {
        NativeSessionConfig {
            model_path: c_string(self.model_path.to_string_lossy().into_owned()),
            cache_dir: c_string(self.cache_dir.to_string_lossy().into_owned()),
            sequence_batch_size: self.sequence_batch_size,
            decode_steps_per_sync: self.decode_steps_per_sync,
            max_tokens: self.max_tokens,
            top_k: self.top_k,
            temperature: self.temperature,
            random_seed: self.random_seed,
        }
    }
}

/// Owns the C strings an `LlmSessionConfig` borrows.
pub(crate) struct NativeSessionConfig {
    model_path: CString,
    cache_dir: CString,
    sequence_batch_size: usize,
    decode_steps_per_sync: usize,
    max_tokens: usize,
    top_k: usize,
    temperature: f32,
    random_seed: usize,
}

impl NativeSessionConfig {
    /// Raw view for the create-session call. Valid while `self` is.
    pub(crate) fn as_raw(&self) -> LlmSessionConfig {
        LlmSessionConfig {
            model_path: self.model_path.as_ptr(),
            cache_dir: self.cache_dir.as_ptr(),
            sequence_batch_size: self.sequence_batch_size,
            num_decode_steps_per_sync: self.decode_steps_per_sync,
            max_tokens: self.max_tokens,
            topk: self.top_k,
            temperature: self.temperature,
            random_seed: self.random_seed,
        }
    }
}

/// C-string form of `text`, cut at the first interior NUL.
pub(crate) fn c_string(text: impl Into<Vec<u8>>) -> CString {
    let mut bytes = text.into();
    if let Some(nul) = bytes.iter().position(|&b| b == 0) {
        bytes.truncate(nul);
    }
    CString::new(bytes).unwrap_or_default()
}
