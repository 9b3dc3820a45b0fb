use std::ffi::CStr;
use std::fs;
use std::io;
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use crate::decode;
use crate::types::LlmSessionConfig;

const CACHE_SUFFIX: &str = ".cache";

/// Owned copy of an `LlmSessionConfig`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub model_path: PathBuf,
    pub cache_dir: PathBuf,
    pub sequence_batch_size: usize,
    pub decode_steps_per_sync: usize,
    pub max_tokens: usize,
    pub top_k: usize,
    pub temperature: f32,
    pub random_seed: usize,
}

impl EngineConfig {
    /// Copy a raw config, validating its strings and the model file.
    ///
    /// # Safety
    ///
    /// Non-null string fields must point at NUL-terminated strings.
    pub unsafe fn from_raw(raw: &LlmSessionConfig) -> Result<Self, String> {
        let model_path = unsafe { path_from_raw(raw.model_path) }
            .ok_or_else(|| "model_path is null or not valid UTF-8".to_string())?;
        let cache_dir = unsafe { path_from_raw(raw.cache_dir) }
            .ok_or_else(|| "cache_dir is null or not valid UTF-8".to_string())?;
        if !model_path.is_file() {
            return Err(format!("no model file at {}", model_path.display()));
        }
        Ok(Self {
            model_path,
            cache_dir,
            sequence_batch_size: raw.sequence_batch_size,
            decode_steps_per_sync: raw.num_decode_steps_per_sync,
            max_tokens: raw.max_tokens,
            top_k: raw.topk,
            temperature: raw.temperature,
            random_seed: raw.random_seed,
        })
    }
}

unsafe fn path_from_raw(ptr: *const c_char) -> Option<PathBuf> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .ok()
        .map(PathBuf::from)
}

/// Engine-side state behind the opaque `LlmSession` pointer.
pub struct LlmSession {
    config: EngineConfig,
    cache_file: Option<PathBuf>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl LlmSession {
    /// Open a session, persisting its cache file if the cache directory
    /// is writable.
    pub fn open(config: EngineConfig) -> Self {
        let cache_file = match write_cache(&config) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(
                    cache_dir = %config.cache_dir.display(),
                    "engine could not write session cache: {}",
                    e
                );
                None
            }
        };
        tracing::debug!(
            model = %config.model_path.display(),
            max_tokens = config.max_tokens,
            "engine session opened"
        );
        Self {
            config,
            cache_file,
            workers: Mutex::new(Vec::new()),
        }
    }

    /// The config this session was opened with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Cache file written at open, if the write succeeded.
    pub fn cache_file(&self) -> Option<&Path> {
        self.cache_file.as_deref()
    }

    /// Blocking prediction: the full response for `input`.
    pub fn predict(&self, input: &str) -> String {
        let tokens = decode::generate(input, self.config.max_tokens);
        decode::render(&tokens)
    }

    /// Run `job` on an engine worker thread tracked by this session.
    pub fn spawn_worker<F>(&self, job: F) -> io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("gi-engine-predict".to_string())
            .spawn(job)?;
        let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        workers.retain(|w| !w.is_finished());
        workers.push(handle);
        Ok(())
    }

    /// Wait for every outstanding streaming request to deliver its final
    /// callback.
    ///
    /// Called from inside a response callback, the calling worker is left
    /// detached; it touches no session state after its terminal callback.
    pub fn join_workers(&self) {
        let workers = {
            let mut guard = self.workers.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };
        let current = thread::current().id();
        for worker in workers {
            if worker.thread().id() == current {
                tracing::debug!("session deleted from its own predict worker");
                continue;
            }
            if worker.join().is_err() {
                tracing::error!("engine predict worker panicked");
            }
        }
    }
}

/// Write the session cache to `<cache_dir>/<model file name>.cache`.
fn write_cache(config: &EngineConfig) -> io::Result<PathBuf> {
    let model_name = config
        .model_path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "model path has no file name"))?;
    let mut file_name = model_name.to_os_string();
    file_name.push(CACHE_SUFFIX);

    fs::create_dir_all(&config.cache_dir)?;
    let path = config.cache_dir.join(file_name);
    let model_len = fs::metadata(&config.model_path)?.len();
    let contents = format!(
        "gi-engine loopback cache v1\nmodel_bytes={}\nsequence_batch_size={}\nmax_tokens={}\ntop_k={}\ntemperature={}\nrandom_seed={}\n",
        model_len,
        config.sequence_batch_size,
        config.max_tokens,
        config.top_k,
        config.temperature,
        config.random_seed,
    );
    fs::write(&path, contents)?;
    Ok(path)
}
