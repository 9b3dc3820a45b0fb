//! Scripted in-process engine used by the unit tests.

use std::collections::VecDeque;
use std::ffi::{CStr, CString};
use std::fs;
use std::os::raw::{c_char, c_int, c_void};
use std::path::PathBuf;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use gi_engine::{LlmResponseCallback, LlmResponseContext, LlmSession, LlmSessionConfig};

use crate::engine::Engine;

static ORPHANS_CLOSED: AtomicUsize = AtomicUsize::new(0);

/// Responses released through `close_orphaned_response` so far, process wide.
pub(crate) fn orphans_closed() -> usize {
    ORPHANS_CLOSED.load(Ordering::SeqCst)
}

/// A scripted response: `None` is a null array, `None` items are null strings.
pub(crate) type Scripted = Option<Vec<Option<String>>>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    Created { model_path: String, cache_dir: String, max_tokens: usize },
    Deleted { cache_present: bool },
    PredictSync(String),
    PredictAsync(String),
    /// The streaming worker read the caller's input buffer before a callback.
    InputSeen(String),
    Closed,
}

#[derive(Default)]
pub(crate) struct ScriptedEngine {
    events: Arc<Mutex<Vec<Event>>>,
    cache_file: Mutex<Option<PathBuf>>,
    sync_script: Mutex<VecDeque<Scripted>>,
    stream_script: Mutex<Option<Vec<(Scripted, bool)>>>,
    hold: Mutex<Option<Receiver<()>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ScriptedEngine {
    /// Queue the response of the next `predict_sync`.
    pub(crate) fn script_sync(&self, items: Option<&[Option<&str>]>) {
        self.sync_script.lock().unwrap().push_back(owned(items));
    }

    /// Script the callbacks of the next `predict_async`.
    pub(crate) fn script_stream(&self, steps: &[(Option<&[Option<&str>]>, bool)]) {
        let steps = steps.iter().map(|(items, done)| (owned(*items), *done)).collect();
        *self.stream_script.lock().unwrap() = Some(steps);
    }

    /// Make the next stream wait for a message on `gate` before its
    /// terminal callback.
    pub(crate) fn hold_stream(&self, gate: Receiver<()>) {
        *self.hold.lock().unwrap() = Some(gate);
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

fn owned(items: Option<&[Option<&str>]>) -> Scripted {
    items.map(|items| items.iter().map(|item| item.map(str::to_string)).collect())
}

unsafe fn read(ptr: *const c_char) -> String {
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Build a response context that `ScriptedEngine` knows how to close.
pub(crate) fn owned_response(items: Option<&[Option<&str>]>, done: bool) -> LlmResponseContext {
    build_response(owned(items), done)
}

fn build_response(items: Scripted, done: bool) -> LlmResponseContext {
    let Some(items) = items else {
        return LlmResponseContext::null(done);
    };
    let array: Box<[*mut c_char]> = items
        .into_iter()
        .map(|item| match item {
            Some(text) => CString::new(text).unwrap().into_raw(),
            None => ptr::null_mut(),
        })
        .collect();
    let count = array.len() as c_int;
    LlmResponseContext {
        response_array: Box::into_raw(array) as *mut *mut c_char,
        response_count: count,
        done,
    }
}

unsafe fn free_response(context: &mut LlmResponseContext) {
    if context.response_array.is_null() {
        return;
    }
    let slice = ptr::slice_from_raw_parts_mut(context.response_array, context.response_count as usize);
    let array = unsafe { Box::from_raw(slice) };
    for &text in array.iter() {
        if !text.is_null() {
            drop(unsafe { CString::from_raw(text) });
        }
    }
    context.response_array = ptr::null_mut();
    context.response_count = 0;
}

/// One scripted stream running on its own thread.
struct StreamJob {
    steps: Vec<(Scripted, bool)>,
    callback: extern "C" fn(*mut c_void, LlmResponseContext),
    callback_context: *mut c_void,
    input: *const c_char,
    gate: Option<Receiver<()>>,
    events: Arc<Mutex<Vec<Event>>>,
}

// SAFETY: the runner keeps both pointers valid until the terminal callback.
unsafe impl Send for StreamJob {}

impl StreamJob {
    fn run(self) {
        for (items, done) in self.steps {
            if done {
                if let Some(gate) = &self.gate {
                    let _ = gate.recv();
                }
            }
            let input = unsafe { read(self.input) };
            self.events.lock().unwrap().push(Event::InputSeen(input));
            (self.callback)(self.callback_context, build_response(items, done));
            if done {
                return;
            }
        }
    }
}

impl Engine for ScriptedEngine {
    unsafe fn create_session(&self, config: &LlmSessionConfig) -> *mut LlmSession {
        let model_path = unsafe { read(config.model_path) };
        let cache_dir = unsafe { read(config.cache_dir) };
        let model_name = PathBuf::from(&model_path)
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        let cache_file = PathBuf::from(&cache_dir).join(format!("{}.cache", model_name));
        fs::create_dir_all(&cache_dir).unwrap();
        fs::write(&cache_file, b"scripted cache").unwrap();
        *self.cache_file.lock().unwrap() = Some(cache_file);

        self.record(Event::Created {
            model_path,
            cache_dir,
            max_tokens: config.max_tokens,
        });
        NonNull::<LlmSession>::dangling().as_ptr()
    }

    unsafe fn delete_session(&self, _session: *mut LlmSession) {
        let workers = std::mem::take(&mut *self.workers.lock().unwrap());
        let current = thread::current().id();
        for worker in workers {
            if worker.thread().id() != current {
                worker.join().unwrap();
            }
        }
        let cache_present = self
            .cache_file
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|path| path.exists());
        self.record(Event::Deleted { cache_present });
    }

    unsafe fn predict_sync(&self, _session: *mut LlmSession, input: *const c_char) -> LlmResponseContext {
        let input = unsafe { read(input) };
        self.record(Event::PredictSync(input.clone()));
        let items = self
            .sync_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Some(vec![Some(input)]));
        build_response(items, true)
    }

    unsafe fn predict_async(
        &self,
        _session: *mut LlmSession,
        callback_context: *mut c_void,
        input: *const c_char,
        callback: LlmResponseCallback,
    ) {
        let text = unsafe { read(input) };
        self.record(Event::PredictAsync(text.clone()));
        let Some(callback) = callback else {
            return;
        };
        let steps = self
            .stream_script
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| vec![(Some(vec![Some(text)]), true)]);
        let job = StreamJob {
            steps,
            callback,
            callback_context,
            input,
            gate: self.hold.lock().unwrap().take(),
            events: Arc::clone(&self.events),
        };
        let handle = thread::spawn(move || job.run());
        self.workers.lock().unwrap().push(handle);
    }

    unsafe fn close_response_context(&self, response: &mut LlmResponseContext) {
        unsafe { free_response(response) };
        self.record(Event::Closed);
    }

    unsafe fn close_orphaned_response(response: &mut LlmResponseContext) {
        unsafe { free_response(response) };
        ORPHANS_CLOSED.fetch_add(1, Ordering::SeqCst);
    }
}
