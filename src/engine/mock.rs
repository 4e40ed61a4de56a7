//! Instrumented stand-in for the native library, used by the engine tests.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;

use super::boundary::{NativeBoundary, NluStatus, RawClient};

pub(crate) const OK: c_int = NluStatus::Ok as c_int;
pub(crate) const KO: c_int = NluStatus::Ko as c_int;

/// What the fake engine does on its next calls.
#[derive(Debug, Clone)]
pub(crate) struct Behavior {
    pub create_status: c_int,
    /// Write a client into the out-parameter even when creation fails.
    pub client_on_failure: bool,
    /// Report success from creation but leave the out-parameter null.
    pub null_client_on_success: bool,
    pub parse_status: c_int,
    /// Replaces the generated parse/tag document. `None` keeps the default.
    pub output: Option<Vec<u8>>,
    /// Report success from parse/tag but leave the out-parameter null.
    pub null_output: bool,
    /// Allocate an output string even when parse/tag fails.
    pub output_on_failure: bool,
    pub last_error: Option<String>,
    pub version_status: c_int,
}

impl Default for Behavior {
    fn default() -> Self {
        Behavior {
            create_status: OK,
            client_on_failure: false,
            null_client_on_success: false,
            parse_status: OK,
            output: None,
            null_output: false,
            output_on_failure: false,
            last_error: None,
            version_status: OK,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Calls {
    pub create_from_dir: AtomicUsize,
    pub create_from_binary: AtomicUsize,
    pub run_parse: AtomicUsize,
    pub run_tag: AtomicUsize,
    pub get_last_error: AtomicUsize,
    pub get_model_version: AtomicUsize,
    pub destroy_string: AtomicUsize,
    pub destroy_client: AtomicUsize,
}

/// The loaded "model": whatever identified the source it came from.
struct FakeEngine {
    model: String,
}

#[derive(Default)]
pub(crate) struct RecordingBoundary {
    behavior: Mutex<Behavior>,
    pub calls: Calls,
    strings_allocated: AtomicUsize,
    clients_allocated: AtomicUsize,
    pub queries: Mutex<Vec<Vec<u8>>>,
    pub binaries: Mutex<Vec<Vec<u8>>>,
}

impl RecordingBoundary {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingBoundary::default())
    }

    pub fn with_behavior(behavior: Behavior) -> Arc<Self> {
        let boundary = RecordingBoundary::default();
        *boundary.behavior.lock().unwrap() = behavior;
        Arc::new(boundary)
    }

    pub fn set(&self, update: impl FnOnce(&mut Behavior)) {
        update(&mut self.behavior.lock().unwrap());
    }

    fn behavior(&self) -> Behavior {
        self.behavior.lock().unwrap().clone()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        let c = &self.calls;
        [
            &c.create_from_dir,
            &c.create_from_binary,
            &c.run_parse,
            &c.run_tag,
            &c.get_last_error,
            &c.get_model_version,
            &c.destroy_string,
            &c.destroy_client,
        ]
        .iter()
        .map(|counter| Self::count(counter))
        .sum()
    }

    pub fn live_strings(&self) -> usize {
        Self::count(&self.strings_allocated) - Self::count(&self.calls.destroy_string)
    }

    pub fn live_clients(&self) -> usize {
        Self::count(&self.clients_allocated) - Self::count(&self.calls.destroy_client)
    }

    pub fn strings_allocated(&self) -> usize {
        Self::count(&self.strings_allocated)
    }

    unsafe fn hand_out_client(&self, model: String, client: *mut RawClient) -> c_int {
        let b = self.behavior();
        let ok = b.create_status == OK;
        if (ok && !b.null_client_on_success) || (!ok && b.client_on_failure) {
            *client = Box::into_raw(Box::new(FakeEngine { model })).cast();
            self.clients_allocated.fetch_add(1, Ordering::SeqCst);
        }
        b.create_status
    }

    unsafe fn hand_out_string(&self, bytes: Vec<u8>, out: *mut *mut c_char) {
        let owned = CString::new(bytes).expect("mock output must not contain NUL");
        *out = owned.into_raw();
        self.strings_allocated.fetch_add(1, Ordering::SeqCst);
    }

    unsafe fn answer(&self, default_doc: serde_json::Value, out: *mut *mut c_char) -> c_int {
        let b = self.behavior();
        let ok = b.parse_status == OK;
        if (ok && !b.null_output) || (!ok && b.output_on_failure) {
            let bytes = b
                .output
                .unwrap_or_else(|| serde_json::to_vec(&default_doc).unwrap());
            self.hand_out_string(bytes, out);
        }
        b.parse_status
    }
}

impl NativeBoundary for RecordingBoundary {
    unsafe fn create_from_dir(&self, root_dir: *const c_char, client: *mut RawClient) -> c_int {
        self.calls.create_from_dir.fetch_add(1, Ordering::SeqCst);
        let dir = CStr::from_ptr(root_dir).to_string_lossy().into_owned();
        let model = dir.rsplit('/').next().unwrap_or_default().to_string();
        self.hand_out_client(model, client)
    }

    unsafe fn create_from_binary(
        &self,
        data: *const u8,
        data_size: c_int,
        client: *mut RawClient,
    ) -> c_int {
        self.calls.create_from_binary.fetch_add(1, Ordering::SeqCst);
        let bytes = std::slice::from_raw_parts(data, data_size as usize).to_vec();
        let model = String::from_utf8_lossy(&bytes).into_owned();
        self.binaries.lock().unwrap().push(bytes);
        self.hand_out_client(model, client)
    }

    unsafe fn run_parse(
        &self,
        client: RawClient,
        input: *const c_char,
        result_json: *mut *mut c_char,
    ) -> c_int {
        self.calls.run_parse.fetch_add(1, Ordering::SeqCst);
        let engine = &*(client as *const FakeEngine);
        let query = CStr::from_ptr(input).to_bytes().to_vec();
        let text = String::from_utf8_lossy(&query).into_owned();
        self.queries.lock().unwrap().push(query);

        let doc = json!({
            "input": text,
            "intent": { "intentName": "BookRestaurant", "probability": 0.87 },
            "slots": [],
            "model": engine.model,
        });
        self.answer(doc, result_json)
    }

    unsafe fn run_tag(
        &self,
        client: RawClient,
        input: *const c_char,
        intent: *const c_char,
        result_json: *mut *mut c_char,
    ) -> c_int {
        self.calls.run_tag.fetch_add(1, Ordering::SeqCst);
        let _engine = &*(client as *const FakeEngine);
        let query = CStr::from_ptr(input).to_string_lossy().into_owned();
        let intent = CStr::from_ptr(intent).to_string_lossy().into_owned();

        let first_word = query.split_whitespace().next().unwrap_or_default().to_string();
        let doc = json!([{
            "value": first_word,
            "range": { "start": 0, "end": first_word.chars().count() },
            "entity": "word",
            "slotName": intent,
        }]);
        self.answer(doc, result_json)
    }

    unsafe fn get_last_error(&self, error: *mut *mut c_char) -> c_int {
        self.calls.get_last_error.fetch_add(1, Ordering::SeqCst);
        match self.behavior().last_error {
            Some(message) => {
                self.hand_out_string(message.into_bytes(), error);
                OK
            }
            None => KO,
        }
    }

    unsafe fn get_model_version(&self, version: *mut *mut c_char) -> c_int {
        self.calls.get_model_version.fetch_add(1, Ordering::SeqCst);
        let status = self.behavior().version_status;
        if status == OK {
            self.hand_out_string(b"0.9.1".to_vec(), version);
        }
        status
    }

    unsafe fn destroy_string(&self, string: *mut c_char) {
        self.calls.destroy_string.fetch_add(1, Ordering::SeqCst);
        drop(CString::from_raw(string));
    }

    unsafe fn destroy_client(&self, client: RawClient) {
        self.calls.destroy_client.fetch_add(1, Ordering::SeqCst);
        drop(Box::from_raw(client as *mut FakeEngine));
    }
}
