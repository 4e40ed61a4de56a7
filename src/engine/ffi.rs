use std::os::raw::{c_char, c_int};

use super::boundary::{NativeBoundary, RawClient};

/**
 * Raw FFI Bindings for the NLU Engine
 *
 * Every symbol returns an `int` status (1 on success) and answers through
 * out-parameters. Strings and clients handed out here belong to the
 * engine until they are passed back to the matching destroy call.
 */
#[link(name = "snips_queries")]
extern "C" {
    fn nlu_engine_create_from_dir(root_dir: *const c_char, client: *mut RawClient) -> c_int;
    fn nlu_engine_create_from_binary(
        data: *const u8,
        data_size: c_int,
        client: *mut RawClient,
    ) -> c_int;
    fn nlu_engine_run_parse(
        client: RawClient,
        input: *const c_char,
        result_json: *mut *mut c_char,
    ) -> c_int;
    fn nlu_engine_run_tag(
        client: RawClient,
        input: *const c_char,
        intent: *const c_char,
        result_json: *mut *mut c_char,
    ) -> c_int;
    fn nlu_engine_get_last_error(error: *mut *mut c_char) -> c_int;
    fn nlu_engine_get_model_version(version: *mut *mut c_char) -> c_int;
    fn nlu_engine_destroy_string(string: *mut c_char);
    fn nlu_engine_destroy_client(client: RawClient);
}

/// The engine library this crate was linked against.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedLibrary;

impl NativeBoundary for LinkedLibrary {
    unsafe fn create_from_dir(&self, root_dir: *const c_char, client: *mut RawClient) -> c_int {
        nlu_engine_create_from_dir(root_dir, client)
    }

    unsafe fn create_from_binary(
        &self,
        data: *const u8,
        data_size: c_int,
        client: *mut RawClient,
    ) -> c_int {
        nlu_engine_create_from_binary(data, data_size, client)
    }

    unsafe fn run_parse(
        &self,
        client: RawClient,
        input: *const c_char,
        result_json: *mut *mut c_char,
    ) -> c_int {
        nlu_engine_run_parse(client, input, result_json)
    }

    unsafe fn run_tag(
        &self,
        client: RawClient,
        input: *const c_char,
        intent: *const c_char,
        result_json: *mut *mut c_char,
    ) -> c_int {
        nlu_engine_run_tag(client, input, intent, result_json)
    }

    unsafe fn get_last_error(&self, error: *mut *mut c_char) -> c_int {
        nlu_engine_get_last_error(error)
    }

    unsafe fn get_model_version(&self, version: *mut *mut c_char) -> c_int {
        nlu_engine_get_model_version(version)
    }

    unsafe fn destroy_string(&self, string: *mut c_char) {
        nlu_engine_destroy_string(string)
    }

    unsafe fn destroy_client(&self, client: RawClient) {
        nlu_engine_destroy_client(client)
    }
}
