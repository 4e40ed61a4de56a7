use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::ptr::{self, NonNull};

/// Opaque engine reference as handed out by the native loader.
pub type RawClient = *mut c_void;

/// Status codes shared by every native entry point that returns one.
///
/// `1` is the only success value. Anything else, including codes the
/// native side may add later, is read as `Ko`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NluStatus {
    Ko = 0,
    Ok = 1,
}

impl NluStatus {
    #[inline]
    pub fn from_code(code: c_int) -> Self {
        if code == NluStatus::Ok as c_int {
            NluStatus::Ok
        } else {
            NluStatus::Ko
        }
    }

    #[inline]
    pub fn is_ok(self) -> bool {
        self == NluStatus::Ok
    }
}

/// A native call that did not return the success sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeFailure {
    pub code: c_int,
}

#[inline]
pub(crate) fn check(code: c_int) -> Result<(), NativeFailure> {
    match NluStatus::from_code(code) {
        NluStatus::Ok => Ok(()),
        NluStatus::Ko => Err(NativeFailure { code }),
    }
}

/// The C entry points of the engine library, one method per symbol.
///
/// `LinkedLibrary` forwards these to the real library; anything else
/// implementing the trait must honour the same contract.
///
/// # Safety
///
/// - Every `*const c_char` input is a NUL-terminated UTF-8 string that is
///   valid for the duration of the call only.
/// - `create_from_binary` reads exactly `data_size` bytes from `data` and
///   must not keep the pointer after returning.
/// - Out-parameters are written at most once. Strings written to them
///   are owned by the native side until passed back to `destroy_string`.
/// - `client` arguments are references previously returned by one of the
///   `create_*` calls and not yet passed to `destroy_client`.
pub trait NativeBoundary: Send + Sync {
    unsafe fn create_from_dir(&self, root_dir: *const c_char, client: *mut RawClient) -> c_int;

    unsafe fn create_from_binary(
        &self,
        data: *const u8,
        data_size: c_int,
        client: *mut RawClient,
    ) -> c_int;

    unsafe fn run_parse(
        &self,
        client: RawClient,
        input: *const c_char,
        result_json: *mut *mut c_char,
    ) -> c_int;

    unsafe fn run_tag(
        &self,
        client: RawClient,
        input: *const c_char,
        intent: *const c_char,
        result_json: *mut *mut c_char,
    ) -> c_int;

    unsafe fn get_last_error(&self, error: *mut *mut c_char) -> c_int;

    unsafe fn get_model_version(&self, version: *mut *mut c_char) -> c_int;

    unsafe fn destroy_string(&self, string: *mut c_char);

    unsafe fn destroy_client(&self, client: RawClient);
}

/// Native-owned output string, freed through `destroy_string` on drop.
pub(crate) struct NativeString<'a> {
    ptr: NonNull<c_char>,
    boundary: &'a dyn NativeBoundary,
}

impl<'a> NativeString<'a> {
    /// # Safety
    /// `ptr` must be null or a string allocated by `boundary` that nobody else frees.
    pub(crate) unsafe fn adopt(boundary: &'a dyn NativeBoundary, ptr: *mut c_char) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| NativeString { ptr, boundary })
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        // SAFETY: adopt() only accepts NUL-terminated strings owned by us.
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }.to_bytes().to_vec()
    }
}

impl Drop for NativeString<'_> {
    fn drop(&mut self) {
        unsafe { self.boundary.destroy_string(self.ptr.as_ptr()) };
    }
}

/// Runs one call that answers through a `char**` out-parameter.
///
/// Whatever the call wrote is freed before returning, whether or not the
/// status was a success. On failure the buffer is released unread; on
/// success its bytes are copied out first. `Ok(None)` means success with
/// a null output.
pub(crate) fn call_with_output<F>(
    boundary: &dyn NativeBoundary,
    call: F,
) -> Result<Option<Vec<u8>>, NativeFailure>
where
    F: FnOnce(*mut *mut c_char) -> c_int,
{
    let mut out: *mut c_char = ptr::null_mut();
    let code = call(&mut out as *mut *mut c_char);
    // SAFETY: the boundary contract says `out` is null or engine-owned.
    let output = unsafe { NativeString::adopt(boundary, out) };
    check(code)?;
    Ok(output.map(|s| s.to_bytes()))
}

/// Fetches the engine's description of its most recent failure.
pub(crate) fn last_error(boundary: &dyn NativeBoundary) -> String {
    match call_with_output(boundary, |out| unsafe { boundary.get_last_error(out) }) {
        Ok(Some(bytes)) if !bytes.is_empty() => String::from_utf8_lossy(&bytes).into_owned(),
        _ => "unknown native error".to_string(),
    }
}

pub(crate) mod utils {
    use super::*;
    use crate::error::{NluError, Result};

    pub fn to_c_string(s: &str, what: &str) -> Result<CString> {
        CString::new(s).map_err(|e| {
            NluError::invalid_input(format!(
                "{} contains a NUL byte at offset {}",
                what,
                e.nul_position()
            ))
        })
    }
}
