use std::os::raw::c_int;
use std::ptr::{self, NonNull};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::{DecodingError, NluError, Result};

pub mod boundary;
#[cfg(feature = "native")]
pub mod ffi;
pub mod result;
pub mod shared;
pub mod source;

#[cfg(test)]
mod mock;

use boundary::{call_with_output, check, last_error, utils};

pub use boundary::{NativeBoundary, NativeFailure, NluStatus, RawClient};
#[cfg(feature = "native")]
pub use ffi::LinkedLibrary;
pub use result::{IntentClassifierResult, IntentParserResult, Range, Slot, TaggedEntity};
pub use shared::SharedNluEngine;
pub use source::{LanguageTag, ModelSource, SourceKind};

/**
 * Safe Rust Wrapper for the NLU Engine
 *
 * `NluEngine` owns exactly one native engine. It is not `Clone` and not
 * `Sync`: one owner, one caller at a time. The native engine is destroyed
 * when the owner drops it or calls `close`, and at no other point.
 */
pub struct NluEngine {
    client: ClientHandle,
    language: LanguageTag,
    source_kind: SourceKind,
}

/// The native reference plus the boundary that must release it.
struct ClientHandle {
    ptr: NonNull<std::os::raw::c_void>,
    boundary: Arc<dyn NativeBoundary>,
}

impl ClientHandle {
    fn as_raw(&self) -> RawClient {
        self.ptr.as_ptr()
    }
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        debug!("destroying native engine");
        unsafe { self.boundary.destroy_client(self.ptr.as_ptr()) };
    }
}

// The native engine may be driven from any thread, one call at a time.
unsafe impl Send for ClientHandle {}

impl NluEngine {
    /// Loads an engine through the linked native library.
    #[cfg(feature = "native")]
    pub fn new(language: LanguageTag, source: &ModelSource) -> Result<Self> {
        Self::with_boundary(Arc::new(LinkedLibrary), language, source)
    }

    #[cfg(feature = "native")]
    pub fn from_dir<P: AsRef<std::path::Path>>(language: LanguageTag, root_dir: P) -> Result<Self> {
        Self::new(language, &ModelSource::Directory(root_dir.as_ref().to_path_buf()))
    }

    #[cfg(feature = "native")]
    pub fn from_binary(language: LanguageTag, data: &[u8]) -> Result<Self> {
        Self::with_boundary_from_binary(Arc::new(LinkedLibrary), language, data)
    }

    /// Loads an engine through an explicit boundary implementation.
    #[instrument(skip(boundary, language, source), fields(language = %language, source = ?source))]
    pub fn with_boundary(
        boundary: Arc<dyn NativeBoundary>,
        language: LanguageTag,
        source: &ModelSource,
    ) -> Result<Self> {
        source.validate()?;
        match source {
            ModelSource::Directory(path) => {
                let path_str = path.to_str().ok_or_else(|| {
                    NluError::invalid_input(format!(
                        "model directory {} is not valid UTF-8",
                        path.display()
                    ))
                })?;
                let c_path = utils::to_c_string(path_str, "model directory")?;
                Self::create(boundary, language, SourceKind::Directory, |b, client| unsafe {
                    b.create_from_dir(c_path.as_ptr(), client)
                })
            }
            ModelSource::Binary(data) => Self::with_boundary_from_binary(boundary, language, data),
        }
    }

    fn with_boundary_from_binary(
        boundary: Arc<dyn NativeBoundary>,
        language: LanguageTag,
        data: &[u8],
    ) -> Result<Self> {
        let data_size = c_int::try_from(data.len()).map_err(|_| {
            NluError::invalid_input(format!(
                "model binary of {} bytes exceeds the native size limit",
                data.len()
            ))
        })?;
        // `data` stays borrowed, and untouched, until the call returns.
        Self::create(boundary, language, SourceKind::Binary, |b, client| unsafe {
            b.create_from_binary(data.as_ptr(), data_size, client)
        })
    }

    fn create<F>(
        boundary: Arc<dyn NativeBoundary>,
        language: LanguageTag,
        source_kind: SourceKind,
        call: F,
    ) -> Result<Self>
    where
        F: FnOnce(&dyn NativeBoundary, *mut RawClient) -> c_int,
    {
        let mut raw: RawClient = ptr::null_mut();
        let code = call(boundary.as_ref(), &mut raw as *mut RawClient);

        if let Err(failure) = check(code) {
            let reason = last_error(boundary.as_ref());
            if !raw.is_null() {
                warn!("native loader failed but handed out an engine, releasing it");
                unsafe { boundary.destroy_client(raw) };
            }
            warn!(code = failure.code, %reason, "engine construction failed");
            return Err(NluError::Construction {
                source_kind,
                reason,
            });
        }

        let ptr = NonNull::new(raw).ok_or_else(|| NluError::Construction {
            source_kind,
            reason: "native loader reported success but returned no engine".to_string(),
        })?;

        debug!(%language, %source_kind, "engine loaded");
        Ok(NluEngine {
            client: ClientHandle { ptr, boundary },
            language,
            source_kind,
        })
    }

    /// Parses one utterance and returns the engine's document as-is.
    #[instrument(skip(self), fields(language = %self.language))]
    pub fn parse(&self, query: &str) -> Result<Value> {
        let c_query = utils::to_c_string(query, "query")?;
        let client = self.client.as_raw();
        let bytes = self.call_for_document(query, |b, out| unsafe {
            b.run_parse(client, c_query.as_ptr(), out)
        })?;
        decode(bytes)
    }

    /// Like `parse`, deserialized into the typed result view.
    pub fn parse_typed(&self, query: &str) -> Result<IntentParserResult> {
        let value = self.parse(query)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Extracts the slots of `query` assuming it expresses `intent_name`.
    #[instrument(skip(self), fields(language = %self.language))]
    pub fn tag(&self, query: &str, intent_name: &str) -> Result<Vec<TaggedEntity>> {
        let c_query = utils::to_c_string(query, "query")?;
        let c_intent = utils::to_c_string(intent_name, "intent name")?;
        let client = self.client.as_raw();
        let bytes = self.call_for_document(query, |b, out| unsafe {
            b.run_tag(client, c_query.as_ptr(), c_intent.as_ptr(), out)
        })?;
        decode(bytes)
    }

    fn call_for_document<F>(&self, query: &str, call: F) -> Result<Vec<u8>>
    where
        F: FnOnce(&dyn NativeBoundary, *mut *mut std::os::raw::c_char) -> c_int,
    {
        let boundary = self.client.boundary.as_ref();
        match call_with_output(boundary, |out| call(boundary, out)) {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) => Err(DecodingError::NullOutput.into()),
            Err(failure) => {
                let reason = last_error(boundary);
                debug!(code = failure.code, %reason, "native call failed");
                Err(NluError::Parse {
                    query: query.to_string(),
                    reason,
                })
            }
        }
    }

    pub fn language(&self) -> &LanguageTag {
        &self.language
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    /// Releases the native engine now instead of at the end of scope.
    ///
    /// The engine is consumed, so it cannot be used afterwards:
    ///
    /// ```compile_fail
    /// use nlu_embed_lib::NluEngine;
    ///
    /// fn parse_after_close(engine: NluEngine) {
    ///     engine.close();
    ///     let _ = engine.parse("Book me a restaurant");
    /// }
    /// ```
    pub fn close(self) {
        drop(self);
    }
}

impl std::fmt::Debug for NluEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NluEngine")
            .field("language", &self.language)
            .field("source_kind", &self.source_kind)
            .finish_non_exhaustive()
    }
}

/// Version of the model format the native library understands.
pub fn model_version(boundary: &dyn NativeBoundary) -> Result<String> {
    match call_with_output(boundary, |out| unsafe { boundary.get_model_version(out) }) {
        Ok(Some(bytes)) => Ok(String::from_utf8(bytes).map_err(DecodingError::from)?),
        Ok(None) => Err(DecodingError::NullOutput.into()),
        Err(_) => Err(NluError::Native {
            call: "nlu_engine_get_model_version",
            reason: last_error(boundary),
        }),
    }
}

#[cfg(feature = "native")]
pub fn linked_model_version() -> Result<String> {
    model_version(&LinkedLibrary)
}

/// UTF-8 first, then JSON, so the two failure kinds stay distinguishable.
fn decode<T: DeserializeOwned>(bytes: Vec<u8>) -> Result<T> {
    let text = String::from_utf8(bytes).map_err(DecodingError::from)?;
    Ok(serde_json::from_str(&text)?)
}
