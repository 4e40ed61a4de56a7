use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NluError, Result};

/// Where an engine's model comes from. Exactly one per construction.
#[derive(Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// A directory holding a persisted model.
    Directory(PathBuf),
    /// A complete serialized model (e.g. the assistant zip) held in memory.
    Binary(Vec<u8>),
}

impl ModelSource {
    /// Builds a source from two optional inputs, as found in config files
    /// and command lines. Exactly one must be present.
    pub fn from_parts(directory: Option<PathBuf>, binary: Option<Vec<u8>>) -> Result<Self> {
        match (directory, binary) {
            (Some(path), None) => {
                let source = ModelSource::Directory(path);
                source.validate()?;
                Ok(source)
            }
            (None, Some(bytes)) => Ok(ModelSource::Binary(bytes)),
            (None, None) => Err(NluError::configuration(
                "either a model directory or a model binary must be given",
            )),
            (Some(_), Some(_)) => Err(NluError::configuration(
                "a model directory and a model binary were both given, pick one",
            )),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            ModelSource::Directory(_) => SourceKind::Directory,
            ModelSource::Binary(_) => SourceKind::Binary,
        }
    }

    /// Caller-side checks made before anything crosses the boundary.
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            ModelSource::Directory(path) if path.as_os_str().is_empty() => {
                Err(NluError::configuration("model directory path is empty"))
            }
            _ => Ok(()),
        }
    }
}

// Model blobs run to megabytes; print their size instead.
impl fmt::Debug for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Directory(path) => f.debug_tuple("Directory").field(path).finish(),
            ModelSource::Binary(bytes) => write!(f, "Binary({} bytes)", bytes.len()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Directory,
    Binary,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Directory => write!(f, "model directory"),
            SourceKind::Binary => write!(f, "model binary"),
        }
    }
}

/// Language the loaded model was built for, e.g. `en` or `pt-br`.
///
/// Informational only: the model itself decides the language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn new(tag: &str) -> Result<Self> {
        let tag = tag.trim();
        let well_formed = !tag.is_empty()
            && tag
                .split(|c| c == '-' || c == '_')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()));
        if !well_formed {
            return Err(NluError::configuration(format!(
                "invalid language tag {:?}",
                tag
            )));
        }
        Ok(LanguageTag(tag.to_ascii_lowercase().replace('_', "-")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LanguageTag {
    fn default() -> Self {
        LanguageTag("en".to_string())
    }
}

impl FromStr for LanguageTag {
    type Err = NluError;

    fn from_str(s: &str) -> Result<Self> {
        LanguageTag::new(s)
    }
}

impl TryFrom<String> for LanguageTag {
    type Error = NluError;

    fn try_from(s: String) -> Result<Self> {
        LanguageTag::new(&s)
    }
}

impl From<LanguageTag> for String {
    fn from(tag: LanguageTag) -> Self {
        tag.0
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
