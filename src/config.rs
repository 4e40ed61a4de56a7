use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{LanguageTag, ModelSource};
use crate::error::{NluError, Result};

/// Environment variables that override the config file.
pub const ENV_LANGUAGE: &str = "NLU_LANGUAGE";
pub const ENV_DATA_PATH: &str = "NLU_DATA_PATH";
pub const ENV_DATA_BINARY: &str = "NLU_DATA_BINARY";
pub const ENV_PARSE_TIMEOUT_MS: &str = "NLU_PARSE_TIMEOUT_MS";

/// How to find and drive an engine.
///
/// ```toml
/// language = "en"
/// data_path = "/var/lib/assistant"      # or:
/// # data_binary = "/var/lib/assistant.zip"
///
/// [parse]
/// timeout_ms = 2000
/// pretty = true
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub language: LanguageTag,
    /// Directory holding a persisted model.
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    /// File holding a serialized model, loaded into memory before use.
    #[serde(default)]
    pub data_binary: Option<PathBuf>,
    #[serde(default)]
    pub parse: ParseConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ParseConfig {
    /// Upper bound on how long an async caller waits for one parse.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Pretty-print documents on the command line.
    #[serde(default)]
    pub pretty: bool,
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| NluError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded engine config");
        Self::from_toml_str(&content)
    }

    /// Config file (when given) overlaid with the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `NLU_*` overrides from `lookup`. Setting one model source
    /// variable clears the other one coming from the file.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(language) = lookup(ENV_LANGUAGE) {
            self.language = LanguageTag::new(&language)?;
        }

        let data_path = lookup(ENV_DATA_PATH).map(PathBuf::from);
        let data_binary = lookup(ENV_DATA_BINARY).map(PathBuf::from);
        if data_path.is_some() || data_binary.is_some() {
            self.data_path = data_path;
            self.data_binary = data_binary;
        }

        if let Some(raw) = lookup(ENV_PARSE_TIMEOUT_MS) {
            let ms = raw.trim().parse::<u64>().map_err(|_| {
                NluError::configuration(format!("{} must be milliseconds, got {:?}", ENV_PARSE_TIMEOUT_MS, raw))
            })?;
            self.parse.timeout_ms = Some(ms);
        }
        Ok(self)
    }

    /// Resolves the configured model source, reading a binary model into memory.
    ///
    /// Fails with `Configuration` before any file is touched when zero or
    /// two sources are configured.
    pub fn model_source(&self) -> Result<ModelSource> {
        match (&self.data_path, &self.data_binary) {
            (Some(dir), None) => ModelSource::from_parts(Some(dir.clone()), None),
            (None, Some(file)) => {
                let bytes = fs::read(file).map_err(|source| NluError::Io {
                    path: file.clone(),
                    source,
                })?;
                debug!(path = %file.display(), size = bytes.len(), "read model binary");
                ModelSource::from_parts(None, Some(bytes))
            }
            _ => ModelSource::from_parts(
                self.data_path.clone(),
                self.data_binary.as_ref().map(|_| Vec::new()),
            ),
        }
    }

    pub fn parse_timeout(&self) -> Option<Duration> {
        self.parse.timeout_ms.map(Duration::from_millis)
    }
}
