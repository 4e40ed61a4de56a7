use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument};

use super::{IntentParserResult, LanguageTag, NluEngine, TaggedEntity};
use crate::error::{NluError, Result};

/// A cloneable handle to one engine, for callers that need to share it.
///
/// Calls from all clones are serialized by a mutex. `dispose` destroys
/// the engine for every clone at once; later calls fail with
/// `EngineNotLoaded` without reaching the native layer.
#[derive(Clone)]
pub struct SharedNluEngine {
    inner: Arc<Mutex<Option<NluEngine>>>,
    language: LanguageTag,
}

impl SharedNluEngine {
    pub fn new(engine: NluEngine) -> Self {
        let language = engine.language().clone();
        SharedNluEngine {
            inner: Arc::new(Mutex::new(Some(engine))),
            language,
        }
    }

    pub(crate) fn with_engine<T>(&self, f: impl FnOnce(&NluEngine) -> Result<T>) -> Result<T> {
        let guard = self.inner.lock()?;
        match guard.as_ref() {
            Some(engine) => f(engine),
            None => Err(NluError::EngineNotLoaded),
        }
    }

    pub fn parse(&self, query: &str) -> Result<Value> {
        self.with_engine(|engine| engine.parse(query))
    }

    pub fn parse_typed(&self, query: &str) -> Result<IntentParserResult> {
        self.with_engine(|engine| engine.parse_typed(query))
    }

    pub fn tag(&self, query: &str, intent_name: &str) -> Result<Vec<TaggedEntity>> {
        self.with_engine(|engine| engine.tag(query, intent_name))
    }

    /// Runs `parse` on tokio's blocking pool.
    ///
    /// With a `timeout` the caller stops waiting after that long. The
    /// native call itself cannot be interrupted and keeps the engine
    /// locked until it returns.
    #[instrument(skip(self), fields(language = %self.language))]
    pub async fn parse_async(&self, query: String, timeout: Option<Duration>) -> Result<Value> {
        let engine = self.clone();
        let task = tokio::task::spawn_blocking(move || engine.parse(&query));

        let joined = match timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| NluError::Timeout(limit))?,
            None => task.await,
        };
        joined.map_err(|e| NluError::Task(e.to_string()))?
    }

    pub fn is_loaded(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn language(&self) -> &LanguageTag {
        &self.language
    }

    /// Destroys the engine. Calling it again is a no-op.
    ///
    /// A lock poisoned by a panicking caller does not stop the release.
    pub fn dispose(&self) -> Result<()> {
        let engine = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(engine) = engine {
            debug!(language = %self.language, "disposing shared engine");
            engine.close();
        }
        Ok(())
    }
}

impl From<NluEngine> for SharedNluEngine {
    fn from(engine: NluEngine) -> Self {
        SharedNluEngine::new(engine)
    }
}

impl std::fmt::Debug for SharedNluEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedNluEngine")
            .field("language", &self.language)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
