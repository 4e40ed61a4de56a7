//! # nlu-embed
//!
//! Safe access to a native intent-parsing engine.
//!
//! ```text
//! EngineConfig → ModelSource → NluEngine ──parse──▶ JSON document
//!                                   │
//!                                   └── dropped / closed → native engine destroyed
//! ```
//!
//! `NluEngine` owns one native engine and is released exactly once.
//! `SharedNluEngine` puts it behind a mutex for callers that need to
//! share it between threads or tasks.

pub mod config;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use engine::{
    model_version, IntentClassifierResult, IntentParserResult, LanguageTag, ModelSource,
    NativeBoundary, NluEngine, SharedNluEngine, Slot, SourceKind, TaggedEntity,
};
#[cfg(feature = "native")]
pub use engine::{linked_model_version, LinkedLibrary};
pub use error::{DecodingError, NluError, Result};
