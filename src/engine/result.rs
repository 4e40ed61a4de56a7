use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Typed view of the document returned by a parse call.
///
/// Fields this binding does not know about are kept in `extra` so that
/// re-serialising never drops engine-defined data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentParserResult {
    /// Outer `None` when the key was absent, `Some(None)` for an explicit `null`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub input: Option<Option<String>>,
    /// `None` when no intent matched the query.
    pub intent: Option<IntentClassifierResult>,
    #[serde(default)]
    pub slots: Vec<Slot>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentClassifierResult {
    pub intent_name: String,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub value: String,
    #[serde(default)]
    pub range: Option<Range>,
    pub entity: String,
    pub slot_name: String,
}

/// Character offsets into the query, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedEntity {
    pub value: String,
    #[serde(default)]
    pub range: Option<Range>,
    pub entity: String,
    pub slot_name: String,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl IntentParserResult {
    pub fn input(&self) -> Option<&str> {
        self.input.as_ref().and_then(|i| i.as_deref())
    }

    pub fn intent_name(&self) -> Option<&str> {
        self.intent.as_ref().map(|i| i.intent_name.as_str())
    }

    pub fn slot(&self, slot_name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.slot_name == slot_name)
    }
}

impl Range {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
