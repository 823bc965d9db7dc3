//! The serialized hand-over between the document parser and the converter
//!
//! A [`RecordStream`] is everything the conversion needs from one ELAN file:
//! the ordered records, the time-slot table and the linguistic type
//! declarations. It is plain serde data, so a parser in any language can
//! produce it as JSON or YAML.
//!
//! ```yaml
//! source: session1.eaf
//! time_slots:
//!   ts1: 10
//!   ts2: "20"
//! linguistic_types:
//!   - ["LINGUISTIC_TYPE_ID - words"]
//! elements:
//!   - kind: TIER
//!     attributes: ["LINGUISTIC_TYPE_REF - words", "TIER_ID - tx"]
//!   - kind: ALIGNABLE_ANNOTATION
//!     attributes: ["TIME_SLOT_REF2 - ts2", "TIME_SLOT_REF1 - ts1", "ANNOTATION_ID - a1"]
//!     depends: ANNOTATION
//!     value: hello
//! ```

use super::anchors::TimeSlotTable;
use super::error::GraphError;
use super::records::{LinguisticType, RawRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A time value as written by the parser: a number, or a string that may be
/// empty for unaligned slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimeValue {
    Offset(u64),
    Text(String),
}

impl RawTimeValue {
    fn as_text(&self) -> String {
        match self {
            RawTimeValue::Offset(offset) => offset.to_string(),
            RawTimeValue::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStream {
    /// Name of the originating file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub time_slots: BTreeMap<String, RawTimeValue>,
    /// Attribute lists of the declared linguistic types
    #[serde(default)]
    pub linguistic_types: Vec<Vec<String>>,
    #[serde(default)]
    pub elements: Vec<RawRecord>,
}

impl RecordStream {
    pub fn from_json(source: &str) -> Result<Self, GraphError> {
        serde_json::from_str(source).map_err(|e| GraphError::InvalidStream(e.to_string()))
    }

    pub fn from_yaml(source: &str) -> Result<Self, GraphError> {
        serde_yaml::from_str(source).map_err(|e| GraphError::InvalidStream(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        serde_json::to_string_pretty(self).map_err(|e| GraphError::InvalidStream(e.to_string()))
    }

    pub fn time_slot_table(&self) -> TimeSlotTable {
        TimeSlotTable::from_raw(
            self.time_slots
                .iter()
                .map(|(id, value)| (id.clone(), value.as_text())),
        )
    }

    pub fn linguistic_types(&self) -> Result<Vec<LinguisticType>, GraphError> {
        self.linguistic_types
            .iter()
            .map(|attributes| LinguisticType::from_attributes(attributes))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_YAML: &str = r#"
source: session1.eaf
time_slots:
  ts1: 10
  ts2: "20"
  ts3: ""
linguistic_types:
  - ["LINGUISTIC_TYPE_ID - words", "CONSTRAINTS - Included_In"]
elements:
  - kind: TIER
    attributes: ["LINGUISTIC_TYPE_REF - words", "TIER_ID - tx"]
  - kind: ALIGNABLE_ANNOTATION
    attributes: ["TIME_SLOT_REF2 - ts2", "TIME_SLOT_REF1 - ts1", "ANNOTATION_ID - a1"]
    depends: ANNOTATION
    value: hello
"#;

    #[test]
    fn test_yaml_stream() {
        let stream = RecordStream::from_yaml(SAMPLE_YAML).unwrap();
        assert_eq!(stream.source.as_deref(), Some("session1.eaf"));
        assert_eq!(stream.elements.len(), 2);
        assert_eq!(stream.elements[1].value.as_deref(), Some("hello"));

        let table = stream.time_slot_table();
        assert_eq!(table.get("ts1"), Some(10));
        assert_eq!(table.get("ts2"), Some(20));
        assert_eq!(table.get("ts3"), None);

        let types = stream.linguistic_types().unwrap();
        assert_eq!(types[0].constraint.as_deref(), Some("Included_In"));
    }

    #[test]
    fn test_json_round_trip_keeps_records() {
        let stream = RecordStream::from_yaml(SAMPLE_YAML).unwrap();
        let json = stream.to_json().unwrap();
        assert_eq!(RecordStream::from_json(&json).unwrap(), stream);
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let err = RecordStream::from_json("{ not json").unwrap_err();
        assert!(matches!(err, GraphError::InvalidStream(_)));
    }
}
