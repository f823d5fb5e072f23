#![allow(dead_code)]

//! Record model: the tagged-union value type and the normalized record wrapper.
//!
//! Downstream writers read the record only through the defaulted accessors,
//! so a missing or mistyped field never fails an archive build.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// Narrative field rendered into the technical document.
pub const NARRATIVE_FIELD: &str = "documento_tecnico";
/// Tabular field: the MGA value chain.
pub const VALUE_CHAIN_FIELD: &str = "cadena_valor";
/// Tabular field: the sector concept.
pub const SECTOR_CONCEPT_FIELD: &str = "concepto_sectorial";
/// Plain-text field written verbatim into the .txt artifact.
pub const PLAIN_TEXT_FIELD: &str = "mga_txt";

pub const TEXT_FIELDS: [&str; 2] = [NARRATIVE_FIELD, PLAIN_TEXT_FIELD];
pub const TABULAR_FIELDS: [&str; 2] = [VALUE_CHAIN_FIELD, SECTOR_CONCEPT_FIELD];

/// A single value inside a normalized record, decided at parse time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    Sequence(Vec<RecordValue>),
    Mapping(IndexMap<String, RecordValue>),
}

/// One row of a tabular field. Column order is the model's key order.
pub type Row = IndexMap<String, RecordValue>;

impl RecordValue {
    pub fn as_sequence(&self) -> Option<&[RecordValue]> {
        match self {
            RecordValue::Sequence(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Row> {
        match self {
            RecordValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RecordValue::Null)
    }

    /// Renders the value for a text cell or paragraph.
    /// Text is returned as-is, scalars via their JSON form, containers as compact JSON.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            RecordValue::Null => Cow::Borrowed(""),
            RecordValue::Bool(b) => Cow::Owned(b.to_string()),
            RecordValue::Number(n) => Cow::Owned(n.to_string()),
            RecordValue::Text(s) => Cow::Borrowed(s.as_str()),
            RecordValue::Sequence(_) | RecordValue::Mapping(_) => {
                Cow::Owned(Value::from(self.clone()).to_string())
            }
        }
    }
}

impl From<Value> for RecordValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RecordValue::Null,
            Value::Bool(b) => RecordValue::Bool(b),
            Value::Number(n) => RecordValue::Number(n),
            Value::String(s) => RecordValue::Text(s),
            Value::Array(items) => {
                RecordValue::Sequence(items.into_iter().map(RecordValue::from).collect())
            }
            Value::Object(map) => RecordValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, RecordValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<RecordValue> for Value {
    fn from(value: RecordValue) -> Self {
        match value {
            RecordValue::Null => Value::Null,
            RecordValue::Bool(b) => Value::Bool(b),
            RecordValue::Number(n) => Value::Number(n),
            RecordValue::Text(s) => Value::String(s),
            RecordValue::Sequence(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            RecordValue::Mapping(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl<'de> Deserialize<'de> for RecordValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(RecordValue::from)
    }
}

/// Why a record fell back to wrapping the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No `{ ... }` region in the response.
    NoStructuredPayload,
    /// A region was found but stayed unparsable after repair.
    MalformedPayload,
}

/// How a record was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum RecordOrigin {
    Structured,
    Fallback(FallbackReason),
}

/// The structured mapping produced by the normalizer.
///
/// Serializes as the plain mapping; `origin` is metadata only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedRecord {
    fields: IndexMap<String, RecordValue>,
    #[serde(skip)]
    origin: RecordOrigin,
}

impl NormalizedRecord {
    /// Wraps a parsed mapping and inserts defaults for every expected field
    /// that is absent or null.
    pub fn structured(fields: IndexMap<String, RecordValue>) -> Self {
        let mut record = Self {
            fields,
            origin: RecordOrigin::Structured,
        };
        record.apply_defaults();
        record
    }

    /// Single-key shape: the trimmed raw text under the narrative field.
    pub fn fallback(raw: &str, reason: FallbackReason) -> Self {
        let mut fields = IndexMap::with_capacity(1);
        fields.insert(
            NARRATIVE_FIELD.to_string(),
            RecordValue::Text(raw.trim().to_string()),
        );
        Self {
            fields,
            origin: RecordOrigin::Fallback(reason),
        }
    }

    fn apply_defaults(&mut self) {
        for key in TEXT_FIELDS {
            let slot = self
                .fields
                .entry(key.to_string())
                .or_insert(RecordValue::Null);
            if slot.is_null() {
                *slot = RecordValue::Text(String::new());
            }
        }
        for key in TABULAR_FIELDS {
            let slot = self
                .fields
                .entry(key.to_string())
                .or_insert(RecordValue::Null);
            if slot.is_null() {
                *slot = RecordValue::Sequence(Vec::new());
            }
        }
    }

    pub fn origin(&self) -> RecordOrigin {
        self.origin
    }

    pub fn fields(&self) -> &IndexMap<String, RecordValue> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&RecordValue> {
        self.fields.get(key)
    }

    /// Technical document body. Empty when absent.
    pub fn narrative(&self) -> Cow<'_, str> {
        self.text_field(NARRATIVE_FIELD)
    }

    /// Plain-text project summary. Empty when absent.
    pub fn plain_text(&self) -> Cow<'_, str> {
        self.text_field(PLAIN_TEXT_FIELD)
    }

    pub fn value_chain(&self) -> Vec<&Row> {
        self.rows(VALUE_CHAIN_FIELD)
    }

    pub fn sector_concept(&self) -> Vec<&Row> {
        self.rows(SECTOR_CONCEPT_FIELD)
    }

    /// Mapping elements of a tabular field. Anything that is not a row is skipped.
    pub fn rows(&self, key: &str) -> Vec<&Row> {
        self.fields
            .get(key)
            .and_then(RecordValue::as_sequence)
            .map(|items| items.iter().filter_map(RecordValue::as_mapping).collect())
            .unwrap_or_default()
    }

    /// True when nothing usable was extracted: both text fields blank and both tables empty.
    pub fn is_empty_extraction(&self) -> bool {
        self.narrative().trim().is_empty()
            && self.plain_text().trim().is_empty()
            && self.value_chain().is_empty()
            && self.sector_concept().is_empty()
    }

    fn text_field(&self, key: &str) -> Cow<'_, str> {
        self.fields
            .get(key)
            .map(RecordValue::render)
            .unwrap_or(Cow::Borrowed(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(value: Value) -> IndexMap<String, RecordValue> {
        match RecordValue::from(value) {
            RecordValue::Mapping(map) => map,
            other => panic!("expected mapping, got {other:?}"),
        }
    }

    #[test]
    fn test_structured_inserts_missing_fields() {
        let record = NormalizedRecord::structured(mapping(json!({"a": 1})));
        assert_eq!(record.get(VALUE_CHAIN_FIELD), Some(&RecordValue::Sequence(vec![])));
        assert_eq!(record.get(SECTOR_CONCEPT_FIELD), Some(&RecordValue::Sequence(vec![])));
        assert_eq!(record.get(NARRATIVE_FIELD), Some(&RecordValue::Text(String::new())));
        assert_eq!(record.get(PLAIN_TEXT_FIELD), Some(&RecordValue::Text(String::new())));
        assert_eq!(record.origin(), RecordOrigin::Structured);
    }

    #[test]
    fn test_structured_replaces_null_fields() {
        let record = NormalizedRecord::structured(mapping(json!({
            "cadena_valor": null,
            "documento_tecnico": null
        })));
        assert_eq!(record.get(VALUE_CHAIN_FIELD), Some(&RecordValue::Sequence(vec![])));
        assert_eq!(record.narrative(), "");
    }

    #[test]
    fn test_structured_keeps_existing_fields_and_order() {
        let record = NormalizedRecord::structured(mapping(json!({
            "z": "last-looking but first",
            "documento_tecnico": "Doc"
        })));
        let keys: Vec<&str> = record.fields().keys().map(String::as_str).collect();
        assert_eq!(keys[0], "z");
        assert_eq!(keys[1], NARRATIVE_FIELD);
        assert_eq!(record.narrative(), "Doc");
    }

    #[test]
    fn test_fallback_is_single_key_and_trimmed() {
        let record = NormalizedRecord::fallback("  hello world \n", FallbackReason::NoStructuredPayload);
        assert_eq!(record.fields().len(), 1);
        assert_eq!(record.narrative(), "hello world");
        assert!(record.value_chain().is_empty());
        assert_eq!(
            record.origin(),
            RecordOrigin::Fallback(FallbackReason::NoStructuredPayload)
        );
    }

    #[test]
    fn test_rows_skip_non_mapping_elements() {
        let record = NormalizedRecord::structured(mapping(json!({
            "cadena_valor": [{"producto": "Acueducto"}, "stray", 3, {"producto": "Red"}]
        })));
        let rows = record.value_chain();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["producto"], RecordValue::Text("Red".to_string()));
    }

    #[test]
    fn test_rows_empty_when_field_is_not_a_sequence() {
        let record = NormalizedRecord::structured(mapping(json!({"concepto_sectorial": "n/a"})));
        assert!(record.sector_concept().is_empty());
    }

    #[test]
    fn test_non_text_narrative_renders_as_json() {
        let record = NormalizedRecord::structured(mapping(json!({
            "documento_tecnico": {"objetivo": "Agua"}
        })));
        assert_eq!(record.narrative(), r#"{"objetivo":"Agua"}"#);
    }

    #[test]
    fn test_empty_extraction_detection() {
        let empty = NormalizedRecord::structured(IndexMap::new());
        assert!(empty.is_empty_extraction());

        let with_rows = NormalizedRecord::structured(mapping(json!({
            "cadena_valor": [{"a": 1}]
        })));
        assert!(!with_rows.is_empty_extraction());
    }

    #[test]
    fn test_record_serializes_as_plain_mapping() {
        let record = NormalizedRecord::structured(mapping(json!({"a": 1})));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "a": 1,
                "documento_tecnico": "",
                "mga_txt": "",
                "cadena_valor": [],
                "concepto_sectorial": []
            })
        );
    }

    #[test]
    fn test_record_value_deserializes_from_json() {
        let value: RecordValue = serde_json::from_str(r#"{"b": [1, "x", null], "a": true}"#).unwrap();
        let map = value.as_mapping().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(map["a"], RecordValue::Bool(true));
    }

    #[test]
    fn test_render_scalars() {
        assert_eq!(RecordValue::Null.render(), "");
        assert_eq!(RecordValue::Bool(false).render(), "false");
        assert_eq!(RecordValue::Number(Number::from(1500000)).render(), "1500000");
    }
}
