use serde_json::{Map, Value};

/// One upstream record exactly as decoded from the JSON page.
///
/// Field names follow whichever naming convention the upstream used for that
/// response (English or Chinese), so nothing about its shape is guaranteed.
pub type RawRecord = Map<String, Value>;

/// Returns the textual form of the first of `names` present in `record` with a
/// non-empty value.
///
/// Strings are returned as-is and numbers keep their JSON textual form. `null`
/// and the empty string count as missing.
pub(crate) fn first_present(record: &RawRecord, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| record.get(*name))
        .find_map(value_text)
}

pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A record mapped onto a data source's fixed output schema.
///
/// Holds one value per schema field, in schema order. Fields the upstream
/// record did not carry are present with an empty value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedRecord {
    fields: Vec<(&'static str, String)>,
}

impl NormalizedRecord {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: &'static str, value: String) {
        self.fields.push((name, value));
    }

    /// Value of the named field, or `None` if the schema has no such field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    /// Values in schema order, ready to be written as one CSV row.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    /// Number of fields, which is the length of the schema it was built from.
    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }

    /// Re-exposes this record as a [`RawRecord`] keyed by the output field names.
    pub fn to_raw(&self) -> RawRecord {
        self.fields
            .iter()
            .map(|(name, value)| (name.to_string(), Value::String(value.clone())))
            .collect()
    }
}
