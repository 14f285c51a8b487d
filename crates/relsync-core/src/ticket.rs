use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Ticket
// ---------------------------------------------------------------------------

/// A ticket record as returned by a query: its key plus whichever fields
/// were requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub key: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Ticket {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Read a multi-valued label field.
    ///
    /// Returns `None` when the field is absent or null, which the store
    /// reports for a label field that was never populated.
    pub fn labels(&self, field: &str) -> Option<BTreeSet<String>> {
        match self.fields.get(field)? {
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Read a single-valued text field.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// FieldOp / Mutations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOp {
    Set(String),
    Add(String),
}

/// A batch of field operations applied to one ticket in a single update.
///
/// Serializes to the store's update document: `{"update": {field: [op, ...]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutations {
    pub update: BTreeMap<String, Vec<FieldOp>>,
}

impl Mutations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.update
            .entry(field.into())
            .or_default()
            .push(FieldOp::Set(value.into()));
        self
    }

    pub fn add(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.update
            .entry(field.into())
            .or_default()
            .push(FieldOp::Add(value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.update.is_empty()
    }

    pub fn ops(&self, field: &str) -> &[FieldOp] {
        self.update.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn labels_absent_null_and_present() {
        let ticket: Ticket = serde_json::from_value(json!({
            "key": "RUN-1",
            "fields": {
                "customfield_10081": ["org/a", "org/b"],
                "customfield_10089": null
            }
        }))
        .unwrap();
        assert_eq!(
            ticket.labels("customfield_10081").unwrap(),
            BTreeSet::from(["org/a".to_string(), "org/b".to_string()])
        );
        assert_eq!(ticket.labels("customfield_10089"), None);
        assert_eq!(ticket.labels("customfield_99999"), None);
    }

    #[test]
    fn ticket_without_fields_object() {
        let ticket: Ticket = serde_json::from_value(json!({ "key": "RUN-2" })).unwrap();
        assert!(ticket.fields.is_empty());
        assert_eq!(ticket.text("customfield_10074"), None);
    }

    #[test]
    fn mutations_serialize_to_update_document() {
        let m = Mutations::new()
            .add("customfield_10089", "org/a")
            .add("customfield_10089", "org/b")
            .set("customfield_10074", "Production");
        assert_eq!(
            serde_json::to_value(&m).unwrap(),
            json!({
                "update": {
                    "customfield_10074": [{ "set": "Production" }],
                    "customfield_10089": [{ "add": "org/a" }, { "add": "org/b" }]
                }
            })
        );
        assert_eq!(m.ops("customfield_10089").len(), 2);
        assert!(m.ops("missing").is_empty());
    }
}
