//! Configuration documents, as stored in the database.

use std::collections::BTreeMap;

use eyre::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::Error;

/// A file attached to a document. `data` holds the base64-encoded content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub content_type: String,
    pub data: String,
}

/// Attachments keyed by their (relative) file name.
pub type Attachments = BTreeMap<String, Attachment>;

/// A JSON document identified by its `_id` property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document(Map<String, JsonValue>);

impl Document {
    /// Creates a document with the given ID and attachments.
    pub fn new<S: Into<String>>(id: S, attachments: &Attachments) -> Result<Self> {
        let id: String = id.into();
        let mut doc = Self(Map::new());
        doc.set("_id", id)?;
        doc.set("_attachments", attachments)?;
        Ok(doc)
    }

    /// Returns this document with every property of `settings` applied on
    /// top of it. Properties from `settings` take precedence, including `_id`
    /// and `_attachments`.
    pub fn merged(mut self, settings: JsonValue) -> Result<Self> {
        match settings {
            JsonValue::Object(settings) => {
                for (key, value) in settings {
                    self.0.insert(key, value);
                }
                Ok(self)
            }
            other => Err(Error::InvalidDocument(format!(
                "settings must be a JSON object, but got {}",
                other
            ))
            .into()),
        }
    }

    /// The document's ID.
    pub fn id(&self) -> &str {
        self.get("_id").and_then(JsonValue::as_str).unwrap_or_default()
    }

    /// The document's revision, if it has one.
    pub fn rev(&self) -> Option<&str> {
        self.get("_rev").and_then(JsonValue::as_str)
    }

    /// Set the value associated with the given key.
    pub fn set<K, V>(&mut self, key: K, value: V) -> Result<Option<JsonValue>>
    where
        K: AsRef<str>,
        V: Serialize,
    {
        let value = serde_json::to_value(value)?;
        let key = key.as_ref().to_string();
        Ok(self.0.insert(key, value))
    }

    /// Get a reference to the value associated with the given key.
    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&JsonValue> {
        self.0.get(key.as_ref())
    }
}

impl TryFrom<JsonValue> for Document {
    type Error = Error;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Object(obj) => Ok(Self(obj)),
            other => Err(Error::InvalidDocument(format!(
                "expected a JSON object, but got {}",
                other
            ))),
        }
    }
}

impl From<Document> for JsonValue {
    fn from(doc: Document) -> Self {
        JsonValue::Object(doc.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn settings_are_applied_over_base_fields() {
        let mut attachments = Attachments::new();
        attachments.insert(
            "logo.png".to_string(),
            Attachment {
                content_type: "image/png".to_string(),
                data: "aGVsbG8=".to_string(),
            },
        );
        let doc = Document::new("branding", &attachments)
            .unwrap()
            .merged(json!({"title": "Clinic", "_id": "renamed"}))
            .unwrap();
        assert_eq!(doc.id(), "renamed");
        assert_eq!(doc.get("title"), Some(&json!("Clinic")));
        assert_eq!(
            doc.get("_attachments"),
            Some(&json!({"logo.png": {"content_type": "image/png", "data": "aGVsbG8="}}))
        );
        assert_eq!(doc.rev(), None);
    }

    #[test]
    fn non_object_settings_are_rejected() {
        let doc = Document::new("branding", &Attachments::new()).unwrap();
        assert!(doc.merged(json!([1, 2, 3])).is_err());
    }
}
