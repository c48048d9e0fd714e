//! Flag value and metadata models shared with the backend.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use derive_more::From;
use serde::{Deserialize, Serialize};

use crate::context::EvaluationContext;

/// A remotely controlled value that gates or parameterizes behavior without a
/// code deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
#[serde(untagged)]
pub enum FlagValue {
    /// A boolean toggle.
    Boolean(bool),
    /// A string value.
    String(String),
    /// A numerical value.
    Number(f64),
    /// A structured JSON payload.
    Structured(serde_json::Value),
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl FlagValue {
    /// Returns the boolean value, or `None` if the flag is not a boolean.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            FlagValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string value, or `None` if the flag is not a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the numeric value, or `None` if the flag is not a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FlagValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the structured payload, or `None` for scalar flags.
    pub fn as_structured(&self) -> Option<&serde_json::Value> {
        match self {
            FlagValue::Structured(v) => Some(v),
            _ => None,
        }
    }

    /// The value kind tag of this value.
    pub fn kind(&self) -> FlagKind {
        match self {
            FlagValue::Boolean(_) => FlagKind::Boolean,
            FlagValue::String(_) => FlagKind::String,
            FlagValue::Number(_) => FlagKind::Number,
            FlagValue::Structured(_) => FlagKind::Structured,
        }
    }
}

/// Value type tag of a flag definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    /// Boolean toggle.
    Boolean,
    /// String value.
    String,
    /// Numeric value.
    Number,
    /// Structured JSON value.
    Structured,
}

impl FlagKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            FlagKind::Boolean => "boolean",
            FlagKind::String => "string",
            FlagKind::Number => "number",
            FlagKind::Structured => "structured",
        }
    }
}

/// Flag metadata as stored by the backend. Read-only from the client's
/// perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagDefinition {
    /// Unique flag key.
    pub key: String,
    /// Human-readable name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Value type of the flag.
    #[serde(rename = "valueType")]
    pub kind: FlagKind,
    /// Whether the flag is enabled at all.
    pub enabled: bool,
    /// Value served when no targeting rule matches.
    #[serde(default)]
    pub default_value: Option<FlagValue>,
    /// Organizational tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

// Wire payloads. The backend wraps collections in an envelope object so the
// schemas stay extensible.

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluationResponse {
    #[serde(default)]
    pub value: Option<FlagValue>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchEvaluationRequest<'a> {
    pub flags: &'a [&'a str],
    pub context: &'a EvaluationContext,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchEvaluationResponse {
    #[serde(default)]
    pub flags: HashMap<String, Option<FlagValue>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserFlagsResponse {
    #[serde(default)]
    pub flags: HashMap<String, FlagValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListFlagsResponse {
    #[serde(default)]
    pub flags: Vec<FlagDefinition>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::{FlagDefinition, FlagKind, FlagValue};

    #[test]
    fn flag_value_deserializes_untagged() {
        let boolean: FlagValue = serde_json::from_str("true").unwrap();
        assert_eq!(boolean, FlagValue::Boolean(true));

        let string: FlagValue = serde_json::from_str("\"mode-a\"").unwrap();
        assert_eq!(string, FlagValue::String("mode-a".to_owned()));

        let number: FlagValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(number, FlagValue::Number(2.5));

        let structured: FlagValue = serde_json::from_str(r#"{"limit": 3}"#).unwrap();
        assert_eq!(structured.kind(), FlagKind::Structured);
    }

    #[test]
    fn flag_value_accessors_check_kind() {
        let value = FlagValue::from("text");
        assert_eq!(value.as_str(), Some("text"));
        assert_eq!(value.as_boolean(), None);
        assert_eq!(value.as_number(), None);
    }

    #[test]
    fn flag_definition_deserializes_camel_case() {
        let definition: FlagDefinition = serde_json::from_value(serde_json::json!({
            "key": "library.search",
            "name": "Library search",
            "valueType": "boolean",
            "enabled": true,
            "defaultValue": false,
            "tags": ["library"],
            "createdAt": "2025-03-01T08:00:00Z",
            "updatedAt": "2025-06-15T10:30:00Z"
        }))
        .unwrap();

        assert_eq!(definition.key, "library.search");
        assert_eq!(definition.kind, FlagKind::Boolean);
        assert_eq!(definition.default_value, Some(FlagValue::Boolean(false)));
        assert_eq!(definition.description, "");
        assert_eq!(definition.created_at.to_rfc3339(), "2025-03-01T08:00:00+00:00");
    }
}
