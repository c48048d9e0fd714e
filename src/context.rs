//! The evaluation context callers attach to a lookup. The backend uses it to
//! resolve flag values for that specific caller; the client uses it to derive
//! request headers and cache keys.

use std::collections::{BTreeMap, HashMap};

use derive_more::From;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

/// Type alias for a map of free-form context attributes.
///
/// # Examples
/// ```
/// # use edflags::{Attributes, AttributeValue};
/// let attributes = [
///     ("classroom_size".to_owned(), 24.0.into()),
///     ("pilot_school".to_owned(), true.into()),
/// ].into_iter().collect::<Attributes>();
/// ```
pub type Attributes = HashMap<String, AttributeValue>;

/// Enum representing possible values of a free-form context attribute.
///
/// Conveniently implements `From` conversions for `String`, `&str`, `f64`,
/// and `bool`.
#[derive(Debug, Serialize, Deserialize, PartialEq, From, Clone)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A string value.
    String(String),
    /// A numerical value.
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// A null value or absence of value.
    Null,
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// Grade band of the learner behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GradeBand {
    /// Pre-kindergarten.
    PreK,
    /// Elementary school.
    Elementary,
    /// Middle school.
    Middle,
    /// High school.
    High,
}

impl GradeBand {
    /// Wire representation, as carried in the `x-grade-band` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeBand::PreK => "pre-k",
            GradeBand::Elementary => "elementary",
            GradeBand::Middle => "middle",
            GradeBand::High => "high",
        }
    }
}

const HEADER_USER_ID: &str = "x-user-id";
const HEADER_SESSION_ID: &str = "x-session-id";
const HEADER_TENANT_ID: &str = "x-tenant-id";
const HEADER_USER_ROLE: &str = "x-user-role";
const HEADER_GRADE_BAND: &str = "x-grade-band";
const HEADER_TENANT_TIER: &str = "x-tenant-tier";
const HEADER_VARIATION: &str = "x-variation";

/// Caller attributes used by the backend to resolve flag and configuration
/// values. Every field is optional; construct one per request or reuse a
/// context across calls.
///
/// # Examples
/// ```
/// # use edflags::{EvaluationContext, GradeBand};
/// let context = EvaluationContext::new()
///     .tenant_id("district-42")
///     .role("teacher")
///     .grade_band(GradeBand::Middle)
///     .attribute("pilot_school", true);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationContext {
    /// Stable identifier of the signed-in user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Identifier of the browser session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Tenant (school or district) the user belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Role of the user, e.g. `"teacher"`, `"student"`, `"therapist"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Grade band the request is made for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_band: Option<GradeBand>,
    /// Subscription tier of the tenant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_tier: Option<String>,
    /// Experiment variation tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation: Option<String>,
    /// Free-form attributes forwarded to the backend's rule evaluation.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: Attributes,
}

impl EvaluationContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user identifier.
    pub fn user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    /// Set the session identifier.
    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    /// Set the tenant identifier.
    pub fn tenant_id(mut self, id: impl Into<String>) -> Self {
        self.tenant_id = Some(id.into());
        self
    }

    /// Set the user role.
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the grade band.
    pub fn grade_band(mut self, band: GradeBand) -> Self {
        self.grade_band = Some(band);
        self
    }

    /// Set the tenant subscription tier.
    pub fn tenant_tier(mut self, tier: impl Into<String>) -> Self {
        self.tenant_tier = Some(tier.into());
        self
    }

    /// Set the experiment variation tag.
    pub fn variation(mut self, variation: impl Into<String>) -> Self {
        self.variation = Some(variation.into());
        self
    }

    /// Add a free-form attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Request headers announcing this context to the backend. Only present
    /// fields are emitted.
    pub(crate) fn to_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let mut push = |name: &'static str, value: &str| match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(_) => {
                log::warn!(target: "edflags", header = name; "dropping context header with invalid value");
            }
        };

        if let Some(v) = &self.user_id {
            push(HEADER_USER_ID, v);
        }
        if let Some(v) = &self.session_id {
            push(HEADER_SESSION_ID, v);
        }
        if let Some(v) = &self.tenant_id {
            push(HEADER_TENANT_ID, v);
        }
        if let Some(v) = &self.role {
            push(HEADER_USER_ROLE, v);
        }
        if let Some(v) = &self.grade_band {
            push(HEADER_GRADE_BAND, v.as_str());
        }
        if let Some(v) = &self.tenant_tier {
            push(HEADER_TENANT_TIER, v);
        }
        if let Some(v) = &self.variation {
            push(HEADER_VARIATION, v);
        }
        headers
    }

    /// Stable serialization used to derive cache keys. Attributes are sorted
    /// by key so that insertion order never affects the result.
    pub(crate) fn canonical_string(&self) -> String {
        let mut out = String::new();
        let mut push = |tag: &str, value: &str| {
            out.push_str(tag);
            out.push('=');
            out.push_str(value);
            out.push(';');
        };

        if let Some(v) = &self.user_id {
            push("user", v);
        }
        if let Some(v) = &self.session_id {
            push("session", v);
        }
        if let Some(v) = &self.tenant_id {
            push("tenant", v);
        }
        if let Some(v) = &self.role {
            push("role", v);
        }
        if let Some(v) = &self.grade_band {
            push("grade", v.as_str());
        }
        if let Some(v) = &self.tenant_tier {
            push("tier", v);
        }
        if let Some(v) = &self.variation {
            push("variation", v);
        }

        let attributes: BTreeMap<&String, &AttributeValue> = self.attributes.iter().collect();
        for (key, value) in attributes {
            let rendered = match value {
                AttributeValue::String(s) => s.clone(),
                AttributeValue::Number(n) => n.to_string(),
                AttributeValue::Boolean(b) => b.to_string(),
                AttributeValue::Null => "null".to_owned(),
            };
            push(&format!("attr.{key}"), &rendered);
        }
        out
    }
}
