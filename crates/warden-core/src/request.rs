//! Access request data model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Context values available to conditions during evaluation.
///
/// Uses `BTreeMap` for deterministic serialization. A key that is absent is a
/// different state from a key that is present with a `null` value; conditions
/// receive `Option<&Value>` and can distinguish the two.
pub type Context = BTreeMap<String, Value>;

/// The query being authorized: who (`subject`) wants to do what (`action`)
/// on which `resource`, plus named context values for condition evaluation.
///
/// Requests are transient. They are created per access check and never
/// persisted or mutated by the engine. Empty strings are legal values for
/// all three identifier fields and are matchable by patterns like `<.*>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Subject requesting access (e.g. a user or client id)
    #[serde(default)]
    pub subject: String,

    /// Action the subject wants to perform
    #[serde(default)]
    pub action: String,

    /// Resource the action targets
    #[serde(default)]
    pub resource: String,

    /// Named context values consumed by policy conditions
    #[serde(default, skip_serializing_if = "Context::is_empty")]
    pub context: Context,
}

impl Request {
    /// Create a request without context
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            action: action.into(),
            resource: resource.into(),
            context: Context::new(),
        }
    }

    /// Add a context value
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}
