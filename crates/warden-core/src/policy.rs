//! Policy data model and validation
//!
//! A policy is the declarative unit of authorization: an effect (allow or
//! deny), pattern lists for subjects/resources/actions, and named conditions.
//! Policies are validated when constructed or deserialized and immutable
//! afterwards; the engine never mutates a policy during evaluation.
//!
//! ## Security
//!
//! Fields are private to force validation through construction or
//! deserialization. The `#[serde(try_from)]` attribute ensures every
//! deserialized policy is checked: non-empty pattern lists, pattern length
//! and count limits, and compilable embedded regex fragments. A malformed
//! pattern is rejected here, at write time, rather than silently never
//! matching at evaluation time.

use crate::condition::{ConditionRegistry, Conditions};
use crate::error::{PolicyError, Result};
use crate::matcher;
use crate::{MAX_PATTERNS_PER_FIELD, MAX_PATTERN_LENGTH};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome a policy attaches to requests it matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Grant access when the policy matches
    Allow,
    /// Refuse access when the policy matches; deny overrides allow
    Deny,
}

impl Effect {
    /// True iff this is the allow effect
    #[must_use]
    pub const fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// True iff this is the deny effect
    #[must_use]
    pub const fn is_deny(self) -> bool {
        matches!(self, Self::Deny)
    }
}

/// A declarative authorization rule.
///
/// Matches a request when any subject pattern matches the request subject,
/// any resource pattern matches the resource, any action pattern matches the
/// action, and every condition is fulfilled by the request context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "PolicyRaw")]
pub struct Policy {
    /// Opaque unique identifier
    id: String,

    /// Free-text description, non-semantic
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,

    /// Subject patterns (literal or `<...>` regex-embedded)
    subjects: Vec<String>,

    /// Resource patterns
    resources: Vec<String>,

    /// Action patterns
    actions: Vec<String>,

    /// Allow or deny
    effect: Effect,

    /// Context conditions, keyed by context name
    #[serde(default, skip_serializing_if = "Conditions::is_empty")]
    conditions: Conditions,
}

/// Raw policy structure for deserialization (internal use only).
///
/// Parsed first, then converted via `TryFrom<PolicyRaw>` so that every
/// deserialized policy passes validation. An unrecognized effect string
/// already fails at this stage, before conversion.
#[derive(Debug, Deserialize)]
struct PolicyRaw {
    id: String,
    #[serde(default)]
    description: String,
    subjects: Vec<String>,
    resources: Vec<String>,
    actions: Vec<String>,
    effect: Effect,
    #[serde(default)]
    conditions: Conditions,
}

impl TryFrom<PolicyRaw> for Policy {
    type Error = PolicyError;

    fn try_from(raw: PolicyRaw) -> Result<Self> {
        let policy = Policy {
            id: raw.id,
            description: raw.description,
            subjects: raw.subjects,
            resources: raw.resources,
            actions: raw.actions,
            effect: raw.effect,
            conditions: raw.conditions,
        };
        policy.validate()?;
        Ok(policy)
    }
}

impl Policy {
    /// Create a validated policy.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::InvalidPolicy` for an empty id or empty pattern
    /// list, `PolicyError::PatternTooLong` / `PolicyError::TooManyPatterns`
    /// when limits are exceeded, and `PolicyError::InvalidPattern` when an
    /// embedded regex fragment does not compile.
    pub fn new(
        id: impl Into<String>,
        effect: Effect,
        subjects: Vec<String>,
        resources: Vec<String>,
        actions: Vec<String>,
        conditions: Conditions,
    ) -> Result<Self> {
        let policy = Self {
            id: id.into(),
            description: String::new(),
            subjects,
            resources,
            actions,
            effect,
            conditions,
        };
        policy.validate()?;
        Ok(policy)
    }

    // ===== Accessors =====

    /// Get the policy id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the subject patterns
    #[must_use]
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Get the resource patterns
    #[must_use]
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// Get the action patterns
    #[must_use]
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Get the effect
    #[must_use]
    pub const fn effect(&self) -> Effect {
        self.effect
    }

    /// Get the conditions
    #[must_use]
    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    /// True iff the policy grants access when it matches
    #[must_use]
    pub const fn allow_access(&self) -> bool {
        self.effect.is_allow()
    }

    /// Attach a description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Validate id, pattern lists, and pattern syntax.
    ///
    /// # Errors
    ///
    /// See [`Policy::new`].
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(PolicyError::InvalidPolicy(
                "policy id cannot be empty".to_string(),
            ));
        }
        validate_patterns("subjects", &self.subjects)?;
        validate_patterns("resources", &self.resources)?;
        validate_patterns("actions", &self.actions)?;
        Ok(())
    }

    /// Load a policy from JSON, resolving conditions against the built-in set
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::Serialization` on parse failure and any
    /// validation error from [`Policy::new`].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a policy from JSON, resolving conditions against a caller-owned
    /// registry. Required when the policy references custom condition types.
    ///
    /// # Errors
    ///
    /// As [`Policy::from_json`], plus `PolicyError::UnknownConditionType`
    /// when the registry has no factory for a referenced type.
    pub fn from_json_with(json: &str, registry: &ConditionRegistry) -> Result<Self> {
        let mut value: Value = serde_json::from_str(json)?;

        // Detach conditions so the default deserialization path does not
        // resolve them against the built-in registry.
        let conditions = match value.as_object_mut().and_then(|o| o.remove("conditions")) {
            Some(raw) if !raw.is_null() => registry.deserialize_conditions(&raw)?,
            _ => Conditions::new(),
        };

        let mut policy: Policy = serde_json::from_value(value)?;
        policy.conditions = conditions;
        Ok(policy)
    }

    /// Serialize the policy to JSON
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::Serialization` if serialization fails
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn validate_patterns(field: &'static str, patterns: &[String]) -> Result<()> {
    if patterns.is_empty() {
        return Err(PolicyError::InvalidPolicy(format!(
            "policy must declare at least one {field} pattern"
        )));
    }

    if patterns.len() > MAX_PATTERNS_PER_FIELD {
        return Err(PolicyError::TooManyPatterns {
            field,
            max: MAX_PATTERNS_PER_FIELD,
            count: patterns.len(),
        });
    }

    for pattern in patterns {
        if pattern.len() > MAX_PATTERN_LENGTH {
            return Err(PolicyError::PatternTooLong {
                max: MAX_PATTERN_LENGTH,
                length: pattern.len(),
            });
        }
        if pattern.contains('<') || pattern.contains('>') {
            matcher::compile_pattern(pattern)?;
        }
    }

    Ok(())
}
