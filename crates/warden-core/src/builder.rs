//! Builder pattern for ergonomic policy construction

use crate::condition::{Condition, Conditions};
use crate::error::{PolicyError, Result};
use crate::policy::{Effect, Policy};

/// Builder for creating [`Policy`] instances with a fluent API.
///
/// `build` runs the same validation as deserialization, so a builder cannot
/// produce a policy that the engine would reject.
///
/// # Examples
///
/// ```
/// use warden_core::builder::PolicyBuilder;
/// use warden_core::condition::{CidrCondition, EqualsSubjectCondition};
///
/// # fn example() -> Result<(), warden_core::PolicyError> {
/// let policy = PolicyBuilder::new()
///     .id("articles-rw")
///     .description("editors may manage articles from the office network")
///     .allow()
///     .subject("<editor:.+>")
///     .resource("urn:articles:<[0-9]+>")
///     .actions(["get", "<create|delete>"])
///     .condition("owner", EqualsSubjectCondition)
///     .condition("clientIP", CidrCondition::new("10.0.0.0/8"))
///     .build()?;
///
/// assert!(policy.allow_access());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    id: Option<String>,
    description: String,
    effect: Option<Effect>,
    subjects: Vec<String>,
    resources: Vec<String>,
    actions: Vec<String>,
    conditions: Conditions,
}

impl PolicyBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy id
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the free-text description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Give the policy the allow effect
    #[must_use]
    pub fn allow(mut self) -> Self {
        self.effect = Some(Effect::Allow);
        self
    }

    /// Give the policy the deny effect
    #[must_use]
    pub fn deny(mut self) -> Self {
        self.effect = Some(Effect::Deny);
        self
    }

    /// Add one subject pattern
    #[must_use]
    pub fn subject(mut self, pattern: impl Into<String>) -> Self {
        self.subjects.push(pattern.into());
        self
    }

    /// Add several subject patterns
    #[must_use]
    pub fn subjects<I, P>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.subjects.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Add one resource pattern
    #[must_use]
    pub fn resource(mut self, pattern: impl Into<String>) -> Self {
        self.resources.push(pattern.into());
        self
    }

    /// Add several resource patterns
    #[must_use]
    pub fn resources<I, P>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.resources.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Add one action pattern
    #[must_use]
    pub fn action(mut self, pattern: impl Into<String>) -> Self {
        self.actions.push(pattern.into());
        self
    }

    /// Add several action patterns
    #[must_use]
    pub fn actions<I, P>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.actions.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Require a condition to be fulfilled under the given context key
    #[must_use]
    pub fn condition(mut self, key: impl Into<String>, condition: impl Condition + 'static) -> Self {
        self.conditions.insert(key, Box::new(condition));
        self
    }

    /// Build and validate the policy
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::InvalidPolicy` when id or effect is unset, plus
    /// every validation error of [`Policy::new`]
    pub fn build(self) -> Result<Policy> {
        let id = self
            .id
            .ok_or_else(|| PolicyError::InvalidPolicy("policy id not set".to_string()))?;
        let effect = self
            .effect
            .ok_or_else(|| PolicyError::InvalidPolicy("policy effect not set".to_string()))?;

        let policy = Policy::new(
            id,
            effect,
            self.subjects,
            self.resources,
            self.actions,
            self.conditions,
        )?;
        Ok(policy.with_description(self.description))
    }
}
