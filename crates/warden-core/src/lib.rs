// SPDX-License-Identifier: Apache-2.0

//! # warden-core
//!
//! Embeddable authorization engine: given an access request, decide whether
//! a subject may perform an action on a resource, based on a set of
//! declarative policies with allow/deny effects, pattern-matched
//! identifiers, and pluggable runtime conditions.
//!
//! The crate provides:
//! - Policy and request data model with validated deserialization
//! - Pattern matching for subjects/resources/actions, with a compiled-regex cache
//! - An extensible, serializable condition system evaluated against request context
//! - A decision engine with deny-overrides-allow conflict resolution
//!
//! Durable policy storage is deliberately not part of this crate; the engine
//! consumes any [`store::PolicyStore`] implementation.
//!
//! ## Security
//!
//! Policies are validated at construction and deserialization time:
//! - MAX_PATTERN_LENGTH = 512 (prevents pathological regex compilation)
//! - MAX_PATTERNS_PER_FIELD = 256 (bounds per-request matching work)
//! - Malformed patterns are rejected before they can reach evaluation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod authorizer;
pub mod builder;
pub mod condition;
pub mod error;
pub mod matcher;
pub mod policy;
pub mod request;
pub mod store;

pub use authorizer::{Authorizer, PolicyAuthorizer};
pub use builder::PolicyBuilder;
pub use condition::{
    CidrCondition, Condition, ConditionRegistry, Conditions, DefinedCondition,
    EqualsSubjectCondition, StringEqualCondition,
};
/// Re-export commonly used types
pub use error::{PolicyError, Result};
pub use matcher::{Matcher, RegexMatcher};
pub use policy::{Effect, Policy};
pub use request::{Context, Request};
pub use store::{PolicyStore, StoreError};

/// Maximum length for a single subject/resource/action pattern
pub const MAX_PATTERN_LENGTH: usize = 512;

/// Maximum number of patterns per policy field
pub const MAX_PATTERNS_PER_FIELD: usize = 256;
