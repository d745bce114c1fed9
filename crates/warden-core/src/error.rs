//! Error types for warden-core

use crate::store::StoreError;
use thiserror::Error;

/// Result type alias for policy operations
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Errors that can occur in policy operations.
///
/// The two denial variants are deliberately distinct: [`PolicyError::ExplicitDeny`]
/// means a deny policy matched the request, [`PolicyError::DefaultDeny`] means no
/// policy matched at all. Both deny access, but audit trails need to tell them
/// apart. Everything else is an infrastructure or validation failure and must
/// never be conflated with a denial.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// At least one matching policy carried a deny effect
    #[error("access denied: matched deny policies {policies:?}")]
    ExplicitDeny {
        /// IDs of the deny policies that matched the request
        policies: Vec<String>,
    },

    /// No policy matched the request
    #[error("access denied: no policy matched the request")]
    DefaultDeny,

    /// The policy store could not be queried
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A serialized condition referenced a type name that was never registered
    #[error("unknown condition type: {0:?}")]
    UnknownConditionType(String),

    /// JSON (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Structurally invalid policy (empty pattern list, missing effect, ...)
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    /// A pattern's embedded regex fragment does not compile
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The offending pattern string
        pattern: String,
        /// Why compilation failed
        reason: String,
    },

    /// Pattern exceeds the maximum length (DoS prevention)
    #[error("pattern exceeds maximum {max} characters (length: {length})")]
    PatternTooLong {
        /// Maximum allowed length
        max: usize,
        /// Actual pattern length
        length: usize,
    },

    /// A policy field declares too many patterns (DoS prevention)
    #[error("{field} list exceeds maximum {max} patterns (count: {count})")]
    TooManyPatterns {
        /// Field the limit applies to
        field: &'static str,
        /// Maximum allowed patterns
        max: usize,
        /// Actual pattern count
        count: usize,
    },
}

impl PolicyError {
    /// True for either denial variant (explicit or default)
    #[must_use]
    pub const fn is_denial(&self) -> bool {
        matches!(self, Self::ExplicitDeny { .. } | Self::DefaultDeny)
    }

    /// True iff a deny policy matched the request
    #[must_use]
    pub const fn is_explicit_deny(&self) -> bool {
        matches!(self, Self::ExplicitDeny { .. })
    }

    /// True iff no policy matched the request
    #[must_use]
    pub const fn is_default_deny(&self) -> bool {
        matches!(self, Self::DefaultDeny)
    }
}
