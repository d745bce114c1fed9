//! Policy store collaborator boundary
//!
//! Durable storage is not part of this crate. The engine consumes any
//! [`PolicyStore`] implementation: an in-memory vector, a SQL-backed table,
//! or anything else that can produce candidate policies for a request. The
//! engine works correctly whether the store returns the full policy set or a
//! pre-narrowed candidate subset; it never assumes the store already applied
//! subject/resource/action filtering.

use crate::policy::Policy;
use crate::request::Request;
use thiserror::Error;

/// Failure to query the backing policy store.
///
/// Propagated to the caller untouched as
/// [`PolicyError::Store`](crate::PolicyError::Store); never treated as a
/// deny or allow decision.
#[derive(Debug, Error)]
#[error("policy store error: {message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    /// Create a store error with a backend-specific message
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Source of candidate policies for evaluation (DIP - the engine depends on
/// this abstraction, not on a storage backend).
pub trait PolicyStore: Send + Sync {
    /// Return every stored policy
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be queried
    fn get_all(&self) -> std::result::Result<Vec<Policy>, StoreError>;

    /// Return candidate policies for a request.
    ///
    /// The default returns the full set; backends that can pre-filter (e.g.
    /// by indexed subject) may narrow it, as long as no policy that could
    /// match the request is omitted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be queried
    fn find_candidates(&self, request: &Request) -> std::result::Result<Vec<Policy>, StoreError> {
        let _ = request;
        self.get_all()
    }
}
