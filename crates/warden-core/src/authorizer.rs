//! Decision engine
//!
//! [`PolicyAuthorizer`] aggregates the policies matching a request into a
//! single decision under deny-overrides-allow semantics:
//!
//! 1. a policy matches iff its subject, resource, and action patterns all
//!    match the request and every condition is fulfilled by the context;
//! 2. any matching deny policy denies the request, regardless of how many
//!    allow policies also matched;
//! 3. otherwise any matching allow policy grants it;
//! 4. otherwise the request is denied by default.
//!
//! Decisions are never cached (they depend on mutable external context);
//! only compiled patterns are, inside the matcher owned by the authorizer.

use crate::error::{PolicyError, Result};
use crate::matcher::{Matcher, RegexMatcher};
use crate::policy::{Effect, Policy};
use crate::request::Request;
use crate::store::PolicyStore;

/// Trait for types that can answer access requests (DIP - clients depend on
/// this abstraction, not on the concrete engine).
pub trait Authorizer {
    /// Grant (`Ok`) or refuse the request with a typed denial
    ///
    /// # Errors
    ///
    /// See [`PolicyAuthorizer::is_allowed`]
    fn is_allowed(&self, request: &Request) -> Result<()>;
}

/// Evaluates access requests against policies from a [`PolicyStore`].
///
/// Owns the compiled-pattern cache (via its [`RegexMatcher`]); construct one
/// authorizer at startup and share it across request handlers. Evaluation is
/// synchronous, CPU-only, and safe to call from many threads concurrently.
#[derive(Debug)]
pub struct PolicyAuthorizer<S> {
    store: S,
    matcher: RegexMatcher,
}

impl<S: PolicyStore> PolicyAuthorizer<S> {
    /// Create an authorizer with a fresh pattern cache
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            matcher: RegexMatcher::new(),
        }
    }

    /// Create an authorizer reusing an existing matcher (and its cache)
    #[must_use]
    pub fn with_matcher(store: S, matcher: RegexMatcher) -> Self {
        Self { store, matcher }
    }

    /// Decide whether the request is allowed.
    ///
    /// Fetches candidate policies from the store and evaluates them. A store
    /// failure is propagated immediately, without retry, and is never turned
    /// into a deny or allow decision.
    ///
    /// # Errors
    ///
    /// - [`PolicyError::ExplicitDeny`] when a deny policy matched
    /// - [`PolicyError::DefaultDeny`] when no policy matched
    /// - [`PolicyError::Store`] when the store could not be queried
    pub fn is_allowed(&self, request: &Request) -> Result<()> {
        let candidates = self.store.find_candidates(request)?;
        self.evaluate(request, &candidates)
    }

    /// Evaluate the request against a given policy set.
    ///
    /// Correct for both a full policy set and a pre-narrowed candidate
    /// subset; matching is re-checked here either way.
    ///
    /// # Errors
    ///
    /// As [`PolicyAuthorizer::is_allowed`], minus the store variant
    pub fn evaluate(&self, request: &Request, policies: &[Policy]) -> Result<()> {
        let mut allowed = false;
        let mut denied: Vec<String> = Vec::new();

        for policy in policies {
            if !self.applies(policy, request) {
                continue;
            }
            match policy.effect() {
                Effect::Deny => denied.push(policy.id().to_string()),
                Effect::Allow => allowed = true,
            }
        }

        // Deny overrides allow
        if !denied.is_empty() {
            tracing::debug!(subject = %request.subject, policies = ?denied, "explicit deny");
            return Err(PolicyError::ExplicitDeny { policies: denied });
        }
        if allowed {
            tracing::trace!(subject = %request.subject, "access granted");
            Ok(())
        } else {
            tracing::debug!(subject = %request.subject, "default deny: no policy matched");
            Err(PolicyError::DefaultDeny)
        }
    }

    /// Iterate over the policies that match the request, whatever their
    /// effect. Useful for auditing and debugging decisions.
    pub fn matching_policies<'a>(
        &'a self,
        request: &'a Request,
        policies: &'a [Policy],
    ) -> impl Iterator<Item = &'a Policy> + 'a {
        policies.iter().filter(move |p| self.applies(p, request))
    }

    /// A policy applies iff all three pattern fields match and every
    /// condition is fulfilled. A condition whose key is absent from the
    /// context receives `None`, not an error.
    fn applies(&self, policy: &Policy, request: &Request) -> bool {
        self.matcher.matches(policy.subjects(), &request.subject)
            && self.matcher.matches(policy.resources(), &request.resource)
            && self.matcher.matches(policy.actions(), &request.action)
            && policy
                .conditions()
                .iter()
                .all(|(key, condition)| condition.fulfills(request.context.get(key), request))
    }
}

impl<S: PolicyStore> Authorizer for PolicyAuthorizer<S> {
    fn is_allowed(&self, request: &Request) -> Result<()> {
        PolicyAuthorizer::is_allowed(self, request)
    }
}
