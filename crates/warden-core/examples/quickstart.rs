//! Quickstart: policies, conditions, and access decisions
//!
//! This example demonstrates the core authorization workflow:
//!
//! 1. Define policies with pattern-matched identifiers and conditions
//! 2. Put them in a (here: in-memory) policy store
//! 3. Ask the authorizer whether access requests should be granted
//!
//! Run with: cargo run --example quickstart

use warden_core::condition::{CidrCondition, EqualsSubjectCondition};
use warden_core::{Policy, PolicyAuthorizer, PolicyBuilder, PolicyStore, Request, StoreError};

/// Minimal store; production embedders bring their own backend
struct MemoryStore(Vec<Policy>);

impl PolicyStore for MemoryStore {
    fn get_all(&self) -> Result<Vec<Policy>, StoreError> {
        Ok(self.0.clone())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("warden - quickstart");
    println!("-------------------");
    println!();

    // -------------------------------------------------------------------------
    // Step 1: Define Policies
    // -------------------------------------------------------------------------
    // A policy declares an effect (allow/deny), pattern lists for subjects,
    // resources and actions, and optional conditions evaluated against the
    // request context. Patterns are literal unless they embed a <regex>
    // fragment.

    let owner_access = PolicyBuilder::new()
        .id("owner-access")
        .description("owners on the office network may manage their articles")
        .allow()
        .subjects(["max", "peter", "<zac|ken>"])
        .resource("urn:articles:<[0-9]+>")
        .actions(["get", "<create|delete>"])
        .condition("owner", EqualsSubjectCondition)
        .condition("clientIP", CidrCondition::new("10.0.0.0/8"))
        .build()?;

    let freeze = PolicyBuilder::new()
        .id("freeze-article-13")
        .description("article 13 is frozen for everyone")
        .deny()
        .subject("<.*>")
        .resource("urn:articles:13")
        .action("<.*>")
        .build()?;

    // -------------------------------------------------------------------------
    // Step 2: Construct the Authorizer
    // -------------------------------------------------------------------------
    // The authorizer owns the compiled-pattern cache; build it once and share
    // it across request handlers.

    let warden = PolicyAuthorizer::new(MemoryStore(vec![owner_access, freeze]));

    // -------------------------------------------------------------------------
    // Step 3: Evaluate Requests
    // -------------------------------------------------------------------------

    let requests = [
        Request::new("peter", "delete", "urn:articles:7")
            .with_context("owner", "peter")
            .with_context("clientIP", "10.1.2.3"),
        // Wrong network: the CIDR condition fails, nothing matches
        Request::new("peter", "delete", "urn:articles:7")
            .with_context("owner", "peter")
            .with_context("clientIP", "8.8.8.8"),
        // Frozen article: the deny policy overrides the allow policy
        Request::new("max", "get", "urn:articles:13")
            .with_context("owner", "max")
            .with_context("clientIP", "10.1.2.3"),
    ];

    for request in &requests {
        match warden.is_allowed(request) {
            Ok(()) => println!(
                "GRANTED  {} {} {}",
                request.subject, request.action, request.resource
            ),
            Err(err) => println!(
                "DENIED   {} {} {} ({err})",
                request.subject, request.action, request.resource
            ),
        }
    }

    Ok(())
}
