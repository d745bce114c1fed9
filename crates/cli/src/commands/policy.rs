use colored::*;
use std::collections::HashSet;
use std::fs;
use warden_core::{Context, Policy, PolicyAuthorizer, PolicyStore, Request, StoreError};

/// File-backed store for ad-hoc CLI evaluation
struct FileStore(Vec<Policy>);

impl PolicyStore for FileStore {
    fn get_all(&self) -> Result<Vec<Policy>, StoreError> {
        Ok(self.0.clone())
    }
}

/// Load a policy file containing either a single policy object or an array
fn load(file_path: &str) -> anyhow::Result<Vec<Policy>> {
    let content =
        fs::read_to_string(file_path).map_err(|e| anyhow::anyhow!("Failed to read file: {}", e))?;

    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| anyhow::anyhow!("JSON parsing error: {}", e))?;

    let raw_policies = match value {
        serde_json::Value::Array(items) => items,
        object => vec![object],
    };

    raw_policies
        .into_iter()
        .map(|raw| {
            serde_json::from_value(raw).map_err(|e| anyhow::anyhow!("Invalid policy: {}", e))
        })
        .collect()
}

pub fn check(file_path: &str) -> anyhow::Result<()> {
    println!("{} {}", "Checking policies:".bold(), file_path);

    // Deserialization already runs full validation
    let policies = load(file_path)?;

    let mut warnings = 0;
    let mut seen_ids = HashSet::new();

    for policy in &policies {
        println!(
            "  {} {} ({}, {} subject(s), {} resource(s), {} action(s), {} condition(s))",
            "✓".green(),
            policy.id(),
            if policy.allow_access() { "allow" } else { "deny" },
            policy.subjects().len(),
            policy.resources().len(),
            policy.actions().len(),
            policy.conditions().len(),
        );

        if !seen_ids.insert(policy.id().to_string()) {
            println!("  {} Policy id {} is duplicated", "⚠".yellow(), policy.id());
            warnings += 1;
        }
    }

    println!();
    if warnings == 0 {
        println!(
            "{} {} policies are valid!",
            "✓".green().bold(),
            policies.len()
        );
    } else {
        println!(
            "{} {} policies are valid with {} warning(s)",
            "⚠".yellow().bold(),
            policies.len(),
            warnings
        );
    }

    Ok(())
}

pub fn test(
    file_path: &str,
    subject: &str,
    action: &str,
    resource: &str,
    context_args: &[String],
) -> anyhow::Result<()> {
    let policies = load(file_path)?;
    let warden = PolicyAuthorizer::new(FileStore(policies));

    let request = Request {
        subject: subject.to_string(),
        action: action.to_string(),
        resource: resource.to_string(),
        context: parse_context(context_args)?,
    };

    println!(
        "{} subject={} action={} resource={}",
        "Evaluating:".bold(),
        request.subject,
        request.action,
        request.resource
    );

    match warden.is_allowed(&request) {
        Ok(()) => println!("{}", "✓ Access granted".green().bold()),
        Err(err) => {
            println!("{}", "✗ Access denied".red().bold());
            println!("  {}", err);
        }
    }

    Ok(())
}

/// Parse repeated `key=value` flags; values are JSON when they parse, strings otherwise
fn parse_context(args: &[String]) -> anyhow::Result<Context> {
    let mut context = Context::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid context entry {:?}, expected key=value", arg))?;
        let value = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        context.insert(key.to_string(), value);
    }
    Ok(context)
}
