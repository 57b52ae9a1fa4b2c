//! Policy document format: record shapes, parser, and well-formedness checks.
//!
//! # Purpose
//! Defines the line-oriented rule notation consumed from the external policy
//! source and the validation run before a document may be published.
//!
//! # Format
//! - `p, <subject-or-role>, <resource>, <action>, <object>` for policy rules
//! - `g, <user>, <role>` for role bindings
//! - `enabled = true|false` sets the enforcement flag (defaults to true)
//! - blank lines and `#` comments are ignored
use crate::action::{ACTION_ANY, Action};
use crate::errors::AuthzError;
use crate::resource::{RESOURCE_NAMESPACES, ROLE_PREFIX};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyRule {
    pub subject: String,
    pub resource: String,
    pub action: String,
    pub object: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub user: String,
    pub role: String,
}

/// A parsed policy document together with its enforcement flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDocument {
    pub rules: Vec<PolicyRule>,
    pub bindings: Vec<RoleBinding>,
    pub enabled: bool,
}

impl PolicyDocument {
    /// Parse the line-oriented rule notation.
    ///
    /// # Errors
    /// - `AuthzError::PolicyMalformed` on unknown line markers or wrong
    ///   field counts. Field-level checks happen in [`validate_document`].
    pub fn parse(raw: &str) -> Result<Self, AuthzError> {
        let mut rules = Vec::new();
        let mut bindings = Vec::new();
        let mut enabled = true;

        for (lineno, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(value) = line.strip_prefix("enabled") {
                let value = value.trim_start().strip_prefix('=').map(str::trim);
                enabled = match value {
                    Some("true") => true,
                    Some("false") => false,
                    _ => {
                        return Err(malformed(lineno, "enabled directive must be true or false"));
                    }
                };
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            match fields.first().copied() {
                Some("p") => {
                    if fields.len() != 5 {
                        return Err(malformed(lineno, "policy rule must have 4 fields"));
                    }
                    rules.push(PolicyRule {
                        subject: fields[1].to_string(),
                        resource: fields[2].to_string(),
                        action: fields[3].to_string(),
                        object: fields[4].to_string(),
                    });
                }
                Some("g") => {
                    if fields.len() != 3 {
                        return Err(malformed(lineno, "role binding must have 2 fields"));
                    }
                    bindings.push(RoleBinding {
                        user: fields[1].to_string(),
                        role: fields[2].to_string(),
                    });
                }
                _ => return Err(malformed(lineno, "unknown rule marker")),
            }
        }

        Ok(Self {
            rules,
            bindings,
            enabled,
        })
    }
}

fn malformed(lineno: usize, message: &str) -> AuthzError {
    AuthzError::PolicyMalformed(format!("line {}: {message}", lineno + 1))
}

/// Check a parsed document for self-consistency against the known resource
/// kinds. A document that fails here must never be published.
pub fn validate_document(
    doc: &PolicyDocument,
    known_resources: &BTreeSet<String>,
) -> Result<(), AuthzError> {
    for rule in &doc.rules {
        if rule.subject.is_empty() {
            return Err(rule_error(rule, "subject must not be empty"));
        }
        if rule.resource != "*" && !known_resources.contains(&rule.resource) {
            return Err(rule_error(rule, "unknown resource kind"));
        }
        if rule.action != ACTION_ANY && rule.action.parse::<Action>().is_err() {
            return Err(rule_error(rule, "unknown action"));
        }
        validate_object_scope(rule)?;
    }

    for binding in &doc.bindings {
        if binding.user.is_empty() {
            return Err(AuthzError::PolicyMalformed(
                "role binding user must not be empty".to_string(),
            ));
        }
        if !binding.role.starts_with(ROLE_PREFIX) {
            return Err(AuthzError::PolicyMalformed(format!(
                "role '{}' must carry the '{ROLE_PREFIX}' prefix",
                binding.role
            )));
        }
    }

    Ok(())
}

fn validate_object_scope(rule: &PolicyRule) -> Result<(), AuthzError> {
    if rule.object.is_empty() {
        return Err(rule_error(rule, "object scope must not be empty"));
    }
    let segments: Vec<&str> = rule.object.split('/').collect();
    if rule.resource == RESOURCE_NAMESPACES {
        if segments.len() != 1 {
            return Err(rule_error(rule, "namespaces scope is single-level"));
        }
    } else if segments.len() > 2 {
        return Err(rule_error(rule, "object scope has at most two levels"));
    }
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(rule_error(rule, "object scope segments must not be empty"));
    }
    Ok(())
}

fn rule_error(rule: &PolicyRule, message: &str) -> AuthzError {
    AuthzError::PolicyMalformed(format!(
        "rule [{}, {}, {}, {}]: {message}",
        rule.subject, rule.resource, rule.action, rule.object
    ))
}
