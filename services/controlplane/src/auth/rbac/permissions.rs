//! Effective-permission enumeration.
//!
//! # Purpose
//! Computes the rule set applicable to a subject from the active snapshot.
//! Rules keyed by a role the subject holds are rewritten so the subject sees
//! permissions attributed to itself rather than to an opaque role name.
use casbin::{Enforcer, RbacApi};
use std::collections::BTreeSet;
use strata_authz::{PolicyRule, RoleBinding};

/// Result of a "what can I do" query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permissions {
    /// Enforcement is globally disabled; no rule list is exposed.
    Disabled,
    Enabled(Vec<PolicyRule>),
}

pub(crate) fn effective_permissions(
    enforcer: &Enforcer,
    bindings: &[RoleBinding],
    subject: &str,
) -> Vec<PolicyRule> {
    let rules: Vec<Vec<String>> = enforcer.get_implicit_permissions_for_user(subject, None);

    let roles: BTreeSet<&str> = bindings
        .iter()
        .filter(|binding| binding.user == subject)
        .map(|binding| binding.role.as_str())
        .collect();

    let mut permissions: Vec<PolicyRule> = rules
        .into_iter()
        .filter(|rule| rule.len() >= 4)
        .map(|rule| {
            let owner = if roles.contains(rule[0].as_str()) {
                subject.to_string()
            } else {
                rule[0].clone()
            };
            PolicyRule {
                subject: owner,
                resource: rule[1].clone(),
                action: rule[2].clone(),
                object: rule[3].clone(),
            }
        })
        .collect();
    permissions.sort();
    permissions.dedup();
    permissions
}
