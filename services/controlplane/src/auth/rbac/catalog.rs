//! Resource catalog derived from the API description.
//!
//! # Purpose
//! At startup, walks the declarative description of every API operation and
//! derives the table mapping operation paths to protected resource kinds plus
//! the list of operations exempt from enforcement. The catalog is built once
//! and never changes.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use strata_authz::Action;

// Embed the API description so deployments don't need a separate file.
const API_DESCRIPTION: &str = include_str!("api.yaml");

#[derive(Debug, Deserialize)]
struct ApiDescription {
    paths: BTreeMap<String, BTreeMap<String, OperationDescription>>,
}

#[derive(Debug, Default, Deserialize)]
struct OperationDescription {
    #[serde(rename = "x-resource-kind")]
    resource_kind: Option<String>,
}

/// Immutable table of protected operations.
#[derive(Debug)]
pub struct ResourceCatalog {
    path_kinds: HashMap<String, String>,
    exempt: BTreeSet<String>,
    kinds: BTreeSet<String>,
}

impl ResourceCatalog {
    pub fn from_embedded() -> Result<Self> {
        Self::from_yaml(API_DESCRIPTION)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let description: ApiDescription =
            serde_yaml::from_str(raw).with_context(|| "parse API description")?;

        let mut path_kinds = HashMap::new();
        let mut exempt = BTreeSet::new();
        let mut kinds = BTreeSet::new();
        for (path, operations) in description.paths {
            let path = normalize_path(&path);
            let mut tagged = false;
            for (method, operation) in operations {
                match operation.resource_kind {
                    Some(kind) => {
                        tagged = true;
                        kinds.insert(kind.clone());
                        // One path may only guard one resource kind.
                        if let Some(existing) = path_kinds.insert(path.clone(), kind.clone()) {
                            anyhow::ensure!(
                                existing == kind,
                                "path {path} is tagged with both {existing} and {kind}"
                            );
                        }
                    }
                    None => {
                        anyhow::ensure!(
                            action_for_method(&method).is_some(),
                            "unknown method {method} on {path}"
                        );
                    }
                }
            }
            if !tagged {
                exempt.insert(path);
            }
        }

        Ok(Self {
            path_kinds,
            exempt,
            kinds,
        })
    }

    /// Resolve an operation to its protected resource kind and action.
    /// Returns `None` for unknown paths or methods.
    pub fn resolve(&self, path: &str, method: &str) -> Option<(&str, Action)> {
        let kind = self.path_kinds.get(&normalize_path(path))?;
        let action = action_for_method(method)?;
        Some((kind.as_str(), action))
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt.contains(&normalize_path(path))
    }

    /// Every resource kind known to the API; drives admin-policy synthesis
    /// and policy well-formedness checks.
    pub fn resource_kinds(&self) -> &BTreeSet<String> {
        &self.kinds
    }
}

/// Replace `{param}` placeholders with `:param` so catalog keys match the
/// router's normalized form.
fn normalize_path(path: &str) -> String {
    path.replace('{', ":").replace('}', "")
}

fn action_for_method(method: &str) -> Option<Action> {
    match method.to_ascii_lowercase().as_str() {
        "get" => Some(Action::Read),
        "post" => Some(Action::Create),
        "put" | "patch" => Some(Action::Update),
        "delete" => Some(Action::Delete),
        _ => None,
    }
}
