//! Strata authorization primitives shared across control-plane services.
//!
//! # Purpose
//! Centralizes the authorization vocabulary (actions, resource kinds, object
//! scopes), the policy document format, and the Casbin model used by the
//! admission gate.
//!
//! # How it fits
//! The control-plane service parses policy documents with this crate, builds
//! its enforcer from the embedded model, and issues enforcement queries using
//! the shared action/resource constants.
//!
//! # Key invariants
//! - Policy rules are `(subject-or-role, resource, action, object)` tuples.
//! - Object scopes are two-level `namespace/name` paths; `*` means "any" at
//!   either level. The namespaces kind uses a single-level scope.
//! - Role identifiers carry the `role:` prefix.
//!
//! # Common pitfalls
//! - Building an enforcer from an unvalidated document allows malformed
//!   rules into the decision path; always run `validate_document` first.

mod action;
mod casbin_model;
mod errors;
mod policy;
mod resource;

pub use action::Action;
pub use casbin_model::{casbin_model, casbin_model_string};
pub use errors::{AuthzError, AuthzResult};
pub use policy::{PolicyDocument, PolicyRule, RoleBinding, validate_document};
pub use resource::{
    ADMIN_ROLE, RESOURCE_BACKUP_STORAGES, RESOURCE_DATABASE_CLUSTER_BACKUPS,
    RESOURCE_DATABASE_CLUSTER_CREDENTIALS, RESOURCE_DATABASE_CLUSTER_RESTORES,
    RESOURCE_DATABASE_CLUSTERS, RESOURCE_DATABASE_ENGINES, RESOURCE_MONITORING_INSTANCES,
    RESOURCE_NAMESPACES, ROLE_PREFIX, object_name,
};
