//! The admission gate: authorization, then domain validation.
//!
//! # Purpose and responsibility
//! Composes the resource catalog, the policy engine, and the validation
//! engine into the single entry point every mutating or sensitive read must
//! pass before it reaches orchestrated state.
//!
//! # Where it fits
//! The request router (external to this crate) resolves route template,
//! parameters, and verified claims, then calls [`AdmissionGate::admit`].
//!
//! # Key invariants and assumptions
//! - Enforcement and validation stay independently testable services; this
//!   module only composes them.
//! - Exempt operations skip enforcement entirely; mutations always require a
//!   resolved subject because validators compose further permission checks.
use crate::auth::identity::{SubjectClaims, resolve_subject};
use crate::auth::rbac::catalog::ResourceCatalog;
use crate::auth::rbac::enforcer::PolicyEngine;
use crate::error::AdmissionError;
use crate::validate::{ValidationSubject, Validator};
use std::sync::Arc;
use strata_authz::{RESOURCE_NAMESPACES, object_name};

/// One admission request, as resolved by the router.
#[derive(Debug, Clone)]
pub struct AdmissionRequest {
    /// Verified identity claims; absent for anonymous calls.
    pub claims: Option<SubjectClaims>,
    /// Route template of the operation, `:param` form or `{param}` form.
    pub path: String,
    pub method: String,
    /// Resolved path parameters; empty when the route has none.
    pub namespace: String,
    pub name: String,
    /// Payload to validate when the operation mutates state.
    pub mutation: Option<ValidationSubject>,
}

pub struct AdmissionGate {
    catalog: Arc<ResourceCatalog>,
    policy: Arc<PolicyEngine>,
    validator: Validator,
}

impl AdmissionGate {
    pub fn new(catalog: Arc<ResourceCatalog>, policy: Arc<PolicyEngine>, validator: Validator) -> Self {
        Self {
            catalog,
            policy,
            validator,
        }
    }

    /// Run the full gate for one request: catalog resolution, enforcement,
    /// then the object-kind-specific ruleset for mutations.
    ///
    /// # Errors
    /// - `UnknownOperation` for paths the catalog has never seen.
    /// - `AuthenticationMissing` when a guarded operation has no claims.
    /// - `AuthorizationDenied` on a policy deny, always generic.
    /// - `Validation` for every domain-rule rejection.
    pub async fn admit(&self, request: &AdmissionRequest) -> Result<(), AdmissionError> {
        let subject = request.claims.as_ref().map(resolve_subject);

        if !self.catalog.is_exempt(&request.path) {
            let Some((resource, action)) = self.catalog.resolve(&request.path, &request.method)
            else {
                return Err(AdmissionError::UnknownOperation {
                    method: request.method.clone(),
                    path: request.path.clone(),
                });
            };
            let subject = subject
                .as_deref()
                .ok_or(AdmissionError::AuthenticationMissing)?;
            let object = if resource == RESOURCE_NAMESPACES {
                request.name.clone()
            } else {
                object_name(&[&request.namespace, &request.name])
            };
            if !self.policy.enforce(subject, resource, action, &object)? {
                metrics::counter!("strata_admissions_total", "result" => "denied").increment(1);
                return Err(AdmissionError::AuthorizationDenied);
            }
        }

        if let Some(mutation) = &request.mutation {
            let subject = subject
                .as_deref()
                .ok_or(AdmissionError::AuthenticationMissing)?;
            if let Err(err) = self.validator.validate(subject, mutation).await {
                metrics::counter!("strata_admissions_total", "result" => "rejected").increment(1);
                return Err(err.into());
            }
        }

        metrics::counter!("strata_admissions_total", "result" => "allowed").increment(1);
        Ok(())
    }
}
