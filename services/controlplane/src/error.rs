//! Admission error taxonomy.
//!
//! # Purpose
//! The outward-facing error kinds of the gate. Authorization denials stay
//! generic: the caller never learns which rule was missing.
use crate::validate::ValidationError;
use strata_authz::AuthzError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("authentication missing")]
    AuthenticationMissing,
    #[error("permission denied")]
    AuthorizationDenied,
    #[error("unknown API operation: {method} {path}")]
    UnknownOperation { method: String, path: String },
    #[error(transparent)]
    Evaluation(#[from] AuthzError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
