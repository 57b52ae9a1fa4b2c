//! Subject resolution for enforcement queries.
//!
//! # Purpose
//! Token decoding happens outside this crate; callers hand the gate the
//! already-verified claims. This module normalizes those claims into the
//! stable subject string used in policy rules.
use serde::{Deserialize, Serialize};

/// Issuer set by the built-in session manager. Session subjects are of the
/// form `user:session-id`; only the user part participates in policy.
pub const SESSION_ISSUER: &str = "strata-session-manager";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectClaims {
    pub subject: String,
    pub issuer: String,
}

impl SubjectClaims {
    pub fn new(subject: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            issuer: issuer.into(),
        }
    }
}

/// Resolve the policy subject from verified claims.
pub fn resolve_subject(claims: &SubjectClaims) -> String {
    if claims.issuer == SESSION_ISSUER {
        claims
            .subject
            .split(':')
            .next()
            .unwrap_or(claims.subject.as_str())
            .to_string()
    } else {
        claims.subject.clone()
    }
}
