//! RBAC module wiring.
//!
//! # Purpose
//! Exposes the resource catalog, the policy engine with live reload, the
//! permission enumeration helpers, and the read-only policy source adapters.
pub mod catalog;
pub mod enforcer;
pub mod permissions;
pub mod source;
