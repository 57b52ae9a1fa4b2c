//! Control-plane admission gate library crate.
//!
//! # Purpose
//! Exposes the two halves of the admission gate, RBAC enforcement over a
//! live-reloading policy snapshot and per-kind domain validation, together
//! with the collaborator interfaces they consume (fleet state, identity
//! resolution, storage reachability probe).
//!
//! # Notes
//! Request routing, CRUD plumbing, and token decoding live outside this
//! crate; module boundaries mirror the admission flow for clarity.
pub mod admission;
pub mod auth;
pub mod config;
pub mod error;
pub mod fleet;
pub mod model;
pub mod observability;
pub mod probe;
pub mod validate;
