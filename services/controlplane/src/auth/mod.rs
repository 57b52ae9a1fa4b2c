//! Authentication and authorization surfaces of the admission gate.
pub mod identity;
pub mod rbac;
