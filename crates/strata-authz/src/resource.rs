//! Resource-kind constants and object-scope builders.
//!
//! # Purpose
//! Provides the canonical names of protected resource kinds and helpers to
//! build the `namespace/name` object scopes used in enforcement queries.
//!
//! # Key invariants
//! - Resource kinds are stable, kebab-case collection names.
//! - Object scopes join segments with `/`; the namespaces kind has no owning
//!   namespace and therefore uses a single-level scope.

pub const RESOURCE_BACKUP_STORAGES: &str = "backup-storages";
pub const RESOURCE_DATABASE_CLUSTERS: &str = "database-clusters";
pub const RESOURCE_DATABASE_CLUSTER_BACKUPS: &str = "database-cluster-backups";
pub const RESOURCE_DATABASE_CLUSTER_CREDENTIALS: &str = "database-cluster-credentials";
pub const RESOURCE_DATABASE_CLUSTER_RESTORES: &str = "database-cluster-restores";
pub const RESOURCE_DATABASE_ENGINES: &str = "database-engines";
pub const RESOURCE_MONITORING_INSTANCES: &str = "monitoring-instances";
pub const RESOURCE_NAMESPACES: &str = "namespaces";

/// Prefix that distinguishes role identifiers from plain subjects.
pub const ROLE_PREFIX: &str = "role:";

/// The synthesized administrator role, granted `*` over every catalog kind.
pub const ADMIN_ROLE: &str = "role:admin";

/// Build an object scope from its segments.
///
/// `object_name(&["default", "db1"])` yields `default/db1`; a single segment
/// stays single-level, which is what the namespaces kind expects.
pub fn object_name(parts: &[&str]) -> String {
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_name_joins_segments() {
        assert_eq!(object_name(&["default", "db1"]), "default/db1");
        assert_eq!(object_name(&["default", ""]), "default/");
        assert_eq!(object_name(&["kube-system"]), "kube-system");
    }
}
