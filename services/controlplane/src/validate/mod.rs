//! Domain validation engine.
//!
//! # Purpose and responsibility
//! Runs the object-kind-specific business rules before a create or update
//! reaches orchestrated state. Validators may issue enforcement queries
//! mid-validation and read current fleet state, but never mutate anything.
//!
//! # Where it fits
//! The admission gate dispatches here after authorization succeeded. Each
//! object kind has an independent validator selected through a single
//! dispatch table; create and update run different rule subsets.
//!
//! # Key invariants and assumptions
//! - Validators hold the fleet, the policy engine, and the probe behind
//!   trait objects; no validator reaches into another component's internals.
//! - Not-found results from fleet lookups are translated into kind-specific
//!   validation errors; other fleet failures pass through for retry.
use crate::auth::rbac::enforcer::PolicyEngine;
use crate::fleet::{FleetError, FleetState};
use crate::model::{
    BackupStorage, CreateBackupStorageRequest, CreateMonitoringRequest, DatabaseCluster,
    DatabaseClusterBackup, DatabaseClusterRestore, DatabaseEngine, EngineKind,
    UpdateBackupStorageRequest, UpdateMonitoringRequest,
};
use crate::probe::{ProbeFailure, StorageProbe};
use std::sync::Arc;
use strata_authz::{Action, AuthzError};
use thiserror::Error;

mod backup;
mod cluster;
mod common;
mod monitoring;
mod quantity;
mod restore;
mod storage;

pub use quantity::Quantity;

#[derive(Debug, Error)]
pub enum ValidationError {
    /// Missing or malformed field.
    #[error("{0}")]
    Structural(String),
    /// A named business constraint was violated.
    #[error("{0}")]
    BusinessRule(String),
    #[error("{kind} {name} does not exist")]
    NotFound { kind: &'static str, name: String },
    #[error("can't edit bucket or region of the {kind} '{name}' while it is in use")]
    InUse { kind: &'static str, name: String },
    #[error("{kind} with the same region, bucket and url already exists")]
    Duplicate { kind: &'static str },
    #[error("insufficient permissions for performing the operation")]
    InsufficientPermissions,
    #[error(transparent)]
    Probe(#[from] ProbeFailure),
    #[error("authorization query failed: {0}")]
    Authz(#[from] AuthzError),
    /// External failure other than not-found; propagates for upstream retry.
    #[error(transparent)]
    Fleet(FleetError),
}

/// The object kind under validation, tagged with everything the validator
/// needs. One variant per validator.
#[derive(Debug, Clone)]
pub enum ValidationSubject {
    ClusterCreate {
        namespace: String,
        cluster: DatabaseCluster,
    },
    ClusterUpdate {
        namespace: String,
        cluster: DatabaseCluster,
    },
    StorageCreate {
        namespace: String,
        request: CreateBackupStorageRequest,
    },
    StorageUpdate {
        namespace: String,
        name: String,
        request: UpdateBackupStorageRequest,
    },
    MonitoringCreate {
        request: CreateMonitoringRequest,
    },
    MonitoringUpdate {
        request: UpdateMonitoringRequest,
    },
    BackupCreate {
        namespace: String,
        backup: DatabaseClusterBackup,
    },
    RestoreCreate {
        namespace: String,
        restore: DatabaseClusterRestore,
    },
}

pub struct Validator {
    fleet: Arc<dyn FleetState>,
    policy: Arc<PolicyEngine>,
    probe: Arc<dyn StorageProbe>,
}

impl Validator {
    pub fn new(
        fleet: Arc<dyn FleetState>,
        policy: Arc<PolicyEngine>,
        probe: Arc<dyn StorageProbe>,
    ) -> Self {
        Self {
            fleet,
            policy,
            probe,
        }
    }

    /// Dispatch to the kind-specific validator.
    pub async fn validate(
        &self,
        user: &str,
        subject: &ValidationSubject,
    ) -> Result<(), ValidationError> {
        match subject {
            ValidationSubject::ClusterCreate { namespace, cluster } => {
                cluster::validate_cluster_create(self, user, namespace, cluster).await
            }
            ValidationSubject::ClusterUpdate { namespace, cluster } => {
                cluster::validate_cluster_update(self, user, namespace, cluster).await
            }
            ValidationSubject::StorageCreate { namespace, request } => {
                storage::validate_storage_create(self, namespace, request).await
            }
            ValidationSubject::StorageUpdate {
                namespace,
                name,
                request,
            } => storage::validate_storage_update(self, namespace, name, request).await,
            ValidationSubject::MonitoringCreate { request } => {
                monitoring::validate_monitoring_create(request)
            }
            ValidationSubject::MonitoringUpdate { request } => {
                monitoring::validate_monitoring_update(request)
            }
            ValidationSubject::BackupCreate { namespace, backup } => {
                backup::validate_backup_create(self, namespace, backup).await
            }
            ValidationSubject::RestoreCreate { namespace, restore } => {
                restore::validate_restore_create(self, namespace, restore).await
            }
        }
    }

    /// Mid-validation enforcement query; a deny surfaces as the generic
    /// insufficient-permissions rule.
    pub(crate) fn require(
        &self,
        user: &str,
        resource: &str,
        action: Action,
        object: &str,
    ) -> Result<(), ValidationError> {
        if self.policy.enforce(user, resource, action, object)? {
            Ok(())
        } else {
            Err(ValidationError::InsufficientPermissions)
        }
    }

    pub(crate) async fn get_cluster(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<DatabaseCluster, ValidationError> {
        self.fleet
            .get_cluster(namespace, name)
            .await
            .map_err(|err| named_not_found(err, "database cluster", name))
    }

    pub(crate) async fn get_backup(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<DatabaseClusterBackup, ValidationError> {
        self.fleet
            .get_backup(namespace, name)
            .await
            .map_err(|err| named_not_found(err, "backup", name))
    }

    pub(crate) async fn get_storage(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BackupStorage, ValidationError> {
        self.fleet
            .get_storage(namespace, name)
            .await
            .map_err(|err| named_not_found(err, "backup storage", name))
    }

    pub(crate) async fn get_engine(
        &self,
        namespace: &str,
        kind: EngineKind,
    ) -> Result<DatabaseEngine, ValidationError> {
        self.fleet
            .get_engine(namespace, kind)
            .await
            .map_err(|err| named_not_found(err, "database engine", kind.as_str()))
    }

    pub(crate) fn fleet(&self) -> &dyn FleetState {
        self.fleet.as_ref()
    }

    pub(crate) fn probe(&self) -> &dyn StorageProbe {
        self.probe.as_ref()
    }
}

/// Translate a fleet not-found into the kind-specific validation error; all
/// other fleet failures pass through unmodified.
fn named_not_found(err: FleetError, kind: &'static str, name: &str) -> ValidationError {
    if err.is_not_found() {
        ValidationError::NotFound {
            kind,
            name: name.to_string(),
        }
    } else {
        ValidationError::Fleet(err)
    }
}

pub(crate) fn fleet_failure(err: FleetError) -> ValidationError {
    ValidationError::Fleet(err)
}
