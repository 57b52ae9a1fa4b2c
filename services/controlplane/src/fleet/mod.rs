//! Read-only fleet state consumed by the validation engine.
//!
//! # Purpose
//! Declares the point-get and list operations the validators run against
//! currently existing clusters, backups, storages, and engines. The gate only
//! ever reads fleet state; mutation happens downstream of admission.
use crate::model::{
    BackupStorage, DatabaseCluster, DatabaseClusterBackup, DatabaseEngine, EngineKind,
};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl FleetError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FleetError::NotFound(_))
    }
}

pub type FleetResult<T> = Result<T, FleetError>;

#[async_trait]
pub trait FleetState: Send + Sync {
    async fn get_cluster(&self, namespace: &str, name: &str) -> FleetResult<DatabaseCluster>;
    async fn list_clusters(&self, namespace: &str) -> FleetResult<Vec<DatabaseCluster>>;

    async fn get_backup(&self, namespace: &str, name: &str) -> FleetResult<DatabaseClusterBackup>;
    /// Backups recorded for one cluster, including completed historical ones.
    async fn list_backups_for_cluster(
        &self,
        namespace: &str,
        cluster: &str,
    ) -> FleetResult<Vec<DatabaseClusterBackup>>;

    async fn get_storage(&self, namespace: &str, name: &str) -> FleetResult<BackupStorage>;
    async fn list_storages(&self, namespace: &str) -> FleetResult<Vec<BackupStorage>>;
    /// Whether any running workload currently references the storage.
    async fn is_storage_in_use(&self, namespace: &str, name: &str) -> FleetResult<bool>;

    async fn get_engine(&self, namespace: &str, kind: EngineKind) -> FleetResult<DatabaseEngine>;

    async fn list_namespaces(&self) -> FleetResult<Vec<String>>;
}
