//! Declarative record types consumed by the admission gate.
//!
//! # Purpose
//! Mirrors the API payloads and orchestrated-resource shapes the validators
//! inspect. These records are transient: constructed per request, discarded
//! after accept/reject.
mod backup;
mod cluster;
mod engine;
mod monitoring;
mod storage;

pub use backup::{ClusterBackupSpec, ClusterRestoreSpec, DatabaseClusterBackup, DatabaseClusterRestore};
pub use cluster::{
    BackupConfig, BackupSchedule, BackupSource, ClusterSpec, ClusterStatus, ConfigServerSpec,
    DataSource, DatabaseCluster, EngineResources, EngineSpec, EngineStorage, Metadata,
    PitrRestore, PitrSpec, ProxySpec, ResourceQuantity, ShardingSpec,
};
pub use engine::{DatabaseEngine, EngineKind, ProxyKind};
pub use monitoring::{CreateMonitoringRequest, MonitoringKind, PmmAuth, UpdateMonitoringRequest};
pub use storage::{
    BackupStorage, BackupStorageSpec, CreateBackupStorageRequest, StorageKind,
    UpdateBackupStorageRequest,
};
