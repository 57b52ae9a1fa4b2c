//! Cluster backup and restore records.
use crate::model::cluster::{DataSource, Metadata};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseClusterBackup {
    pub metadata: Metadata,
    pub spec: ClusterBackupSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterBackupSpec {
    #[serde(default)]
    pub db_cluster_name: String,
    #[serde(default)]
    pub backup_storage_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseClusterRestore {
    pub metadata: Metadata,
    pub spec: ClusterRestoreSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRestoreSpec {
    #[serde(default)]
    pub db_cluster_name: String,
    pub data_source: DataSource,
}
