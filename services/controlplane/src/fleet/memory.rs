//! In-memory implementation of the fleet-state interface.
//!
//! # Purpose
//! Backs local development and tests with `HashMap`s guarded by
//! `tokio::sync::RwLock`. Not durable; state is lost on restart. Reads are
//! concurrent, writes are serialized per map.
use super::{FleetError, FleetResult, FleetState};
use crate::model::{
    BackupStorage, DatabaseCluster, DatabaseClusterBackup, DatabaseEngine, EngineKind,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type NamespacedKey = (String, String);

#[derive(Default)]
pub struct InMemoryFleet {
    clusters: Arc<RwLock<HashMap<NamespacedKey, DatabaseCluster>>>,
    backups: Arc<RwLock<HashMap<NamespacedKey, DatabaseClusterBackup>>>,
    storages: Arc<RwLock<HashMap<NamespacedKey, BackupStorage>>>,
    engines: Arc<RwLock<HashMap<(String, EngineKind), DatabaseEngine>>>,
}

impl InMemoryFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_cluster(&self, cluster: DatabaseCluster) {
        let key = (
            cluster.metadata.namespace.clone(),
            cluster.metadata.name.clone(),
        );
        self.clusters.write().await.insert(key, cluster);
    }

    pub async fn insert_backup(&self, backup: DatabaseClusterBackup) {
        let key = (
            backup.metadata.namespace.clone(),
            backup.metadata.name.clone(),
        );
        self.backups.write().await.insert(key, backup);
    }

    pub async fn insert_storage(&self, storage: BackupStorage) {
        let key = (
            storage.metadata.namespace.clone(),
            storage.metadata.name.clone(),
        );
        self.storages.write().await.insert(key, storage);
    }

    pub async fn insert_engine(&self, namespace: &str, engine: DatabaseEngine) {
        self.engines
            .write()
            .await
            .insert((namespace.to_string(), engine.kind), engine);
    }
}

#[async_trait]
impl FleetState for InMemoryFleet {
    async fn get_cluster(&self, namespace: &str, name: &str) -> FleetResult<DatabaseCluster> {
        self.clusters
            .read()
            .await
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| FleetError::NotFound("database cluster".into()))
    }

    async fn list_clusters(&self, namespace: &str) -> FleetResult<Vec<DatabaseCluster>> {
        Ok(self
            .clusters
            .read()
            .await
            .values()
            .filter(|cluster| cluster.metadata.namespace == namespace)
            .cloned()
            .collect())
    }

    async fn get_backup(&self, namespace: &str, name: &str) -> FleetResult<DatabaseClusterBackup> {
        self.backups
            .read()
            .await
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| FleetError::NotFound("database cluster backup".into()))
    }

    async fn list_backups_for_cluster(
        &self,
        namespace: &str,
        cluster: &str,
    ) -> FleetResult<Vec<DatabaseClusterBackup>> {
        Ok(self
            .backups
            .read()
            .await
            .values()
            .filter(|backup| {
                backup.metadata.namespace == namespace && backup.spec.db_cluster_name == cluster
            })
            .cloned()
            .collect())
    }

    async fn get_storage(&self, namespace: &str, name: &str) -> FleetResult<BackupStorage> {
        self.storages
            .read()
            .await
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| FleetError::NotFound("backup storage".into()))
    }

    async fn list_storages(&self, namespace: &str) -> FleetResult<Vec<BackupStorage>> {
        Ok(self
            .storages
            .read()
            .await
            .values()
            .filter(|storage| storage.metadata.namespace == namespace)
            .cloned()
            .collect())
    }

    async fn is_storage_in_use(&self, namespace: &str, name: &str) -> FleetResult<bool> {
        let clusters = self.clusters.read().await;
        let referenced_by_cluster = clusters.values().any(|cluster| {
            if cluster.metadata.namespace != namespace {
                return false;
            }
            let in_schedules = cluster
                .schedules()
                .iter()
                .any(|schedule| schedule.backup_storage_name == name);
            let in_pitr = cluster
                .spec
                .backup
                .as_ref()
                .and_then(|backup| backup.pitr.as_ref())
                .and_then(|pitr| pitr.backup_storage_name.as_deref())
                == Some(name);
            in_schedules || in_pitr
        });
        if referenced_by_cluster {
            return Ok(true);
        }

        let backups = self.backups.read().await;
        Ok(backups.values().any(|backup| {
            backup.metadata.namespace == namespace && backup.spec.backup_storage_name == name
        }))
    }

    async fn get_engine(&self, namespace: &str, kind: EngineKind) -> FleetResult<DatabaseEngine> {
        self.engines
            .read()
            .await
            .get(&(namespace.to_string(), kind))
            .cloned()
            .ok_or_else(|| FleetError::NotFound("database engine".into()))
    }

    async fn list_namespaces(&self) -> FleetResult<Vec<String>> {
        let mut namespaces: Vec<String> = self
            .clusters
            .read()
            .await
            .keys()
            .map(|(namespace, _)| namespace.clone())
            .collect();
        namespaces.sort();
        namespaces.dedup();
        Ok(namespaces)
    }
}
