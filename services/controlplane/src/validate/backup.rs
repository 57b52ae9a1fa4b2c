//! Cluster backup validation.
use crate::model::{DatabaseClusterBackup, EngineKind};
use crate::validate::cluster::validate_pg_storage_limit;
use crate::validate::{ValidationError, Validator};

pub(super) async fn validate_backup_create(
    v: &Validator,
    namespace: &str,
    backup: &DatabaseClusterBackup,
) -> Result<(), ValidationError> {
    if backup.spec.backup_storage_name.is_empty() {
        return Err(ValidationError::Structural(
            ".spec.backupStorageName cannot be empty".to_string(),
        ));
    }
    if backup.spec.db_cluster_name.is_empty() {
        return Err(ValidationError::Structural(
            ".spec.dbClusterName cannot be empty".to_string(),
        ));
    }

    let cluster = v.get_cluster(namespace, &backup.spec.db_cluster_name).await?;

    if cluster.spec.engine.kind == EngineKind::Postgresql {
        // The storage ceiling counts the backup being validated too.
        validate_pg_storage_limit(v, namespace, &cluster, Some(backup)).await?;
    }

    if cluster.spec.engine.kind == EngineKind::Mongodb {
        let active = cluster
            .status
            .as_ref()
            .and_then(|status| status.active_storage.as_deref())
            .filter(|name| !name.is_empty());
        if let Some(active) = active
            && active != backup.spec.backup_storage_name
        {
            return Err(ValidationError::BusinessRule(
                "can't change the active storage for mongodb clusters".to_string(),
            ));
        }
    }
    Ok(())
}
