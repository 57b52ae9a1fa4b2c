//! Cluster restore validation: reference-existence chain and data source.
use crate::model::DatabaseClusterRestore;
use crate::validate::{ValidationError, Validator};

pub(super) async fn validate_restore_create(
    v: &Validator,
    namespace: &str,
    restore: &DatabaseClusterRestore,
) -> Result<(), ValidationError> {
    let backup_name = restore
        .spec
        .data_source
        .db_cluster_backup_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            ValidationError::Structural(
                ".spec.dataSource.dbClusterBackupName cannot be empty".to_string(),
            )
        })?;
    if restore.spec.db_cluster_name.is_empty() {
        return Err(ValidationError::Structural(
            ".spec.dbClusterName cannot be empty".to_string(),
        ));
    }

    // The reference chain must hold end to end: target cluster, source
    // backup, and the storage that backup points at.
    v.get_cluster(namespace, &restore.spec.db_cluster_name)
        .await?;
    let backup = v.get_backup(namespace, backup_name).await?;
    v.get_storage(namespace, &backup.spec.backup_storage_name)
        .await?;

    super::cluster::validate_data_source(&restore.spec.data_source)
}
