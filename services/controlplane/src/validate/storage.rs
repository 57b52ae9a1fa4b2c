//! Backup storage validation: duplicate detection, in-use guard, and the
//! reachability probe round trip.
use crate::model::{
    BackupStorage, CreateBackupStorageRequest, StorageKind, UpdateBackupStorageRequest,
};
use crate::probe::{StorageAccess, check_with_timeout};
use crate::validate::common::{validate_bucket_name, validate_name_label, validate_url_field};
use crate::validate::{ValidationError, Validator, fleet_failure};

pub(super) async fn validate_storage_create(
    v: &Validator,
    namespace: &str,
    request: &CreateBackupStorageRequest,
) -> Result<(), ValidationError> {
    let existing = v
        .fleet()
        .list_storages(namespace)
        .await
        .map_err(fleet_failure)?;
    let url = request.url.as_deref().unwrap_or("");
    for storage in &existing {
        if storage.spec.region == request.region
            && storage.spec.endpoint_url == url
            && storage.spec.bucket == request.bucket_name
        {
            return Err(ValidationError::Duplicate {
                kind: "backup storage",
            });
        }
    }

    validate_name_label(&request.name, "name")?;
    validate_bucket_name(&request.bucket_name)?;
    if let Some(url) = &request.url {
        validate_url_field(url, "url")?;
    }
    if request.kind == StorageKind::S3 && request.region.is_empty() {
        return Err(ValidationError::Structural(
            "region is required when using the s3 storage type".to_string(),
        ));
    }

    let access = StorageAccess {
        endpoint: request.url.clone().filter(|url| !url.is_empty()),
        bucket: request.bucket_name.clone(),
        region: request.region.clone(),
        access_key: request.access_key.clone(),
        secret_key: request.secret_key.clone(),
        verify_tls: request.verify_tls.unwrap_or(true),
        force_path_style: request.force_path_style.unwrap_or(false),
    };
    check_with_timeout(v.probe(), &access).await?;
    Ok(())
}

pub(super) async fn validate_storage_update(
    v: &Validator,
    namespace: &str,
    name: &str,
    request: &UpdateBackupStorageRequest,
) -> Result<(), ValidationError> {
    let storage = v.get_storage(namespace, name).await?;

    // The in-use guard is independent of duplicate detection: workloads
    // reference a storage by bucket and region, so those fields are frozen
    // while anything runs against it.
    let used = v
        .fleet()
        .is_storage_in_use(namespace, name)
        .await
        .map_err(fleet_failure)?;
    if used && basic_params_changed(&storage, request) {
        return Err(ValidationError::InUse {
            kind: "backup storage",
            name: name.to_string(),
        });
    }

    let existing = v
        .fleet()
        .list_storages(namespace)
        .await
        .map_err(fleet_failure)?;
    if is_duplicate_after_update(&storage, &existing, request) {
        return Err(ValidationError::Duplicate {
            kind: "backup storage",
        });
    }

    if let Some(url) = &request.url {
        validate_url_field(url, "url")?;
    }
    if let Some(bucket) = &request.bucket_name {
        validate_bucket_name(bucket)?;
    }
    if storage.spec.kind == StorageKind::S3 && request.region_or(&storage.spec.region).is_empty() {
        return Err(ValidationError::Structural(
            "region is required when using the s3 storage type".to_string(),
        ));
    }

    let endpoint = request.url_or(&storage.spec.endpoint_url);
    let access = StorageAccess {
        endpoint: (!endpoint.is_empty()).then(|| endpoint.to_string()),
        bucket: request.bucket_or(&storage.spec.bucket).to_string(),
        region: request.region_or(&storage.spec.region).to_string(),
        access_key: request.access_key.clone().unwrap_or_default(),
        secret_key: request.secret_key.clone().unwrap_or_default(),
        verify_tls: request
            .verify_tls
            .or(storage.spec.verify_tls)
            .unwrap_or(true),
        force_path_style: request
            .force_path_style
            .or(storage.spec.force_path_style)
            .unwrap_or(false),
    };
    check_with_timeout(v.probe(), &access).await?;
    Ok(())
}

fn basic_params_changed(storage: &BackupStorage, request: &UpdateBackupStorageRequest) -> bool {
    if let Some(bucket) = &request.bucket_name
        && *bucket != storage.spec.bucket
    {
        return true;
    }
    if let Some(region) = &request.region
        && *region != storage.spec.region
    {
        return true;
    }
    false
}

/// Compare the post-update `(region, bucket, endpoint)` triple against every
/// *other* existing storage.
fn is_duplicate_after_update(
    storage: &BackupStorage,
    existing: &[BackupStorage],
    request: &UpdateBackupStorageRequest,
) -> bool {
    let region = request.region_or(&storage.spec.region);
    let bucket = request.bucket_or(&storage.spec.bucket);
    let endpoint = request.url_or(&storage.spec.endpoint_url);

    existing
        .iter()
        .filter(|other| other.metadata.name != storage.metadata.name)
        .any(|other| {
            other.spec.region == region
                && other.spec.bucket == bucket
                && other.spec.endpoint_url == endpoint
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BackupStorageSpec, Metadata};

    fn storage(name: &str, region: &str, bucket: &str, endpoint: &str) -> BackupStorage {
        BackupStorage {
            metadata: Metadata {
                name: name.to_string(),
                namespace: "default".to_string(),
                resource_version: None,
            },
            spec: BackupStorageSpec {
                kind: StorageKind::S3,
                bucket: bucket.to_string(),
                region: region.to_string(),
                endpoint_url: endpoint.to_string(),
                verify_tls: None,
                force_path_style: None,
            },
        }
    }

    #[test]
    fn basic_params_changed_detects_bucket_and_region_edits() {
        let current = storage("s1", "us-east-1", "bucket-a", "https://s3.local");

        let unchanged = UpdateBackupStorageRequest::default();
        assert!(!basic_params_changed(&current, &unchanged));

        let same_values = UpdateBackupStorageRequest {
            bucket_name: Some("bucket-a".to_string()),
            region: Some("us-east-1".to_string()),
            ..Default::default()
        };
        assert!(!basic_params_changed(&current, &same_values));

        let new_bucket = UpdateBackupStorageRequest {
            bucket_name: Some("bucket-b".to_string()),
            ..Default::default()
        };
        assert!(basic_params_changed(&current, &new_bucket));
    }

    #[test]
    fn duplicate_after_update_ignores_self() {
        let current = storage("s1", "us-east-1", "bucket-a", "https://s3.local");
        let existing = vec![
            storage("s1", "us-east-1", "bucket-a", "https://s3.local"),
            storage("s2", "us-east-1", "bucket-b", "https://s3.local"),
        ];

        // Unchanged triple matches only itself.
        assert!(!is_duplicate_after_update(
            &current,
            &existing,
            &UpdateBackupStorageRequest::default()
        ));

        // Changing the bucket onto another storage's triple is a duplicate.
        let onto_other = UpdateBackupStorageRequest {
            bucket_name: Some("bucket-b".to_string()),
            ..Default::default()
        };
        assert!(is_duplicate_after_update(&current, &existing, &onto_other));
    }
}
