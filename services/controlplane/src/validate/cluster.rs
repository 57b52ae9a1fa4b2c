//! Database cluster validation: create and update rule sets.
use crate::model::{
    BackupSchedule, DataSource, DatabaseCluster, DatabaseEngine, EngineKind, ProxyKind,
    ResourceQuantity,
};
use crate::validate::common::{validate_metadata, validate_name_label};
use crate::validate::quantity::Quantity;
use crate::validate::{ValidationError, Validator, fleet_failure};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use strata_authz::{
    Action, RESOURCE_BACKUP_STORAGES, RESOURCE_DATABASE_CLUSTER_BACKUPS,
    RESOURCE_DATABASE_CLUSTER_CREDENTIALS, RESOURCE_DATABASE_CLUSTER_RESTORES, object_name,
};

const MIN_SHARDS: i32 = 1;
const MIN_CONFIG_SERVERS: i32 = 1;
// Distinct backup storages one postgresql cluster may reference, counting
// schedules and historical backups together.
const PG_STORAGE_LIMIT: usize = 3;
const MIN_SHARDING_VERSION: &str = "1.17.0";
const PITR_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

static MIN_CPU: LazyLock<Quantity> =
    LazyLock::new(|| Quantity::parse("600m").expect("minimum cpu quantity"));
static MIN_MEMORY: LazyLock<Quantity> =
    LazyLock::new(|| Quantity::parse("512M").expect("minimum memory quantity"));
static MIN_STORAGE: LazyLock<Quantity> =
    LazyLock::new(|| Quantity::parse("1G").expect("minimum storage quantity"));

/// Create-path entry point: permission composition first, then the shared
/// cluster record rules.
pub(super) async fn validate_cluster_create(
    v: &Validator,
    user: &str,
    namespace: &str,
    cluster: &DatabaseCluster,
) -> Result<(), ValidationError> {
    let schedules = cluster.schedules();
    if !schedules.is_empty() {
        // Creating a cluster with schedules means taking backups; the user
        // needs that permission explicitly, plus read on every referenced
        // storage.
        v.require(
            user,
            RESOURCE_DATABASE_CLUSTER_BACKUPS,
            Action::Create,
            &object_name(&[namespace, ""]),
        )?;
        for schedule in schedules {
            v.require(
                user,
                RESOURCE_BACKUP_STORAGES,
                Action::Read,
                &object_name(&[namespace, &schedule.backup_storage_name]),
            )?;
        }
    }

    enforce_restore_to_new_cluster(v, user, namespace, cluster).await?;
    validate_cluster_record(v, namespace, cluster).await
}

/// Restoring into a new cluster needs create-permission on restores plus the
/// reads required to follow the source backup's lineage.
async fn enforce_restore_to_new_cluster(
    v: &Validator,
    user: &str,
    namespace: &str,
    cluster: &DatabaseCluster,
) -> Result<(), ValidationError> {
    let source_backup = cluster
        .spec
        .data_source
        .as_ref()
        .and_then(|source| source.db_cluster_backup_name.as_deref())
        .filter(|name| !name.is_empty());
    let Some(source_backup) = source_backup else {
        return Ok(());
    };

    v.require(
        user,
        RESOURCE_DATABASE_CLUSTER_RESTORES,
        Action::Create,
        &object_name(&[namespace, ""]),
    )?;
    let backup = v.get_backup(namespace, source_backup).await?;
    v.require(
        user,
        RESOURCE_DATABASE_CLUSTER_BACKUPS,
        Action::Read,
        &object_name(&[namespace, source_backup]),
    )?;
    v.require(
        user,
        RESOURCE_DATABASE_CLUSTER_CREDENTIALS,
        Action::Read,
        &object_name(&[namespace, &backup.spec.db_cluster_name]),
    )?;
    Ok(())
}

/// Update-path entry point: transition rules against the stored record, then
/// the shared cluster record rules.
pub(super) async fn validate_cluster_update(
    v: &Validator,
    user: &str,
    namespace: &str,
    cluster: &DatabaseCluster,
) -> Result<(), ValidationError> {
    validate_metadata(&cluster.metadata)?;
    let old = v.get_cluster(namespace, &cluster.metadata.name).await?;

    let new_version = cluster.spec.engine.version.as_deref().unwrap_or("");
    let old_version = old.spec.engine.version.as_deref().unwrap_or("");
    if !new_version.is_empty() && new_version != old_version {
        validate_version_upgrade(new_version, old_version)?;
    }

    if cluster.spec.engine.replicas == 1
        && old.spec.engine.replicas > 1
        && !cluster.spec.allow_unsafe_configuration
    {
        return Err(ValidationError::BusinessRule(format!(
            "cannot scale down a {} node cluster to 1 without the unsafe-configuration override",
            old.spec.engine.replicas
        )));
    }

    validate_sharding_on_update(cluster, &old)?;
    validate_schedule_update_permissions(v, user, namespace, cluster, &old)?;
    validate_cluster_record(v, namespace, cluster).await
}

/// Rules shared by create and update.
async fn validate_cluster_record(
    v: &Validator,
    namespace: &str,
    cluster: &DatabaseCluster,
) -> Result<(), ValidationError> {
    validate_cluster_name(cluster)?;

    let engine = v.get_engine(namespace, cluster.spec.engine.kind).await?;
    validate_version(cluster.spec.engine.version.as_deref(), &engine)?;

    if let Some(proxy) = cluster.spec.proxy.as_ref().and_then(|proxy| proxy.kind) {
        validate_proxy(cluster.spec.engine.kind, proxy)?;
    }

    validate_backup_spec(cluster)?;
    validate_backup_storages_for(v, namespace, cluster).await?;

    if let Some(data_source) = &cluster.spec.data_source {
        validate_data_source(data_source)?;
    }

    if cluster.spec.engine.kind == EngineKind::Postgresql {
        validate_pg_schedule_restrictions(v, namespace, cluster).await?;
        validate_pg_storage_limit(v, namespace, cluster, None).await?;
    }

    validate_sharding(cluster)?;
    validate_resource_limits(cluster)
}

fn validate_cluster_name(cluster: &DatabaseCluster) -> Result<(), ValidationError> {
    if cluster.metadata.name.is_empty() {
        return Err(ValidationError::Structural(
            "metadata.name should not be empty".to_string(),
        ));
    }
    if cluster.metadata.namespace.is_empty() {
        return Err(ValidationError::Structural(
            "metadata.namespace should not be empty".to_string(),
        ));
    }
    validate_name_label(&cluster.metadata.name, "metadata.name")
}

fn validate_version(
    version: Option<&str>,
    engine: &DatabaseEngine,
) -> Result<(), ValidationError> {
    let Some(version) = version.filter(|version| !version.is_empty()) else {
        return Ok(());
    };
    // The operator-pinned allow-list wins over the broader available set.
    if !engine.allowed_versions.is_empty() {
        if !engine.allowed_versions.iter().any(|allowed| allowed == version) {
            return Err(ValidationError::BusinessRule(format!(
                "using {version} version for {} is not allowed",
                engine.kind
            )));
        }
        return Ok(());
    }
    if !engine.available_versions.contains(version) {
        return Err(ValidationError::BusinessRule(format!(
            "{version} is not in available versions list"
        )));
    }
    Ok(())
}

fn validate_proxy(engine: EngineKind, proxy: ProxyKind) -> Result<(), ValidationError> {
    if proxy != engine.allowed_proxy() {
        let allowed = match engine.allowed_proxy() {
            ProxyKind::Haproxy => "haproxy",
            ProxyKind::Mongos => "mongos",
            ProxyKind::Pgbouncer => "pgbouncer",
        };
        return Err(ValidationError::BusinessRule(format!(
            "you can use only {allowed} as a proxy type for {engine} clusters"
        )));
    }
    Ok(())
}

fn validate_backup_spec(cluster: &DatabaseCluster) -> Result<(), ValidationError> {
    let Some(backup) = &cluster.spec.backup else {
        return Ok(());
    };
    if !backup.enabled {
        return Ok(());
    }
    let schedules = cluster.schedules();
    if schedules.is_empty() {
        return Err(ValidationError::BusinessRule(
            "please specify at least one backup schedule".to_string(),
        ));
    }

    validate_pitr_spec(cluster)?;

    for schedule in schedules {
        if schedule.name.is_empty() {
            return Err(ValidationError::Structural(
                "'name' field for the backup schedules cannot be empty".to_string(),
            ));
        }
        if schedule.enabled && schedule.backup_storage_name.is_empty() {
            return Err(ValidationError::Structural(
                "'backupStorageName' field cannot be empty when the schedule is enabled"
                    .to_string(),
            ));
        }
    }
    check_duplicate_schedules(schedules)
}

/// Duplicate detection keys solely on the cron expression, regardless of
/// differing names or storages.
fn check_duplicate_schedules(schedules: &[BackupSchedule]) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for schedule in schedules {
        if !seen.insert(schedule.schedule.as_str()) {
            return Err(ValidationError::BusinessRule(
                "duplicated backup schedules are not allowed".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_pitr_spec(cluster: &DatabaseCluster) -> Result<(), ValidationError> {
    let Some(pitr) = cluster
        .spec
        .backup
        .as_ref()
        .and_then(|backup| backup.pitr.as_ref())
    else {
        return Ok(());
    };
    if !pitr.enabled {
        return Ok(());
    }

    if cluster.spec.engine.kind == EngineKind::Mysql
        && pitr
            .backup_storage_name
            .as_deref()
            .is_none_or(|name| name.is_empty())
    {
        return Err(ValidationError::BusinessRule(
            "'backupStorageName' field cannot be empty when pitr is enabled".to_string(),
        ));
    }
    if let Some(interval) = pitr.upload_interval_sec
        && interval <= 0
    {
        return Err(ValidationError::BusinessRule(
            "'uploadIntervalSec' should be more than 0".to_string(),
        ));
    }
    Ok(())
}

/// Storage-reference rules that need current fleet state, per engine family.
async fn validate_backup_storages_for(
    v: &Validator,
    namespace: &str,
    cluster: &DatabaseCluster,
) -> Result<(), ValidationError> {
    let Some(backup) = &cluster.spec.backup else {
        return Ok(());
    };

    let storages: BTreeSet<&str> = cluster
        .schedules()
        .iter()
        .map(|schedule| schedule.backup_storage_name.as_str())
        .collect();

    if cluster.spec.engine.kind == EngineKind::Mongodb {
        if storages.len() > 1 {
            return Err(ValidationError::BusinessRule(
                "can't use more than one backup storage for mongodb clusters".to_string(),
            ));
        }
        let active = cluster
            .status
            .as_ref()
            .and_then(|status| status.active_storage.as_deref())
            .filter(|name| !name.is_empty());
        if let Some(active) = active
            && storages.iter().any(|name| *name != active)
        {
            return Err(ValidationError::BusinessRule(
                "can't change the active storage for mongodb clusters".to_string(),
            ));
        }
    }

    let Some(pitr) = backup.pitr.as_ref().filter(|pitr| pitr.enabled) else {
        return Ok(());
    };
    if cluster.spec.engine.kind == EngineKind::Mysql {
        let storage_name = pitr
            .backup_storage_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ValidationError::BusinessRule(
                    "'backupStorageName' field cannot be empty when pitr is enabled".to_string(),
                )
            })?;
        let storage = v.get_storage(namespace, storage_name).await?;
        if storage.spec.kind != crate::model::StorageKind::S3 {
            return Err(ValidationError::BusinessRule(
                "point-in-time recovery is only supported for s3-compatible storages".to_string(),
            ));
        }
    }
    Ok(())
}

pub(super) fn validate_data_source(data_source: &DataSource) -> Result<(), ValidationError> {
    let has_backup_name = data_source
        .db_cluster_backup_name
        .as_deref()
        .is_some_and(|name| !name.is_empty());
    match (&data_source.backup_source, has_backup_name) {
        (None, false) | (Some(_), true) => {
            return Err(ValidationError::Structural(
                "either dbClusterBackupName or backupSource must be specified in the dataSource \
                 field"
                    .to_string(),
            ));
        }
        _ => {}
    }

    if let Some(source) = &data_source.backup_source {
        if source.backup_storage_name.is_empty() {
            return Err(ValidationError::Structural(
                "'backupStorageName' should be specified in .spec.dataSource.backupSource"
                    .to_string(),
            ));
        }
        if source.path.is_empty() {
            return Err(ValidationError::Structural(
                "'path' should be specified in .spec.dataSource.backupSource".to_string(),
            ));
        }
    }

    if let Some(pitr) = &data_source.pitr {
        match pitr.kind.as_deref() {
            None | Some("date") => {
                let Some(date) = pitr.date.as_deref().filter(|date| !date.is_empty()) else {
                    return Err(ValidationError::Structural(
                        "pitr date must be specified for type date".to_string(),
                    ));
                };
                if chrono::NaiveDateTime::parse_from_str(date, PITR_DATE_FORMAT).is_err() {
                    return Err(ValidationError::Structural(format!(
                        "failed to parse pitr date, expected format {PITR_DATE_FORMAT}"
                    )));
                }
            }
            Some(_) => {
                return Err(ValidationError::BusinessRule(
                    "the given point-in-time recovery type is not supported".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Existing postgresql schedules may not change their storage, and no two
/// schedules may share one storage.
async fn validate_pg_schedule_restrictions(
    v: &Validator,
    namespace: &str,
    cluster: &DatabaseCluster,
) -> Result<(), ValidationError> {
    match v.get_cluster(namespace, &cluster.metadata.name).await {
        Ok(old) => {
            for old_schedule in old.schedules() {
                for new_schedule in cluster.schedules() {
                    if old_schedule.name == new_schedule.name
                        && old_schedule.backup_storage_name != new_schedule.backup_storage_name
                    {
                        return Err(ValidationError::BusinessRule(
                            "existing postgresql schedules can't change their storage".to_string(),
                        ));
                    }
                }
            }
            check_pg_storage_duplicates(cluster)
        }
        // No such cluster yet: only the duplicate check applies.
        Err(ValidationError::NotFound { .. }) => check_pg_storage_duplicates(cluster),
        Err(err) => Err(err),
    }
}

fn check_pg_storage_duplicates(cluster: &DatabaseCluster) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for schedule in cluster.schedules() {
        if !seen.insert(schedule.backup_storage_name.as_str()) {
            return Err(ValidationError::BusinessRule(
                "postgresql clusters can't use the same storage for different schedules"
                    .to_string(),
            ));
        }
    }
    Ok(())
}

/// Capacity ceiling on distinct storages per postgresql cluster, counting the
/// union of schedule references and historical backups. `extra_backup`
/// carries the backup currently under validation, when there is one.
pub(super) async fn validate_pg_storage_limit(
    v: &Validator,
    namespace: &str,
    cluster: &DatabaseCluster,
    extra_backup: Option<&crate::model::DatabaseClusterBackup>,
) -> Result<(), ValidationError> {
    let mut storages: BTreeSet<String> = cluster
        .schedules()
        .iter()
        .map(|schedule| schedule.backup_storage_name.clone())
        .collect();

    let backups = v
        .fleet()
        .list_backups_for_cluster(namespace, &cluster.metadata.name)
        .await
        .map_err(fleet_failure)?;
    for backup in &backups {
        storages.insert(backup.spec.backup_storage_name.clone());
    }
    if let Some(backup) = extra_backup {
        storages.insert(backup.spec.backup_storage_name.clone());
    }

    if storages.len() > PG_STORAGE_LIMIT {
        return Err(ValidationError::BusinessRule(format!(
            "only {PG_STORAGE_LIMIT} different storages are allowed in a postgresql cluster"
        )));
    }
    Ok(())
}

/// Sharding constraints at creation (or when already enabled and unchanged).
fn validate_sharding(cluster: &DatabaseCluster) -> Result<(), ValidationError> {
    let Some(sharding) = cluster.spec.sharding.as_ref().filter(|s| s.enabled) else {
        return Ok(());
    };
    if cluster.spec.engine.kind != EngineKind::Mongodb {
        return Err(ValidationError::BusinessRule(
            "sharding is not supported".to_string(),
        ));
    }
    let version_ok = cluster
        .spec
        .engine
        .version
        .as_deref()
        .and_then(|version| semver::Version::parse(version.trim_start_matches('v')).ok())
        .is_some_and(|version| {
            version >= semver::Version::parse(MIN_SHARDING_VERSION).expect("minimum version")
        });
    if !version_ok {
        return Err(ValidationError::BusinessRule(format!(
            "sharding is available starting with engine version {MIN_SHARDING_VERSION}"
        )));
    }
    if sharding.shards < MIN_SHARDS {
        return Err(ValidationError::BusinessRule(
            "shards number should be greater than 0".to_string(),
        ));
    }
    if sharding.config_server.replicas < MIN_CONFIG_SERVERS {
        return Err(ValidationError::BusinessRule(format!(
            "sharding: minimum config servers number is {MIN_CONFIG_SERVERS}"
        )));
    }
    // Quorum requires an odd number of config servers.
    if sharding.config_server.replicas % 2 == 0 {
        return Err(ValidationError::BusinessRule(
            "sharding: config servers number should be odd".to_string(),
        ));
    }
    Ok(())
}

/// Sharding is a one-way switch: never enabled on update, never disabled,
/// shard and config-server counts frozen once enabled.
fn validate_sharding_on_update(
    cluster: &DatabaseCluster,
    old: &DatabaseCluster,
) -> Result<(), ValidationError> {
    let new_sharding = cluster.spec.sharding.as_ref();
    let Some(old_sharding) = old.spec.sharding.as_ref().filter(|s| s.enabled) else {
        if new_sharding.is_some_and(|s| s.enabled) {
            return Err(ValidationError::BusinessRule(
                "sharding: enabling sharding is not supported when editing an existing cluster"
                    .to_string(),
            ));
        }
        return Ok(());
    };

    let Some(new_sharding) = new_sharding.filter(|s| s.enabled) else {
        return Err(ValidationError::BusinessRule(
            "sharding: disabling sharding is not supported".to_string(),
        ));
    };
    if new_sharding.shards != old_sharding.shards {
        return Err(ValidationError::BusinessRule(
            "sharding: changing the shards number is not supported".to_string(),
        ));
    }
    if new_sharding.config_server.replicas != old_sharding.config_server.replicas {
        return Err(ValidationError::BusinessRule(
            "sharding: changing the config servers number is not supported".to_string(),
        ));
    }
    validate_sharding(cluster)
}

/// Permission re-checks for schedule edits, skipped when the schedule set is
/// structurally unchanged so unrelated edits don't re-prompt permission
/// errors.
fn validate_schedule_update_permissions(
    v: &Validator,
    user: &str,
    namespace: &str,
    cluster: &DatabaseCluster,
    old: &DatabaseCluster,
) -> Result<(), ValidationError> {
    let mut new_schedules: Vec<BackupSchedule> = cluster.schedules().to_vec();
    let mut old_schedules: Vec<BackupSchedule> = old.schedules().to_vec();
    new_schedules.sort_by(|a, b| a.name.cmp(&b.name));
    old_schedules.sort_by(|a, b| a.name.cmp(&b.name));
    if new_schedules == old_schedules {
        return Ok(());
    }

    v.require(
        user,
        RESOURCE_DATABASE_CLUSTER_BACKUPS,
        Action::Create,
        &object_name(&[namespace, ""]),
    )?;
    for schedule in &new_schedules {
        v.require(
            user,
            RESOURCE_BACKUP_STORAGES,
            Action::Read,
            &object_name(&[namespace, &schedule.backup_storage_name]),
        )?;
    }
    Ok(())
}

/// Engine version transitions are monotonic non-decreasing and never cross a
/// major boundary.
pub(super) fn validate_version_upgrade(
    new_version: &str,
    old_version: &str,
) -> Result<(), ValidationError> {
    let parse = |version: &str| semver::Version::parse(version.trim_start_matches('v')).ok();
    let Some(new_version) = parse(new_version) else {
        return Err(ValidationError::BusinessRule(
            "invalid database engine version provided".to_string(),
        ));
    };
    let Some(old_version) = parse(old_version) else {
        return Err(ValidationError::BusinessRule(
            "invalid database engine version provided".to_string(),
        ));
    };

    if new_version < old_version {
        return Err(ValidationError::BusinessRule(
            "database engine version cannot be downgraded".to_string(),
        ));
    }
    // Major upgrades are handled differently by each downstream operator, so
    // they are rejected wholesale.
    if new_version.major != old_version.major {
        return Err(ValidationError::BusinessRule(
            "database engine cannot be upgraded to a major version".to_string(),
        ));
    }
    Ok(())
}

fn validate_resource_limits(cluster: &DatabaseCluster) -> Result<(), ValidationError> {
    let Some(resources) = &cluster.spec.engine.resources else {
        return Err(ValidationError::BusinessRule(
            "please specify resource limits for the cluster".to_string(),
        ));
    };

    let cpu = resources.cpu.as_ref().ok_or_else(|| {
        ValidationError::BusinessRule("cpu limits should be above 600m".to_string())
    })?;
    check_quantity_min(cpu, &MIN_CPU, "cpu limits should be above 600m")?;

    let memory = resources.memory.as_ref().ok_or_else(|| {
        ValidationError::BusinessRule("memory limits should be above 512M".to_string())
    })?;
    check_quantity_min(memory, &MIN_MEMORY, "memory limits should be above 512M")?;

    let size = cluster
        .spec
        .engine
        .storage
        .as_ref()
        .and_then(|storage| storage.size.as_ref())
        .ok_or_else(|| {
            ValidationError::BusinessRule("storage size should be above 1G".to_string())
        })?;
    check_quantity_min(size, &MIN_STORAGE, "storage size should be above 1G")
}

fn check_quantity_min(
    value: &ResourceQuantity,
    minimum: &Quantity,
    message: &str,
) -> Result<(), ValidationError> {
    let text = match value {
        ResourceQuantity::Number(_) => {
            return Err(ValidationError::Structural(
                "specifying resources using the integer type is not supported, use the string \
                 format"
                    .to_string(),
            ));
        }
        ResourceQuantity::Text(text) => text,
    };
    let quantity =
        Quantity::parse(text).map_err(|err| ValidationError::Structural(err.to_string()))?;
    if quantity < *minimum {
        return Err(ValidationError::BusinessRule(message.to_string()));
    }
    Ok(())
}
