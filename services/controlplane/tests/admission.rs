//! End-to-end admission gate tests: catalog resolution, enforcement, and
//! domain validation composed over a static policy and an in-memory fleet.
use controlplane::admission::{AdmissionGate, AdmissionRequest};
use controlplane::auth::identity::{SESSION_ISSUER, SubjectClaims};
use controlplane::auth::rbac::catalog::ResourceCatalog;
use controlplane::auth::rbac::enforcer::PolicyEngine;
use controlplane::auth::rbac::source::StaticPolicySource;
use controlplane::error::AdmissionError;
use controlplane::fleet::memory::InMemoryFleet;
use controlplane::model::{
    BackupConfig, BackupSchedule, BackupStorage, BackupStorageSpec, ClusterBackupSpec,
    ClusterRestoreSpec, ClusterSpec, ConfigServerSpec, CreateBackupStorageRequest, DataSource,
    DatabaseCluster, DatabaseClusterBackup, DatabaseClusterRestore, DatabaseEngine, EngineKind,
    EngineResources, EngineSpec, EngineStorage, Metadata, ResourceQuantity, ShardingSpec,
    StorageKind, UpdateBackupStorageRequest,
};
use controlplane::probe::DebugProbe;
use controlplane::validate::{ValidationError, ValidationSubject, Validator};
use std::sync::Arc;

const CLUSTERS_PATH: &str = "/v1/namespaces/{namespace}/database-clusters";
const CLUSTER_PATH: &str = "/v1/namespaces/{namespace}/database-clusters/{name}";
const STORAGES_PATH: &str = "/v1/namespaces/{namespace}/backup-storages";
const STORAGE_PATH: &str = "/v1/namespaces/{namespace}/backup-storages/{name}";
const RESTORES_PATH: &str = "/v1/namespaces/{namespace}/database-cluster-restores";

async fn gate_with(policy: &str, fleet: Arc<InMemoryFleet>) -> AdmissionGate {
    let catalog = Arc::new(ResourceCatalog::from_embedded().expect("catalog"));
    let source = Arc::new(StaticPolicySource::new(policy));
    let engine = PolicyEngine::new(Arc::clone(&catalog), source)
        .await
        .expect("policy engine");
    let validator = Validator::new(fleet, Arc::clone(&engine), Arc::new(DebugProbe));
    AdmissionGate::new(catalog, engine, validator)
}

fn claims(user: &str) -> Option<SubjectClaims> {
    Some(SubjectClaims::new(user, "https://idp.example.com"))
}

fn request(
    user: Option<&str>,
    path: &str,
    method: &str,
    namespace: &str,
    name: &str,
    mutation: Option<ValidationSubject>,
) -> AdmissionRequest {
    AdmissionRequest {
        claims: user.and_then(claims),
        path: path.to_string(),
        method: method.to_string(),
        namespace: namespace.to_string(),
        name: name.to_string(),
        mutation,
    }
}

fn metadata(namespace: &str, name: &str) -> Metadata {
    Metadata {
        name: name.to_string(),
        namespace: namespace.to_string(),
        resource_version: None,
    }
}

fn quantity(text: &str) -> Option<ResourceQuantity> {
    Some(ResourceQuantity::Text(text.to_string()))
}

fn cluster(namespace: &str, name: &str, kind: EngineKind, version: &str) -> DatabaseCluster {
    DatabaseCluster {
        metadata: metadata(namespace, name),
        spec: ClusterSpec {
            engine: EngineSpec {
                kind,
                version: Some(version.to_string()),
                replicas: 3,
                resources: Some(EngineResources {
                    cpu: quantity("1"),
                    memory: quantity("1G"),
                }),
                storage: Some(EngineStorage {
                    size: quantity("10G"),
                }),
            },
            proxy: None,
            backup: None,
            sharding: None,
            data_source: None,
            allow_unsafe_configuration: false,
        },
        status: None,
    }
}

fn schedule(name: &str, storage: &str, cron: &str) -> BackupSchedule {
    BackupSchedule {
        name: name.to_string(),
        enabled: true,
        backup_storage_name: storage.to_string(),
        schedule: cron.to_string(),
        retention_copies: None,
    }
}

fn storage(namespace: &str, name: &str, region: &str, bucket: &str, url: &str) -> BackupStorage {
    BackupStorage {
        metadata: metadata(namespace, name),
        spec: BackupStorageSpec {
            kind: StorageKind::S3,
            bucket: bucket.to_string(),
            region: region.to_string(),
            endpoint_url: url.to_string(),
            verify_tls: None,
            force_path_style: None,
        },
    }
}

async fn seeded_fleet() -> Arc<InMemoryFleet> {
    let fleet = Arc::new(InMemoryFleet::new());
    for (kind, name) in [
        (EngineKind::Mysql, "mysql-operator"),
        (EngineKind::Mongodb, "mongodb-operator"),
        (EngineKind::Postgresql, "postgresql-operator"),
    ] {
        fleet
            .insert_engine(
                "default",
                DatabaseEngine {
                    name: name.to_string(),
                    kind,
                    allowed_versions: Vec::new(),
                    available_versions: ["7.0.1", "7.0.5", "8.0.36", "16.2.0"]
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                },
            )
            .await;
    }
    fleet
}

#[tokio::test]
async fn exempt_operations_skip_enforcement() {
    let gate = gate_with("", seeded_fleet().await).await;
    gate.admit(&request(None, "/v1/version", "GET", "", "", None))
        .await
        .expect("exempt path needs no identity");
}

#[tokio::test]
async fn guarded_operations_require_identity() {
    let gate = gate_with("", seeded_fleet().await).await;
    let err = gate
        .admit(&request(None, CLUSTERS_PATH, "GET", "default", "", None))
        .await
        .expect_err("anonymous");
    assert!(matches!(err, AdmissionError::AuthenticationMissing));
}

#[tokio::test]
async fn unknown_operations_are_rejected() {
    let gate = gate_with("", seeded_fleet().await).await;
    let err = gate
        .admit(&request(Some("root"), "/v1/unknown", "GET", "", "", None))
        .await
        .expect_err("unknown path");
    assert!(matches!(err, AdmissionError::UnknownOperation { .. }));
}

#[tokio::test]
async fn denial_is_generic() {
    let gate = gate_with("", seeded_fleet().await).await;
    let err = gate
        .admit(&request(
            Some("mallory"),
            CLUSTERS_PATH,
            "GET",
            "default",
            "",
            None,
        ))
        .await
        .expect_err("no rule");
    assert!(matches!(err, AdmissionError::AuthorizationDenied));
    assert_eq!(err.to_string(), "permission denied");
}

#[tokio::test]
async fn namespace_listing_is_always_permitted() {
    let gate = gate_with("", seeded_fleet().await).await;
    gate.admit(&request(
        Some("mallory"),
        "/v1/namespaces",
        "GET",
        "",
        "",
        None,
    ))
    .await
    .expect("namespaces listing bypasses policy");
}

#[tokio::test]
async fn session_identities_resolve_to_the_user() {
    let gate = gate_with("p, alice, database-clusters, read, default/*\n", seeded_fleet().await)
        .await;
    let mut request = request(None, CLUSTER_PATH, "GET", "default", "db1", None);
    request.claims = Some(SubjectClaims::new("alice:3f2a9c", SESSION_ISSUER));
    gate.admit(&request).await.expect("session subject maps to alice");
}

#[tokio::test]
async fn admin_role_passes_gate_and_validation() {
    let fleet = seeded_fleet().await;
    let gate = gate_with("g, root, role:admin\n", Arc::clone(&fleet)).await;

    let mutation = ValidationSubject::ClusterCreate {
        namespace: "default".to_string(),
        cluster: cluster("default", "db1", EngineKind::Mysql, "8.0.36"),
    };
    gate.admit(&request(
        Some("root"),
        CLUSTERS_PATH,
        "POST",
        "default",
        "",
        Some(mutation),
    ))
    .await
    .expect("admin create");
}

#[tokio::test]
async fn schedule_bearing_create_needs_backup_permissions() {
    let fleet = seeded_fleet().await;
    let base_policy = "p, dev, database-clusters, create, default/*\n";
    let gate = gate_with(base_policy, Arc::clone(&fleet)).await;

    let mut with_schedules = cluster("default", "db1", EngineKind::Mysql, "8.0.36");
    with_schedules.spec.backup = Some(BackupConfig {
        enabled: true,
        schedules: Some(vec![schedule("daily", "s3-main", "0 2 * * *")]),
        pitr: None,
    });
    let mutation = ValidationSubject::ClusterCreate {
        namespace: "default".to_string(),
        cluster: with_schedules.clone(),
    };

    let err = gate
        .admit(&request(
            Some("dev"),
            CLUSTERS_PATH,
            "POST",
            "default",
            "",
            Some(mutation.clone()),
        ))
        .await
        .expect_err("missing backup permissions");
    assert!(matches!(
        err,
        AdmissionError::Validation(ValidationError::InsufficientPermissions)
    ));

    let full_policy = "p, dev, database-clusters, create, default/*\n\
                       p, dev, database-cluster-backups, create, default/*\n\
                       p, dev, backup-storages, read, default/*\n";
    let gate = gate_with(full_policy, fleet).await;
    gate.admit(&request(
        Some("dev"),
        CLUSTERS_PATH,
        "POST",
        "default",
        "",
        Some(mutation),
    ))
    .await
    .expect("permissions granted");
}

#[tokio::test]
async fn sharding_create_matrix() {
    let fleet = seeded_fleet().await;
    let gate = gate_with("g, root, role:admin\n", Arc::clone(&fleet)).await;

    let sharded = |shards: i32, config_servers: i32| {
        let mut cluster = cluster("default", "mdb", EngineKind::Mongodb, "7.0.1");
        cluster.spec.sharding = Some(ShardingSpec {
            enabled: true,
            shards,
            config_server: ConfigServerSpec {
                replicas: config_servers,
            },
        });
        ValidationSubject::ClusterCreate {
            namespace: "default".to_string(),
            cluster,
        }
    };

    gate.admit(&request(
        Some("root"),
        CLUSTERS_PATH,
        "POST",
        "default",
        "",
        Some(sharded(3, 3)),
    ))
    .await
    .expect("odd config servers");

    let err = gate
        .admit(&request(
            Some("root"),
            CLUSTERS_PATH,
            "POST",
            "default",
            "",
            Some(sharded(3, 2)),
        ))
        .await
        .expect_err("even config servers");
    assert!(err.to_string().contains("odd"));

    let err = gate
        .admit(&request(
            Some("root"),
            CLUSTERS_PATH,
            "POST",
            "default",
            "",
            Some(sharded(0, 3)),
        ))
        .await
        .expect_err("zero shards");
    assert!(err.to_string().contains("shards number"));
}

#[tokio::test]
async fn sharding_is_a_one_way_switch() {
    let fleet = seeded_fleet().await;
    let mut old = cluster("default", "mdb", EngineKind::Mongodb, "7.0.1");
    old.spec.sharding = Some(ShardingSpec {
        enabled: true,
        shards: 3,
        config_server: ConfigServerSpec { replicas: 3 },
    });
    fleet.insert_cluster(old.clone()).await;
    let gate = gate_with("g, root, role:admin\n", Arc::clone(&fleet)).await;

    let update = |sharding: Option<ShardingSpec>| {
        let mut cluster = cluster("default", "mdb", EngineKind::Mongodb, "7.0.1");
        cluster.spec.sharding = sharding;
        ValidationSubject::ClusterUpdate {
            namespace: "default".to_string(),
            cluster,
        }
    };
    let admit = |mutation| {
        request(
            Some("root"),
            CLUSTER_PATH,
            "PUT",
            "default",
            "mdb",
            Some(mutation),
        )
    };

    let err = gate
        .admit(&admit(update(None)))
        .await
        .expect_err("disable sharding");
    assert!(err.to_string().contains("disabling sharding"));

    let err = gate
        .admit(&admit(update(Some(ShardingSpec {
            enabled: true,
            shards: 5,
            config_server: ConfigServerSpec { replicas: 3 },
        }))))
        .await
        .expect_err("change shards");
    assert!(err.to_string().contains("shards number"));

    gate.admit(&admit(update(Some(ShardingSpec {
        enabled: true,
        shards: 3,
        config_server: ConfigServerSpec { replicas: 3 },
    }))))
    .await
    .expect("unchanged sharding");

    // Enabling on a cluster created without sharding is rejected too.
    let plain = cluster("default", "mdb2", EngineKind::Mongodb, "7.0.1");
    fleet.insert_cluster(plain).await;
    let err = gate
        .admit(&request(
            Some("root"),
            CLUSTER_PATH,
            "PUT",
            "default",
            "mdb2",
            Some({
                let mut cluster = cluster("default", "mdb2", EngineKind::Mongodb, "7.0.1");
                cluster.spec.sharding = Some(ShardingSpec {
                    enabled: true,
                    shards: 3,
                    config_server: ConfigServerSpec { replicas: 3 },
                });
                ValidationSubject::ClusterUpdate {
                    namespace: "default".to_string(),
                    cluster,
                }
            }),
        ))
        .await
        .expect_err("enable on update");
    assert!(err.to_string().contains("enabling sharding"));
}

#[tokio::test]
async fn version_transitions_are_guarded() {
    let fleet = seeded_fleet().await;
    fleet
        .insert_cluster(cluster("default", "db1", EngineKind::Mongodb, "7.0.5"))
        .await;
    let gate = gate_with("g, root, role:admin\n", Arc::clone(&fleet)).await;

    let update_to = |version: &str| {
        ValidationSubject::ClusterUpdate {
            namespace: "default".to_string(),
            cluster: cluster("default", "db1", EngineKind::Mongodb, version),
        }
    };
    let admit = |mutation| {
        request(
            Some("root"),
            CLUSTER_PATH,
            "PUT",
            "default",
            "db1",
            Some(mutation),
        )
    };

    let err = gate
        .admit(&admit(update_to("7.0.1")))
        .await
        .expect_err("downgrade");
    assert!(err.to_string().contains("downgraded"));

    let err = gate
        .admit(&admit(update_to("8.0.36")))
        .await
        .expect_err("major upgrade");
    assert!(err.to_string().contains("major"));
}

#[tokio::test]
async fn scale_down_to_one_needs_the_unsafe_override() {
    let fleet = seeded_fleet().await;
    fleet
        .insert_cluster(cluster("default", "db1", EngineKind::Mysql, "8.0.36"))
        .await;
    let gate = gate_with("g, root, role:admin\n", Arc::clone(&fleet)).await;

    let mut scaled = cluster("default", "db1", EngineKind::Mysql, "8.0.36");
    scaled.spec.engine.replicas = 1;
    let err = gate
        .admit(&request(
            Some("root"),
            CLUSTER_PATH,
            "PUT",
            "default",
            "db1",
            Some(ValidationSubject::ClusterUpdate {
                namespace: "default".to_string(),
                cluster: scaled.clone(),
            }),
        ))
        .await
        .expect_err("scale down");
    assert!(err.to_string().contains("scale down"));

    scaled.spec.allow_unsafe_configuration = true;
    gate.admit(&request(
        Some("root"),
        CLUSTER_PATH,
        "PUT",
        "default",
        "db1",
        Some(ValidationSubject::ClusterUpdate {
            namespace: "default".to_string(),
            cluster: scaled,
        }),
    ))
    .await
    .expect("override set");
}

#[tokio::test]
async fn duplicate_storages_and_in_use_edits_are_rejected() {
    let fleet = seeded_fleet().await;
    fleet
        .insert_storage(storage(
            "default",
            "s3-main",
            "us-east-1",
            "bucket-a",
            "https://s3.local",
        ))
        .await;
    let gate = gate_with("g, root, role:admin\n", Arc::clone(&fleet)).await;

    // Creation with an identical (region, bucket, endpoint) triple.
    let duplicate = CreateBackupStorageRequest {
        name: "s3-copy".to_string(),
        kind: StorageKind::S3,
        bucket_name: "bucket-a".to_string(),
        region: "us-east-1".to_string(),
        url: Some("https://s3.local".to_string()),
        access_key: "key".to_string(),
        secret_key: "secret".to_string(),
        verify_tls: None,
        force_path_style: None,
    };
    let err = gate
        .admit(&request(
            Some("root"),
            STORAGES_PATH,
            "POST",
            "default",
            "",
            Some(ValidationSubject::StorageCreate {
                namespace: "default".to_string(),
                request: duplicate.clone(),
            }),
        ))
        .await
        .expect_err("duplicate triple");
    assert!(matches!(
        err,
        AdmissionError::Validation(ValidationError::Duplicate { .. })
    ));

    // A distinct triple passes (the probe is stubbed).
    let mut distinct = duplicate;
    distinct.bucket_name = "bucket-b".to_string();
    gate.admit(&request(
        Some("root"),
        STORAGES_PATH,
        "POST",
        "default",
        "",
        Some(ValidationSubject::StorageCreate {
            namespace: "default".to_string(),
            request: distinct,
        }),
    ))
    .await
    .expect("distinct triple");

    // Editing the bucket of a storage a workload references is rejected even
    // though the new bucket is unique.
    let mut referencing = cluster("default", "db1", EngineKind::Mysql, "8.0.36");
    referencing.spec.backup = Some(BackupConfig {
        enabled: true,
        schedules: Some(vec![schedule("daily", "s3-main", "0 2 * * *")]),
        pitr: None,
    });
    fleet.insert_cluster(referencing).await;

    let err = gate
        .admit(&request(
            Some("root"),
            STORAGE_PATH,
            "PATCH",
            "default",
            "s3-main",
            Some(ValidationSubject::StorageUpdate {
                namespace: "default".to_string(),
                name: "s3-main".to_string(),
                request: UpdateBackupStorageRequest {
                    bucket_name: Some("bucket-unique".to_string()),
                    ..Default::default()
                },
            }),
        ))
        .await
        .expect_err("in use");
    assert!(matches!(
        err,
        AdmissionError::Validation(ValidationError::InUse { .. })
    ));
}

#[tokio::test]
async fn restore_reference_chain_is_checked() {
    let fleet = seeded_fleet().await;
    fleet
        .insert_cluster(cluster("default", "db1", EngineKind::Mysql, "8.0.36"))
        .await;
    let gate = gate_with("g, root, role:admin\n", Arc::clone(&fleet)).await;

    let restore = DatabaseClusterRestore {
        metadata: metadata("default", "restore-1"),
        spec: ClusterRestoreSpec {
            db_cluster_name: "db1".to_string(),
            data_source: DataSource {
                db_cluster_backup_name: Some("missing-backup".to_string()),
                backup_source: None,
                pitr: None,
            },
        },
    };
    let err = gate
        .admit(&request(
            Some("root"),
            RESTORES_PATH,
            "POST",
            "default",
            "",
            Some(ValidationSubject::RestoreCreate {
                namespace: "default".to_string(),
                restore: restore.clone(),
            }),
        ))
        .await
        .expect_err("missing backup");
    assert_eq!(err.to_string(), "backup missing-backup does not exist");

    // Complete the chain and the restore passes.
    fleet
        .insert_storage(storage(
            "default",
            "s3-main",
            "us-east-1",
            "bucket-a",
            "https://s3.local",
        ))
        .await;
    fleet
        .insert_backup(DatabaseClusterBackup {
            metadata: metadata("default", "bkp-1"),
            spec: ClusterBackupSpec {
                db_cluster_name: "db1".to_string(),
                backup_storage_name: "s3-main".to_string(),
            },
        })
        .await;
    let mut restore = restore;
    restore.spec.data_source.db_cluster_backup_name = Some("bkp-1".to_string());
    gate.admit(&request(
        Some("root"),
        RESTORES_PATH,
        "POST",
        "default",
        "",
        Some(ValidationSubject::RestoreCreate {
            namespace: "default".to_string(),
            restore,
        }),
    ))
    .await
    .expect("complete chain");
}

#[tokio::test]
async fn disabled_enforcement_admits_every_query() {
    let gate = gate_with("enabled = false\n", seeded_fleet().await).await;
    gate.admit(&request(
        Some("mallory"),
        CLUSTER_PATH,
        "DELETE",
        "default",
        "db1",
        None,
    ))
    .await
    .expect("enforcement disabled");
}
