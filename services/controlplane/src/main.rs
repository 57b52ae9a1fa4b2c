//! Strata control-plane admission service entry point.
//!
//! # Purpose
//! Wires configuration, observability, and the policy engine, subscribes the
//! engine to SIGHUP-driven reload notifications, and serves the Prometheus
//! metrics endpoint.
//!
//! # Notes
//! The request router and fleet backends are wired by the embedding
//! deployment; this binary owns the policy lifecycle and observability.
use anyhow::Context;
use controlplane::auth::rbac::catalog::ResourceCatalog;
use controlplane::auth::rbac::enforcer::PolicyEngine;
use controlplane::auth::rbac::source::FilePolicySource;
use controlplane::{config, observability};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::ControlPlaneConfig::from_env_or_yaml().expect("control plane config");
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(
    config: config::ControlPlaneConfig,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("strata-controlplane");

    let catalog = Arc::new(ResourceCatalog::from_embedded().context("build resource catalog")?);
    let source = Arc::new(FilePolicySource::new(&config.policy_path));
    let policy = PolicyEngine::new(Arc::clone(&catalog), source)
        .await
        .context("load initial policy")?;
    tracing::info!(
        resource_kinds = catalog.resource_kinds().len(),
        enforcement = policy.enforcement_enabled(),
        debug = config.debug,
        policy_path = %config.policy_path.display(),
        "policy engine ready"
    );

    // SIGHUP is the reload notification transport for file-backed policies.
    let (events_tx, events_rx) = mpsc::channel(1);
    let _reload_task = Arc::clone(&policy).watch_changes(events_rx);
    let mut hangups = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())
        .context("install SIGHUP handler")?;
    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            let _ = events_tx.send(()).await;
        }
    });

    let metrics_bind = config.metrics_bind;
    tracing::info!(%metrics_bind, "metrics endpoint listening");
    let metrics_task = tokio::spawn(observability::serve_metrics(metrics_handle, metrics_bind));

    tokio::pin!(shutdown);
    tokio::select! {
        _ = &mut shutdown => {}
        result = metrics_task => {
            result.context("metrics task")??;
        }
    }
    Ok(())
}
