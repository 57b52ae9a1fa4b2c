use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

// Control plane configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct ControlPlaneConfig {
    pub metrics_bind: SocketAddr,
    pub policy_path: PathBuf,
    /// Debug deployments substitute the always-succeeding storage probe.
    pub debug: bool,
}

#[derive(Debug, Deserialize)]
struct ControlPlaneConfigOverride {
    metrics_bind: Option<String>,
    policy_path: Option<PathBuf>,
    debug: Option<bool>,
}

impl ControlPlaneConfig {
    pub fn from_env() -> Result<Self> {
        let metrics_bind = std::env::var("STRATA_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse STRATA_METRICS_BIND")?;
        let policy_path = std::env::var("STRATA_POLICY_FILE")
            .unwrap_or_else(|_| "/etc/strata/policy.csv".to_string())
            .into();
        let debug = std::env::var("STRATA_DEBUG")
            .map(|value| value == "true")
            .unwrap_or(false);
        Ok(Self {
            metrics_bind,
            policy_path,
            debug,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("STRATA_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read STRATA_CONFIG: {path}"))?;
            let override_cfg: ControlPlaneConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse control plane config yaml")?;
            if let Some(value) = override_cfg.metrics_bind {
                config.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
            }
            if let Some(value) = override_cfg.policy_path {
                config.policy_path = value;
            }
            if let Some(value) = override_cfg.debug {
                config.debug = value;
            }
        }
        Ok(config)
    }
}
