//! Database engine families and the per-namespace engine records reported by
//! the orchestrator.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Mysql,
    Mongodb,
    Postgresql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    Haproxy,
    Mongos,
    Pgbouncer,
}

impl EngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Mysql => "mysql",
            EngineKind::Mongodb => "mongodb",
            EngineKind::Postgresql => "postgresql",
        }
    }

    /// Each family accepts exactly one proxy flavor.
    pub fn allowed_proxy(self) -> ProxyKind {
        match self {
            EngineKind::Mysql => ProxyKind::Haproxy,
            EngineKind::Mongodb => ProxyKind::Mongos,
            EngineKind::Postgresql => ProxyKind::Pgbouncer,
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine record as reported by the orchestrator for a namespace.
///
/// `allowed_versions` is an operator-pinned allow-list checked before the
/// broader `available_versions` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseEngine {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EngineKind,
    #[serde(default)]
    pub allowed_versions: Vec<String>,
    #[serde(default)]
    pub available_versions: BTreeSet<String>,
}
