//! Read-only policy source adapters.
//!
//! # Purpose
//! The policy document is owned by an external configuration-management path;
//! this process only ever reads it. Every mutation entry point reports an
//! unsupported-operation error instead of silently drifting from the system
//! of record.
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::RwLock;
use strata_authz::{AuthzError, AuthzResult, PolicyDocument, PolicyRule};

#[async_trait]
pub trait PolicySource: Send + Sync {
    /// Fetch and parse the current document.
    async fn load(&self) -> AuthzResult<PolicyDocument>;

    async fn save(&self, _document: &PolicyDocument) -> AuthzResult<()> {
        Err(AuthzError::ReadOnlySource("save"))
    }

    async fn add_rule(&self, _rule: &PolicyRule) -> AuthzResult<()> {
        Err(AuthzError::ReadOnlySource("add"))
    }

    async fn remove_rule(&self, _rule: &PolicyRule) -> AuthzResult<()> {
        Err(AuthzError::ReadOnlySource("remove"))
    }
}

/// Policy document read from a file on disk.
pub struct FilePolicySource {
    path: PathBuf,
}

impl FilePolicySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PolicySource for FilePolicySource {
    async fn load(&self) -> AuthzResult<PolicyDocument> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        PolicyDocument::parse(&raw)
    }
}

/// Fixed in-memory document, settable between loads. Test fixture.
pub struct StaticPolicySource {
    raw: RwLock<String>,
}

impl StaticPolicySource {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: RwLock::new(raw.into()),
        }
    }

    pub fn set(&self, raw: impl Into<String>) {
        *self.raw.write().expect("policy source lock") = raw.into();
    }
}

#[async_trait]
impl PolicySource for StaticPolicySource {
    async fn load(&self) -> AuthzResult<PolicyDocument> {
        let raw = self.raw.read().expect("policy source lock").clone();
        PolicyDocument::parse(&raw)
    }
}
