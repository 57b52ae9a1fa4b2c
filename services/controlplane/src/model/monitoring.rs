//! Monitoring instance request payloads.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitoringKind {
    Pmm,
}

impl MonitoringKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MonitoringKind::Pmm => "pmm",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PmmAuth {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMonitoringRequest {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MonitoringKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmm: Option<PmmAuth>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMonitoringRequest {
    /// Empty means "leave unchanged".
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MonitoringKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmm: Option<PmmAuth>,
}
