//! Configuration schema definitions.
//!
//! Field names follow the JSON document operators already deploy
//! (`Ip`, `AppId`, `NginxConfPath`, ...). Snake-case aliases are accepted too.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Cluster every item and release is scoped to.
pub const DEFAULT_CLUSTER: &str = "default";

/// Namespace holding the managed item.
pub const DEFAULT_NAMESPACE: &str = "application";

/// Suffix appended to the managed file path to form the backup path.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Root configuration for the agent.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Base address of the configuration authority (e.g. "http://apollo:8070").
    #[serde(rename = "Ip", alias = "ip", alias = "authority")]
    pub ip: String,

    /// Environment the item lives in (e.g. "DEV", "PRO").
    #[serde(rename = "Env", alias = "env")]
    pub env: String,

    /// Application id. Also used as the item key.
    #[serde(rename = "AppId", alias = "app_id")]
    pub app_id: String,

    /// Open API token sent verbatim in the `Authorization` header.
    #[serde(rename = "Token", alias = "token")]
    pub token: String,

    /// Identity recorded as author of pushed items and releases.
    #[serde(rename = "CreatedBy", alias = "created_by")]
    pub created_by: String,

    /// Path to the managed proxy configuration file.
    #[serde(rename = "NginxConfPath", alias = "nginx_conf_path")]
    pub nginx_conf_path: String,
}

impl AgentConfig {
    /// Authority address without a trailing slash.
    pub fn authority(&self) -> &str {
        self.ip.trim().trim_end_matches('/')
    }

    /// Key of the managed item. The application id doubles as the key.
    pub fn item_key(&self) -> &str {
        self.app_id.trim()
    }

    /// `{ip}/openapi/v1/envs/{env}/apps/{app}/clusters/default/namespaces/application`
    pub fn namespace_url(&self) -> String {
        format!(
            "{}/openapi/v1/envs/{}/apps/{}/clusters/{}/namespaces/{}",
            self.authority(),
            self.env.trim(),
            self.app_id.trim(),
            DEFAULT_CLUSTER,
            DEFAULT_NAMESPACE,
        )
    }

    /// Item endpoint used by fetch and upsert.
    pub fn item_url(&self) -> String {
        format!("{}/items/{}", self.namespace_url(), self.item_key())
    }

    /// Release endpoint used by publish.
    pub fn release_url(&self) -> String {
        format!("{}/releases", self.namespace_url())
    }

    /// Managed proxy configuration file.
    pub fn managed_path(&self) -> &Path {
        Path::new(self.nginx_conf_path.trim())
    }

    /// Backup counterpart of the managed file.
    pub fn backup_path(&self) -> PathBuf {
        let mut path = self.managed_path().as_os_str().to_owned();
        path.push(BACKUP_SUFFIX);
        PathBuf::from(path)
    }
}
