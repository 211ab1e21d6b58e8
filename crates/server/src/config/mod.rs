mod server;

pub use server::*;

use serde::Deserialize;

/// Top-level configuration for `iamd`, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct IamConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}
