use serde::Deserialize;

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Graceful shutdown timeout in seconds: the maximum time to wait for
    /// the analytics pipeline to drain after the listener stops accepting
    /// new connections.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Remote catalog client configuration (C1).
#[derive(Debug, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the API server exposing `/v1/secrets` and `/v1/policies`.
    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,
    /// Bearer token used to authenticate to the API server.
    #[serde(default)]
    pub bearer_token: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_base_url(),
            bearer_token: String::new(),
        }
    }
}

fn default_catalog_base_url() -> String {
    "http://127.0.0.1:9090".to_owned()
}

/// Notification bus configuration (C3).
#[derive(Debug, Deserialize)]
pub struct NotifyConfig {
    /// Redis URL for the cluster pub/sub channel.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_owned()
}

/// Analytics pipeline configuration (C7).
#[derive(Debug, Deserialize)]
pub struct AuditConfig {
    /// Worker pool size `P`.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Shared queue capacity `B`; per-worker batch size is `B / P`.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Per-worker flush timer `F`, in milliseconds.
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// Sink key audit batches are appended under.
    #[serde(default = "default_sink_key")]
    pub sink_key: String,
    /// Sink backend: `"memory"` or `"redis"`.
    #[serde(default = "default_sink_backend")]
    pub sink_backend: String,
    /// Redis URL, used only when `sink_backend = "redis"`.
    pub redis_url: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            buffer_capacity: default_buffer_capacity(),
            flush_interval_ms: default_flush_interval_ms(),
            sink_key: default_sink_key(),
            sink_backend: default_sink_backend(),
            redis_url: None,
        }
    }
}

fn default_pool_size() -> usize {
    4
}

fn default_buffer_capacity() -> usize {
    1024
}

fn default_flush_interval_ms() -> u64 {
    500
}

fn default_sink_key() -> String {
    "iam.audit.records".to_owned()
}

fn default_sink_backend() -> String {
    "memory".to_owned()
}
