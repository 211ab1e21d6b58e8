//! Remote catalog client (C1).
//!
//! # Quick Start
//!
//! ```no_run
//! use iam_catalog_client::{CatalogClient, HttpCatalogClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), iam_core::IamError> {
//!     let client = HttpCatalogClient::new("http://localhost:8080", "token");
//!     let snapshot = client.fetch_all().await?;
//!     println!("secrets: {}", snapshot.secret_count());
//!     Ok(())
//! }
//! ```

mod error;
mod page;

pub use error::ClientError;

use std::time::Duration;

use async_trait::async_trait;
use iam_core::{CatalogSnapshot, IamError, Policy, Secret};
use reqwest::Client;

use page::Page;

/// Default request timeout for a single page fetch.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size used when walking the API server's paginated list endpoints.
const PAGE_LIMIT: u32 = 200;

/// The one operation the rest of the authorization path needs from the
/// remote catalog: assemble a complete, consistent [`CatalogSnapshot`].
///
/// Implemented as a trait so the reload coordinator can be exercised against
/// a test double without reaching for a real HTTP server.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn fetch_all(&self) -> Result<CatalogSnapshot, IamError>;
}

/// HTTP implementation of [`CatalogClient`] against the API server's
/// `/v1/secrets` and `/v1/policies` list endpoints.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
    bearer_token: String,
}

impl HttpCatalogClient {
    /// Build a client with the default timeout.
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self::builder(base_url, bearer_token).build()
    }

    /// Start a [`HttpCatalogClientBuilder`] for custom timeouts or an
    /// injected `reqwest::Client`.
    pub fn builder(base_url: impl Into<String>, bearer_token: impl Into<String>) -> HttpCatalogClientBuilder {
        HttpCatalogClientBuilder::new(base_url, bearer_token)
    }

    async fn fetch_page<T>(&self, path: &str, offset: u32, limit: u32) -> Result<Page<T>, ClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&[("offset", offset), ("limit", limit)])
            .send()
            .await?;

        let response = response.error_for_status()?;
        let page = response.json::<Page<T>>().await?;
        Ok(page)
    }

    /// Walk every page of `path` until `total_count` items have been seen.
    /// Returns only once the whole collection is assembled; a failure on any
    /// page aborts the whole fetch rather than yielding a partial result.
    async fn fetch_all_pages<T>(&self, path: &str) -> Result<Vec<T>, ClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.fetch_page::<T>(path, offset, PAGE_LIMIT).await?;
            let fetched = page.items.len() as u32;
            items.extend(page.items);

            if fetched == 0 || items.len() as u64 >= page.total_count {
                break;
            }
            offset += fetched;
        }

        Ok(items)
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn fetch_all(&self) -> Result<CatalogSnapshot, IamError> {
        let secrets = self
            .fetch_all_pages::<Secret>("/v1/secrets")
            .await
            .map_err(|err| IamError::CatalogUnavailable(err.to_string()))?;
        let policies = self
            .fetch_all_pages::<Policy>("/v1/policies")
            .await
            .map_err(|err| IamError::CatalogUnavailable(err.to_string()))?;

        CatalogSnapshot::build(secrets, policies).map_err(IamError::from)
    }
}

/// Builder for configuring a [`HttpCatalogClient`].
#[derive(Debug)]
pub struct HttpCatalogClientBuilder {
    base_url: String,
    bearer_token: String,
    timeout: Duration,
    client: Option<Client>,
}

impl HttpCatalogClientBuilder {
    fn new(base_url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            bearer_token: bearer_token.into(),
            timeout: DEFAULT_TIMEOUT,
            client: None,
        }
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a custom `reqwest::Client`, e.g. one shared across collaborators.
    #[must_use]
    pub fn http_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> HttpCatalogClient {
        let client = self.client.unwrap_or_else(|| {
            Client::builder()
                .timeout(self.timeout)
                .build()
                .expect("reqwest client with static config never fails to build")
        });

        HttpCatalogClient {
            client,
            base_url: self.base_url,
            bearer_token: self.bearer_token,
        }
    }
}
