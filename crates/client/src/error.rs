use thiserror::Error;

/// Transport- and decode-level failures talking to the API server. Never
/// exposed past this crate's boundary — [`crate::HttpCatalogClient`] maps
/// every variant into [`iam_core::IamError::CatalogUnavailable`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}
