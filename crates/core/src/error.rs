use thiserror::Error;

/// Errors surfaced across the authorization decision path.
///
/// Only [`IamError::Bind`] and [`IamError::Unauthenticated`] are ever turned
/// into a client-visible response; every other variant is logged and retried
/// internally by the component that produced it.
#[derive(Debug, Error)]
pub enum IamError {
    /// The request body could not be decoded into an `AccessRequest`.
    #[error("malformed request: {0}")]
    Bind(String),

    /// No authenticated principal could be resolved for the request.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The remote catalog client could not complete `FetchAll`.
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// A freshly fetched snapshot failed to compile (bad pattern, bad condition).
    #[error("snapshot install failed: {0}")]
    SnapshotInstallFailed(String),

    /// The analytics sink rejected or could not accept a batch.
    #[error("sink unavailable: {0}")]
    SinkUnavailable(String),

    /// Any other internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure compiling a single glob-or-regex pattern segment.
#[derive(Debug, Error)]
pub enum PatternCompileError {
    /// A `<` was opened but never closed.
    #[error("unterminated regex segment in pattern {0:?}")]
    UnterminatedSegment(String),

    /// The assembled regex failed to compile.
    #[error("invalid regex segment in pattern {pattern:?}: {source}")]
    InvalidRegex {
        /// The offending pattern.
        pattern: String,
        /// Underlying regex compile error.
        #[source]
        source: regex::Error,
    },
}

/// Failure compiling a whole [`crate::policy::Policy`] into a
/// [`crate::policy::CompiledPolicy`].
#[derive(Debug, Error)]
pub enum PolicyCompileError {
    /// One of the subject/action/resource patterns failed to compile.
    #[error("policy {policy:?}: {source}")]
    Pattern {
        /// Name of the offending policy.
        policy: String,
        #[source]
        source: PatternCompileError,
    },
}

impl From<PolicyCompileError> for IamError {
    fn from(value: PolicyCompileError) -> Self {
        IamError::SnapshotInstallFailed(value.to_string())
    }
}
