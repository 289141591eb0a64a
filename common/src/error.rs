use thiserror::Error;

/// Error taxonomy shared by the chain gateway, the caches and the score
/// pipeline. HTTP status mapping lives in the gateway crate, which wraps
/// these in its own `ApiError`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("no healthy rpc endpoint available")]
    NoHealthyEndpoint,

    #[error("contract call failed: {0}")]
    ContractCallFailed(#[source] anyhow::Error),

    #[error("upstream error: {0}")]
    UpstreamError(String),

    #[error("rate limited by upstream")]
    RateLimited,

    #[error("unauthorized against upstream")]
    Unauthorized,

    #[error("persistent cache read error: {0}")]
    PersistentCacheReadError(#[source] anyhow::Error),

    #[error("persistent cache write error: {0}")]
    PersistentCacheWriteError(#[source] anyhow::Error),

    #[error("decrypt failure: {0}")]
    DecryptFailure(String),

    #[error("malformed submission: {0}")]
    MalformedSubmission(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
