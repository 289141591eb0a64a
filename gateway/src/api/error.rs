use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use swarm_cache_common::error::GatewayError;

/// Wraps `GatewayError` with the actix-web `ResponseError` impl, mirroring
/// the teacher's `InternalRpcError` -> HTTP response mapping in
/// `common/src/rpc/error.rs`, mapped to the status codes of spec §7.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub GatewayError);

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            GatewayError::InvalidAddress(_) | GatewayError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            GatewayError::DecryptFailure(_) | GatewayError::MalformedSubmission(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::NoHealthyEndpoint
            | GatewayError::ContractCallFailed(_)
            | GatewayError::UpstreamError(_)
            | GatewayError::RateLimited
            | GatewayError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::PersistentCacheReadError(_) | GatewayError::PersistentCacheWriteError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorEnvelope { success: false, error: self.0.to_string() })
    }
}
