use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Standard API response wrapper
///
/// # Example
/// ```
/// use svcmgr::common::ApiResponse;
/// use axum::http::StatusCode;
///
/// let ok = ApiResponse::success("ready");
/// assert!(ok.success);
///
/// let failed: ApiResponse<()> = ApiResponse::error(StatusCode::SERVICE_UNAVAILABLE, "draining");
/// assert_eq!(failed.error.unwrap().code, "Service Unavailable");
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    pub success: bool,

    #[serde(skip)]
    pub http_status: StatusCode,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response with data
    ///
    /// Defaults to HTTP 200 OK.
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            success: true,
            http_status: StatusCode::OK,
        }
    }

    /// Create an error response
    ///
    /// The error `code` is the status's canonical reason phrase.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(ApiError {
                code: status.canonical_reason().unwrap_or("Unknown").to_string(),
                message: message.into(),
            }),
            success: false,
            http_status: status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.http_status, Json(self)).into_response()
    }
}
