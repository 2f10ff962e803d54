use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::{Error as HyperError, Response, StatusCode};
use serde_json::json;
use thiserror::Error;

pub const CORS_HEADERS: &[(&str, &str)] = &[
    ("Access-Control-Allow-Origin", "*"),
    (
        "Access-Control-Allow-Methods",
        "OPTIONS,GET,POST,PUT,DELETE,PATCH",
    ),
    ("Access-Control-Allow-Headers", "*"),
];

// -----------------------------------------------------------------------------
// Report Errors
// -----------------------------------------------------------------------------
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    #[error("Message store unavailable")]
    StoreUnavailable(String),

    #[error("Route not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    InternalServerError(String),

    #[error("Failed to create response: {0}")]
    ResponseCreationFailed(#[from] hyper::http::Error),
}

impl ReportError {
    pub fn status(&self) -> StatusCode {
        match self {
            ReportError::InvalidRequest(_) | ReportError::MissingParameters(_) => {
                StatusCode::BAD_REQUEST
            }
            ReportError::StoreUnavailable(_) => StatusCode::BAD_GATEWAY,
            ReportError::NotFound(_) => StatusCode::NOT_FOUND,
            ReportError::InternalServerError(_) | ReportError::ResponseCreationFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn into_response(self) -> Response<BoxBody<Bytes, HyperError>> {
        let status = self.status();
        let (code, details) = match &self {
            ReportError::InvalidRequest(reason) => ("InvalidRequest", json!({ "reason": reason })),
            ReportError::MissingParameters(names) => {
                ("MissingParameters", json!({ "parameters": names }))
            }
            // Passing the reason into details for easier debugging
            ReportError::StoreUnavailable(reason) => {
                ("StoreUnavailable", json!({ "reason": reason }))
            }
            ReportError::NotFound(path) => ("NotFound", json!({ "path": path })),
            ReportError::InternalServerError(reason) => {
                ("InternalServerError", json!({ "reason": reason }))
            }
            ReportError::ResponseCreationFailed(reason) => (
                "ResponseCreationFailed",
                json!({ "reason": reason.to_string() }),
            ),
        };

        let body_json = json!({
            "error": {
                "code": code,
                "message": self.to_string(),
                "details": details
            }
        });

        // Full never fails, but BoxBody expects a HyperError
        let boxed_body = Full::new(Bytes::from(body_json.to_string()))
            .map_err(|never| match never {})
            .boxed();

        let mut builder = Response::builder()
            .status(status)
            .header("content-type", "application/json");
        for (name, value) in CORS_HEADERS {
            builder = builder.header(*name, *value);
        }

        builder.body(boxed_body).unwrap_or_else(|_| {
            Response::new(
                Full::new(Bytes::from("Internal Error"))
                    .map_err(|never| match never {})
                    .boxed(),
            )
        })
    }
}
