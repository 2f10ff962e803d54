use std::collections::HashMap;

use bytes::Bytes;
use chrono::NaiveDate;
use common::errors::{ReportError, CORS_HEADERS};
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full};
use hyper::{Response, StatusCode};
use serde::Serialize;

pub type ReportResponse = Response<BoxBody<Bytes, hyper::Error>>;

pub fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty() -> BoxBody<Bytes, hyper::Error> {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

fn with_cors(mut builder: hyper::http::response::Builder) -> hyper::http::response::Builder {
    for (name, value) in CORS_HEADERS {
        builder = builder.header(*name, *value);
    }
    builder
}

/// 200 response with `value` as the JSON body.
pub fn json_response<T: Serialize>(value: &T) -> Result<ReportResponse, ReportError> {
    let json = serde_json::to_string(value)
        .map_err(|e| ReportError::InternalServerError(format!("failed to encode report: {}", e)))?;

    let response = with_cors(Response::builder())
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(full(json))?;
    Ok(response)
}

/// Preflight answer for any known path.
pub fn no_content() -> Result<ReportResponse, ReportError> {
    let response = with_cors(Response::builder())
        .status(StatusCode::NO_CONTENT)
        .header("Allow", "GET, OPTIONS")
        .body(empty())?;
    Ok(response)
}

/// Decodes a raw query string. Later duplicates win.
pub fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Reads an optional `YYYY-MM-DD` parameter. Blank counts as absent.
pub fn optional_date(
    params: &HashMap<String, String>,
    name: &str,
) -> Result<Option<NaiveDate>, ReportError> {
    match params.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                ReportError::InvalidRequest(format!(
                    "{} must be a date formatted YYYY-MM-DD, got '{}'",
                    name, value
                ))
            }),
        None => Ok(None),
    }
}

/// Reads an optional parameter with `FromStr`, rejecting values that do not parse.
pub fn optional_param<T>(
    params: &HashMap<String, String>,
    name: &str,
) -> Result<Option<T>, ReportError>
where
    T: std::str::FromStr,
{
    match params.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(value) => value.parse::<T>().map(Some).map_err(|_| {
            ReportError::InvalidRequest(format!("invalid value '{}' for {}", value, name))
        }),
        None => Ok(None),
    }
}
