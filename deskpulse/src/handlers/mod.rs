pub mod activity;
pub mod alerts;
pub mod groups;
pub mod metrics;
pub mod utils;

#[cfg(test)]
mod integration_tests;

use chrono::{DateTime, Utc};
use common::consts::{
    ALERTS_PATH, GROUPS_OVERVIEW_PATH, HEALTHZ_PATH, HOURLY_ACTIVITY_PATH, PERIOD_ACTIVITY_PATH,
    TODAY_METRICS_PATH,
};
use common::errors::ReportError;
use hyper::Method;
use serde_json::json;
use tracing::{debug, warn};

use crate::service::ReportService;
use utils::{json_response, no_content, parse_query, ReportResponse};

const REPORT_PATHS: &[&str] = &[
    HOURLY_ACTIVITY_PATH,
    PERIOD_ACTIVITY_PATH,
    ALERTS_PATH,
    GROUPS_OVERVIEW_PATH,
    TODAY_METRICS_PATH,
];

/// Dispatches one request to its report. Errors are rendered here so the
/// server loop always gets a response.
pub async fn route(
    method: &Method,
    path: &str,
    query: Option<&str>,
    service: &ReportService,
    now: DateTime<Utc>,
) -> ReportResponse {
    let result = dispatch(method, path, query, service, now).await;
    result.unwrap_or_else(|err| {
        if err.status().is_server_error() {
            warn!(path, error = %err, "report failed");
        } else {
            debug!(path, error = %err, "rejected request");
        }
        err.into_response()
    })
}

async fn dispatch(
    method: &Method,
    path: &str,
    query: Option<&str>,
    service: &ReportService,
    now: DateTime<Utc>,
) -> Result<ReportResponse, ReportError> {
    if method == Method::OPTIONS && REPORT_PATHS.contains(&path) {
        return no_content();
    }

    let params = parse_query(query);
    match (method, path) {
        (&Method::GET, HOURLY_ACTIVITY_PATH) => {
            activity::hourly_activity(&params, service, now).await
        }
        (&Method::GET, PERIOD_ACTIVITY_PATH) => activity::period_activity(&params, service).await,
        (&Method::GET, ALERTS_PATH) => alerts::list_alerts(&params, service, now).await,
        (&Method::GET, GROUPS_OVERVIEW_PATH) => groups::groups_overview(service, now).await,
        (&Method::GET, TODAY_METRICS_PATH) => metrics::today_metrics(service, now).await,
        (&Method::GET, HEALTHZ_PATH) => json_response(&json!({ "status": "ok" })),
        _ => Err(ReportError::NotFound(format!("{} {}", method, path))),
    }
}
