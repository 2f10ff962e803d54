use chrono::{DateTime, Utc};
use common::errors::ReportError;

use super::utils::{json_response, ReportResponse};
use crate::service::ReportService;

/// `GET /metrics/today`: today's totals against yesterday's.
pub async fn today_metrics(
    service: &ReportService,
    now: DateTime<Utc>,
) -> Result<ReportResponse, ReportError> {
    let metrics = service.today_metrics(now).await?;
    json_response(&metrics)
}
