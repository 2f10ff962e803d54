use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::errors::ReportError;

use super::utils::{json_response, optional_param, ReportResponse};
use crate::engine::Priority;
use crate::service::{AlertsQuery, ReportService};

/// `GET /alerts?limit=&priority=`
pub async fn list_alerts(
    params: &HashMap<String, String>,
    service: &ReportService,
    now: DateTime<Utc>,
) -> Result<ReportResponse, ReportError> {
    let query = AlertsQuery {
        limit: optional_param::<usize>(params, "limit")?,
        priority: optional_param::<Priority>(params, "priority")?,
    };
    let page = service.alerts_report(&query, now).await?;
    json_response(&page)
}
