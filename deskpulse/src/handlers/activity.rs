use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::errors::ReportError;

use super::utils::{json_response, optional_date, ReportResponse};
use crate::service::{PeriodQuery, ReportService};

/// `GET /activity/hourly?date=YYYY-MM-DD`, date defaults to the local today.
pub async fn hourly_activity(
    params: &HashMap<String, String>,
    service: &ReportService,
    now: DateTime<Utc>,
) -> Result<ReportResponse, ReportError> {
    let date = optional_date(params, "date")?;
    let report = service.hourly_report(date, now).await?;
    json_response(&report)
}

/// `GET /activity/weekly?startDate=&endDate=&groupId=`
///
/// Both bounds are required and validated before the store is read.
pub async fn period_activity(
    params: &HashMap<String, String>,
    service: &ReportService,
) -> Result<ReportResponse, ReportError> {
    let start = optional_date(params, "startDate")?;
    let end = optional_date(params, "endDate")?;

    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        (start, end) => {
            let missing = [("startDate", start.is_none()), ("endDate", end.is_none())]
                .into_iter()
                .filter(|(_, missing)| *missing)
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(ReportError::MissingParameters(missing));
        }
    };

    let query = PeriodQuery::new(start, end, params.get("groupId").cloned())?;
    let report = service.period_report(&query).await?;
    json_response(&report)
}
