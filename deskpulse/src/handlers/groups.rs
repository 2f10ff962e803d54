use chrono::{DateTime, Utc};
use common::errors::ReportError;

use super::utils::{json_response, ReportResponse};
use crate::service::ReportService;

pub async fn groups_overview(
    service: &ReportService,
    now: DateTime<Utc>,
) -> Result<ReportResponse, ReportError> {
    let overview = service.groups_overview(now).await?;
    json_response(&overview)
}
