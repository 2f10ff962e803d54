use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use common::configuration::EngineSettings;
use common::consts::MAX_PERIOD_DAYS;
use common::errors::ReportError;
use tracing::{debug, info, instrument, warn};

use crate::engine::alerts::AlertsPage;
use crate::engine::{
    group_conversations, reporting_offset, AlertAssembler, GroupsOverview, HourlyReport,
    MetricsAggregator, OverviewBuilder, PeriodReport, Priority, ResponseCorrelator, Snapshot,
    TodayMetrics, WaitClassifier,
};
use crate::signals::{LevenshteinSimilarity, NoiseClassifier, DEFAULT_CLOSING_PHRASES};
use crate::store::{GroupNameResolver, MessageStore};

/// Validated parameters of the period report.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub group_id: Option<String>,
}

impl PeriodQuery {
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        group_id: Option<String>,
    ) -> Result<Self, ReportError> {
        if end < start {
            return Err(ReportError::InvalidRequest(format!(
                "endDate {} is before startDate {}",
                end, start
            )));
        }
        let days = end.signed_duration_since(start).num_days() + 1;
        if days > MAX_PERIOD_DAYS {
            return Err(ReportError::InvalidRequest(format!(
                "period of {} days exceeds the maximum of {} days",
                days, MAX_PERIOD_DAYS
            )));
        }
        Ok(Self {
            start,
            end,
            group_id: group_id.filter(|id| !id.is_empty()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertsQuery {
    pub limit: Option<usize>,
    pub priority: Option<Priority>,
}

/// Answers the dashboard reports. Every call takes one fresh snapshot of the
/// store and derives everything from it.
pub struct ReportService {
    store: Arc<dyn MessageStore>,
    names: Arc<dyn GroupNameResolver>,
    tenant: Option<String>,
    offset: FixedOffset,
    correlator: ResponseCorrelator,
    alerts: AlertAssembler,
    idle_after_minutes: i64,
    default_alerts_limit: usize,
}

impl ReportService {
    pub fn new(
        store: Arc<dyn MessageStore>,
        names: Arc<dyn GroupNameResolver>,
        settings: &EngineSettings,
        tenant: Option<String>,
    ) -> Self {
        let noise = match &settings.closing_phrases {
            Some(phrases) => NoiseClassifier::with_settings(
                phrases,
                Arc::new(LevenshteinSimilarity),
                settings.similarity_threshold,
            ),
            None => NoiseClassifier::with_settings(
                DEFAULT_CLOSING_PHRASES.iter().copied(),
                Arc::new(LevenshteinSimilarity),
                settings.similarity_threshold,
            ),
        };
        let wait = WaitClassifier::new(settings.medium_after_minutes, settings.high_after_minutes);

        Self {
            store,
            names,
            tenant,
            offset: reporting_offset(settings.utc_offset_hours),
            correlator: ResponseCorrelator::new(settings.response_window_minutes),
            alerts: AlertAssembler::new(settings.grace_period_minutes, noise, wait),
            idle_after_minutes: settings.idle_after_minutes,
            default_alerts_limit: settings.default_alerts_limit,
        }
    }

    /// Local calendar date of `now` in the reporting offset.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    async fn snapshot(&self) -> Result<Snapshot, ReportError> {
        let stored = self
            .store
            .list_all_messages(self.tenant.as_deref())
            .await
            .map_err(|err| {
                warn!(error = %err, "failed to list messages");
                ReportError::StoreUnavailable(err.to_string())
            })?;

        let snapshot = Snapshot::from_stored(&stored, self.offset);
        debug!(
            messages = snapshot.len(),
            skipped = snapshot.skipped,
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    async fn group_name(&self, conversation_id: &str) -> String {
        self.names.resolve_name(conversation_id).await
    }

    fn aggregator(&self) -> MetricsAggregator {
        MetricsAggregator::new(self.correlator)
    }

    #[instrument(skip(self, now), fields(date = ?date))]
    pub async fn hourly_report(
        &self,
        date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<HourlyReport, ReportError> {
        let date = date.unwrap_or_else(|| self.local_date(now));
        let snapshot = self.snapshot().await?;
        let report = self.aggregator().hourly(&snapshot.messages, date);

        info!(
            date = %report.date,
            total_messages = report.summary.total_messages,
            "hourly report"
        );
        Ok(report)
    }

    #[instrument(skip(self, query), fields(start = %query.start, end = %query.end))]
    pub async fn period_report(&self, query: &PeriodQuery) -> Result<PeriodReport, ReportError> {
        let snapshot = self.snapshot().await?;
        let report = self.aggregator().period(
            &snapshot.messages,
            query.start,
            query.end,
            query.group_id.as_deref(),
        );

        info!(
            days = report.data.len(),
            total_messages = report.summary.total_messages,
            "period report"
        );
        Ok(report)
    }

    #[instrument(skip(self, query, now), fields(limit = ?query.limit, priority = ?query.priority))]
    pub async fn alerts_report(
        &self,
        query: &AlertsQuery,
        now: DateTime<Utc>,
    ) -> Result<AlertsPage, ReportError> {
        let snapshot = self.snapshot().await?;
        let conversations = group_conversations(&snapshot.messages);

        let mut alerts = self.alerts.assemble(&conversations, now);
        if let Some(priority) = query.priority {
            alerts.retain(|alert| alert.priority == priority);
        }

        let limit = query.limit.unwrap_or(self.default_alerts_limit);
        let mut page = AlertsPage::paginate(alerts, limit);
        // names only for the rows that are returned
        for alert in &mut page.alerts {
            alert.group_name = self.group_name(&alert.group_id).await;
        }

        info!(total = page.total, returned = page.alerts.len(), "alerts report");
        Ok(page)
    }

    #[instrument(skip(self, now))]
    pub async fn groups_overview(&self, now: DateTime<Utc>) -> Result<GroupsOverview, ReportError> {
        let snapshot = self.snapshot().await?;
        let conversations = group_conversations(&snapshot.messages);

        let builder = OverviewBuilder::new(self.correlator, &self.alerts, self.idle_after_minutes);
        let mut groups = builder.build(&conversations, self.local_date(now), now);
        for group in &mut groups {
            let name = self.group_name(&group.id).await;
            if !name.is_empty() {
                group.name = name;
            }
        }

        info!(groups = groups.len(), "groups overview");
        Ok(GroupsOverview { groups })
    }

    #[instrument(skip(self, now))]
    pub async fn today_metrics(&self, now: DateTime<Utc>) -> Result<TodayMetrics, ReportError> {
        let snapshot = self.snapshot().await?;
        let metrics = self
            .aggregator()
            .today(&snapshot.messages, self.local_date(now));

        info!(date = %metrics.date, "today metrics");
        Ok(metrics)
    }
}
