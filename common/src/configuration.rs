use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_ALERTS_LIMIT, DEFAULT_GRACE_PERIOD_MINUTES, DEFAULT_HIGH_PRIORITY_MINUTES,
    DEFAULT_IDLE_AFTER_MINUTES, DEFAULT_MEDIUM_PRIORITY_MINUTES, DEFAULT_RESPONSE_WINDOW_MINUTES,
    DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_STORE_PAGE_SIZE, DEFAULT_UTC_OFFSET_HOURS,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub version: String,
    pub store: StoreConfig,
    pub alerts: Option<AlertsConfig>,
    pub reporting: Option<ReportingConfig>,
    pub tracing: Option<Tracing>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(rename = "type")]
    pub store_type: StoreType,
    pub connection_string: Option<String>,
    /// Rows fetched per round trip when listing the whole message table.
    pub page_size: Option<i64>,
    /// Restricts every snapshot to a single tenant when set.
    pub tenant: Option<String>,
    /// JSON file with `{"messages": [...], "groups": {...}}` used to seed the memory store.
    pub seed_file: Option<String>,
}

impl StoreConfig {
    pub fn page_size(&self) -> i64 {
        self.page_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_STORE_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AlertsConfig {
    pub grace_period_minutes: Option<i64>,
    pub medium_after_minutes: Option<i64>,
    pub high_after_minutes: Option<i64>,
    pub default_limit: Option<usize>,
    pub similarity_threshold: Option<f64>,
    pub closing_phrases: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReportingConfig {
    pub utc_offset_hours: Option<i32>,
    pub response_window_minutes: Option<f64>,
    pub idle_after_minutes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Tracing {
    pub random_sampling: Option<u32>,
    pub opentracing_grpc_endpoint: Option<String>,
}

/// Fully resolved engine settings, every optional knob replaced by its default.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub utc_offset_hours: i32,
    pub response_window_minutes: f64,
    pub grace_period_minutes: i64,
    pub medium_after_minutes: i64,
    pub high_after_minutes: i64,
    pub idle_after_minutes: i64,
    pub default_alerts_limit: usize,
    pub similarity_threshold: f64,
    pub closing_phrases: Option<Vec<String>>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            response_window_minutes: DEFAULT_RESPONSE_WINDOW_MINUTES,
            grace_period_minutes: DEFAULT_GRACE_PERIOD_MINUTES,
            medium_after_minutes: DEFAULT_MEDIUM_PRIORITY_MINUTES,
            high_after_minutes: DEFAULT_HIGH_PRIORITY_MINUTES,
            idle_after_minutes: DEFAULT_IDLE_AFTER_MINUTES,
            default_alerts_limit: DEFAULT_ALERTS_LIMIT,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            closing_phrases: None,
        }
    }
}

impl From<&Configuration> for EngineSettings {
    fn from(config: &Configuration) -> Self {
        let defaults = EngineSettings::default();
        let alerts = config.alerts.clone().unwrap_or_default();
        let reporting = config.reporting.clone().unwrap_or_default();

        Self {
            utc_offset_hours: reporting
                .utc_offset_hours
                .unwrap_or(defaults.utc_offset_hours),
            response_window_minutes: reporting
                .response_window_minutes
                .unwrap_or(defaults.response_window_minutes),
            grace_period_minutes: alerts
                .grace_period_minutes
                .unwrap_or(defaults.grace_period_minutes),
            medium_after_minutes: alerts
                .medium_after_minutes
                .unwrap_or(defaults.medium_after_minutes),
            high_after_minutes: alerts
                .high_after_minutes
                .unwrap_or(defaults.high_after_minutes),
            idle_after_minutes: reporting
                .idle_after_minutes
                .unwrap_or(defaults.idle_after_minutes),
            default_alerts_limit: alerts.default_limit.unwrap_or(defaults.default_alerts_limit),
            similarity_threshold: alerts
                .similarity_threshold
                .unwrap_or(defaults.similarity_threshold),
            closing_phrases: alerts.closing_phrases,
        }
    }
}
