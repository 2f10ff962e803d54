pub const HOURLY_ACTIVITY_PATH: &str = "/activity/hourly";
pub const PERIOD_ACTIVITY_PATH: &str = "/activity/weekly";
pub const ALERTS_PATH: &str = "/alerts";
pub const GROUPS_OVERVIEW_PATH: &str = "/groups/overview";
pub const TODAY_METRICS_PATH: &str = "/metrics/today";
pub const HEALTHZ_PATH: &str = "/healthz";

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:9092";
pub const DEFAULT_CONFIG_PATH: &str = "./deskpulse_config.yaml";

/// Local reporting offset of the support team (UTC-3).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = -3;
/// Replies outside `(0, window)` minutes are not counted as response samples.
pub const DEFAULT_RESPONSE_WINDOW_MINUTES: f64 = 180.0;
pub const DEFAULT_GRACE_PERIOD_MINUTES: i64 = 10;
pub const DEFAULT_MEDIUM_PRIORITY_MINUTES: i64 = 60;
pub const DEFAULT_HIGH_PRIORITY_MINUTES: i64 = 120;
pub const DEFAULT_IDLE_AFTER_MINUTES: i64 = 300;
pub const DEFAULT_ALERTS_LIMIT: usize = 10;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 85.0;
pub const DEFAULT_STORE_PAGE_SIZE: i64 = 500;
/// Longest inclusive date range the period report accepts.
pub const MAX_PERIOD_DAYS: i64 = 366;

pub const RESPONSE_TIME_UNIT: &str = "minutes";
