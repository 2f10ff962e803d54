//! Pure reporting engine. Everything here works on one immutable snapshot and
//! an explicit `now`; nothing touches the store or the clock.

use chrono::{FixedOffset, Offset, Utc};
use tracing::warn;

use crate::store::{Message, StoredMessage};

pub mod alerts;
pub mod correlator;
pub mod grouper;
pub mod metrics;
pub mod overview;
pub mod priority;

pub use alerts::{Alert, AlertAssembler, AlertsPage};
pub use correlator::{BucketKey, Bucketing, ResponseCorrelator, ResponseSample};
pub use grouper::{group_conversations, Conversation};
pub use metrics::{DayMetrics, HourlyReport, MetricsAggregator, PeriodReport, TodayMetrics};
pub use overview::{GroupOverview, GroupStatus, GroupsOverview, OverviewBuilder};
pub use priority::{Priority, WaitClassifier};

/// Fixed offset every timestamp is shifted into before bucketing.
pub fn reporting_offset(utc_offset_hours: i32) -> FixedOffset {
    utc_offset_hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| {
            warn!(utc_offset_hours, "invalid reporting offset, falling back to UTC");
            Utc.fix()
        })
}

/// Parsed view of one store listing.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub messages: Vec<Message>,
    /// Records dropped because their timestamp could not be parsed.
    pub skipped: usize,
}

impl Snapshot {
    pub fn from_stored(stored: &[StoredMessage], offset: FixedOffset) -> Self {
        let mut snapshot = Snapshot {
            messages: Vec::with_capacity(stored.len()),
            skipped: 0,
        };

        for record in stored {
            match Message::from_stored(record, offset) {
                Ok(message) => snapshot.messages.push(message),
                Err(err) => {
                    warn!(message_id = %record.id, error = %err, "skipping message");
                    snapshot.skipped += 1;
                }
            }
        }
        snapshot
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Rounds to two decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
