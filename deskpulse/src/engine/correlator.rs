use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};

use common::consts::DEFAULT_RESPONSE_WINDOW_MINUTES;

use super::grouper::Conversation;
use crate::store::{Direction, Message};

/// Bucket a message or sample falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BucketKey {
    Hour(u32),
    Day(NaiveDate),
}

impl BucketKey {
    /// `"HH:00"` for hours, `"YYYY-MM-DD"` for days.
    pub fn label(&self) -> String {
        match self {
            BucketKey::Hour(hour) => format!("{:02}:00", hour),
            BucketKey::Day(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// How a report slices time. Timestamps outside the report's range map to no bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucketing {
    /// 24 hour-of-day buckets of a single local date.
    Hourly { date: NaiveDate },
    /// One bucket per local date between two inclusive bounds.
    Daily { start: NaiveDate, end: NaiveDate },
}

impl Bucketing {
    pub fn bucket_of(&self, timestamp: &DateTime<FixedOffset>) -> Option<BucketKey> {
        let date = timestamp.date_naive();
        match *self {
            Bucketing::Hourly { date: day } if date == day => {
                Some(BucketKey::Hour(timestamp.hour()))
            }
            Bucketing::Daily { start, end } if start <= date && date <= end => {
                Some(BucketKey::Day(date))
            }
            _ => None,
        }
    }

    /// Every bucket of the report in display order, including empty ones.
    pub fn keys(&self) -> Vec<BucketKey> {
        match *self {
            Bucketing::Hourly { .. } => (0..24).map(BucketKey::Hour).collect(),
            Bucketing::Daily { start, end } => start
                .iter_days()
                .take_while(|day| *day <= end)
                .map(BucketKey::Day)
                .collect(),
        }
    }
}

/// Latency between a customer message and the first team reply after it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSample {
    pub conversation_id: String,
    /// Local timestamp of the customer message the sample is anchored on.
    pub anchored_at: DateTime<FixedOffset>,
    pub latency_minutes: f64,
}

impl ResponseSample {
    pub fn bucket(&self, bucketing: &Bucketing) -> Option<BucketKey> {
        bucketing.bucket_of(&self.anchored_at)
    }
}

/// Pairs customer messages with the team reply that answered them.
#[derive(Debug, Clone, Copy)]
pub struct ResponseCorrelator {
    window_minutes: f64,
}

impl ResponseCorrelator {
    pub fn new(window_minutes: f64) -> Self {
        Self { window_minutes }
    }

    pub fn window_minutes(&self) -> f64 {
        self.window_minutes
    }

    /// Single forward pass: customer messages wait in `pending` until the next
    /// team message drains them, so one reply can close several anchors.
    pub fn correlate(&self, conversation: &Conversation<'_>) -> Vec<ResponseSample> {
        let mut samples = Vec::new();
        let mut pending: Vec<&Message> = Vec::new();

        for &message in &conversation.messages {
            match message.direction {
                Direction::Customer => pending.push(message),
                Direction::Team => {
                    samples.extend(
                        pending
                            .drain(..)
                            .filter_map(|anchor| self.sample(conversation.id, anchor, message)),
                    );
                }
                Direction::Other => {}
            }
        }
        samples
    }

    pub fn correlate_all(&self, conversations: &[Conversation<'_>]) -> Vec<ResponseSample> {
        conversations
            .iter()
            .flat_map(|conversation| self.correlate(conversation))
            .collect()
    }

    fn sample(
        &self,
        conversation_id: &str,
        anchor: &Message,
        reply: &Message,
    ) -> Option<ResponseSample> {
        let latency_minutes =
            (reply.timestamp - anchor.timestamp).num_milliseconds() as f64 / 60_000.0;
        if latency_minutes <= 0.0 || latency_minutes >= self.window_minutes {
            return None;
        }
        Some(ResponseSample {
            conversation_id: conversation_id.to_string(),
            anchored_at: anchor.timestamp,
            latency_minutes,
        })
    }
}

impl Default for ResponseCorrelator {
    fn default() -> Self {
        Self::new(DEFAULT_RESPONSE_WINDOW_MINUTES)
    }
}

/// English day name used by the period report.
pub fn day_of_week(date: NaiveDate) -> String {
    date.format("%A").to_string()
}
