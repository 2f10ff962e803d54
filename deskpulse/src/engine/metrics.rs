use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use common::consts::RESPONSE_TIME_UNIT;
use serde::Serialize;

use super::correlator::{day_of_week, BucketKey, Bucketing, ResponseCorrelator, ResponseSample};
use super::grouper::group_conversations;
use super::{mean, round2};
use crate::store::Message;

/// Counts and mean latency for one hour or one day.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsBucket {
    pub key: BucketKey,
    pub message_count: usize,
    /// Two-decimal mean of the bucket's samples, 0 when there are none.
    pub average_response_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub total_messages: usize,
    pub average_response_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseTime {
    pub average: f64,
    pub unit: &'static str,
}

impl ResponseTime {
    fn minutes(average: f64) -> Self {
        Self {
            average,
            unit: RESPONSE_TIME_UNIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPoint {
    pub hour: String,
    pub messages: usize,
    pub response_time: ResponseTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyReport {
    pub date: String,
    pub data: Vec<HourlyPoint>,
    pub summary: MetricsSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: String,
    pub day_of_week: String,
    pub messages: usize,
    pub response_time: ResponseTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodReport {
    pub period: Period,
    pub data: Vec<DailyPoint>,
    pub summary: MetricsSummary,
}

/// Activity of a single local day, computed from that day's messages only.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DayMetrics {
    pub total_messages: usize,
    pub average_response_time: f64,
    pub active_groups: usize,
    pub waiting_clients: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    Increase,
    Decrease,
}

/// Change of a metric against the previous day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsDelta<T> {
    pub value: T,
    #[serde(rename = "type")]
    pub direction: ChangeDirection,
}

impl MetricsDelta<usize> {
    pub fn counts(today: usize, yesterday: usize) -> Self {
        if yesterday == 0 || today >= yesterday {
            // a zero baseline reports today's value as the whole increase
            return Self {
                value: today - yesterday,
                direction: ChangeDirection::Increase,
            };
        }
        Self {
            value: yesterday - today,
            direction: ChangeDirection::Decrease,
        }
    }
}

impl MetricsDelta<f64> {
    pub fn averages(today: f64, yesterday: f64) -> Self {
        if yesterday == 0.0 {
            return Self {
                value: today,
                direction: ChangeDirection::Increase,
            };
        }
        let diff = today - yesterday;
        Self {
            value: round2(diff.abs()),
            direction: if diff >= 0.0 {
                ChangeDirection::Increase
            } else {
                ChangeDirection::Decrease
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountMetric {
    pub value: usize,
    pub change: MetricsDelta<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageMetric {
    pub value: f64,
    pub unit: &'static str,
    pub change: MetricsDelta<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayMetricsBody {
    pub total_messages: CountMetric,
    pub average_response_time: AverageMetric,
    pub active_groups: CountMetric,
    pub waiting_clients: CountMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayMetrics {
    pub date: String,
    pub metrics: TodayMetricsBody,
}

impl TodayMetrics {
    pub fn compare(date: NaiveDate, today: DayMetrics, yesterday: DayMetrics) -> Self {
        let count = |today: usize, yesterday: usize| CountMetric {
            value: today,
            change: MetricsDelta::counts(today, yesterday),
        };

        Self {
            date: date.format("%Y-%m-%d").to_string(),
            metrics: TodayMetricsBody {
                total_messages: count(today.total_messages, yesterday.total_messages),
                average_response_time: AverageMetric {
                    value: today.average_response_time,
                    unit: RESPONSE_TIME_UNIT,
                    change: MetricsDelta::averages(
                        today.average_response_time,
                        yesterday.average_response_time,
                    ),
                },
                active_groups: count(today.active_groups, yesterday.active_groups),
                waiting_clients: count(today.waiting_clients, yesterday.waiting_clients),
            },
        }
    }
}

/// Buckets message counts and response samples for the activity reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsAggregator {
    correlator: ResponseCorrelator,
}

impl MetricsAggregator {
    pub fn new(correlator: ResponseCorrelator) -> Self {
        Self { correlator }
    }

    /// Every bucket of `bucketing` in order plus the summary over them.
    ///
    /// Correlation runs over the complete conversations, so a reply landing
    /// after the range still closes a sample anchored inside it.
    pub fn aggregate<'a, I>(
        &self,
        messages: I,
        bucketing: &Bucketing,
    ) -> (Vec<MetricsBucket>, MetricsSummary)
    where
        I: IntoIterator<Item = &'a Message>,
    {
        let conversations = group_conversations(messages);

        let mut counts: HashMap<BucketKey, usize> = HashMap::new();
        for conversation in &conversations {
            for message in &conversation.messages {
                if let Some(key) = bucketing.bucket_of(&message.timestamp) {
                    *counts.entry(key).or_default() += 1;
                }
            }
        }

        let mut latencies: HashMap<BucketKey, Vec<f64>> = HashMap::new();
        for sample in self.correlator.correlate_all(&conversations) {
            if let Some(key) = sample.bucket(bucketing) {
                latencies
                    .entry(key)
                    .or_default()
                    .push(sample.latency_minutes);
            }
        }

        let buckets: Vec<MetricsBucket> = bucketing
            .keys()
            .into_iter()
            .map(|key| MetricsBucket {
                key,
                message_count: counts.get(&key).copied().unwrap_or_default(),
                average_response_minutes: latencies
                    .get(&key)
                    .and_then(|values| mean(values.iter().copied()))
                    .map(round2)
                    .unwrap_or_default(),
            })
            .collect();

        let summary = MetricsSummary {
            total_messages: buckets.iter().map(|b| b.message_count).sum(),
            average_response_time: mean(latencies.values().flatten().copied())
                .map(round2)
                .unwrap_or_default(),
        };
        (buckets, summary)
    }

    pub fn hourly(&self, messages: &[Message], date: NaiveDate) -> HourlyReport {
        let (buckets, summary) = self.aggregate(messages, &Bucketing::Hourly { date });
        HourlyReport {
            date: date.format("%Y-%m-%d").to_string(),
            data: buckets
                .into_iter()
                .map(|bucket| HourlyPoint {
                    hour: bucket.key.label(),
                    messages: bucket.message_count,
                    response_time: ResponseTime::minutes(bucket.average_response_minutes),
                })
                .collect(),
            summary,
        }
    }

    /// Daily report between two inclusive dates, optionally for one conversation.
    pub fn period(
        &self,
        messages: &[Message],
        start: NaiveDate,
        end: NaiveDate,
        conversation_id: Option<&str>,
    ) -> PeriodReport {
        let selected = messages
            .iter()
            .filter(|m| conversation_id.map_or(true, |id| m.conversation_id == id));
        let (buckets, summary) = self.aggregate(selected, &Bucketing::Daily { start, end });

        PeriodReport {
            period: Period {
                start: start.format("%Y-%m-%d").to_string(),
                end: end.format("%Y-%m-%d").to_string(),
            },
            data: buckets
                .into_iter()
                .filter_map(|bucket| match bucket.key {
                    BucketKey::Day(date) => Some(DailyPoint {
                        date: bucket.key.label(),
                        day_of_week: day_of_week(date),
                        messages: bucket.message_count,
                        response_time: ResponseTime::minutes(bucket.average_response_minutes),
                    }),
                    BucketKey::Hour(_) => None,
                })
                .collect(),
            summary,
        }
    }

    /// Metrics of one local day. Replies on a later day do not count here.
    pub fn day_metrics(&self, messages: &[Message], date: NaiveDate) -> DayMetrics {
        let conversations =
            group_conversations(messages.iter().filter(|m| m.timestamp.date_naive() == date));

        let samples: Vec<ResponseSample> = self.correlator.correlate_all(&conversations);
        let active: HashSet<&str> = conversations.iter().map(|c| c.id).collect();

        DayMetrics {
            total_messages: conversations.iter().map(|c| c.len()).sum(),
            average_response_time: mean(samples.iter().map(|s| s.latency_minutes))
                .map(round2)
                .unwrap_or_default(),
            active_groups: active.len(),
            waiting_clients: conversations
                .iter()
                .filter(|c| c.last().is_some_and(|m| m.is_customer()))
                .count(),
        }
    }

    pub fn today(&self, messages: &[Message], today: NaiveDate) -> TodayMetrics {
        let yesterday = today.pred_opt().unwrap_or(today);
        TodayMetrics::compare(
            today,
            self.day_metrics(messages, today),
            self.day_metrics(messages, yesterday),
        )
    }
}
