use std::cmp::Reverse;

use chrono::{DateTime, Duration, Utc};
use common::consts::{DEFAULT_GRACE_PERIOD_MINUTES, RESPONSE_TIME_UNIT};
use serde::Serialize;
use tracing::debug;

use super::grouper::Conversation;
use super::priority::{Priority, WaitClassifier};
use crate::signals::NoiseClassifier;
use crate::store::Message;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastMessage {
    pub text: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitingTime {
    pub value: i64,
    pub unit: &'static str,
}

/// An unanswered customer message that needs attention.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Id of the customer message the alert is anchored on.
    pub id: String,
    pub group_id: String,
    pub group_name: String,
    pub client_name: Option<String>,
    pub last_message: LastMessage,
    pub waiting_time: WaitingTime,
    pub priority: Priority,
    pub message_count: usize,
}

impl Alert {
    pub fn waiting_minutes(&self) -> i64 {
        self.waiting_time.value
    }
}

/// Builds and ranks alerts for unanswered conversations.
#[derive(Clone)]
pub struct AlertAssembler {
    grace_period: Duration,
    noise: NoiseClassifier,
    wait: WaitClassifier,
}

impl AlertAssembler {
    pub fn new(grace_period_minutes: i64, noise: NoiseClassifier, wait: WaitClassifier) -> Self {
        Self {
            grace_period: Duration::minutes(grace_period_minutes),
            noise,
            wait,
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Latest customer message that should anchor an alert, with its index.
    ///
    /// Messages younger than the grace period are always accepted; older ones
    /// are skipped while they read as closing remarks.
    pub fn select_anchor<'a>(
        &self,
        conversation: &Conversation<'a>,
        now: DateTime<Utc>,
    ) -> Option<(usize, &'a Message)> {
        conversation
            .messages
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, message)| message.is_customer())
            .find(|(_, message)| {
                let elapsed = now.signed_duration_since(message.timestamp);
                elapsed < self.grace_period || !self.noise.is_irrelevant(message.text.as_deref())
            })
            .map(|(index, message)| (index, *message))
    }

    /// Anchor that no team message has answered yet.
    pub fn open_anchor<'a>(
        &self,
        conversation: &Conversation<'a>,
        now: DateTime<Utc>,
    ) -> Option<&'a Message> {
        let (index, anchor) = self.select_anchor(conversation, now)?;
        let answered = conversation.messages[index + 1..]
            .iter()
            .any(|message| message.is_team());
        (!answered).then_some(anchor)
    }

    /// Alert for one conversation, with an empty group name.
    pub fn alert_for(&self, conversation: &Conversation<'_>, now: DateTime<Utc>) -> Option<Alert> {
        let anchor = self.open_anchor(conversation, now)?;

        let waiting_minutes = now
            .signed_duration_since(anchor.timestamp)
            .num_minutes()
            .max(0);
        let priority = self.wait.classify(waiting_minutes);

        debug!(
            conversation_id = %conversation.id,
            message_id = %anchor.id,
            waiting_minutes,
            priority = %priority,
            "unanswered customer message"
        );

        Some(Alert {
            id: anchor.id.clone(),
            group_id: conversation.id.to_string(),
            group_name: String::new(),
            client_name: anchor.sender_name.clone(),
            last_message: LastMessage {
                text: anchor.text.clone(),
                timestamp: anchor.raw_timestamp.clone(),
            },
            waiting_time: WaitingTime {
                value: waiting_minutes,
                unit: RESPONSE_TIME_UNIT,
            },
            priority,
            message_count: conversation.len(),
        })
    }

    /// One alert per open conversation, most urgent first.
    pub fn assemble(&self, conversations: &[Conversation<'_>], now: DateTime<Utc>) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = conversations
            .iter()
            .filter_map(|conversation| self.alert_for(conversation, now))
            .collect();
        sort_alerts(&mut alerts);
        alerts
    }
}

impl Default for AlertAssembler {
    fn default() -> Self {
        Self::new(
            DEFAULT_GRACE_PERIOD_MINUTES,
            NoiseClassifier::default(),
            WaitClassifier::default(),
        )
    }
}

/// Priority rank ascending, then longest wait first. Group id breaks the
/// remaining ties so output is deterministic.
pub fn sort_alerts(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| {
        (a.priority.rank(), Reverse(a.waiting_minutes()), &a.group_id).cmp(&(
            b.priority.rank(),
            Reverse(b.waiting_minutes()),
            &b.group_id,
        ))
    });
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsPage {
    pub alerts: Vec<Alert>,
    pub total: usize,
    pub page: usize,
    pub has_more: bool,
}

impl AlertsPage {
    /// Keeps the first `limit` of already sorted alerts.
    pub fn paginate(mut alerts: Vec<Alert>, limit: usize) -> Self {
        let total = alerts.len();
        alerts.truncate(limit);
        Self {
            alerts,
            total,
            page: 1,
            has_more: total > limit,
        }
    }
}
