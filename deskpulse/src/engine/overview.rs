use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, Utc};
use common::consts::DEFAULT_IDLE_AFTER_MINUTES;
use serde::Serialize;

use super::alerts::AlertAssembler;
use super::correlator::ResponseCorrelator;
use super::grouper::Conversation;
use super::{mean, round2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Waiting,
    Idle,
    Active,
}

/// Dashboard row for one conversation group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOverview {
    pub id: String,
    pub name: String,
    pub today_messages: usize,
    pub avg_response_time: String,
    pub last_activity: String,
    pub status: GroupStatus,
    #[serde(skip)]
    pub last_activity_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupsOverview {
    pub groups: Vec<GroupOverview>,
}

/// `"<m> min"` using the floor of the mean, `"-"` when there is nothing to show.
pub fn format_average(average_minutes: Option<f64>) -> String {
    match average_minutes.map(round2) {
        Some(minutes) if minutes > 0.0 => format!("{} min", minutes.floor() as i64),
        _ => "-".to_string(),
    }
}

/// Relative time label, minutes below an hour and whole hours above.
pub fn format_elapsed(elapsed_minutes: i64) -> String {
    let minutes = elapsed_minutes.max(0);
    if minutes < 60 {
        format!("há {}min", minutes)
    } else {
        format!("há {}h", minutes / 60)
    }
}

pub struct OverviewBuilder<'a> {
    correlator: ResponseCorrelator,
    alerts: &'a AlertAssembler,
    idle_after_minutes: i64,
}

impl<'a> OverviewBuilder<'a> {
    pub fn new(
        correlator: ResponseCorrelator,
        alerts: &'a AlertAssembler,
        idle_after_minutes: i64,
    ) -> Self {
        Self {
            correlator,
            alerts,
            idle_after_minutes,
        }
    }

    pub fn with_defaults(alerts: &'a AlertAssembler) -> Self {
        Self::new(
            ResponseCorrelator::default(),
            alerts,
            DEFAULT_IDLE_AFTER_MINUTES,
        )
    }

    /// Row for one conversation with the id as a placeholder name.
    pub fn row(
        &self,
        conversation: &Conversation<'_>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> GroupOverview {
        let today_messages = conversation
            .messages
            .iter()
            .filter(|m| m.timestamp.date_naive() == today)
            .count();

        let samples = self.correlator.correlate(conversation);
        let average = mean(samples.iter().map(|s| s.latency_minutes));

        let last_at = conversation.last().map(|m| m.timestamp.with_timezone(&Utc));
        let idle_minutes = last_at
            .map(|at| now.signed_duration_since(at).num_minutes())
            .unwrap_or_default();

        let waiting = self
            .alerts
            .open_anchor(conversation, now)
            .is_some_and(|anchor| {
                now.signed_duration_since(anchor.timestamp) > self.alerts.grace_period()
            });

        let status = if waiting {
            GroupStatus::Waiting
        } else if idle_minutes >= self.idle_after_minutes {
            GroupStatus::Idle
        } else {
            GroupStatus::Active
        };

        GroupOverview {
            id: conversation.id.to_string(),
            name: conversation.id.to_string(),
            today_messages,
            avg_response_time: format_average(average),
            last_activity: format_elapsed(idle_minutes),
            status,
            last_activity_at: last_at,
        }
    }

    /// Rows ordered by most recent activity, ties by id.
    pub fn build(
        &self,
        conversations: &[Conversation<'_>],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Vec<GroupOverview> {
        let mut rows: Vec<GroupOverview> = conversations
            .iter()
            .map(|conversation| self.row(conversation, today, now))
            .collect();
        rows.sort_by(|a, b| {
            (Reverse(a.last_activity_at), &a.id).cmp(&(Reverse(b.last_activity_at), &b.id))
        });
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grouper::group_conversations;
    use crate::engine::test_support::{at, customer, on, team};
    use crate::store::Message;
    use chrono::{FixedOffset, NaiveDate};
    use pretty_assertions::assert_eq;

    fn utc(local: DateTime<FixedOffset>) -> DateTime<Utc> {
        local.with_timezone(&Utc)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn rows(messages: &[Message], now: DateTime<Utc>) -> Vec<GroupOverview> {
        let alerts = AlertAssembler::default();
        let conversations = group_conversations(messages);
        OverviewBuilder::with_defaults(&alerts).build(&conversations, today(), now)
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_elapsed(0), "há 0min");
        assert_eq!(format_elapsed(59), "há 59min");
        assert_eq!(format_elapsed(60), "há 1h");
        assert_eq!(format_elapsed(179), "há 2h");
        assert_eq!(format_elapsed(-5), "há 0min");

        assert_eq!(format_average(None), "-");
        assert_eq!(format_average(Some(0.0)), "-");
        assert_eq!(format_average(Some(0.4)), "0 min");
        assert_eq!(format_average(Some(7.99)), "7 min");
        assert_eq!(format_average(Some(0.001)), "-");
    }

    #[test]
    fn test_row_fields() {
        let messages = vec![
            customer("c0", "g1", on(today().pred_opt().unwrap(), 18, 0), "oi"),
            customer("c1", "g1", at(9, 0), "preciso de ajuda"),
            team("t1", "g1", at(9, 12)),
        ];
        let groups = rows(&messages, utc(at(9, 30)));

        assert_eq!(groups.len(), 1);
        let row = &groups[0];
        assert_eq!(row.today_messages, 2);
        assert_eq!(row.avg_response_time, "12 min");
        assert_eq!(row.last_activity, "há 18min");
        assert_eq!(row.status, GroupStatus::Active);
    }

    #[test]
    fn test_status_rules() {
        let messages = vec![
            customer("w", "waiting", at(9, 0), "cadê o pedido"),
            customer("r", "recent", at(9, 55), "cadê o pedido"),
            customer("i1", "idle", at(3, 0), "oi"),
            team("i2", "idle", at(4, 0)),
            customer("n", "noise", at(3, 0), "obrigado"),
        ];
        let groups = rows(&messages, utc(at(10, 0)));

        let status: Vec<(&str, GroupStatus)> =
            groups.iter().map(|g| (g.id.as_str(), g.status)).collect();
        assert_eq!(
            status,
            vec![
                ("recent", GroupStatus::Active),
                ("waiting", GroupStatus::Waiting),
                ("idle", GroupStatus::Idle),
                ("noise", GroupStatus::Idle),
            ]
        );
    }

    #[test]
    fn test_waiting_uses_exact_elapsed_time() {
        let messages = vec![customer("c1", "g1", at(9, 0), "cadê o pedido")];

        let just_past = utc(at(9, 10)) + chrono::Duration::seconds(50);
        assert_eq!(rows(&messages, just_past)[0].status, GroupStatus::Waiting);

        let on_the_mark = utc(at(9, 10));
        assert_eq!(rows(&messages, on_the_mark)[0].status, GroupStatus::Active);
    }

    #[test]
    fn test_serialized_row() {
        let messages = vec![customer("c1", "g1", at(9, 0), "oi tudo bem")];
        let groups = rows(&messages, utc(at(12, 0)));
        let json = serde_json::to_value(&groups[0]).unwrap();

        assert_eq!(json["todayMessages"], 1);
        assert_eq!(json["avgResponseTime"], "-");
        assert_eq!(json["lastActivity"], "há 3h");
        assert_eq!(json["status"], "waiting");
        assert!(json.get("lastActivityAt").is_none());
    }
}
