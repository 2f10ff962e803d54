use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use common::configuration::EngineSettings;
use http_body_util::BodyExt;
use hyper::{Method, StatusCode};

use crate::handlers::route;
use crate::handlers::utils::ReportResponse;
use crate::service::ReportService;
use crate::store::memory::{MemoryGroupDirectory, MemoryMessageStore};
use crate::store::{MessageStore, StoreError, StoredMessage};

/// End to end tests of the report flow over an in-memory store:
/// 1. route - parses the path and the query string
/// 2. ReportService - takes one snapshot and runs the engine
/// 3. handlers - encode the report with the CORS headers
#[cfg(test)]
mod integration_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Store that fails the test when it is read.
    struct UntouchableStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MessageStore for UntouchableStore {
        async fn list_all_messages(
            &self,
            _tenant: Option<&str>,
        ) -> Result<Vec<StoredMessage>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            panic!("store must not be read for an invalid request");
        }
    }

    fn record(id: &str, group: &str, direction: &str, timestamp: &str, text: &str) -> StoredMessage {
        StoredMessage {
            id: id.to_string(),
            conversation_id: group.to_string(),
            direction: direction.to_string(),
            timestamp: timestamp.to_string(),
            text: Some(text.to_string()),
            sender_name: Some("Marina".to_string()),
            tenant: Some("acme".to_string()),
        }
    }

    /// 2025-03-10 12:00 at UTC-3.
    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-10T15:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn seeded_service() -> ReportService {
        let messages = vec![
            // yesterday, answered after 20 minutes
            record("y1", "loja-a", "client", "2025-03-09T12:00:00Z", "meu pedido atrasou"),
            record("y2", "loja-a", "agent", "2025-03-09T12:20:00Z", "vamos verificar"),
            record("y3", "loja-b", "client", "2025-03-09T13:00:00Z", "oi"),
            // today
            record("a1", "loja-a", "client", "2025-03-10T13:00:00Z", "o boleto não chegou"),
            record("a2", "loja-a", "team", "2025-03-10T13:05:00Z", "reenviamos"),
            record("a3", "loja-a", "client", "2025-03-10T13:10:00Z", "obrigado!"),
            record("b1", "loja-b", "client", "2025-03-10T12:30:00Z", "preciso trocar o endereço"),
            record("c1", "loja-c", "client", "2025-03-10T14:55:00Z", "ok"),
            record("d1", "loja-d", "client", "2025-03-10T14:00:00Z", "qual o prazo?"),
            record("x1", "loja-d", "client", "sem data", "ignorado"),
        ];
        let names = HashMap::from([
            ("loja-a".to_string(), "Loja A".to_string()),
            ("loja-b".to_string(), "Loja B".to_string()),
        ]);

        ReportService::new(
            Arc::new(MemoryMessageStore::with_messages(messages)),
            Arc::new(MemoryGroupDirectory::with_names(names)),
            &EngineSettings::default(),
            Some("acme".to_string()),
        )
    }

    async fn get(service: &ReportService, path: &str, query: Option<&str>) -> ReportResponse {
        route(&Method::GET, path, query, service, now()).await
    }

    async fn body_json(response: ReportResponse) -> serde_json::Value {
        let body: Bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_missing_start_date_never_reads_store() {
        let store = Arc::new(UntouchableStore {
            calls: AtomicUsize::new(0),
        });
        let service = ReportService::new(
            store.clone(),
            Arc::new(MemoryGroupDirectory::new()),
            &EngineSettings::default(),
            None,
        );

        let response = get(&service, "/activity/weekly", Some("endDate=2025-03-10")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "MissingParameters");
        assert_eq!(body["error"]["details"]["parameters"][0], "startDate");

        let response = get(
            &service,
            "/activity/weekly",
            Some("startDate=2025-03-10&endDate=2025-03-01"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(
            &service,
            "/activity/weekly",
            Some("startDate=0001-01-01&endDate=9999-12-31"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(&service, "/activity/hourly", Some("date=10-03-2025")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hourly_report() {
        let service = seeded_service();
        let response = get(&service, "/activity/hourly", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");

        let body = body_json(response).await;
        assert_eq!(body["date"], "2025-03-10");
        assert_eq!(body["data"].as_array().unwrap().len(), 24);
        assert_eq!(body["data"][10]["hour"], "10:00");
        assert_eq!(body["data"][10]["messages"], 3);
        assert_eq!(body["data"][10]["responseTime"]["average"], 5.0);
        assert_eq!(body["summary"]["totalMessages"], 6);
        assert_eq!(body["summary"]["averageResponseTime"], 5.0);
    }

    #[tokio::test]
    async fn test_period_report() {
        let service = seeded_service();
        let response = get(
            &service,
            "/activity/weekly",
            Some("startDate=2025-03-08&endDate=2025-03-10&groupId=loja-a"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["period"]["start"], "2025-03-08");
        assert_eq!(body["data"][0]["dayOfWeek"], "Saturday");
        assert_eq!(body["data"][0]["messages"], 0);
        assert_eq!(body["data"][1]["messages"], 2);
        assert_eq!(body["data"][1]["responseTime"]["average"], 20.0);
        assert_eq!(body["data"][2]["messages"], 3);
        assert_eq!(body["summary"]["totalMessages"], 5);
        assert_eq!(body["summary"]["averageResponseTime"], 12.5);
    }

    #[tokio::test]
    async fn test_alerts_report() {
        let service = seeded_service();
        let response = get(&service, "/alerts", Some("limit=2")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        // loja-a ends in a stale "obrigado!" after a reply, loja-c is a fresh "ok"
        assert_eq!(body["total"], 3);
        assert_eq!(body["page"], 1);
        assert_eq!(body["hasMore"], true);

        let alerts = body["alerts"].as_array().unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0]["groupId"], "loja-b");
        assert_eq!(alerts[0]["groupName"], "Loja B");
        assert_eq!(alerts[0]["priority"], "high");
        assert_eq!(alerts[0]["waitingTime"]["value"], 150);
        assert_eq!(alerts[0]["clientName"], "Marina");
        assert_eq!(alerts[0]["messageCount"], 2);
        assert_eq!(alerts[1]["groupId"], "loja-d");
        assert_eq!(alerts[1]["priority"], "medium");

        let body = body_json(get(&service, "/alerts", Some("priority=low")).await).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["alerts"][0]["groupId"], "loja-c");
        assert_eq!(body["alerts"][0]["groupName"], "");

        let response = get(&service, "/alerts", Some("priority=urgent")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_groups_overview() {
        let service = seeded_service();
        let body = body_json(get(&service, "/groups/overview", None).await).await;

        let groups = body["groups"].as_array().unwrap();
        let ids: Vec<&str> = groups.iter().map(|g| g["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["loja-c", "loja-d", "loja-a", "loja-b"]);

        assert_eq!(groups[0]["name"], "loja-c");
        assert_eq!(groups[0]["status"], "active");
        assert_eq!(groups[0]["lastActivity"], "há 5min");
        assert_eq!(groups[1]["status"], "waiting");
        assert_eq!(groups[2]["name"], "Loja A");
        assert_eq!(groups[2]["avgResponseTime"], "12 min");
        assert_eq!(groups[2]["todayMessages"], 3);
        assert_eq!(groups[3]["status"], "waiting");
        assert_eq!(groups[3]["lastActivity"], "há 2h");
    }

    #[tokio::test]
    async fn test_today_metrics() {
        let service = seeded_service();
        let body = body_json(get(&service, "/metrics/today", None).await).await;

        let metrics = &body["metrics"];
        assert_eq!(body["date"], "2025-03-10");
        assert_eq!(metrics["totalMessages"]["value"], 6);
        assert_eq!(metrics["totalMessages"]["change"]["value"], 3);
        assert_eq!(metrics["totalMessages"]["change"]["type"], "increase");
        assert_eq!(metrics["averageResponseTime"]["value"], 5.0);
        assert_eq!(metrics["averageResponseTime"]["unit"], "minutes");
        assert_eq!(metrics["averageResponseTime"]["change"]["value"], 15.0);
        assert_eq!(metrics["averageResponseTime"]["change"]["type"], "decrease");
        assert_eq!(metrics["activeGroups"]["value"], 4);
        assert_eq!(metrics["waitingClients"]["value"], 4);
        assert_eq!(metrics["waitingClients"]["change"]["value"], 3);
    }

    #[tokio::test]
    async fn test_preflight_and_unknown_paths() {
        let service = seeded_service();

        let response = route(&Method::OPTIONS, "/alerts", None, &service, now()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["Access-Control-Allow-Headers"], "*");

        let response = get(&service, "/v1/unknown", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "NotFound");

        let response = route(&Method::POST, "/alerts", None, &service, now()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = get(&service, "/healthz", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
