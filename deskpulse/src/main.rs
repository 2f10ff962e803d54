use std::sync::Arc;
use std::time::Instant;
use std::{env, fs};

use chrono::Utc;
use common::configuration::{Configuration, EngineSettings, StoreType};
use common::consts::{DEFAULT_BIND_ADDRESS, DEFAULT_CONFIG_PATH};
use deskpulse::handlers::route;
use deskpulse::service::ReportService;
use deskpulse::store::memory::{load_seed_file, MemoryGroupDirectory, MemoryMessageStore};
use deskpulse::store::postgresql::{PostgreSQLGroupDirectory, PostgreSQLMessageStore};
use deskpulse::store::{GroupNameResolver, MessageStore};
use deskpulse::tracing::{http, operation_name, report, request_id};
use deskpulse::utils::tracing::init_tracer;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use opentelemetry::trace::FutureExt;
use opentelemetry::{global, Context};
use opentelemetry_http::HeaderExtractor;
use tokio::net::TcpListener;
use tracing::{debug, field, info, info_span, warn, Instrument};

// Utility function to extract the context from the incoming request headers
fn extract_context_from_request(req: &Request<Incoming>) -> Context {
    global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(req.headers()))
    })
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn build_stores(
    config: &Configuration,
) -> Result<(Arc<dyn MessageStore>, Arc<dyn GroupNameResolver>), BoxError> {
    match config.store.store_type {
        StoreType::Memory => {
            let (messages, names) = match &config.store.seed_file {
                Some(path) => load_seed_file(path).await?,
                None => (MemoryMessageStore::new(), MemoryGroupDirectory::new()),
            };
            let count = messages.len().await;
            info!(
                store_type = "memory",
                messages = count,
                "initialized message store"
            );
            Ok((Arc::new(messages), Arc::new(names)))
        }
        StoreType::Postgres => {
            let connection_string = config
                .store
                .connection_string
                .as_ref()
                .ok_or("connection_string is required for the postgres store")?;

            debug!(connection_string = %connection_string, "postgres connection");
            info!(store_type = "postgres", "initializing message store");
            let messages =
                PostgreSQLMessageStore::new(connection_string, config.store.page_size()).await?;
            let names = PostgreSQLGroupDirectory::new(connection_string).await?;
            Ok((Arc::new(messages), Arc::new(names)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let bind_address =
        env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());

    // read before tracing init so the tracing section is available
    let config_path =
        env::var("DESKPULSE_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    eprintln!("loading deskpulse config from {}", config_path);

    let config_contents = fs::read_to_string(&config_path)
        .map_err(|e| format!("failed to read {}: {}", config_path, e))?;
    let config: Configuration = serde_yaml::from_str(&config_contents)
        .map_err(|e| format!("failed to parse {}: {}", config_path, e))?;

    let _tracer_provider = init_tracer(config.tracing.as_ref());
    info!(path = %config_path, version = %config.version, "loaded config");

    let settings = EngineSettings::from(&config);
    let (store, names) = build_stores(&config).await?;
    let service = Arc::new(ReportService::new(
        store,
        names,
        &settings,
        config.store.tenant.clone(),
    ));

    let listener = TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "listening");

    loop {
        let (stream, _) = listener.accept().await?;
        let peer_addr = stream.peer_addr()?;
        let io = TokioIo::new(stream);

        let service = Arc::clone(&service);
        let handler = service_fn(move |req: Request<Incoming>| {
            let service = Arc::clone(&service);
            let parent_cx = extract_context_from_request(&req);

            let method = req.method().clone();
            let path = req.uri().path().to_string();
            let query = req.uri().query().map(str::to_string);
            let span = info_span!(
                "request",
                otel.name = %operation_name(&method, &path),
                request_id = %request_id(req.headers()),
                http.method = %method,
                http.target = %path,
                http.status_code = field::Empty,
                report.duration_ms = field::Empty,
            );

            async move {
                let started = Instant::now();
                let response =
                    route(&method, &path, query.as_deref(), &service, Utc::now()).await;

                let current = tracing::Span::current();
                current.record(http::STATUS_CODE, response.status().as_u16());
                current.record(report::DURATION_MS, started.elapsed().as_millis() as u64);
                info!(status = response.status().as_u16(), "request completed");
                Ok::<_, hyper::Error>(response)
            }
            .instrument(span)
            .with_context(parent_cx)
        });

        tokio::task::spawn(async move {
            debug!(peer = ?peer_addr, "accepted connection");
            if let Err(err) = http1::Builder::new()
                .serve_connection(io, handler)
                .await
            {
                warn!(error = ?err, "error serving connection");
            }
        });
    }
}
