mod config;
mod errors;
mod interview;
mod llm_client;
mod models;
mod routes;
mod state;
mod telephony;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interview::initiator::IdempotencyRegistry;
use crate::interview::session::InMemorySessionStore;
use crate::interview::status::{NoopResultSink, ResultSink, WebhookResultSink};
use crate::llm_client::{build_http_client, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;
use crate::telephony::TwilioClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // One pooled HTTP client shared by every provider
    let http = build_http_client()?;

    let llm = LlmClient::new(
        http.clone(),
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.openai_model.clone(),
    );
    info!("LLM client initialized (model: {})", llm.model());

    let telephony = TwilioClient::new(
        http.clone(),
        config.twilio_account_sid.clone(),
        config.twilio_auth_token.clone(),
    );
    info!("Telephony client initialized (from: {})", config.twilio_phone_number);

    let result_sink: Arc<dyn ResultSink> = match &config.ats_webhook_url {
        Some(url) => {
            info!("Forwarding interview results to {url}");
            Arc::new(WebhookResultSink::new(http.clone(), url.clone()))
        }
        None => {
            info!("ATS_WEBHOOK_URL not set; interview results will only be logged");
            Arc::new(NoopResultSink)
        }
    };

    let state = AppState {
        llm: Arc::new(llm),
        telephony: Arc::new(telephony),
        sessions: Arc::new(InMemorySessionStore::with_ttl(chrono::Duration::seconds(
            config.session_ttl_secs,
        ))),
        idempotency: IdempotencyRegistry::with_ttl(chrono::Duration::seconds(
            config.idempotency_ttl_secs,
        )),
        result_sink,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Interview API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
