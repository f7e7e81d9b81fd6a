use std::sync::Arc;

use crate::config::Config;
use crate::interview::initiator::IdempotencyRegistry;
use crate::interview::session::SessionStore;
use crate::interview::status::ResultSink;
use crate::llm_client::ChatModel;
use crate::telephony::CallOriginator;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every client is built once in `main` and lives for the whole process.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn ChatModel>,
    pub telephony: Arc<dyn CallOriginator>,
    /// Conversation memory keyed by call identifier. Process-local.
    pub sessions: Arc<dyn SessionStore>,
    pub idempotency: IdempotencyRegistry,
    /// Applicant-tracking integration. Log-only unless ATS_WEBHOOK_URL is set.
    pub result_sink: Arc<dyn ResultSink>,
    pub config: Config,
}
