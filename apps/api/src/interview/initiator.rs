//! Call Initiator — originates the outbound interview call.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::Config;
use crate::errors::AppError;
use crate::telephony::{CallOriginator, CallSid, OutboundCall};

pub const ANSWER_PATH: &str = "/handle-interview-call";
pub const STATUS_PATH: &str = "/call-status";

/// Builds the origination request for `phone_number` from configuration.
pub fn outbound_call(phone_number: &str, config: &Config) -> OutboundCall {
    OutboundCall {
        to: phone_number.trim().to_string(),
        from: config.twilio_phone_number.clone(),
        answer_url: config.callback_url(ANSWER_PATH),
        status_callback_url: config.callback_url(STATUS_PATH),
    }
}

/// Places one real phone call. Every invocation dials again.
pub async fn initiate_call(
    phone_number: &str,
    config: &Config,
    telephony: &dyn CallOriginator,
) -> Result<CallSid, AppError> {
    let call = outbound_call(phone_number, config);
    let call_sid = telephony.originate(&call).await?;
    info!("Interview call {call_sid} placed");
    Ok(call_sid)
}

/// Remembers which call an `Idempotency-Key` produced.
///
/// A key is reserved before any provider call, so concurrent requests sharing
/// it wait on the first one instead of dialing again. If origination fails the
/// slot stays empty and the next request with that key tries again. Entries
/// expire after the registry's TTL.
#[derive(Clone)]
pub struct IdempotencyRegistry {
    slots: Arc<Mutex<HashMap<String, Reservation>>>,
    ttl: Duration,
}

struct Reservation {
    call: Arc<OnceCell<CallSid>>,
    reserved_at: DateTime<Utc>,
}

const DEFAULT_TTL_SECS: i64 = 24 * 60 * 60;

impl Default for IdempotencyRegistry {
    fn default() -> Self {
        Self::with_ttl(Duration::seconds(DEFAULT_TTL_SECS))
    }
}

impl IdempotencyRegistry {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Reservation>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the slot for `key`, creating it if absent. Expired slots are
    /// dropped first; a request still holding one finishes undisturbed.
    pub fn reserve(&self, key: &str) -> Arc<OnceCell<CallSid>> {
        let now = Utc::now();
        let mut guard = self.lock();
        guard.retain(|_, r| now - r.reserved_at < self.ttl);
        guard
            .entry(key.to_string())
            .or_insert_with(|| Reservation {
                call: Arc::new(OnceCell::new()),
                reserved_at: now,
            })
            .call
            .clone()
    }

    /// Runs `place` at most once per key until it succeeds; every caller gets the same call.
    pub async fn place_once<F, Fut>(&self, key: &str, place: F) -> Result<CallSid, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CallSid, AppError>>,
    {
        let slot = self.reserve(key);
        if let Some(existing) = slot.get() {
            info!("Idempotent replay for call {existing}");
            return Ok(existing.clone());
        }
        slot.get_or_try_init(place).await.cloned()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }
}
