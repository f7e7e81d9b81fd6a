//! Telephony — outbound call origination through the Twilio REST API.
//!
//! Handlers only see the `CallOriginator` trait; `TwilioClient` is the
//! production backend. Voice-response markup lives in `twiml`.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub mod twiml;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

#[derive(Debug, Error)]
pub enum TelephonyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telephony API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Opaque call identifier assigned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallSid(pub String);

impl CallSid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallSid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallSid {
    fn from(value: &str) -> Self {
        CallSid(value.to_string())
    }
}

/// Everything the provider needs to place one outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCall {
    pub to: String,
    pub from: String,
    /// Webhook invoked when the callee answers.
    pub answer_url: String,
    /// Webhook invoked on lifecycle changes.
    pub status_callback_url: String,
}

/// Call origination seam. Carried in `AppState` as `Arc<dyn CallOriginator>`.
#[async_trait]
pub trait CallOriginator: Send + Sync {
    /// Places one real phone call and returns its provider identifier.
    async fn originate(&self, call: &OutboundCall) -> Result<CallSid, TelephonyError>;
}

#[derive(Debug, Deserialize)]
struct CreatedCall {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct TwilioClient {
    client: Client,
    account_sid: String,
    auth_token: String,
}

impl TwilioClient {
    pub fn new(http: Client, account_sid: String, auth_token: String) -> Self {
        Self {
            client: http,
            account_sid,
            auth_token,
        }
    }

    fn calls_url(&self) -> String {
        format!("{TWILIO_API_BASE}/Accounts/{}/Calls.json", self.account_sid)
    }
}

#[async_trait]
impl CallOriginator for TwilioClient {
    async fn originate(&self, call: &OutboundCall) -> Result<CallSid, TelephonyError> {
        let form = [
            ("To", call.to.as_str()),
            ("From", call.from.as_str()),
            ("Url", call.answer_url.as_str()),
            ("StatusCallback", call.status_callback_url.as_str()),
        ];

        let response = self
            .client
            .post(self.calls_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TwilioErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(TelephonyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let created: CreatedCall = response.json().await?;
        info!("Outbound call created: {}", created.sid);
        Ok(CallSid(created.sid))
    }
}
