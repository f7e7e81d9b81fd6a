//! In-process fakes for the provider seams. Test builds only.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::interview::status::{ResultSink, SinkError};
use crate::llm_client::{ChatMessage, ChatModel, LlmError};
use crate::models::interview::CompletedInterview;
use crate::telephony::{CallOriginator, CallSid, OutboundCall, TelephonyError};

/// Replays scripted replies in order (repeating the last one) and records every request.
pub struct FakeChatModel {
    replies: Vec<String>,
    failure: Option<String>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeChatModel {
    pub fn replying<const N: usize>(replies: [&str; N]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            replies: Vec::new(),
            failure: Some(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for FakeChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(messages.to_vec());

        if let Some(message) = &self.failure {
            return Err(LlmError::Api {
                status: 500,
                message: message.clone(),
            });
        }

        let index = (calls.len() - 1).min(self.replies.len().saturating_sub(1));
        self.replies
            .get(index)
            .cloned()
            .ok_or(LlmError::EmptyContent)
    }
}

/// Hands out sequential call ids (`CA0001`, `CA0002`, ...) or a fixed error.
pub struct FakeOriginator {
    failure: Option<String>,
    delay: Option<Duration>,
    placed: Mutex<Vec<OutboundCall>>,
}

impl FakeOriginator {
    pub fn succeeding() -> Self {
        Self {
            failure: None,
            delay: None,
            placed: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            delay: None,
            placed: Mutex::new(Vec::new()),
        }
    }

    /// Succeeds after sleeping, so overlapping requests are in flight together.
    pub fn delayed(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::succeeding()
        }
    }

    pub fn placed(&self) -> Vec<OutboundCall> {
        self.placed.lock().unwrap().clone()
    }
}

#[async_trait]
impl CallOriginator for FakeOriginator {
    async fn originate(&self, call: &OutboundCall) -> Result<CallSid, TelephonyError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(TelephonyError::Api {
                status: 400,
                message: message.clone(),
            });
        }
        let mut placed = self.placed.lock().unwrap();
        placed.push(call.clone());
        Ok(CallSid(format!("CA{:04}", placed.len())))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    reject: bool,
    submitted: Mutex<Vec<CompletedInterview>>,
}

impl RecordingSink {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn submitted(&self) -> Vec<CompletedInterview> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultSink for RecordingSink {
    async fn submit(&self, completed: &CompletedInterview) -> Result<(), SinkError> {
        if self.reject {
            return Err(SinkError::Rejected(503));
        }
        self.submitted.lock().unwrap().push(completed.clone());
        Ok(())
    }
}
