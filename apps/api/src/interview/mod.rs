// Interview service: match analysis, call origination, the spoken dialogue
// loop, and call-lifecycle reporting.
// All LLM calls go through llm_client, all provider calls through telephony.

pub mod analyzer;
pub mod dialogue;
pub mod handlers;
pub mod initiator;
pub mod prompts;
pub mod session;
pub mod status;
