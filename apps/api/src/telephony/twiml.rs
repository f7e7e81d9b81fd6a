//! TwiML builder — the voice-response markup returned from every call webhook.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

/// One top-level verb in a voice response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Say(String),
    Gather(Gather),
    Hangup,
}

/// Collects speech input and posts the transcript to `action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gather {
    pub action: String,
    pub prompt: Option<String>,
}

impl Gather {
    pub fn speech(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            prompt: None,
        }
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.prompt = Some(text.into());
        self
    }
}

/// An ordered list of verbs rendered as a `<Response>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say(text.into()));
        self
    }

    pub fn gather(mut self, gather: Gather) -> Self {
        self.verbs.push(Verb::Gather(gather));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    #[cfg(test)]
    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    pub fn render(&self) -> String {
        let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
        for verb in &self.verbs {
            match verb {
                Verb::Say(text) => push_say(&mut out, text),
                Verb::Gather(gather) => {
                    out.push_str(&format!(
                        r#"<Gather action="{}" input="speech" method="POST">"#,
                        escape_xml(&gather.action)
                    ));
                    if let Some(prompt) = &gather.prompt {
                        push_say(&mut out, prompt);
                    }
                    out.push_str("</Gather>");
                }
                Verb::Hangup => out.push_str("<Hangup/>"),
            }
        }
        out.push_str("</Response>");
        out
    }
}

impl IntoResponse for VoiceResponse {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "application/xml")], self.render()).into_response()
    }
}

fn push_say(out: &mut String, text: &str) {
    out.push_str("<Say>");
    out.push_str(&escape_xml(text));
    out.push_str("</Say>");
}

/// Escapes markup characters and drops code points XML 1.0 forbids.
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\t' | '\n' | '\r' => escaped.push(c),
            c if c < '\u{20}' || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
