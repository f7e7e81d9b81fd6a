pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview API
        .route(
            "/initiate-interview",
            post(handlers::handle_initiate_interview),
        )
        // Telephony webhooks
        .route(
            "/handle-interview-call",
            post(handlers::handle_interview_call),
        )
        .route(
            "/process-response",
            post(handlers::handle_process_response),
        )
        .route("/call-status", post(handlers::handle_call_status))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::test_config;
    use crate::interview::initiator::IdempotencyRegistry;
    use crate::interview::session::{InMemorySessionStore, SessionStore};
    use crate::telephony::CallSid;
    use crate::test_support::{FakeChatModel, FakeOriginator, RecordingSink};

    struct Harness {
        state: AppState,
        sessions: InMemorySessionStore,
        llm: Arc<FakeChatModel>,
        telephony: Arc<FakeOriginator>,
        sink: Arc<RecordingSink>,
    }

    fn harness(llm: FakeChatModel, telephony: FakeOriginator) -> Harness {
        let sessions = InMemorySessionStore::new();
        let llm = Arc::new(llm);
        let telephony = Arc::new(telephony);
        let sink = Arc::new(RecordingSink::default());
        let state = AppState {
            llm: llm.clone(),
            telephony: telephony.clone(),
            sessions: Arc::new(sessions.clone()),
            idempotency: IdempotencyRegistry::new(),
            result_sink: sink.clone(),
            config: test_config(),
        };
        Harness {
            state,
            sessions,
            llm,
            telephony,
            sink,
        }
    }

    fn json_request(body: Value, idempotency_key: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/initiate-interview")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = idempotency_key {
            builder = builder.header("Idempotency-Key", key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn form_request(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    fn example_request() -> Value {
        json!({
            "job_description": "Backend engineer",
            "resume": "5 yrs Python",
            "phone_number": "+15551234567"
        })
    }

    #[tokio::test]
    async fn test_initiate_interview_returns_call_sid() {
        let h = harness(
            FakeChatModel::replying(["Good match"]),
            FakeOriginator::succeeding(),
        );
        let app = build_router(h.state.clone());

        let response = app.oneshot(json_request(example_request(), None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Interview call initiated");
        assert_eq!(body["call_sid"], "CA0001");
        assert!(body.get("detail").is_none());

        let session = h.sessions.get(&CallSid::from("CA0001")).unwrap();
        let context = session.context.unwrap();
        assert_eq!(context.job_description, "Backend engineer");
        assert_eq!(context.analysis.analysis, "Good match");
    }

    #[tokio::test]
    async fn test_initiate_interview_analysis_failure_is_500_without_call() {
        let h = harness(
            FakeChatModel::failing("invalid_api_key"),
            FakeOriginator::succeeding(),
        );
        let app = build_router(h.state.clone());

        let response = app.oneshot(json_request(example_request(), None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("invalid_api_key"));
        assert!(body.get("call_sid").is_none());
        assert!(h.telephony.placed().is_empty());
    }

    #[tokio::test]
    async fn test_initiate_interview_call_failure_is_500() {
        let h = harness(
            FakeChatModel::replying(["Good match"]),
            FakeOriginator::failing("Authentication Error"),
        );
        let app = build_router(h.state.clone());

        let response = app.oneshot(json_request(example_request(), None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(!body["detail"].as_str().unwrap().is_empty());
        assert!(body.get("call_sid").is_none());
        assert_eq!(h.sessions.len(), 0);
    }

    #[tokio::test]
    async fn test_initiate_interview_rejects_blank_fields() {
        let h = harness(FakeChatModel::replying(["x"]), FakeOriginator::succeeding());
        let app = build_router(h.state.clone());
        let body = json!({"job_description": "", "resume": "cv", "phone_number": "+1555"});

        let response = app.oneshot(json_request(body, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(h.llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_without_idempotency_key_each_request_places_a_call() {
        let h = harness(FakeChatModel::replying(["ok"]), FakeOriginator::succeeding());

        for _ in 0..2 {
            let app = build_router(h.state.clone());
            let response = app.oneshot(json_request(example_request(), None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(h.telephony.placed().len(), 2);
    }

    #[tokio::test]
    async fn test_idempotency_key_places_one_call() {
        let h = harness(FakeChatModel::replying(["ok"]), FakeOriginator::succeeding());
        let mut sids = Vec::new();

        for _ in 0..2 {
            let app = build_router(h.state.clone());
            let response = app
                .oneshot(json_request(example_request(), Some("req-42")))
                .await
                .unwrap();
            sids.push(body_json(response).await["call_sid"].clone());
        }

        assert_eq!(sids[0], sids[1]);
        assert_eq!(h.telephony.placed().len(), 1);
        assert_eq!(h.llm.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_with_same_key_place_one_call() {
        let h = harness(
            FakeChatModel::replying(["ok"]),
            FakeOriginator::delayed(Duration::from_millis(50)),
        );
        let first = build_router(h.state.clone());
        let second = build_router(h.state.clone());

        let (a, b) = tokio::join!(
            first.oneshot(json_request(example_request(), Some("k1"))),
            second.oneshot(json_request(example_request(), Some("k1"))),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.status(), StatusCode::OK);
        assert_eq!(b.status(), StatusCode::OK);
        let (a, b) = (body_json(a).await, body_json(b).await);
        assert_eq!(a["call_sid"], "CA0001");
        assert_eq!(b["call_sid"], "CA0001");
        assert_eq!(h.telephony.placed().len(), 1);
        assert_eq!(h.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_call_does_not_burn_idempotency_key() {
        let h = harness(
            FakeChatModel::failing("rate limited"),
            FakeOriginator::succeeding(),
        );
        let response = build_router(h.state.clone())
            .oneshot(json_request(example_request(), Some("k2")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let retry = harness(FakeChatModel::replying(["ok"]), FakeOriginator::succeeding());
        let state = AppState {
            idempotency: h.state.idempotency.clone(),
            ..retry.state.clone()
        };
        let response = build_router(state)
            .oneshot(json_request(example_request(), Some("k2")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(retry.telephony.placed().len(), 1);
    }

    #[tokio::test]
    async fn test_handle_interview_call_without_body() {
        let h = harness(FakeChatModel::replying(["x"]), FakeOriginator::succeeding());
        let app = build_router(h.state.clone());

        let response = app
            .oneshot(
                Request::post("/handle-interview-call")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/xml"
        );
        let xml = body_text(response).await;
        assert!(xml.contains("This call will be recorded"));
        assert_eq!(xml.matches("<Gather").count(), 1);
        assert!(xml.contains(r#"action="/process-response""#));
    }

    #[tokio::test]
    async fn test_process_response_success_has_one_gather() {
        let h = harness(
            FakeChatModel::replying(["Which frameworks did you use?"]),
            FakeOriginator::succeeding(),
        );
        let app = build_router(h.state.clone());

        let response = app
            .oneshot(form_request(
                "/process-response",
                "CallSid=CA1&SpeechResult=I+built+Django+services",
            ))
            .await
            .unwrap();

        let xml = body_text(response).await;
        assert_eq!(xml.matches("<Gather").count(), 1);
        assert!(xml.contains("Which frameworks did you use?"));
        assert!(!xml.contains("<Hangup/>"));
        assert_eq!(
            h.llm.calls()[0].last().unwrap().content,
            "Candidate's response: I built Django services"
        );
    }

    #[tokio::test]
    async fn test_process_response_accepts_snake_case_field() {
        let h = harness(FakeChatModel::replying(["Next?"]), FakeOriginator::succeeding());
        let app = build_router(h.state.clone());

        let response = app
            .oneshot(form_request("/process-response", "speech_result=hello"))
            .await
            .unwrap();

        assert!(body_text(response).await.contains("Next?"));
    }

    #[tokio::test]
    async fn test_process_response_reads_query_string() {
        let h = harness(FakeChatModel::replying(["Next?"]), FakeOriginator::succeeding());
        let app = build_router(h.state.clone());

        let response = app
            .oneshot(
                Request::post("/process-response?speech_result=hello")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let xml = body_text(response).await;
        assert!(xml.contains("Next?"));
        assert_eq!(xml.matches("<Gather").count(), 1);
        assert_eq!(h.llm.calls().len(), 1);
        assert_eq!(
            h.llm.calls()[0].last().unwrap().content,
            "Candidate's response: hello"
        );
    }

    #[tokio::test]
    async fn test_process_response_form_wins_over_query() {
        let h = harness(FakeChatModel::replying(["Next?"]), FakeOriginator::succeeding());
        let app = build_router(h.state.clone());

        app.oneshot(form_request(
            "/process-response?SpeechResult=from+query",
            "SpeechResult=from+form",
        ))
        .await
        .unwrap();

        assert_eq!(
            h.llm.calls()[0].last().unwrap().content,
            "Candidate's response: from form"
        );
    }

    #[tokio::test]
    async fn test_process_response_provider_failure_hangs_up() {
        let h = harness(FakeChatModel::failing("timeout"), FakeOriginator::succeeding());
        let app = build_router(h.state.clone());

        let response = app
            .oneshot(form_request("/process-response", "SpeechResult=hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let xml = body_text(response).await;
        assert!(xml.contains("<Hangup/>"));
        assert!(!xml.contains("<Gather"));
        assert!(xml.contains("human recruiter"));
    }

    #[tokio::test]
    async fn test_call_status_completed() {
        let h = harness(FakeChatModel::replying(["x"]), FakeOriginator::succeeding());
        let app = build_router(h.state.clone());

        let response = app
            .oneshot(form_request("/call-status", "CallSid=CA1&CallStatus=completed"))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["message"], "Interview completed and results posted");
        assert_eq!(h.sink.submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_call_status_echoes_other_status() {
        let h = harness(FakeChatModel::replying(["x"]), FakeOriginator::succeeding());
        let app = build_router(h.state.clone());

        let response = app
            .oneshot(form_request("/call-status", "call_sid=CA1&status=ringing"))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["message"], "Call status: ringing");
        assert!(h.sink.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_call_status_reads_query_string() {
        let h = harness(FakeChatModel::replying(["x"]), FakeOriginator::succeeding());
        let app = build_router(h.state.clone());

        let response = app
            .oneshot(
                Request::post("/call-status?status=completed&call_sid=CA1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Interview completed and results posted");
        assert_eq!(h.sink.submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_call_status_without_status_is_400() {
        let h = harness(FakeChatModel::replying(["x"]), FakeOriginator::succeeding());
        let app = build_router(h.state.clone());

        let response = app
            .oneshot(
                Request::post("/call-status?call_sid=CA1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["detail"]
            .as_str()
            .unwrap()
            .contains("status"));
        assert!(h.sink.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness(FakeChatModel::replying(["x"]), FakeOriginator::succeeding());
        let app = build_router(h.state.clone());

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }
}
