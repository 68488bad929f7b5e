//! End-to-end tests for the upstream client.
//!
//! A scripted axum server stands in for the chat completions API; the real
//! `OpenAiClient` talks to it over HTTP, and in the full-stack tests the
//! coach-web server sits in front of both.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use coach_rs::api::RetryConfig;
use coach_rs::config::GatewayConfig;
use coach_rs::error::GatewayError;
use coach_rs::gateway::Gateway;
use coach_rs::normalize::extract_text;
use coach_rs::{ChatRequest, Message, OpenAiClient};
use coach_web::{AppState, WebConfig, spawn_web};
use serde_json::{Value, json};

#[derive(Default)]
struct Script {
    responses: Mutex<VecDeque<(StatusCode, String)>>,
    seen: Mutex<Vec<(Option<String>, Value)>>,
    delay: Option<Duration>,
}

impl Script {
    fn new(responses: Vec<(u16, Value)>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(s, v)| (StatusCode::from_u16(s).unwrap(), v.to_string()))
                    .collect(),
            ),
            ..Default::default()
        })
    }

    fn raw(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::from([(
                StatusCode::from_u16(status).unwrap(),
                body.to_string(),
            )])),
            ..Default::default()
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }

    fn seen(&self) -> Vec<(Option<String>, Value)> {
        self.seen.lock().unwrap().clone()
    }
}

async fn completions(
    State(script): State<Arc<Script>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = serde_json::from_str(&body).unwrap_or(Value::Null);
    script.seen.lock().unwrap().push((auth, body));
    if let Some(delay) = script.delay {
        tokio::time::sleep(delay).await;
    }
    script
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::OK, "{}".to_string()))
}

/// Start the scripted upstream and return a config pointing at it.
async fn spawn_upstream(script: Arc<Script>) -> GatewayConfig {
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(script);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut config = GatewayConfig::new("sk-test");
    config.api_url = format!("http://{addr}/v1/chat/completions");
    config
}

fn hello_request() -> ChatRequest {
    ChatRequest {
        model: "gpt-4o-mini".into(),
        messages: vec![Message::system("rules"), Message::user("hello")],
        temperature: Some(0.7),
        ..Default::default()
    }
}

#[tokio::test]
async fn client_sends_bearer_auth_and_reads_choices() {
    let script = Script::new(vec![(
        200,
        json!({"choices": [{"message": {"role": "assistant", "content": "안녕!"}}]}),
    )]);
    let config = spawn_upstream(script.clone()).await;
    let client = OpenAiClient::new(&config).unwrap();

    let completion = client.chat(&hello_request()).await.unwrap();
    assert_eq!(extract_text(&completion), "안녕!");

    let seen = script.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.as_deref(), Some("Bearer sk-test"));
    assert_eq!(seen[0].1["model"], "gpt-4o-mini");
    assert_eq!(seen[0].1["messages"][1]["content"], "hello");
    assert!(seen[0].1.get("max_tokens").is_none());
}

#[tokio::test]
async fn client_reads_output_shape() {
    let script = Script::new(vec![(
        200,
        json!({"output": [{"content": [{"type": "output_text", "text": "요약"}]}]}),
    )]);
    let client = OpenAiClient::new(&spawn_upstream(script).await).unwrap();

    let completion = client.chat(&hello_request()).await.unwrap();
    assert_eq!(extract_text(&completion), "요약");
}

#[tokio::test]
async fn client_surfaces_upstream_error_message() {
    let script = Script::new(vec![(
        401,
        json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}),
    )]);
    let client = OpenAiClient::new(&spawn_upstream(script).await).unwrap();

    match client.chat(&hello_request()).await.unwrap_err() {
        GatewayError::Upstream { status, detail } => {
            assert_eq!(status, 401);
            assert_eq!(detail, "Incorrect API key provided");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_success_body_is_an_upstream_error() {
    let client = OpenAiClient::new(&spawn_upstream(Script::raw(200, "<html>")).await).unwrap();
    let err = client.chat(&hello_request()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Upstream { status: 200, .. }));
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let mut config = spawn_upstream(Script::slow(Duration::from_secs(5))).await;
    config.timeout = Duration::from_millis(200);
    let client = OpenAiClient::new(&config).unwrap();

    let err = client.chat(&hello_request()).await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {err:?}");
}

#[tokio::test]
async fn transient_failures_are_retried_when_enabled() {
    let script = Script::new(vec![
        (503, json!({"error": "overloaded"})),
        (200, json!({"choices": [{"message": {"content": "ok"}}]})),
    ]);
    let mut config = spawn_upstream(script.clone()).await;
    config.retry = RetryConfig {
        initial_delay: Duration::from_millis(10),
        ..RetryConfig::with_retries(1)
    };
    let client = OpenAiClient::new(&config).unwrap();

    let completion = client.chat(&hello_request()).await.unwrap();
    assert_eq!(extract_text(&completion), "ok");
    assert_eq!(script.seen().len(), 2);
}

#[tokio::test]
async fn single_attempt_by_default() {
    let script = Script::new(vec![
        (503, json!({"error": "overloaded"})),
        (200, json!({"choices": [{"message": {"content": "ok"}}]})),
    ]);
    let client = OpenAiClient::new(&spawn_upstream(script.clone()).await).unwrap();

    let err = client.chat(&hello_request()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Upstream { status: 503, .. }));
    assert_eq!(script.seen().len(), 1);
}

// ── Full stack ───────────────────────────────────────────────────────

async fn spawn_stack(script: Arc<Script>) -> String {
    let config = spawn_upstream(script).await;
    let gateway = Gateway::from_config(&config).unwrap();
    let web = WebConfig {
        bind_addr: ([127, 0, 0, 1], 0).into(),
        ..Default::default()
    };
    let addr = spawn_web(AppState::new(Arc::new(gateway)), web)
        .await
        .unwrap();
    format!("http://{addr}")
}

#[tokio::test]
async fn reply_round_trips_through_real_client() {
    let script = Script::new(vec![(
        200,
        json!({"choices": [{"message": {"content": "응 뭐해 || 5 · 안전 || 40 · 무난 || 되묻기"}}]}),
    )]);
    let base = spawn_stack(script.clone()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/reply"))
        .json(&json!({"text": "오늘 뭐해?", "tone": "friend"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["replies"][0]["sentence"], "응 뭐해");

    let (_, sent) = &script.seen()[0];
    assert_eq!(sent["model"], "gpt-4o-mini");
    assert_eq!(sent["messages"][0]["role"], "system");
}

#[tokio::test]
async fn upstream_error_reaches_browser_as_500() {
    let script = Script::new(vec![(
        500,
        json!({"error": {"message": "The server had an error"}}),
    )]);
    let base = spawn_stack(script).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/fix"))
        .json(&json!({"text": "왜 늦어"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], 500);
    assert_eq!(json["detail"], "The server had an error");
}
