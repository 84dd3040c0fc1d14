//! Router tests against stub models.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use firdesk_ai::{
    FaqMatcher, IncidentClassifier, KeywordRules, LabelScore, MatchSettings, TextEmbedder, Triage,
    ZeroShotClassifier,
};
use firdesk_core::{Corpus, CorpusEntry, FALLBACK_REPLY};
use firdesk_server::{AppState, HealthResponse, INTERNAL_ERROR_MESSAGE, router};
use serde_json::{Value, json};
use tower::util::ServiceExt;

const VOCAB: &[&str] = &["fir", "file", "process", "lost", "phone"];

struct VocabEmbedder;

impl TextEmbedder for VocabEmbedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        Ok(VOCAB
            .iter()
            .map(|w| tokens.iter().filter(|t| *t == w).count() as f32)
            .collect())
    }
}

/// Ranks candidates in reverse order with descending scores.
struct ReverseClassifier;

impl ZeroShotClassifier for ReverseClassifier {
    fn classify(&self, _text: &str, labels: &[&str]) -> anyhow::Result<Vec<LabelScore>> {
        Ok(labels
            .iter()
            .rev()
            .enumerate()
            .map(|(i, l)| LabelScore::new(*l, 0.8765 / (i as f32 + 1.0)))
            .collect())
    }
}

struct FailingClassifier;

impl ZeroShotClassifier for FailingClassifier {
    fn classify(&self, _text: &str, _labels: &[&str]) -> anyhow::Result<Vec<LabelScore>> {
        anyhow::bail!("model offline")
    }
}

struct OutOfSetClassifier;

impl ZeroShotClassifier for OutOfSetClassifier {
    fn classify(&self, _text: &str, _labels: &[&str]) -> anyhow::Result<Vec<LabelScore>> {
        Ok(vec![LabelScore::new("Other", 0.9)])
    }
}

fn app_with(classifier: Arc<dyn ZeroShotClassifier>) -> axum::Router {
    let corpus = Corpus::from_entries(vec![
        CorpusEntry::new(
            ["How do I file an FIR?", "FIR process"],
            "Visit your nearest police station...",
        ),
        CorpusEntry::new(["Lost my phone"], "Report it on the CEIR portal."),
    ])
    .unwrap();
    let matcher =
        FaqMatcher::build(&corpus, Arc::new(VocabEmbedder), MatchSettings::default()).unwrap();
    let incidents = Arc::new(IncidentClassifier::with_defaults(classifier));
    let triage = Triage::new(KeywordRules::default(), incidents.clone());
    router(Arc::new(AppState::new(matcher, incidents, triage)))
}

fn app() -> axum::Router {
    app_with(Arc::new(ReverseClassifier))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn chat_returns_matched_answer() {
    let resp = app()
        .oneshot(post_json("/chat", json!({"message": "What is the FIR process?"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["reply"], "Visit your nearest police station...");
}

#[tokio::test]
async fn chat_gibberish_gets_fallback() {
    let resp = app()
        .oneshot(post_json("/chat", json!({"message": "asdkjhasdkjh"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["reply"], FALLBACK_REPLY);
}

#[tokio::test]
async fn chat_empty_message_is_not_an_error() {
    let resp = app()
        .oneshot(post_json("/chat", json!({"message": ""})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["reply"], FALLBACK_REPLY);
}

#[tokio::test]
async fn chat_missing_field_is_client_error() {
    let resp = app()
        .oneshot(post_json("/chat", json!({"text": "hello"})))
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn chat_malformed_json_is_client_error() {
    let req = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn classify_shapes_report() {
    let resp = app()
        .oneshot(post_json(
            "/classify",
            json!({"description": "He broke into my house and stole my laptop"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["crimeType"], "Murder Attempt");
    assert_eq!(body["crimeConfidence"], 0.88);
    assert_eq!(body["lethality"], "Life Threatening");
    assert_eq!(body["lethalityConfidence"], 0.88);
}

#[tokio::test]
async fn classify_failure_is_server_error() {
    let resp = app_with(Arc::new(FailingClassifier))
        .oneshot(post_json("/classify", json!({"description": "anything"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert_eq!(body["error"], INTERNAL_ERROR_MESSAGE);
    assert!(!body.to_string().contains("model offline"));
}

#[tokio::test]
async fn classify_out_of_set_label_is_server_error() {
    let resp = app_with(Arc::new(OutOfSetClassifier))
        .oneshot(post_json("/classify", json!({"description": "anything"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await["error"], INTERNAL_ERROR_MESSAGE);
}

#[tokio::test]
async fn triage_rule_hit() {
    let resp = app()
        .oneshot(post_json("/triage", json!({"description": "Mera phone chori ho gaya"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["crimeType"], "Theft");
    assert_eq!(body["method"], "rule-based");
    assert!(body["confidence"].is_null());
}

#[tokio::test]
async fn triage_model_fallback() {
    let resp = app()
        .oneshot(post_json("/triage", json!({"description": "my son did not return home"})))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["crimeType"], "Murder Attempt");
    assert_eq!(body["method"], "model");
    assert_eq!(body["confidence"], 0.88);
}

#[tokio::test]
async fn triage_blank_description_rejected() {
    let resp = app()
        .oneshot(post_json("/triage", json!({"description": "  "})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Please provide a description");
}

#[tokio::test]
async fn health_reports_index_size() {
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.questions, 3);
}
