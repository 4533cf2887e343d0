use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, header};
use tower::ServiceExt;

use super::*;
use crate::cards::{CardText, Side};
use crate::database::{CardStore, ContextResult, EmbeddedCardText, MemoryCardStore};
use crate::embeddings::{Embedder, EmbeddingError};
use crate::generation::{ChatGenerator, GenerationError};
use crate::languages::Language;
use crate::retrieval::RetrievalService;

struct FixedEmbedder(Result<Vec<f32>, EmbeddingError>);

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.0.clone()
    }

    fn model(&self) -> &str {
        "fixed"
    }
}

struct FixedGenerator(&'static str);

#[async_trait]
impl ChatGenerator for FixedGenerator {
    async fn generate(
        &self,
        _english_text: &str,
        _context: &[ContextResult],
        _language: Language,
    ) -> Result<String, GenerationError> {
        Ok(self.0.to_string())
    }
}

async fn router(embedding: Result<Vec<f32>, EmbeddingError>) -> Router {
    let store = Arc::new(MemoryCardStore::new());
    store
        .insert_batch(&[EmbeddedCardText {
            card: CardText {
                code: "01030".to_string(),
                name: "Magnifying Glass".to_string(),
                side: Side::Front,
                english_text: "[action]: Draw 1 card.".to_string(),
                translations: BTreeMap::from([(Language::It, "[action]: Pesca 1 carta.".to_string())]),
            },
            embedding: vec![1.0, 0.0],
        }])
        .await
        .expect("seeding should succeed");

    let translator = Translator::new(
        Arc::new(FixedEmbedder(embedding)),
        RetrievalService::new(store as Arc<dyn CardStore>, 12),
        Arc::new(FixedGenerator("[action]: Pesca 1 carta.")),
        5,
    );
    app_router(Arc::new(translator))
}

fn post_translate(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/translate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

#[tokio::test]
async fn health_reports_service() {
    let app = router(Ok(vec![1.0, 0.0])).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "status": "ok", "service": "arkham-localize" })
    );
}

#[tokio::test]
async fn translate_returns_translation_and_context() {
    let app = router(Ok(vec![1.0, 0.0])).await;
    let response = app
        .oneshot(post_translate(r#"{"text": "[action]: Draw 1 card."}"#))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["translation"], "[action]: Pesca 1 carta.");
    assert_eq!(body["language"], "it");
    assert_eq!(body["context"][0]["card_code"], "01030");
    assert_eq!(body["context"][0]["translated_text"], "[action]: Pesca 1 carta.");
}

#[tokio::test]
async fn empty_text_is_bad_request() {
    let app = router(Ok(vec![1.0, 0.0])).await;
    let response = app
        .oneshot(post_translate(r#"{"text": ""}"#))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "text field is required");
}

#[tokio::test]
async fn unsupported_language_is_bad_request() {
    let app = router(Ok(vec![1.0, 0.0])).await;
    let response = app
        .oneshot(post_translate(r#"{"text": "Draw 1 card.", "language": "pt"}"#))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    let message = body["error"].as_str().expect("error should be a string");
    assert!(message.contains("unsupported language: pt"));
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = router(Ok(vec![1.0, 0.0])).await;
    let response = app
        .oneshot(post_translate("{not json"))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(
        body["error"]
            .as_str()
            .expect("error should be a string")
            .starts_with("Invalid request body")
    );
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let app = router(Err(EmbeddingError::Status {
        status: 500,
        body: "upstream down".to_string(),
    }))
    .await;
    let response = app
        .oneshot(post_translate(r#"{"text": "Draw 1 card."}"#))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert!(
        body["error"]
            .as_str()
            .expect("error should be a string")
            .contains("failed to generate embedding")
    );
}

#[test]
fn store_failures_map_to_internal_error() {
    let error = TranslateError::Retrieval(RetrievalError::Store(
        crate::database::StoreError::DimensionMismatch {
            expected: 1536,
            actual: 2,
        },
    ));
    assert_eq!(status_for(&error), StatusCode::INTERNAL_SERVER_ERROR);

    let invalid = TranslateError::Retrieval(RetrievalError::InvalidQuery("query vector is empty"));
    assert_eq!(status_for(&invalid), StatusCode::BAD_REQUEST);

    let generation = TranslateError::Generation(GenerationError::NoChoices);
    assert_eq!(status_for(&generation), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let app = router(Ok(vec![1.0, 0.0])).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/translate")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );
}
