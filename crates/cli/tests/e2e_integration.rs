//! End-to-end integration tests for the TravelGuide pipeline.
//!
//! These tests exercise the full path from a travel query (or HTTP request)
//! to a validated guide document, and from a chat question to streamed
//! chunks, with a scripted provider standing in for the LLM backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use travelguide_config::{AppConfig, ModelProfile};
use travelguide_core::error::{GuideError, ProviderError};
use travelguide_core::guide::TravelGuideDocument;
use travelguide_core::message::Message;
use travelguide_core::provider::{
    ChunkReceiver, Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage,
};
use travelguide_core::query::{DateRange, TravelQuery};
use travelguide_gateway::{ApiState, build_router};
use travelguide_planner::{ChunkSink, RelayOutcome, SinkClosed, TravelGuideService};
use travelguide_providers::{LlmGateway, RetryPolicy};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted completions in sequence and a
/// fixed list of stream chunks.
struct ScriptedProvider {
    completions: std::sync::Mutex<Vec<Result<String, ProviderError>>>,
    chunks: Vec<Result<StreamChunk, ProviderError>>,
    call_count: std::sync::Mutex<usize>,
    requests: std::sync::Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(completions: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            completions: std::sync::Mutex::new(completions),
            chunks: Vec::new(),
            call_count: std::sync::Mutex::new(0),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn text(response: &str) -> Self {
        Self::new(vec![Ok(response.to_string())])
    }

    fn streaming(chunks: Vec<Result<StreamChunk, ProviderError>>) -> Self {
        Self {
            chunks,
            ..Self::new(Vec::new())
        }
    }

    fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        self.requests.lock().unwrap().push(request.clone());
        let completions = self.completions.lock().unwrap();
        // The last scripted completion repeats once the script runs out.
        let index = (*count).min(completions.len().saturating_sub(1));
        *count += 1;
        let text = completions
            .get(index)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::NotConfigured("no script".into())))?;
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 900,
                completion_tokens: 1200,
                total_tokens: 2100,
            }),
            model: request.model,
        })
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        *self.call_count.lock().unwrap() += 1;
        self.requests.lock().unwrap().push(request);
        let (tx, rx) = tokio::sync::mpsc::channel(self.chunks.len().max(1));
        for chunk in self.chunks.clone() {
            let _ = tx.send(chunk).await;
        }
        Ok(rx)
    }
}

/// Collects chunks like a WebSocket client would.
#[derive(Default)]
struct CollectingSink {
    chunks: Vec<String>,
    error: Option<String>,
}

#[async_trait]
impl ChunkSink for CollectingSink {
    fn is_open(&self) -> bool {
        self.error.is_none()
    }

    async fn send_chunk(&mut self, chunk: &str) -> Result<(), SinkClosed> {
        self.chunks.push(chunk.to_string());
        Ok(())
    }

    async fn close_with_error(&mut self, reason: &str) {
        self.error = Some(reason.to_string());
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

fn guide_json() -> serde_json::Value {
    json!({
        "overview": "Five days from Cusco to Machu Picchu.",
        "tips_and_recommendations": {
            "altitude": "Spend the first day resting in Cusco",
            "tickets": "Book Machu Picchu entry weeks ahead"
        },
        "must_visit_attractions": {
            "Sacred Valley": [
                {"location": "Pisac", "activities": ["Market", "Ruins hike"]},
                {"location": "Ollantaytambo", "activities": ["Fortress climb"]}
            ]
        },
        "itinerary": [
            {
                "day": "Day 1",
                "location": "Cusco",
                "date_time": "Monday, May 5",
                "list_of_images": [
                    {"image_title": "Plaza de Armas", "image_url": "https://example.org/plaza.jpg",
                     "image_description": "Main square at dusk"}
                ],
                "activities": ["Walking tour"],
                "activities_and_experiences": {"culture": ["San Pedro market"]},
                "accommodations": [{
                    "name": "Casa Andina",
                    "location": "San Blas",
                    "amenities": ["oxygen on request"],
                    "type": "hotel",
                    "description": "Colonial courtyard hotel",
                    "price_per_night": 140
                }],
                "includes": ["Breakfast"],
                "excludes": ["Dinner"]
            },
            {
                "day": "Day 2",
                "location": "Aguas Calientes",
                "date_time": "Tuesday, May 6",
                "list_of_images": [],
                "activities": ["Train through the valley"],
                "activities_and_experiences": {},
                "accommodations": [],
                "includes": ["Train ticket"],
                "excludes": []
            }
        ],
        "budget_breakdown": {
            "transport": {"train": "$180 return", "bus": "$24 return"},
            "lodging": {"hotels": "$140 per night"}
        },
        "safety_tips": ["Drink bottled water", "Watch for altitude sickness"],
        "conclusion": "Ruins, markets and mountain air."
    })
}

fn peru_query(budget: f64) -> TravelQuery {
    let dates = DateRange::new(
        NaiveDate::from_ymd_opt(2025, 5, 5).unwrap(),
        NaiveDate::from_ymd_opt(2025, 5, 9).unwrap(),
    )
    .unwrap();
    TravelQuery::from_lists(
        &["Cusco".to_string(), "Machu Picchu".to_string()],
        dates,
        &["History".to_string(), "Hiking".to_string()],
        budget,
        2,
    )
    .unwrap()
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(2, Duration::from_secs(5)).with_initial_backoff(Duration::ZERO)
}

fn service_with(guide: Arc<ScriptedProvider>, chat: Arc<ScriptedProvider>) -> TravelGuideService {
    let guide = LlmGateway::new(guide, ModelProfile::guide()).with_retry_policy(fast_retry());
    let chat = LlmGateway::new(chat, ModelProfile::chat()).with_retry_policy(fast_retry());
    TravelGuideService::new(Arc::new(guide), Arc::new(chat))
}

fn guide_service(provider: Arc<ScriptedProvider>) -> TravelGuideService {
    service_with(provider, Arc::new(ScriptedProvider::new(Vec::new())))
}

// ── Structured guide ─────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_guide_from_query_to_document() {
    let provider = Arc::new(ScriptedProvider::text(&guide_json().to_string()));
    let service = guide_service(provider.clone());

    let doc = service.generate_guide(&peru_query(2500.0)).await.unwrap();

    assert_eq!(doc.itinerary.len(), 2);
    assert_eq!(doc.accommodation_count(), 1);
    assert_eq!(doc.itinerary[0].accommodations[0].kind, "hotel");
    assert_eq!(doc.must_visit_attractions["Sacred Valley"].len(), 2);
    assert_eq!(provider.calls(), 1);

    let request = &provider.requests()[0];
    assert_eq!(request.temperature, 0.0);
    assert!(!request.stream);
    let prompt = &request.messages[0].content;
    assert!(prompt.contains("Cusco, Machu Picchu"));
    assert!(prompt.contains("History, Hiking"));
    assert!(prompt.contains("Comfort tier"));
    assert!(prompt.contains("2025-05-05 to 2025-05-09 (5 days)"));
}

#[tokio::test]
async fn e2e_guide_accepts_enveloped_output() {
    for key in ["output", "response", "result"] {
        let wrapped = json!({ key: guide_json().to_string() }).to_string();
        let provider = Arc::new(ScriptedProvider::text(&wrapped));

        let doc = guide_service(provider)
            .generate_guide(&peru_query(1200.0))
            .await
            .unwrap();
        assert_eq!(doc.conclusion, "Ruins, markets and mountain air.");
    }
}

#[tokio::test]
async fn e2e_budget_tiers_follow_boundaries() {
    let cases = [
        (1000.0, "Budget tier"),
        (2000.0, "Budget tier"),
        (2000.01, "Comfort tier"),
        (4000.0, "Comfort tier"),
        (4000.01, "Luxury tier"),
    ];
    for (budget, expected) in cases {
        let provider = Arc::new(ScriptedProvider::text(&guide_json().to_string()));
        guide_service(provider.clone())
            .generate_guide(&peru_query(budget))
            .await
            .unwrap();
        let prompt = provider.requests()[0].messages[0].content.clone();
        assert!(prompt.contains(expected), "budget {budget} → {expected}");
    }
}

#[tokio::test]
async fn e2e_budget_below_minimum_makes_no_call() {
    let provider = Arc::new(ScriptedProvider::text(&guide_json().to_string()));
    let service = guide_service(provider.clone());

    let err = service.generate_guide(&peru_query(999.99)).await.unwrap_err();
    assert!(matches!(err, GuideError::InvalidBudget { .. }));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn e2e_transient_failures_are_retried() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(ProviderError::Network("connection refused".into())),
        Err(ProviderError::ApiError {
            status_code: 503,
            message: "overloaded".into(),
        }),
        Ok(guide_json().to_string()),
    ]));

    let doc = guide_service(provider.clone())
        .generate_guide(&peru_query(3000.0))
        .await
        .unwrap();
    assert_eq!(doc.itinerary.len(), 2);
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn e2e_backend_down_is_upstream_unavailable() {
    let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Network(
        "connection refused".into(),
    ))]));

    let err = guide_service(provider.clone())
        .generate_guide(&peru_query(3000.0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GuideError::UpstreamUnavailable { attempts: 3, .. }
    ));
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn e2e_malformed_and_invalid_outputs() {
    let cases = [
        ("Sorry, I cannot help", "malformed_output"),
        ("{\"overview\": \"cut off", "malformed_output"),
        ("{\"overview\": \"only this\"}", "schema_violation"),
    ];
    for (reply, kind) in cases {
        let provider = Arc::new(ScriptedProvider::text(reply));
        let err = guide_service(provider)
            .generate_guide(&peru_query(3000.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), kind, "reply {reply:?}");
    }
}

// ── HTTP ─────────────────────────────────────────────────────────────────

fn guide_request(budget: f64) -> Request<Body> {
    let body = json!({
        "destinations": ["Cusco", "Machu Picchu"],
        "travel_dates": {"start_date": "2025-05-05", "end_date": "2025-05-09"},
        "interests": ["History"],
        "user_budget": budget,
        "number_of_travellers": 2
    });
    Request::builder()
        .method("POST")
        .uri("/generate-travel-guide")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn e2e_http_guide_round_trip() {
    let provider = Arc::new(ScriptedProvider::text(&guide_json().to_string()));
    let app = build_router(ApiState::new(guide_service(provider.clone())), 64 * 1024);

    let response = app.oneshot(guide_request(4500.0)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let doc: TravelGuideDocument = serde_json::from_slice(&body).unwrap();
    assert_eq!(doc.itinerary[0].location, "Cusco");
    assert!(provider.requests()[0].messages[0].content.contains("Luxury tier"));
}

#[tokio::test]
async fn e2e_http_status_mapping() {
    let provider = Arc::new(ScriptedProvider::text(&guide_json().to_string()));
    let app = build_router(ApiState::new(guide_service(provider.clone())), 64 * 1024);
    let response = app.oneshot(guide_request(500.0)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(provider.calls(), 0);

    let down = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Timeout(
        "no answer".into(),
    ))]));
    let app = build_router(ApiState::new(guide_service(down)), 64 * 1024);
    let response = app.oneshot(guide_request(1500.0)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["kind"], "upstream_unavailable");
}

// ── Chat streaming ───────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_chat_streams_in_order() {
    let chat = Arc::new(ScriptedProvider::streaming(vec![
        Ok(StreamChunk::text("## Best time\n")),
        Ok(StreamChunk::text("")),
        Ok(StreamChunk::text("May to September ")),
        Ok(StreamChunk::text("is the dry season.")),
        Ok(StreamChunk::done(None)),
    ]));
    let service = service_with(Arc::new(ScriptedProvider::new(Vec::new())), chat.clone());
    let mut sink = CollectingSink::default();

    let outcome = service
        .stream_chat("When should I hike to Machu Picchu?", &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome, RelayOutcome::Completed { chunks: 3 });
    assert_eq!(
        sink.chunks,
        ["## Best time\n", "May to September ", "is the dry season."]
    );

    let request = &chat.requests()[0];
    assert!(request.stream);
    assert_eq!(request.temperature, 0.9);
    assert!(request.messages[0].content.contains("Markdown"));
    assert_eq!(request.messages[1].content, "When should I hike to Machu Picchu?");
}

#[tokio::test]
async fn e2e_chat_upstream_error_closes_client() {
    let chat = Arc::new(ScriptedProvider::streaming(vec![
        Ok(StreamChunk::text("Start")),
        Err(ProviderError::StreamInterrupted("socket reset".into())),
    ]));
    let service = service_with(Arc::new(ScriptedProvider::new(Vec::new())), chat);
    let mut sink = CollectingSink::default();

    let err = service.stream_chat("Hi", &mut sink).await.unwrap_err();
    assert!(matches!(err, GuideError::StreamingUpstreamError(_)));
    assert_eq!(sink.chunks, ["Start"]);
    assert!(sink.error.unwrap().contains("socket reset"));
}

// ── Configuration ────────────────────────────────────────────────────────

#[test]
fn e2e_default_config_round_trips_and_resolves() {
    let text = AppConfig::default_toml();
    let mut config: AppConfig = toml::from_str(&text).unwrap();
    assert!(config.require_backend().is_err());

    let env: HashMap<&str, &str> = HashMap::from([
        ("OLLAMA_BASE_URL", "http://localhost:11434/v1"),
        ("GROQ_API_KEY", "gsk-e2e"),
    ]);
    config.apply_env(|key| env.get(key).map(|v| v.to_string()));
    config.validate().unwrap();
    config.require_backend().unwrap();

    let service = TravelGuideService::from_config(&config).unwrap();
    assert_eq!(service.guide_gateway().model(), "llama-3.3-70b-versatile");
    assert_eq!(service.chat_gateway().model(), "llama3.2:1b");
}
