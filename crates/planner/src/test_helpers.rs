//! Shared fixtures and provider doubles for planner tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use travelguide_core::error::ProviderError;
use travelguide_core::guide::TravelGuideDocument;
use travelguide_core::message::Message;
use travelguide_core::provider::{
    ChunkReceiver, Provider, ProviderRequest, ProviderResponse, StreamChunk,
};
use travelguide_core::query::{DateRange, TravelQuery};

pub fn sample_query(budget: f64) -> TravelQuery {
    let dates = DateRange::new(
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 6, 7).unwrap(),
    )
    .unwrap();
    TravelQuery::from_lists(
        &["Tanzania".to_string()],
        dates,
        &["Safari".to_string(), "Beaches".to_string()],
        budget,
        2,
    )
    .unwrap()
}

pub fn sample_guide_json() -> Value {
    json!({
        "overview": "Seven days between the Serengeti and Zanzibar.",
        "tips_and_recommendations": {
            "packing": "Neutral colours for game drives",
            "money": "Carry small USD notes for tips"
        },
        "must_visit_attractions": {
            "Northern Circuit": [
                {"location": "Serengeti", "activities": ["Game drive", "Balloon safari"]}
            ]
        },
        "itinerary": [{
            "day": "Day 1",
            "location": "Serengeti",
            "date_time": "Sunday, Jun 1",
            "list_of_images": [
                {"image_title": "Lion Pride", "image_url": null, "image_description": "Lions at dawn"}
            ],
            "activities": ["Morning game drive"],
            "activities_and_experiences": {"wildlife": ["Big five safari"]},
            "accommodations": [{
                "name": "Four Seasons Safari Lodge",
                "location": "Central Serengeti",
                "amenities": ["pool", "spa"],
                "type": "lodge",
                "description": "Lodge overlooking a watering hole",
                "price_per_night": 1450.0
            }],
            "includes": ["Park fees"],
            "excludes": ["Tips"]
        }],
        "budget_breakdown": {
            "accommodation": {"lodges": "$1450 per night"}
        },
        "safety_tips": ["Stay inside the vehicle near wildlife"],
        "conclusion": "A week of wildlife and white sand."
    })
}

pub fn sample_document() -> TravelGuideDocument {
    serde_json::from_value(sample_guide_json()).unwrap()
}

/// Answers every blocking call with `reply` and every stream with `chunks`,
/// counting calls of each kind.
pub struct ScriptedProvider {
    reply: String,
    chunks: Vec<Result<StreamChunk, ProviderError>>,
    completions: AtomicUsize,
    streams: AtomicUsize,
    last_request: Mutex<Option<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            chunks: Vec::new(),
            completions: AtomicUsize::new(0),
            streams: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn streaming(chunks: Vec<Result<StreamChunk, ProviderError>>) -> Self {
        Self {
            chunks,
            ..Self::replying("")
        }
    }

    pub fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }

    pub fn streams(&self) -> usize {
        self.streams.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.completions.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        Ok(ProviderResponse {
            message: Message::assistant(self.reply.clone()),
            usage: None,
            model: request.model,
        })
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        self.streams.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        let (tx, rx) = tokio::sync::mpsc::channel(self.chunks.len().max(1));
        for item in self.chunks.clone() {
            let _ = tx.send(item).await;
        }
        Ok(rx)
    }
}
