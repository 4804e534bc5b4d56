//! `POST /generate-travel-guide`.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use travelguide_core::error::GuideError;
use travelguide_core::guide::TravelGuideDocument;
use travelguide_core::query::{DateRange, TravelQuery};

use crate::SharedState;

#[derive(Debug, Clone, Deserialize)]
pub struct GuideRequest {
    pub destinations: Vec<String>,
    pub travel_dates: TravelDates,
    #[serde(default)]
    pub interests: Vec<String>,
    pub user_budget: f64,
    pub number_of_travellers: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TravelDates {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl GuideRequest {
    pub fn into_query(self) -> Result<TravelQuery, GuideError> {
        let dates = DateRange::new(self.travel_dates.start_date, self.travel_dates.end_date)?;
        TravelQuery::from_lists(
            &self.destinations,
            dates,
            &self.interests,
            self.user_budget,
            self.number_of_travellers,
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub kind: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a pipeline error to a status and a `{detail, kind}` body.
///
/// Budget and query validation (`invalid_budget`, `invalid_query`) answer 422,
/// not a generic 500; both are detected before any LLM call. Every upstream
/// or output failure is 500.
pub fn error_response(err: &GuideError) -> ApiError {
    let status = if err.is_validation() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorResponse {
            detail: err.to_string(),
            kind: err.kind().to_string(),
        }),
    )
}

/// Build a travel guide for the posted query.
///
/// Responses:
/// - 200 with the [`TravelGuideDocument`]
/// - the axum rejection status (400, 413, 415, 422) with kind `invalid_request`
///   when the body cannot be read as a [`GuideRequest`]
/// - 422 for a budget below the minimum or an invalid query
/// - 500 when the backend is unavailable or its output cannot be used
pub async fn generate_handler(
    State(state): State<SharedState>,
    payload: Result<Json<GuideRequest>, JsonRejection>,
) -> Result<Json<TravelGuideDocument>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(status = %rejection.status(), "Rejected guide request body");
        (
            rejection.status(),
            Json(ErrorResponse {
                detail: rejection.body_text(),
                kind: "invalid_request".into(),
            }),
        )
    })?;

    let query = request.into_query().map_err(|e| error_response(&e))?;
    info!(
        destinations = %query.destinations,
        travellers = query.travellers,
        "Generating travel guide"
    );

    match state.service.generate_guide(&query).await {
        Ok(document) => Ok(Json(document)),
        Err(e) => {
            if e.is_validation() {
                warn!(kind = e.kind(), error = %e, "Guide request rejected");
            } else {
                error!(kind = e.kind(), error = %e, "Error generating travel guide");
            }
            Err(error_response(&e))
        }
    }
}
