//! The travel query: what the caller wants a guide for.

use crate::error::GuideError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An inclusive travel window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting an end date before the start date.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, GuideError> {
        if end_date < start_date {
            return Err(GuideError::InvalidQuery(format!(
                "end date {end_date} is before start date {start_date}"
            )));
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// A validated travel query.
///
/// Construction checks every field except the budget floor, which belongs to
/// tier classification (see [`crate::budget::classify`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TravelQuery {
    /// Comma-separated destinations, e.g. "Serengeti, Ngorongoro"
    pub destinations: String,
    pub dates: DateRange,
    /// Comma-separated interests, e.g. "wildlife photography, cultural experiences"
    pub interests: String,
    /// Total budget in USD
    pub budget: f64,
    pub travellers: u32,
}

impl TravelQuery {
    pub fn new(
        destinations: impl Into<String>,
        dates: DateRange,
        interests: impl Into<String>,
        budget: f64,
        travellers: u32,
    ) -> Result<Self, GuideError> {
        let destinations = destinations.into().trim().to_string();
        if destinations.is_empty() {
            return Err(GuideError::InvalidQuery(
                "at least one destination is required".into(),
            ));
        }
        if !budget.is_finite() || budget <= 0.0 {
            return Err(GuideError::InvalidQuery(format!(
                "budget must be a positive amount, got {budget}"
            )));
        }
        if travellers == 0 {
            return Err(GuideError::InvalidQuery(
                "number of travellers must be at least 1".into(),
            ));
        }

        Ok(Self {
            destinations,
            dates,
            interests: interests.into().trim().to_string(),
            budget,
            travellers,
        })
    }

    /// Build a query from list-shaped inputs, joining each list with ", ".
    pub fn from_lists(
        destinations: &[String],
        dates: DateRange,
        interests: &[String],
        budget: f64,
        travellers: u32,
    ) -> Result<Self, GuideError> {
        let destinations = join_non_empty(destinations);
        let interests = join_non_empty(interests);
        Self::new(destinations, dates, interests, budget, travellers)
    }
}

fn join_non_empty(items: &[String]) -> String {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
