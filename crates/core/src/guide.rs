//! The travel guide document produced by the structured-guide pipeline.
//!
//! Field names are the JSON wire contract shared with the LLM (via the
//! prompt's schema description) and with HTTP clients. Maps are `BTreeMap`
//! so serialization order is stable.

use crate::error::GuideError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelGuideDocument {
    pub overview: String,
    pub tips_and_recommendations: BTreeMap<String, String>,
    /// Region name → attractions in that region.
    pub must_visit_attractions: BTreeMap<String, Vec<AttractionItem>>,
    pub itinerary: Vec<ItineraryDay>,
    /// Category → subcategory → cost description.
    pub budget_breakdown: BTreeMap<String, BTreeMap<String, String>>,
    pub safety_tips: Vec<String>,
    pub conclusion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttractionItem {
    pub location: String,
    pub activities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryDay {
    /// e.g. "Day 1"
    pub day: String,
    pub location: String,
    /// e.g. "Saturday, Jun 1"
    pub date_time: String,
    pub list_of_images: Vec<ImageItem>,
    pub activities: Vec<String>,
    pub activities_and_experiences: BTreeMap<String, Vec<String>>,
    pub accommodations: Vec<AccommodationItem>,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageItem {
    pub image_title: String,
    /// Models often leave this out or send `null`; both become "".
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_url: String,
    pub image_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationItem {
    pub name: String,
    pub location: String,
    pub amenities: Vec<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub price_per_night: f64,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl TravelGuideDocument {
    /// Checks the constraints the type system cannot express.
    ///
    /// Presence and JSON types are enforced by deserialization; this covers
    /// value ranges.
    pub fn validate(&self) -> Result<(), GuideError> {
        for (day_index, day) in self.itinerary.iter().enumerate() {
            for accommodation in &day.accommodations {
                let price = accommodation.price_per_night;
                if !price.is_finite() || price < 0.0 {
                    return Err(GuideError::SchemaViolation(format!(
                        "itinerary[{day_index}] accommodation '{}' has invalid price_per_night {price}",
                        accommodation.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Total number of accommodations across all itinerary days.
    pub fn accommodation_count(&self) -> usize {
        self.itinerary.iter().map(|d| d.accommodations.len()).sum()
    }
}
