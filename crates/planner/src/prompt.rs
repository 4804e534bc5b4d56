//! Prompt rendering for the two LLM paths.
//!
//! The guide prompt embeds the output schema as a JSON Schema document so
//! the model sees the exact field names [`reconcile`](crate::reconcile)
//! will enforce. Both builders are pure.

use serde_json::{Value, json};
use std::fmt::Write;
use travelguide_core::budget::{BudgetTier, TierDescription};
use travelguide_core::message::Message;
use travelguide_core::query::TravelQuery;

/// A rendered prompt, ready to hand to a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
}

impl Prompt {
    pub fn to_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system {
            messages.push(Message::system(system.clone()));
        }
        messages.push(Message::user(self.user.clone()));
        messages
    }
}

const CHAT_INSTRUCTIONS: &str = "\
You are a travel agent. Answer only questions about travel planning: \
destinations, itineraries, transport, accommodation, budgets, visas, \
safety and local customs.
If a question is not about travel, politely decline in one sentence and \
invite the user to ask a travel question instead.
The response must be in Markdown format.";

/// Build the structured-guide prompt for a classified query.
///
/// The tier description is passed in rather than looked up so callers
/// decide classification once and the prompt reflects exactly that choice.
pub fn build_guide_prompt(
    query: &TravelQuery,
    tier: BudgetTier,
    description: &TierDescription,
    schema: &Value,
) -> Prompt {
    let start = query.dates.start_date;
    let end = query.dates.end_date;
    let days = query.dates.days();
    let interests = if query.interests.is_empty() {
        "general sightseeing"
    } else {
        query.interests.as_str()
    };

    let mut user = String::new();
    let _ = writeln!(
        user,
        "You are a travel agent creating a detailed travel guide based on these details:"
    );
    let _ = writeln!(user, "- Destinations: {}", query.destinations);
    let _ = writeln!(user, "- Travel dates: {start} to {end} ({days} days)");
    let _ = writeln!(user, "- Interests: {interests}");
    let _ = writeln!(
        user,
        "- Budget: {:.2} USD, {} tier ({description})",
        query.budget, tier
    );
    let _ = writeln!(user, "- Travellers: {}", query.travellers);
    let _ = writeln!(user);

    let _ = writeln!(
        user,
        "Tailor every recommendation to the {tier} tier. For reference, the tiers are:"
    );
    for t in BudgetTier::ALL {
        let d = t.description();
        let _ = writeln!(
            user,
            "- {t} ({}): {}, {}, {}, {}, {}",
            d.range, d.accommodations, d.tours, d.transportation, d.meals, d.extras
        );
    }
    let _ = writeln!(user);

    let _ = writeln!(
        user,
        "Return a single JSON object with real travel guide content. It must conform to this JSON Schema:"
    );
    let schema_text = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
    let _ = writeln!(user, "{schema_text}");
    let _ = writeln!(user);

    let _ = writeln!(user, "Rules:");
    let _ = writeln!(
        user,
        "(a) Output only the populated JSON object, with no text, Markdown fences or commentary before or after it."
    );
    let _ = writeln!(
        user,
        "(b) Every itinerary date must fall between {start} and {end}, with one itinerary entry per day."
    );
    let _ = writeln!(
        user,
        "(c) Keep all costs within the {tier} tier ({}) for {} traveller(s).",
        description.range, query.travellers
    );
    let _ = writeln!(
        user,
        "(d) Each itinerary day lists images, activities and accommodations; price_per_night is a number in USD."
    );
    let _ = writeln!(
        user,
        "(e) Include a budget breakdown with specific costs per category, safety tips and a conclusion."
    );
    let _ = write!(
        user,
        "(f) Do not repeat the schema itself; fill it with content for {}.",
        query.destinations
    );

    Prompt { system: None, user }
}

/// Build the conversational travel-chat prompt.
pub fn build_chat_prompt(question: &str) -> Prompt {
    Prompt {
        system: Some(CHAT_INSTRUCTIONS.to_string()),
        user: question.trim().to_string(),
    }
}

fn string() -> Value {
    json!({ "type": "string" })
}

fn array(items: Value) -> Value {
    json!({ "type": "array", "items": items })
}

fn map_of(values: Value) -> Value {
    json!({ "type": "object", "additionalProperties": values })
}

fn object(properties: Value) -> Value {
    let required: Vec<String> = properties
        .as_object()
        .map(|p| p.keys().cloned().collect())
        .unwrap_or_default();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// JSON Schema of [`TravelGuideDocument`](travelguide_core::TravelGuideDocument).
pub fn guide_output_schema() -> Value {
    let image = object(json!({
        "image_title": string(),
        "image_url": string(),
        "image_description": string(),
    }));

    let accommodation = object(json!({
        "name": string(),
        "location": string(),
        "amenities": array(string()),
        "type": { "type": "string", "description": "hotel, lodge, resort, hostel, ..." },
        "description": string(),
        "price_per_night": { "type": "number", "minimum": 0 },
    }));

    let day = object(json!({
        "day": { "type": "string", "description": "Day label such as \"Day 1\"" },
        "location": string(),
        "date_time": { "type": "string", "description": "Weekday and date of this day" },
        "list_of_images": array(image),
        "activities": array(string()),
        "activities_and_experiences": map_of(array(string())),
        "accommodations": array(accommodation),
        "includes": array(string()),
        "excludes": array(string()),
    }));

    let attraction = object(json!({
        "location": string(),
        "activities": array(string()),
    }));

    let mut schema = object(json!({
        "overview": string(),
        "tips_and_recommendations": map_of(string()),
        "must_visit_attractions": map_of(array(attraction)),
        "itinerary": array(day),
        "budget_breakdown": map_of(map_of(string())),
        "safety_tips": array(string()),
        "conclusion": string(),
    }));
    if let Some(root) = schema.as_object_mut() {
        root.insert("title".into(), json!("TravelGuideDocument"));
    }
    schema
}
