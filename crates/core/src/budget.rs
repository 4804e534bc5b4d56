//! Budget tiers.
//!
//! A numeric budget maps onto one of three fixed tiers. Each tier carries a
//! static description that steers the style of recommendations in the prompt.

use crate::error::GuideError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest budget we will plan for, in USD.
pub const MIN_BUDGET: f64 = 1000.0;

/// Upper bound (inclusive) of the Budget tier.
const BUDGET_CEILING: f64 = 2000.0;

/// Upper bound (inclusive) of the Comfort tier.
const COMFORT_CEILING: f64 = 4000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BudgetTier {
    Budget,
    Comfort,
    Luxury,
}

impl BudgetTier {
    pub const ALL: [BudgetTier; 3] = [BudgetTier::Budget, BudgetTier::Comfort, BudgetTier::Luxury];

    pub fn name(&self) -> &'static str {
        match self {
            BudgetTier::Budget => "Budget",
            BudgetTier::Comfort => "Comfort",
            BudgetTier::Luxury => "Luxury",
        }
    }

    pub fn description(&self) -> &'static TierDescription {
        match self {
            BudgetTier::Budget => &BUDGET,
            BudgetTier::Comfort => &COMFORT,
            BudgetTier::Luxury => &LUXURY,
        }
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a tier buys: the fixed record embedded in the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierDescription {
    pub range: &'static str,
    pub accommodations: &'static str,
    pub tours: &'static str,
    pub transportation: &'static str,
    pub meals: &'static str,
    pub extras: &'static str,
}

impl TierDescription {
    /// Ordered `(key, value)` pairs.
    pub fn entries(&self) -> [(&'static str, &'static str); 6] {
        [
            ("range", self.range),
            ("accommodations", self.accommodations),
            ("tours", self.tours),
            ("transportation", self.transportation),
            ("meals", self.meals),
            ("extras", self.extras),
        ]
    }
}

/// Flattened `key: value, key: value` form used inside prompts.
impl fmt::Display for TierDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        Ok(())
    }
}

static BUDGET: TierDescription = TierDescription {
    range: "$1000 - $2000",
    accommodations: "3-star accommodations",
    tours: "Group tours",
    transportation: "Local transportation",
    meals: "Basic meals included",
    extras: "Guided city tours",
};

static COMFORT: TierDescription = TierDescription {
    range: "$2000 - $4000",
    accommodations: "4-star accommodations",
    tours: "Private tours",
    transportation: "Private transportation",
    meals: "Premium meals included",
    extras: "Professional photography session",
};

static LUXURY: TierDescription = TierDescription {
    range: "$4000+",
    accommodations: "5-star luxury resorts",
    tours: "VIP experiences",
    transportation: "Luxury vehicle transfers",
    meals: "Gourmet dining",
    extras: "Personal concierge service",
};

/// Classify a budget into its tier.
///
/// `[1000, 2000]` is Budget, `(2000, 4000]` is Comfort, anything above is
/// Luxury. Budgets under the minimum (and NaN) are rejected.
pub fn classify(budget: f64) -> Result<(BudgetTier, &'static TierDescription), GuideError> {
    if budget.is_nan() || budget < MIN_BUDGET {
        return Err(GuideError::InvalidBudget {
            budget,
            minimum: MIN_BUDGET,
        });
    }

    let tier = if budget <= BUDGET_CEILING {
        BudgetTier::Budget
    } else if budget <= COMFORT_CEILING {
        BudgetTier::Comfort
    } else {
        BudgetTier::Luxury
    };
    Ok((tier, tier.description()))
}
