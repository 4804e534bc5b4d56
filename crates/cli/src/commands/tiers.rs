//! `travelguide tiers`: Print the budget tier table. Needs no config.

use travelguide_core::budget::{BudgetTier, MIN_BUDGET};

pub fn run() {
    println!("💰 Budget tiers (minimum ${MIN_BUDGET})");
    println!();
    for tier in BudgetTier::ALL {
        let description = tier.description();
        println!("  {tier} — {}", description.range);
        for (key, value) in description.entries().iter().skip(1) {
            println!("    {key:<15} {value}");
        }
        println!();
    }
}
