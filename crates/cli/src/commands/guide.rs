//! `travelguide guide`: Run the structured pipeline once and print JSON.

use chrono::NaiveDate;
use clap::Args;
use travelguide_config::AppConfig;
use travelguide_core::query::{DateRange, TravelQuery};
use travelguide_planner::TravelGuideService;

#[derive(Debug, Args)]
pub struct GuideArgs {
    /// Destination (repeat or comma-separate for several)
    #[arg(short, long = "destination", required = true, value_delimiter = ',')]
    pub destinations: Vec<String>,

    /// First day of the trip (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last day of the trip (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,

    /// Interest (repeat or comma-separate for several)
    #[arg(short, long = "interest", value_delimiter = ',')]
    pub interests: Vec<String>,

    /// Total budget in USD (minimum 1000)
    #[arg(short, long)]
    pub budget: f64,

    /// Number of travellers
    #[arg(short, long, default_value_t = 1)]
    pub travellers: u32,
}

impl GuideArgs {
    pub fn to_query(&self) -> Result<TravelQuery, Box<dyn std::error::Error>> {
        let dates = DateRange::new(self.start, self.end)?;
        let query = TravelQuery::from_lists(
            &self.destinations,
            dates,
            &self.interests,
            self.budget,
            self.travellers,
        )?;
        Ok(query)
    }
}

pub async fn run(args: GuideArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Validate input before touching config or the network.
    let query = args.to_query()?;
    travelguide_core::budget::classify(query.budget)?;

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let service = TravelGuideService::from_config(&config)?;

    eprint!("  Planning {}...", query.destinations);
    let result = service.generate_guide(&query).await;
    eprint!("\r\x1b[2K");

    let document = result?;
    println!("{}", serde_json::to_string_pretty(&document)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: GuideArgs,
    }

    #[test]
    fn parses_lists_and_dates() {
        let cli = TestCli::parse_from([
            "guide",
            "--destination",
            "Kyoto,Osaka",
            "-d",
            "Nara",
            "--start",
            "2025-11-03",
            "--end",
            "2025-11-05",
            "--interest",
            "food",
            "--budget",
            "2500",
        ]);
        let query = cli.args.to_query().unwrap();
        assert_eq!(query.destinations, "Kyoto, Osaka, Nara");
        assert_eq!(query.interests, "food");
        assert_eq!(query.travellers, 1);
        assert_eq!(query.dates.days(), 3);
    }

    #[test]
    fn reversed_dates_fail() {
        let cli = TestCli::parse_from([
            "guide", "-d", "Lima", "--start", "2025-05-10", "--end", "2025-05-01", "-b", "3000",
        ]);
        assert!(cli.args.to_query().is_err());
    }

    #[test]
    fn invalid_date_is_a_parse_error() {
        let result = TestCli::try_parse_from([
            "guide", "-d", "Lima", "--start", "next week", "--end", "2025-05-01", "-b", "3000",
        ]);
        assert!(result.is_err());
    }
}
