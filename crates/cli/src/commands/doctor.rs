//! `travelguide doctor`: Diagnose configuration and backend reachability.

use travelguide_config::AppConfig;
use travelguide_providers::LlmGateway;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 TravelGuide Doctor — System Diagnostics");
    println!("==========================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found at {}", config_path.display());
    } else {
        println!("  ℹ️  No config file, using defaults and environment");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  ⚠️  Fix the configuration before checking the backend.");
            return Ok(());
        }
    };

    for (name, profile) in [("guide", &config.guide), ("chat", &config.chat)] {
        match LlmGateway::from_config(&config, profile) {
            Ok(gateway) => {
                if gateway.health_check().await {
                    println!(
                        "  ✅ {name} backend reachable ({} via {})",
                        gateway.model(),
                        gateway.provider_name()
                    );
                } else {
                    println!(
                        "  ⚠️  {name} backend not reachable ({} via {})",
                        gateway.model(),
                        gateway.provider_name()
                    );
                    issues += 1;
                }
            }
            Err(e) => {
                println!("  ❌ {name} backend: {e}");
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
