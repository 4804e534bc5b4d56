//! `travelguide config`: Configuration management commands.

use travelguide_config::AppConfig;

pub fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");
            println!();
            println!("   Backend:   {}", config.backend.provider);
            println!(
                "   Base URL:  {}",
                config.backend.base_url.as_deref().unwrap_or("-")
            );
            println!(
                "   Guide:     {} (temperature {}, {} retries)",
                config.guide.model, config.guide.temperature, config.guide.max_retries
            );
            println!(
                "   Chat:      {} (temperature {}, {} retries)",
                config.chat.model, config.chat.temperature, config.chat.max_retries
            );
            println!(
                "   Gateway:   {}:{}",
                config.gateway.host, config.gateway.port
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub fn path() {
    println!("{}", config_path().display());
}

pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path();
    if path.exists() {
        println!("   Config already exists at {}", path.display());
        return Ok(());
    }

    std::fs::create_dir_all(AppConfig::config_dir())?;
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("   ✅ Wrote default config to {}", path.display());
    println!("   Set TRAVELGUIDE_BASE_URL and TRAVELGUIDE_API_KEY, or fill in [backend].");
    Ok(())
}

fn config_path() -> std::path::PathBuf {
    AppConfig::config_dir().join("config.toml")
}
