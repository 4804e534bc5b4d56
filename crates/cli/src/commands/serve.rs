//! `travelguide serve`: Start the HTTP/WebSocket gateway.

use travelguide_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🧭 TravelGuide Gateway");
    println!("   Listening:   {}:{}", config.gateway.host, config.gateway.port);
    println!("   Guide model: {}", config.guide.model);
    println!("   Chat model:  {}", config.chat.model);

    travelguide_gateway::start(config).await?;

    Ok(())
}
