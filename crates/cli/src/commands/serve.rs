//! `cardsense serve`: start the HTTP API server.

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_with_api_key()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("💳 CardSense Gateway");
    println!("   Listening:  {}:{}", config.gateway.host, config.gateway.port);
    println!("   Deployment: {}", config.deployment);
    println!("   Model:      {}", config.model);

    cardsense_gateway::start(config).await?;

    Ok(())
}
