//! `cardsense provision`: resolve the knowledge base ahead of the first question.

use cardsense_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_with_api_key()?;
    let assistant = cardsense_gateway::assistant_from_config(&config)?;

    println!("💳 CardSense Provisioning");
    println!("   Deployment: {}", config.deployment);
    println!("   Documents:  {}", config.knowledge_base.documents_dir.display());

    let handle = assistant.provisioner().resolve().await?;

    println!("\n  ✅ Knowledge base ready: {handle}");
    if let Some(store) = config.handle_store() {
        println!("     Persisted in: {}", store.path().display());
    } else {
        println!("     Set VECTOR_STORE_ID={handle} in the hosting environment.");
    }
    println!("     Config: {}", AppConfig::config_path().display());

    Ok(())
}
