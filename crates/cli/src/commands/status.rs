//! `cardsense status`: show effective configuration.

use cardsense_config::AppConfig;
use cardsense_core::HandleStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let config_path = AppConfig::config_path();

    println!("💳 CardSense Status");
    println!("===================");
    println!("  Config file:   {}", config_path.display());
    println!("  API URL:       {}", config.api_url);
    println!("  API key:       {}", if config.has_api_key() { "configured" } else { "missing" });
    println!("  Model:         {}", config.model);
    println!("  Deployment:    {}", config.deployment);
    println!("  Documents:     {}", config.knowledge_base.documents_dir.display());
    println!("  System prompt: {}", config.assistant.system_prompt_path.display());
    println!("  Gateway:       {}:{}", config.gateway.host, config.gateway.port);

    let handle = match (&config.knowledge_base.vector_store_id, config.handle_store()) {
        (Some(id), _) => format!("{id} (configured)"),
        (None, Some(store)) => match store.load() {
            Ok(Some(handle)) => format!("{handle} (persisted in {})", store.path().display()),
            Ok(None) => "not provisioned yet".to_string(),
            Err(e) => format!("unreadable: {e}"),
        },
        (None, None) => "missing (VECTOR_STORE_ID required)".to_string(),
    };
    println!("  Knowledge base: {handle}");

    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file, using defaults. Run `cardsense init` to create one.");
    }

    Ok(())
}
