//! `cardsense init`: first-time setup.

use cardsense_assistant::FALLBACK_INSTRUCTIONS;
use cardsense_config::AppConfig;
use std::path::Path;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_path();
    let config = AppConfig::load_from(&config_path)
        .map_err(|e| format!("Failed to load config: {e}"))?;

    println!("💳 CardSense: First-Time Setup");
    println!("==============================\n");

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
    } else {
        write_new(&config_path, &AppConfig::default_toml())?;
        println!("✅ Created {}", config_path.display());
    }

    let prompt_path = &config.assistant.system_prompt_path;
    if prompt_path.exists() {
        println!("   System prompt exists: {}", prompt_path.display());
    } else {
        let mut prompt = String::from("# CardSense\n\n");
        prompt.push_str(FALLBACK_INSTRUCTIONS);
        prompt.push('\n');
        write_new(prompt_path, &prompt)?;
        println!("✅ Created {}", prompt_path.display());
    }

    let docs_dir = &config.knowledge_base.documents_dir;
    if !docs_dir.exists() {
        std::fs::create_dir_all(docs_dir)?;
        println!("✅ Created documents directory: {}", docs_dir.display());
    }

    println!("\n📝 Next steps:");
    println!("   1. Put OPENAI_API_KEY=sk-... in .env");
    println!("   2. Drop bank and card .txt files into {}", docs_dir.display());
    println!("   3. Run: cardsense chat\n");

    Ok(())
}

fn write_new(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
}
