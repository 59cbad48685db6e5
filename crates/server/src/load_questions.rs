use anyhow::Context;
use polls::config::Config;
use polls::loader;
use polls::store::PgStore;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::load()?;
    let database_url = config.database_url.context("DATABASE_URL must be set")?;
    let store = PgStore::connect(&database_url, config.max_connections).await?;
    store.migrate().await?;

    println!("Connected to database!");

    let path = env::args().nth(1).unwrap_or_else(|| "questions.txt".to_string());
    let content = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {path} - make sure it exists!"))?;
    let seeds = loader::parse(&content)?;

    let report = loader::load(&store, seeds, chrono::Utc::now()).await?;
    for question in &report.skipped {
        println!("⊘ Skipped (duplicate): {}", question);
    }
    for question in &report.loaded {
        println!("✓ Loaded: {}", question);
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Successfully loaded {} new questions!", report.loaded.len());
    if !report.skipped.is_empty() {
        println!("⊘ Skipped {} duplicate questions", report.skipped.len());
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    Ok(())
}
