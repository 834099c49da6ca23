use agro_inventory::{
    bot::{self, BotData},
    config::{self, database},
    core::{
        gemini::GeminiClient,
        insight::{InsightGateway, InsightProvider, UnconfiguredProvider},
        location::ConfiguredLocation,
        session::Session,
    },
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()?;

    // 4. Open the store and load the inventory
    let database_url = database::get_database_url();
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;
    let session = Session::load(db, &app_config)
        .await
        .inspect(|_| info!("Inventory loaded successfully."))
        .inspect_err(|e| error!("Failed to load inventory: {}", e))?;

    // 5. Insight gateway and farm location
    let provider: Arc<dyn InsightProvider> = match GeminiClient::from_env(&app_config.gateway) {
        Some(client) => Arc::new(client),
        None => {
            warn!("GEMINI_API_KEY is not set; /summary and /insights are disabled.");
            Arc::new(UnconfiguredProvider)
        }
    };
    let location = ConfiguredLocation::new(app_config.location.map(Into::into));

    // 6. Run the bot
    // DISCORD_BOT_TOKEN is read here, directly before use, not stored in AppConfig
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    let data = BotData::new(session, InsightGateway::new(provider), location);
    bot::run_bot(token, data).await.map_err(Error::from)?;

    Ok(())
}
