//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the inventory, including all
//! slash commands, autocomplete handlers, embed rendering and the shared bot
//! context.

/// Discord command implementations (general, category, item, settings, sync, insight)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;
/// Embed and text rendering of inventory state
pub mod views;

use crate::{
    core::{insight::InsightGateway, location::ConfiguredLocation, session::Session},
    errors::Error,
};
use poise::serenity_prelude as serenity;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
///
/// The session sits behind an async mutex so mutations are applied one at a
/// time. Insight requests take a snapshot and release the lock before calling
/// out, so a slow gateway never blocks inventory edits.
pub struct BotData {
    /// The inventory and its store
    pub session: Mutex<Session>,
    /// AI insight gateway
    pub gateway: InsightGateway,
    /// Fallback farm location for `/insights`
    pub location: ConfiguredLocation,
}

impl BotData {
    /// Creates the shared context for all commands.
    #[must_use]
    pub fn new(session: Session, gateway: InsightGateway, location: ConfiguredLocation) -> Self {
        Self {
            session: Mutex::new(session),
            gateway,
            location,
        }
    }
}

/// Command context alias
pub type Context<'a> = poise::Context<'a, BotData, Error>;

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            let reply = poise::CreateReply::default()
                .content(format!("❌ {error}"))
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Registers the commands and runs the Discord client until it stops.
#[instrument(skip_all)]
pub async fn run_bot(token: String, data: BotData) -> Result<(), serenity::Error> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))
}
