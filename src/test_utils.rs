//! Shared test utilities.
//!
//! Helpers for an in-memory database and for building inventory fixtures with
//! sensible defaults.

use crate::{
    config::AppConfig,
    core::{inventory::Inventory, inventory::NewItem, session::Session},
    errors::Result,
    models::{AppSettings, SettingsDefaults, default_categories},
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Session over a fresh in-memory database with the default configuration.
pub async fn setup_session() -> Result<Session> {
    let db = setup_test_db().await?;
    Session::load(db, &AppConfig::default()).await
}

/// Inventory holding the three default categories and no items.
#[must_use]
pub fn seeded_inventory() -> Inventory {
    Inventory::new(
        default_categories(),
        Vec::new(),
        AppSettings::default(),
        SettingsDefaults::default(),
    )
}

/// Add-item form input without a photo.
#[must_use]
pub fn new_item(name: &str, quantity: &str, category_id: &str) -> NewItem {
    NewItem {
        name: name.to_string(),
        quantity: quantity.to_string(),
        category_id: category_id.to_string(),
        photo: None,
    }
}
