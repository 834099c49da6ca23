//! Persistent store binding.
//!
//! Each collection is stored as one JSON document in the `kv_entries` table
//! under a fixed key. A write serializes the whole collection and replaces the
//! stored document (last write wins). On load every key falls back to its
//! default independently when it is missing or cannot be parsed. Seeded
//! categories come back flagged dirty so the first commit stores them.

use crate::{
    core::inventory::{Dirty, Inventory},
    entities::{KvEntry, kv_entry},
    errors::Result,
    models::{AppSettings, Category, InventoryItem, SettingsDefaults, Theme},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

/// Key of the category list
pub const CATEGORIES_KEY: &str = "agro_categories";
/// Key of the item list
pub const ITEMS_KEY: &str = "agro_items";
/// Key of the settings record
pub const SETTINGS_KEY: &str = "agro_settings";

/// Reads and parses the document stored under `key`.
///
/// Returns `Ok(None)` when the key is absent. A document that does not parse
/// is logged and also treated as absent, so callers fall back to defaults.
pub async fn read_document<C, T>(db: &C, key: &str) -> Result<Option<T>>
where
    C: ConnectionTrait,
    T: DeserializeOwned,
{
    let Some(entry) = KvEntry::find()
        .filter(kv_entry::Column::Key.eq(key))
        .one(db)
        .await?
    else {
        debug!("No stored document under '{key}'");
        return Ok(None);
    };

    match serde_json::from_str(&entry.value) {
        Ok(document) => Ok(Some(document)),
        Err(e) => {
            warn!("Stored document '{key}' is unreadable, using defaults: {e}");
            Ok(None)
        }
    }
}

/// Serializes `document` and stores it under `key`, replacing any previous
/// value.
pub async fn write_document<C, T>(db: &C, key: &str, document: &T) -> Result<()>
where
    C: ConnectionTrait,
    T: Serialize + ?Sized,
{
    let value = serde_json::to_string(document)?;
    let now = Utc::now().naive_utc();

    let existing = KvEntry::find()
        .filter(kv_entry::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(entry) = existing {
        let mut active_model: kv_entry::ActiveModel = entry.into();
        active_model.value = Set(value);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_entry = kv_entry::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
            updated_at: Set(now),
            ..Default::default()
        };
        new_entry.insert(db).await?;
    }

    debug!("Wrote document '{key}'");
    Ok(())
}

/// Loads the three collections, falling back to `seed_categories`, an empty
/// item list and default settings for whichever key is missing or unreadable.
pub async fn load_inventory<C>(
    db: &C,
    seed_categories: Vec<Category>,
    defaults: SettingsDefaults,
) -> Result<Inventory>
where
    C: ConnectionTrait,
{
    let stored_categories = read_document::<_, Vec<Category>>(db, CATEGORIES_KEY).await?;
    let seeded = stored_categories.is_none();
    let categories = stored_categories.unwrap_or(seed_categories);
    let items = read_document::<_, Vec<InventoryItem>>(db, ITEMS_KEY)
        .await?
        .unwrap_or_default();
    let settings = read_document::<_, Value>(db, SETTINGS_KEY)
        .await?
        .and_then(parse_settings)
        .unwrap_or_default();

    let mut inventory = Inventory::new(categories, items, settings, defaults);
    // Items reference seed ids, so the seeds must be stored before any item is
    if seeded {
        inventory.mark_dirty(Dirty {
            categories: true,
            ..Dirty::default()
        });
    }
    Ok(inventory)
}

/// Parses the stored settings record. A theme this build does not know is
/// dropped (and so defaulted) rather than discarding the whole record.
fn parse_settings(mut document: Value) -> Option<AppSettings> {
    if let Value::Object(fields) = &mut document {
        if fields
            .get("theme")
            .is_some_and(|theme| Theme::deserialize(theme).is_err())
        {
            warn!("Stored theme {:?} is unknown, using the default", fields["theme"]);
            fields.remove("theme");
        }
    }

    match serde_json::from_value(document) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!("Stored settings are unreadable, using defaults: {e}");
            None
        }
    }
}

/// Writes every collection flagged in `dirty`, clearing each flag once its
/// document is stored. On error the flags of unwritten collections remain set.
pub async fn persist<C>(db: &C, inventory: &Inventory, dirty: &mut Dirty) -> Result<()>
where
    C: ConnectionTrait,
{
    if dirty.categories {
        write_document(db, CATEGORIES_KEY, inventory.categories()).await?;
        dirty.categories = false;
    }
    if dirty.items {
        write_document(db, ITEMS_KEY, inventory.items()).await?;
        dirty.items = false;
    }
    if dirty.settings {
        write_document(db, SETTINGS_KEY, inventory.settings()).await?;
        dirty.settings = false;
    }
    Ok(())
}
