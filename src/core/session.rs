//! The running session: an [`Inventory`] bound to its store.
//!
//! Every mutating call applies the change in memory and then commits the
//! collections it touched, so the stored documents always mirror the last
//! successful mutation. Reads go straight to the inventory.

use crate::{
    config::AppConfig,
    core::{
        insight::InventorySnapshot,
        inventory::{Confirm, DeletedCategory, Deletion, Inventory, NewItem},
        photo::PhotoUpload,
        store, sync,
    },
    errors::Result,
    models::{CardOption, Category, InventoryItem, Theme},
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use tracing::{debug, info, instrument};

/// An inventory plus the connection its changes are committed to.
#[derive(Debug)]
pub struct Session {
    db: DatabaseConnection,
    inventory: Inventory,
}

/// What an import replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Categories now in the inventory
    pub categories: usize,
    /// Items now in the inventory
    pub items: usize,
    /// Whether the code carried settings
    pub settings_replaced: bool,
}

/// An export ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// The sync code
    pub code: String,
    /// `mailto:` link carrying the code, if an address is configured
    pub mailto: Option<String>,
    /// Timestamp stamped into `lastSync`
    pub synced_at: i64,
}

impl Session {
    /// Loads the stored inventory, seeding from `config` where nothing is
    /// stored yet. Seed categories are written right away.
    #[instrument(skip_all)]
    pub async fn load(db: DatabaseConnection, config: &AppConfig) -> Result<Self> {
        let inventory =
            store::load_inventory(&db, config.seed_categories(), config.defaults.clone()).await?;
        info!(
            "Loaded inventory: {} categories, {} items",
            inventory.categories().len(),
            inventory.items().len()
        );
        let mut session = Self { db, inventory };
        session.commit().await?;
        Ok(session)
    }

    /// Read access to the inventory
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// The connection changes are written to
    #[must_use]
    pub const fn database(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Writes every collection changed since the last commit.
    ///
    /// Collections that could not be written stay flagged and are retried by
    /// the next commit.
    pub async fn commit(&mut self) -> Result<()> {
        let mut pending = self.inventory.take_dirty();
        if pending.is_clean() {
            return Ok(());
        }
        debug!("Committing {pending:?}");
        let result = store::persist(&self.db, &self.inventory, &mut pending).await;
        self.inventory.mark_dirty(pending);
        result
    }

    /// Photo-free copy for the insight gateway
    #[must_use]
    pub fn snapshot(&self) -> InventorySnapshot {
        self.inventory.snapshot()
    }

    /// Makes a category active. Not persisted.
    pub fn select_category(&mut self, id: &str) -> bool {
        self.inventory.select_category(id)
    }

    /// Adds a category and stores the category list
    pub async fn add_category(&mut self, name: &str, icon: &str) -> Result<Category> {
        let category = self.inventory.add_category(name, icon);
        self.commit().await?;
        info!("Added category '{}' ({})", category.name, category.id);
        Ok(category)
    }

    /// Renames a category; `None` if the id is unknown
    pub async fn rename_category(
        &mut self,
        id: &str,
        name: &str,
        icon: &str,
    ) -> Result<Option<Category>> {
        let renamed = self.inventory.rename_category(id, name, icon);
        self.commit().await?;
        Ok(renamed)
    }

    /// Confirmation-gated cascade delete
    pub async fn delete_category(
        &mut self,
        id: &str,
        confirm: &impl Confirm,
    ) -> Result<Deletion<DeletedCategory>> {
        let outcome = self.inventory.delete_category(id, confirm);
        self.commit().await?;
        if let Deletion::Deleted(deleted) = &outcome {
            info!(
                "Deleted category '{}' and {} item(s)",
                deleted.category.name, deleted.removed_items
            );
        }
        Ok(outcome)
    }

    /// Adds an item to an existing category
    pub async fn add_item(&mut self, new_item: NewItem) -> Result<InventoryItem> {
        let item = self.inventory.add_item(new_item)?;
        self.commit().await?;
        info!("Added item '{}' x{}", item.name, item.quantity);
        Ok(item)
    }

    /// Adds an item whose photo is an upload still to be encoded.
    pub async fn add_item_with_photo(
        &mut self,
        mut new_item: NewItem,
        photo: PhotoUpload,
    ) -> Result<InventoryItem> {
        new_item.photo = Some(photo.to_data_uri());
        self.add_item(new_item).await
    }

    /// Confirmation-gated item delete
    pub async fn delete_item(
        &mut self,
        id: &str,
        confirm: &impl Confirm,
    ) -> Result<Deletion<InventoryItem>> {
        let outcome = self.inventory.delete_item(id, confirm);
        self.commit().await?;
        Ok(outcome)
    }

    /// Flips whether an item counts toward the total
    pub async fn toggle_selection(&mut self, id: &str) -> Result<Option<bool>> {
        let selected = self.inventory.toggle_selection(id);
        self.commit().await?;
        Ok(selected)
    }

    /// Renames the farm
    pub async fn set_farm_name(&mut self, name: &str) -> Result<()> {
        self.inventory.set_farm_name(name);
        self.commit().await
    }

    /// Switches the palette
    pub async fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.inventory.set_theme(theme);
        self.commit().await
    }

    /// Flips a card option, returning the new value
    pub async fn toggle_card_option(&mut self, option: CardOption) -> Result<bool> {
        let value = self.inventory.toggle_card_option(option);
        self.commit().await?;
        Ok(value)
    }

    /// Replaces the background with a URL or `data:` URI
    pub async fn set_background_image(&mut self, image: String) -> Result<()> {
        self.inventory.set_background_image(image);
        self.commit().await
    }

    /// Replaces the background with an uploaded image.
    pub async fn set_background_upload(&mut self, upload: PhotoUpload) -> Result<()> {
        self.set_background_image(upload.to_data_uri()).await
    }

    /// Sets or clears the export address
    pub async fn set_user_email(&mut self, email: Option<&str>) -> Result<()> {
        self.inventory.set_user_email(email);
        self.commit().await
    }

    /// Stamps `lastSync`, persists it and encodes the whole state.
    #[instrument(skip(self))]
    pub async fn export(&mut self) -> Result<Export> {
        let synced_at = Utc::now().timestamp_millis();
        self.inventory.mark_synced(synced_at);
        self.commit().await?;

        let code = sync::encode(&self.inventory.to_state())?;
        let settings = self.inventory.settings();
        let mailto = settings
            .user_email
            .as_ref()
            .map(|_| sync::mailto_link(settings, &code));
        info!("Exported sync code ({} bytes)", code.len());

        Ok(Export {
            code,
            mailto,
            synced_at,
        })
    }

    /// Replaces the inventory with the contents of a sync code.
    ///
    /// # Errors
    /// Returns [`crate::errors::Error::Decode`] when the code is rejected; the
    /// inventory and the store are then left exactly as they were.
    #[instrument(skip_all)]
    pub async fn import(&mut self, code: &str) -> Result<ImportSummary> {
        let payload = sync::decode_payload(code)?;
        let settings_replaced = payload.settings.is_some();

        self.inventory.import(payload);
        self.commit().await?;

        let summary = ImportSummary {
            categories: self.inventory.categories().len(),
            items: self.inventory.items().len(),
            settings_replaced,
        };
        info!("Imported sync code: {summary:?}");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        config::{app::CategorySeed, database::create_tables},
        core::store::{CATEGORIES_KEY, ITEMS_KEY, SETTINGS_KEY},
        entities::KvEntry,
        errors::{DecodeError, Error},
        models::default_categories,
        test_utils::{new_item, setup_session, setup_test_db},
    };
    use base64::{Engine, engine::general_purpose::STANDARD};
    use sea_orm::{ConnectionTrait, EntityTrait};

    async fn stored_keys(session: &Session) -> Vec<String> {
        let mut keys: Vec<String> = KvEntry::find()
            .all(session.database())
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.key)
            .collect();
        keys.sort();
        keys
    }

    fn config_with_seeds(seeds: &[(&str, &str)]) -> AppConfig {
        AppConfig {
            categories: seeds
                .iter()
                .map(|(id, name)| CategorySeed {
                    id: Some((*id).to_string()),
                    name: (*name).to_string(),
                    icon: None,
                })
                .collect(),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn test_first_run_stores_seed_categories() -> Result<()> {
        let session = setup_session().await?;
        assert_eq!(session.inventory().categories(), default_categories().as_slice());
        assert_eq!(stored_keys(&session).await, vec![CATEGORIES_KEY.to_string()]);
        assert!(session.inventory().dirty().is_clean());
        Ok(())
    }

    #[tokio::test]
    async fn test_items_survive_seed_change() -> Result<()> {
        let db = setup_test_db().await?;
        {
            let mut session = Session::load(db.clone(), &AppConfig::default()).await?;
            session.add_item(new_item("Vaca 01", "1", "cat-1")).await?;
        }

        let edited = config_with_seeds(&[("pasto", "Pasto"), ("x", "Outro")]);
        let reloaded = Session::load(db, &edited).await?;

        assert_eq!(reloaded.inventory().items().len(), 1);
        assert_eq!(reloaded.inventory().categories(), default_categories().as_slice());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_commit_is_retried() -> Result<()> {
        let db = setup_test_db().await?;
        let mut session = Session::load(db.clone(), &AppConfig::default()).await?;

        db.execute_unprepared("DROP TABLE kv_entries").await?;
        assert!(session.add_category("Sementes", "seedling").await.is_err());
        assert!(session.inventory().dirty().categories);

        create_tables(&db).await?;
        let category_id = session.inventory().categories()[3].id.clone();
        session
            .add_item(new_item("Milho", "10", &category_id))
            .await?;

        let reloaded = Session::load(db, &AppConfig::default()).await?;
        assert_eq!(reloaded.inventory().categories().len(), 4);
        assert_eq!(reloaded.inventory().items().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_only_touched_collections_are_written() -> Result<()> {
        let mut session = setup_session().await?;

        session.toggle_card_option(CardOption::Date).await?;
        assert_eq!(
            stored_keys(&session).await,
            vec![CATEGORIES_KEY.to_string(), SETTINGS_KEY.to_string()]
        );

        session.add_item(new_item("Trator", "1", "cat-2")).await?;
        assert_eq!(
            stored_keys(&session).await,
            vec![
                CATEGORIES_KEY.to_string(),
                ITEMS_KEY.to_string(),
                SETTINGS_KEY.to_string()
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_selection_is_not_persisted() -> Result<()> {
        let mut session = setup_session().await?;
        assert!(session.select_category("cat-3"));
        assert!(session.inventory().dirty().is_clean());
        session.commit().await?;
        assert_eq!(stored_keys(&session).await, vec![CATEGORIES_KEY.to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_changes_survive_reload() -> Result<()> {
        let db = setup_test_db().await?;
        let config = AppConfig::default();
        {
            let mut session = Session::load(db.clone(), &config).await?;
            let category = session.add_category("Sementes", "seedling").await?;
            session
                .add_item(new_item("Milho", "40 sacas", &category.id))
                .await?;
            session.set_farm_name("Fazenda Boa Vista").await?;
        }

        let reloaded = Session::load(db, &config).await?;
        let inventory = reloaded.inventory();
        assert_eq!(inventory.categories().len(), 4);
        assert_eq!(inventory.items()[0].quantity, 40);
        assert_eq!(inventory.settings().display_name(), "Fazenda Boa Vista");
        Ok(())
    }

    #[tokio::test]
    async fn test_add_delete_scenario() -> Result<()> {
        let mut session = setup_session().await?;

        let item = session.add_item(new_item("Vaca 01", "5", "cat-1")).await?;
        assert_eq!(session.inventory().selected_total(), 5);
        assert_eq!(session.inventory().category_item_count("cat-1"), 1);

        assert_eq!(session.toggle_selection(&item.id).await?, Some(false));
        assert_eq!(session.inventory().selected_total(), 0);

        let declined = session.delete_category("cat-1", &false).await?;
        assert_eq!(declined, Deletion::Declined);
        assert_eq!(session.inventory().items().len(), 1);

        let Deletion::Deleted(deleted) = session.delete_category("cat-1", &true).await? else {
            panic!("category should have been deleted");
        };
        assert_eq!(deleted.removed_items, 1);
        assert!(session.inventory().items().is_empty());
        assert_eq!(
            session.inventory().active_category().map(|c| c.id.as_str()),
            Some("cat-2")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_export_stamps_last_sync_and_round_trips() -> Result<()> {
        let mut session = setup_session().await?;
        session.set_user_email(Some("dono@fazenda.com")).await?;
        session.add_item(new_item("Adubo", "3", "cat-3")).await?;

        let export = session.export().await?;
        assert_eq!(
            session.inventory().settings().last_sync,
            Some(export.synced_at)
        );
        assert!(export.mailto.unwrap().starts_with("mailto:dono@fazenda"));

        let state = sync::decode(&export.code)?;
        assert_eq!(state, session.inventory().to_state());
        Ok(())
    }

    #[tokio::test]
    async fn test_import_replaces_state() -> Result<()> {
        let mut source = setup_session().await?;
        source.add_item(new_item("Boi", "7", "cat-1")).await?;
        source.set_farm_name("Sítio Origem").await?;
        let code = source.export().await?.code;

        let mut target = setup_session().await?;
        target.add_category("Outros", "box").await?;
        target.add_item(new_item("Pá", "2", "cat-3")).await?;

        let summary = target.import(&code).await?;
        assert_eq!(
            summary,
            ImportSummary {
                categories: 3,
                items: 1,
                settings_replaced: true,
            }
        );
        assert_eq!(target.inventory().to_state(), source.inventory().to_state());
        assert_eq!(
            target.inventory().active_category().map(|c| c.id.as_str()),
            Some("cat-1")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_import_without_settings_keeps_settings() -> Result<()> {
        let mut session = setup_session().await?;
        session.set_farm_name("Minha Fazenda").await?;

        let json = serde_json::json!({ "categories": default_categories(), "items": [] });
        let code = STANDARD.encode(json.to_string());

        let summary = session.import(&code).await?;
        assert!(!summary.settings_replaced);
        assert_eq!(session.inventory().settings().display_name(), "Minha Fazenda");
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_import_changes_nothing() -> Result<()> {
        let mut session = setup_session().await?;
        session.add_item(new_item("Boi", "7", "cat-1")).await?;
        let before = session.inventory().to_state();
        let rows_before = KvEntry::find().all(session.database()).await?;

        let err = session.import("isto não é um código").await.unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::Encoding(_))));

        assert_eq!(session.inventory().to_state(), before);
        assert_eq!(KvEntry::find().all(session.database()).await?, rows_before);
        assert!(session.inventory().dirty().is_clean());
        Ok(())
    }

    #[tokio::test]
    async fn test_photo_upload_is_embedded() -> Result<()> {
        let mut session = setup_session().await?;
        let item = session
            .add_item_with_photo(
                new_item("Vaca", "1", "cat-1"),
                PhotoUpload {
                    filename: "vaca.png".to_string(),
                    content_type: None,
                    bytes: vec![1, 2, 3],
                },
            )
            .await?;
        assert_eq!(item.photo.as_deref(), Some("data:image/png;base64,AQID"));

        session
            .set_background_upload(PhotoUpload {
                filename: "fundo.jpg".to_string(),
                content_type: Some("image/jpeg".to_string()),
                bytes: vec![0xff],
            })
            .await?;
        assert_eq!(
            session.inventory().settings().background_image.as_deref(),
            Some("data:image/jpeg;base64,/w==")
        );
        Ok(())
    }
}
