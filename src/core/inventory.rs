//! Inventory state container.
//!
//! `Inventory` is the in-memory mirror of the three persisted collections
//! (categories, items, settings) plus the active category selection. It is
//! the only place the collections are mutated. Every operation records which
//! collections it touched in a [`Dirty`] set; [`crate::core::session::Session`]
//! drains that set after each operation and writes exactly those collections
//! back to the key-value store.
//!
//! Nothing here does I/O, so every invariant can be tested synchronously.

use crate::{
    core::{insight::InventorySnapshot, sync::SyncPayload},
    errors::{Error, Result},
    models::{
        AppSettings, AppState, CardOption, Category, InventoryItem, SettingsDefaults, Theme,
        normalize_icon,
    },
};
use chrono::Utc;
use tracing::warn;

/// Collections changed since the last commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dirty {
    /// The category list changed
    pub categories: bool,
    /// The item list changed
    pub items: bool,
    /// The settings record changed
    pub settings: bool,
}

impl Dirty {
    /// True when nothing needs to be written
    #[must_use]
    pub const fn is_clean(self) -> bool {
        !self.categories && !self.items && !self.settings
    }
}

/// Explicit confirmation for destructive operations.
///
/// A plain `bool` is a pre-confirmed answer; a closure is asked with the
/// prompt text and answers yes or no.
pub trait Confirm {
    /// Returns true if the action described by `prompt` may proceed
    fn confirm(&self, prompt: &str) -> bool;
}

impl Confirm for bool {
    fn confirm(&self, _prompt: &str) -> bool {
        *self
    }
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Outcome of a confirmation-gated delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deletion<T> {
    /// The record was removed
    Deleted(T),
    /// Confirmation was refused; nothing changed
    Declined,
    /// No record with that id; nothing changed
    NotFound,
}

/// A removed category and how many of its items went with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedCategory {
    /// The category as it was before deletion
    pub category: Category,
    /// Number of items removed by the cascade
    pub removed_items: usize,
}

/// Input of the add-item form.
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    /// Item name
    pub name: String,
    /// Raw quantity text as typed by the user
    pub quantity: String,
    /// Target category id
    pub category_id: String,
    /// Photo, already encoded as a `data:` URI
    pub photo: Option<String>,
}

/// Parses a user-typed quantity leniently.
///
/// Leading digits are read after an optional sign and anything after them is
/// ignored, so `"12 cabeças"` is 12. Input without digits and negative
/// numbers become 0; values beyond `u32::MAX` saturate.
#[must_use]
pub fn parse_quantity(input: &str) -> u32 {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 || negative {
        return 0;
    }

    rest[..digits_len]
        .bytes()
        .try_fold(0_u32, |acc, digit| {
            acc.checked_mul(10)?.checked_add(u32::from(digit - b'0'))
        })
        .unwrap_or(u32::MAX)
}

/// The in-memory inventory.
#[derive(Debug, Clone)]
pub struct Inventory {
    categories: Vec<Category>,
    items: Vec<InventoryItem>,
    settings: AppSettings,
    defaults: SettingsDefaults,
    active_category_id: Option<String>,
    dirty: Dirty,
}

impl Inventory {
    /// Builds an inventory from loaded collections. Settings are merged with
    /// `defaults`, items whose category is gone are dropped, and the first
    /// category becomes active.
    #[must_use]
    pub fn new(
        categories: Vec<Category>,
        mut items: Vec<InventoryItem>,
        settings: AppSettings,
        defaults: SettingsDefaults,
    ) -> Self {
        let before = items.len();
        items.retain(|item| categories.iter().any(|c| c.id == item.category_id));
        if items.len() != before {
            warn!(
                "Dropped {} item(s) whose category no longer exists",
                before - items.len()
            );
        }

        let active_category_id = categories.first().map(|c| c.id.clone());
        Self {
            categories,
            items,
            settings: settings.merged_with(&defaults),
            defaults,
            active_category_id,
            dirty: Dirty::default(),
        }
    }

    /// An inventory with no categories, no items and default settings
    #[must_use]
    pub fn empty(defaults: SettingsDefaults) -> Self {
        Self::new(Vec::new(), Vec::new(), AppSettings::default(), defaults)
    }

    /// All categories in display order
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// All items in insertion order
    #[must_use]
    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    /// The settings record
    #[must_use]
    pub const fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Fallbacks used when merging settings
    #[must_use]
    pub const fn defaults(&self) -> &SettingsDefaults {
        &self.defaults
    }

    /// Collections changed since the last [`Self::take_dirty`]
    #[must_use]
    pub const fn dirty(&self) -> Dirty {
        self.dirty
    }

    /// Returns and clears the dirty set
    pub fn take_dirty(&mut self) -> Dirty {
        std::mem::take(&mut self.dirty)
    }

    /// Flags `dirty` as needing a write, on top of what is already flagged
    pub const fn mark_dirty(&mut self, dirty: Dirty) {
        self.dirty.categories |= dirty.categories;
        self.dirty.items |= dirty.items;
        self.dirty.settings |= dirty.settings;
    }

    /// The full exportable state
    #[must_use]
    pub fn to_state(&self) -> AppState {
        AppState {
            categories: self.categories.clone(),
            items: self.items.clone(),
            settings: self.settings.clone(),
        }
    }

    /// Photo-free copy of the inventory for the insight gateway
    #[must_use]
    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            farm_name: self.settings.display_name().to_string(),
            categories: self.categories.clone(),
            items: self
                .items
                .iter()
                .map(|item| InventoryItem {
                    photo: None,
                    ..item.clone()
                })
                .collect(),
        }
    }

    /// Looks up a category by exact id, then by case-insensitive name
    #[must_use]
    pub fn find_category(&self, query: &str) -> Option<&Category> {
        let query = query.trim();
        let lowered = query.to_lowercase();
        self.categories
            .iter()
            .find(|c| c.id == query)
            .or_else(|| {
                self.categories
                    .iter()
                    .find(|c| c.name.trim().to_lowercase() == lowered)
            })
    }

    /// Looks up an item by exact id, then by case-insensitive name
    #[must_use]
    pub fn find_item(&self, query: &str) -> Option<&InventoryItem> {
        let query = query.trim();
        let lowered = query.to_lowercase();
        self.items.iter().find(|i| i.id == query).or_else(|| {
            self.items
                .iter()
                .find(|i| i.name.trim().to_lowercase() == lowered)
        })
    }

    /// The active category, if any
    #[must_use]
    pub fn active_category(&self) -> Option<&Category> {
        let id = self.active_category_id.as_deref()?;
        self.categories.iter().find(|c| c.id == id)
    }

    /// Makes `id` the active category. Returns false if it is unknown.
    pub fn select_category(&mut self, id: &str) -> bool {
        if self.categories.iter().any(|c| c.id == id) {
            self.active_category_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Items of one category in insertion order
    pub fn items_by_category<'a>(
        &'a self,
        category_id: &'a str,
    ) -> impl Iterator<Item = &'a InventoryItem> + 'a {
        self.items
            .iter()
            .filter(move |item| item.category_id == category_id)
    }

    /// Number of items in one category
    #[must_use]
    pub fn category_item_count(&self, category_id: &str) -> usize {
        self.items_by_category(category_id).count()
    }

    /// Sum of quantities over items selected for the total
    #[must_use]
    pub fn selected_total(&self) -> u64 {
        self.items
            .iter()
            .filter(|item| item.is_selected_for_sum)
            .map(|item| u64::from(item.quantity))
            .sum()
    }

    /// Appends a new category with a fresh id. The first category ever added
    /// also becomes the active one.
    pub fn add_category(&mut self, name: &str, icon: &str) -> Category {
        let category = Category {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            icon: normalize_icon(icon).to_string(),
        };
        self.categories.push(category.clone());
        if self.active_category().is_none() {
            self.active_category_id = Some(category.id.clone());
        }
        self.dirty.categories = true;
        category
    }

    /// Replaces the name and icon of a category in place. `None` if the id is
    /// unknown.
    pub fn rename_category(&mut self, id: &str, name: &str, icon: &str) -> Option<Category> {
        let category = self.categories.iter_mut().find(|c| c.id == id)?;
        category.name = name.trim().to_string();
        category.icon = normalize_icon(icon).to_string();
        let renamed = category.clone();
        self.dirty.categories = true;
        Some(renamed)
    }

    /// Deletes a category together with every item that belongs to it.
    ///
    /// If the category was active, the selection moves to the first remaining
    /// category, or to none when the list is empty.
    pub fn delete_category(
        &mut self,
        id: &str,
        confirm: &impl Confirm,
    ) -> Deletion<DeletedCategory> {
        let Some(position) = self.categories.iter().position(|c| c.id == id) else {
            return Deletion::NotFound;
        };

        let prompt = format!(
            "⚠️ ATENÇÃO: Excluir a aba \"{}\" apagará permanentemente TODOS os itens dentro dela. Deseja continuar?",
            self.categories[position].name
        );
        if !confirm.confirm(&prompt) {
            return Deletion::Declined;
        }

        let category = self.categories.remove(position);
        let before = self.items.len();
        self.items.retain(|item| item.category_id != category.id);
        let removed_items = before - self.items.len();

        if self.active_category_id.as_deref() == Some(category.id.as_str()) {
            self.active_category_id = self.categories.first().map(|c| c.id.clone());
        }

        self.dirty.categories = true;
        if removed_items > 0 {
            self.dirty.items = true;
        }

        Deletion::Deleted(DeletedCategory {
            category,
            removed_items,
        })
    }

    /// Creates an item selected for the total, coercing the quantity text.
    ///
    /// # Errors
    /// Returns [`Error::CategoryNotFound`] if `category_id` is not a live
    /// category.
    pub fn add_item(&mut self, new_item: NewItem) -> Result<InventoryItem> {
        if !self.categories.iter().any(|c| c.id == new_item.category_id) {
            return Err(Error::CategoryNotFound {
                id: new_item.category_id,
            });
        }

        let item = InventoryItem {
            id: uuid::Uuid::new_v4().to_string(),
            name: new_item.name.trim().to_string(),
            quantity: parse_quantity(&new_item.quantity),
            photo: new_item.photo,
            category_id: new_item.category_id,
            created_at: Utc::now().timestamp_millis(),
            is_selected_for_sum: true,
        };
        self.items.push(item.clone());
        self.dirty.items = true;
        Ok(item)
    }

    /// Removes one item after confirmation.
    pub fn delete_item(&mut self, id: &str, confirm: &impl Confirm) -> Deletion<InventoryItem> {
        let Some(position) = self.items.iter().position(|i| i.id == id) else {
            return Deletion::NotFound;
        };

        let prompt = format!("Excluir o item \"{}\"?", self.items[position].name);
        if !confirm.confirm(&prompt) {
            return Deletion::Declined;
        }

        let item = self.items.remove(position);
        self.dirty.items = true;
        Deletion::Deleted(item)
    }

    /// Flips whether an item counts toward the total. Returns the new flag,
    /// `None` if the id is unknown.
    pub fn toggle_selection(&mut self, id: &str) -> Option<bool> {
        let item = self.items.iter_mut().find(|i| i.id == id)?;
        item.is_selected_for_sum = !item.is_selected_for_sum;
        self.dirty.items = true;
        Some(item.is_selected_for_sum)
    }

    /// Renames the farm
    pub fn set_farm_name(&mut self, name: &str) {
        self.settings.farm_name = Some(name.trim().to_string());
        self.dirty.settings = true;
    }

    /// Switches the colour palette
    pub const fn set_theme(&mut self, theme: Theme) {
        self.settings.theme = theme;
        self.dirty.settings = true;
    }

    /// Flips one card option and returns its new value
    pub const fn toggle_card_option(&mut self, option: CardOption) -> bool {
        self.dirty.settings = true;
        self.settings.card_options.toggle(option)
    }

    /// Replaces the background with a `data:` URI or URL
    pub fn set_background_image(&mut self, image: String) {
        self.settings.background_image = Some(image);
        self.settings = std::mem::take(&mut self.settings).merged_with(&self.defaults);
        self.dirty.settings = true;
    }

    /// Sets or clears the address export mails go to
    pub fn set_user_email(&mut self, email: Option<&str>) {
        self.settings.user_email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        self.dirty.settings = true;
    }

    /// Records the time of an export
    pub const fn mark_synced(&mut self, at_millis: i64) {
        self.settings.last_sync = Some(at_millis);
        self.dirty.settings = true;
    }

    /// Replaces the whole state with an imported payload.
    ///
    /// Categories and items are overwritten, settings only when the payload
    /// carries them. The first imported category becomes active.
    pub fn import(&mut self, payload: SyncPayload) {
        self.categories = payload.categories;
        self.items = payload.items;
        self.dirty.categories = true;
        self.dirty.items = true;

        if let Some(settings) = payload.settings {
            self.settings = settings.merged_with(&self.defaults);
            self.dirty.settings = true;
        }

        self.active_category_id = self.categories.first().map(|c| c.id.clone());
    }
}
