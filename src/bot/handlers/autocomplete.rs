//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions show the human-readable name but submit the record id, so the
//! commands resolve the exact record even when two items share a name. Typed
//! text that was not picked from the list still resolves by name.

use crate::{
    bot::{BotData, views::icon_emoji},
    errors::Error,
    models::{Category, ICONS, InventoryItem},
};
use poise::serenity_prelude as serenity;

/// Discord autocomplete limit
const MAX_CHOICES: usize = 25;

/// Longest choice label Discord accepts
const MAX_LABEL_CHARS: usize = 100;

fn matches(name: &str, partial: &str) -> bool {
    name.to_lowercase().contains(&partial.trim().to_lowercase())
}

fn fit_label(label: String) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        return label;
    }
    let mut cut: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
    cut.push('…');
    cut
}

/// Label shown for a category: icon and name
#[must_use]
pub fn category_label(category: &Category) -> String {
    fit_label(format!("{} {}", icon_emoji(&category.icon), category.name))
}

/// Label shown for an item: name, category and quantity
#[must_use]
pub fn item_label(item: &InventoryItem, categories: &[Category]) -> String {
    let category = categories
        .iter()
        .find(|c| c.id == item.category_id)
        .map_or("?", |c| c.name.as_str());
    fit_label(format!("{} ({category}, {})", item.name, item.quantity))
}

/// Category choices whose name contains `partial`
#[must_use]
pub fn category_choices(categories: &[Category], partial: &str) -> Vec<serenity::AutocompleteChoice> {
    categories
        .iter()
        .filter(|category| matches(&category.name, partial))
        .take(MAX_CHOICES)
        .map(|category| {
            serenity::AutocompleteChoice::new(category_label(category), category.id.clone())
        })
        .collect()
}

/// Item choices whose name contains `partial`, labelled with their category
#[must_use]
pub fn item_choices(
    items: &[InventoryItem],
    categories: &[Category],
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    items
        .iter()
        .filter(|item| matches(&item.name, partial))
        .take(MAX_CHOICES)
        .map(|item| serenity::AutocompleteChoice::new(item_label(item, categories), item.id.clone()))
        .collect()
}

/// Provides autocomplete suggestions for category names.
pub async fn autocomplete_category(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let session = ctx.data().session.lock().await;
    category_choices(session.inventory().categories(), partial)
}

/// Provides autocomplete suggestions for item names.
pub async fn autocomplete_item(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let session = ctx.data().session.lock().await;
    let inventory = session.inventory();
    item_choices(inventory.items(), inventory.categories(), partial)
}

/// Provides the fixed icon keys.
pub async fn autocomplete_icon(_ctx: poise::Context<'_, BotData, Error>, partial: &str) -> Vec<String> {
    ICONS
        .iter()
        .filter(|icon| matches(icon, partial))
        .map(|&icon| icon.to_string())
        .collect()
}
