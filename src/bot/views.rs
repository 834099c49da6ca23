//! Rendering of inventory state into Discord embeds.
//!
//! Text building is kept in plain functions so it can be tested without a
//! Discord connection; the embed builders only arrange that text.

use crate::{
    core::{
        insight::LocationInsight,
        inventory::Inventory,
        photo::{self, extension_for},
    },
    models::{AppSettings, CardOptions, Category, InventoryItem},
};
use chrono::DateTime;
use poise::serenity_prelude as serenity;
use std::fmt::Write;

/// Discord embed descriptions stop at 4096 characters
const DESCRIPTION_LIMIT: usize = 4000;

/// Emoji shown for a category icon key
#[must_use]
pub fn icon_emoji(icon: &str) -> &'static str {
    match icon {
        "cow" => "🐄",
        "tractor" => "🚜",
        "wheat" => "🌾",
        "horse" => "🐎",
        "pig" => "🐖",
        "chicken" => "🐓",
        "sheep" => "🐑",
        "seedling" => "🌱",
        "tools" => "🧰",
        "warehouse" => "🏚️",
        "droplet" => "💧",
        _ => "📦",
    }
}

/// Short reference shown on item cards: first four characters of the id
#[must_use]
pub fn item_ref(item: &InventoryItem) -> String {
    item.id.chars().take(4).collect::<String>().to_uppercase()
}

/// `dd/mm/yyyy` in UTC, empty for out-of-range timestamps
#[must_use]
pub fn format_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

/// One line of an item list honouring the card options.
#[must_use]
pub fn item_line(item: &InventoryItem, options: &CardOptions) -> String {
    let mut line = String::new();
    if options.show_checkbox {
        line.push_str(if item.is_selected_for_sum { "☑ " } else { "☐ " });
    }
    let _ = write!(line, "**{}**", item.name);
    if options.show_quantity {
        let _ = write!(line, " · {}", item.quantity);
    }
    if options.show_ref {
        let _ = write!(line, " · `Ref: {}`", item_ref(item));
    }
    if options.show_date {
        let _ = write!(line, " · 📅 {}", format_date(item.created_at));
    }
    if options.show_photo && item.photo.is_some() {
        line.push_str(" · 📷");
    }
    line
}

fn truncate(mut text: String) -> String {
    if text.len() > DESCRIPTION_LIMIT {
        let mut cut = DESCRIPTION_LIMIT;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push('…');
    }
    text
}

/// Item list of one category
#[must_use]
pub fn category_items_text(inventory: &Inventory, category: &Category) -> String {
    let options = &inventory.settings().card_options;
    let lines: Vec<String> = inventory
        .items_by_category(&category.id)
        .map(|item| item_line(item, options))
        .collect();

    if lines.is_empty() {
        "Nenhum item nesta categoria. Use `/item add` para cadastrar.".to_string()
    } else {
        truncate(lines.join("\n"))
    }
}

/// Category list with item counts, the active category marked
#[must_use]
pub fn category_list_text(inventory: &Inventory) -> String {
    if inventory.categories().is_empty() {
        return "Nenhuma categoria. Use `/category add` para criar uma.".to_string();
    }

    let active = inventory.active_category().map(|c| c.id.as_str());
    inventory
        .categories()
        .iter()
        .map(|category| {
            let marker = if Some(category.id.as_str()) == active {
                "▶ "
            } else {
                ""
            };
            format!(
                "{marker}{} **{}** ({})",
                icon_emoji(&category.icon),
                category.name,
                inventory.category_item_count(&category.id)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Header embed: farm name, total, categories and background
#[must_use]
pub fn overview_embed(inventory: &Inventory) -> (serenity::CreateEmbed, Option<serenity::CreateAttachment>) {
    let settings = inventory.settings();
    let mut embed = serenity::CreateEmbed::new()
        .title(format!("🌾 {}", settings.display_name()))
        .description(category_list_text(inventory))
        .color(settings.theme.accent())
        .field(
            "Total Selecionado",
            inventory.selected_total().to_string(),
            true,
        )
        .field("Itens", inventory.items().len().to_string(), true);

    if let Some(active) = inventory.active_category() {
        embed = embed.field(
            format!("{} {}", icon_emoji(&active.icon), active.name),
            category_items_text(inventory, active),
            false,
        );
    }

    let (embed, attachment) = with_image(embed, settings.background_image.as_deref(), "fundo");
    (embed.footer(footer(settings)), attachment)
}

/// Items of one category as an embed
#[must_use]
pub fn category_embed(inventory: &Inventory, category: &Category) -> serenity::CreateEmbed {
    let total: u64 = inventory
        .items_by_category(&category.id)
        .filter(|item| item.is_selected_for_sum)
        .map(|item| u64::from(item.quantity))
        .sum();
    serenity::CreateEmbed::new()
        .title(format!("{} {}", icon_emoji(&category.icon), category.name))
        .description(category_items_text(inventory, category))
        .color(inventory.settings().theme.accent())
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Total: {total} | Total geral: {}",
            inventory.selected_total()
        )))
}

/// Card of one item, with its photo attached when it has one
#[must_use]
pub fn item_embed(
    item: &InventoryItem,
    category: Option<&Category>,
    settings: &AppSettings,
) -> (serenity::CreateEmbed, Option<serenity::CreateAttachment>) {
    let embed = serenity::CreateEmbed::new()
        .title(item.name.clone())
        .description(item_line(item, &settings.card_options))
        .color(settings.theme.accent())
        .field("Quantidade", item.quantity.to_string(), true)
        .field(
            "Categoria",
            category.map_or_else(|| "—".to_string(), |c| c.name.clone()),
            true,
        )
        .field("Cadastrado em", format_date(item.created_at), true);

    with_image(embed, item.photo.as_deref(), &format!("item-{}", item_ref(item)))
}

/// Current settings
#[must_use]
pub fn settings_embed(settings: &AppSettings) -> serenity::CreateEmbed {
    let options = &settings.card_options;
    let flag = |on: bool| if on { "✅" } else { "❌" };
    let mut cards = String::new();
    let _ = writeln!(cards, "{} Foto", flag(options.show_photo));
    let _ = writeln!(cards, "{} Ref/ID", flag(options.show_ref));
    let _ = writeln!(cards, "{} Quantidade", flag(options.show_quantity));
    let _ = writeln!(cards, "{} Data", flag(options.show_date));
    let _ = write!(cards, "{} Checkbox", flag(options.show_checkbox));

    let background = match settings.background_image.as_deref() {
        Some(image) if image.starts_with("data:") => "imagem enviada".to_string(),
        Some(image) => image.to_string(),
        None => "—".to_string(),
    };

    serenity::CreateEmbed::new()
        .title("⚙️ Configurações")
        .color(settings.theme.accent())
        .field("Fazenda", settings.display_name(), true)
        .field("Tema", settings.theme.key(), true)
        .field(
            "E-mail",
            settings.user_email.as_deref().unwrap_or("—"),
            true,
        )
        .field("Cartões", cards, false)
        .field("Fundo", background, false)
        .footer(footer(settings))
}

/// Answer and citations of a location query
#[must_use]
pub fn insight_text(insight: &LocationInsight) -> String {
    let mut text = if insight.text.trim().is_empty() {
        "Nenhuma resposta.".to_string()
    } else {
        insight.text.trim().to_string()
    };

    if !insight.links.is_empty() {
        text.push_str("\n\n**Fontes**");
        for link in &insight.links {
            let title = link.title.as_deref().unwrap_or(&link.uri);
            let _ = write!(text, "\n• [{title}]({})", link.uri);
            if let Some(snippet) = &link.snippet {
                let _ = write!(text, " - _{snippet}_");
            }
        }
    }
    truncate(text)
}

fn footer(settings: &AppSettings) -> serenity::CreateEmbedFooter {
    let synced = settings
        .last_sync
        .map_or_else(|| "nunca".to_string(), format_date);
    serenity::CreateEmbedFooter::new(format!("Última sincronização: {synced}"))
}

/// Sets the embed image: URLs are linked directly, `data:` URIs are sent as
/// an attachment and referenced from the embed.
fn with_image(
    embed: serenity::CreateEmbed,
    image: Option<&str>,
    name: &str,
) -> (serenity::CreateEmbed, Option<serenity::CreateAttachment>) {
    match image {
        Some(uri) if uri.starts_with("data:") => match photo::from_data_uri(uri) {
            Ok((mime, bytes)) => {
                let filename = format!("{name}.{}", extension_for(&mime));
                let embed = embed.image(format!("attachment://{filename}"));
                (embed, Some(serenity::CreateAttachment::bytes(bytes, filename)))
            }
            Err(e) => {
                tracing::warn!("Stored image is not a valid data URI: {e}");
                (embed, None)
            }
        },
        Some(url) if url.starts_with("http") => (embed.image(url), None),
        _ => (embed, None),
    }
}
