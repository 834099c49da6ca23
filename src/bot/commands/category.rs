//! Category Discord commands - add, rename, delete, select and list.
//!
//! Deleting a category removes all of its items, so the delete subcommand only
//! proceeds when it is invoked with `confirm: true`; otherwise it replies with
//! the warning and changes nothing.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::reply_ephemeral, handlers::autocomplete, views},
        core::inventory::Deletion,
        errors::{Error, Result},
        models::DEFAULT_ICON,
    };
    use std::sync::OnceLock;

    /// Parent command for managing categories.
    #[poise::command(
        slash_command,
        subcommands(
            "category_add",
            "category_rename",
            "category_delete",
            "category_select",
            "category_list"
        )
    )]
    pub async fn category(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Gerenciamento de categorias. Subcomandos disponíveis:\n\
            `/category add` - Cria uma categoria\n\
            `/category rename` - Altera nome ou ícone\n\
            `/category delete` - Exclui a categoria e todos os seus itens\n\
            `/category select` - Torna a categoria ativa\n\
            `/category list` - Lista as categorias";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Creates a category.
    #[poise::command(slash_command, rename = "add")]
    pub async fn category_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Category name (e.g., 'Gado Leiteiro')"] name: String,
        #[description = "Icon"]
        #[autocomplete = "autocomplete::autocomplete_icon"]
        icon: Option<String>,
    ) -> Result<()> {
        if name.trim().is_empty() {
            return reply_ephemeral(ctx, "❌ O nome da categoria não pode ficar vazio.").await;
        }

        let category = {
            let mut session = ctx.data().session.lock().await;
            session
                .add_category(&name, icon.as_deref().unwrap_or(DEFAULT_ICON))
                .await?
        };
        ctx.say(format!(
            "✅ Categoria {} **{}** criada.",
            views::icon_emoji(&category.icon),
            category.name
        ))
        .await?;
        Ok(())
    }

    /// Changes the name and/or icon of a category.
    #[poise::command(slash_command, rename = "rename")]
    pub async fn category_rename(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Category to change"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: String,
        #[description = "New name"] name: Option<String>,
        #[description = "New icon"]
        #[autocomplete = "autocomplete::autocomplete_icon"]
        icon: Option<String>,
    ) -> Result<()> {
        let mut session = ctx.data().session.lock().await;
        let found = session.inventory().find_category(&category).cloned();
        let Some(current) = found else {
            drop(session);
            return reply_ephemeral(ctx, format!("❌ Categoria '{category}' não encontrada.")).await;
        };

        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| current.name.clone());
        let icon = icon.unwrap_or_else(|| current.icon.clone());
        let renamed = session.rename_category(&current.id, &name, &icon).await?;
        drop(session);

        match renamed {
            Some(renamed) => {
                ctx.say(format!(
                    "✏️ **{}** agora é {} **{}**.",
                    current.name,
                    views::icon_emoji(&renamed.icon),
                    renamed.name
                ))
                .await?;
            }
            None => {
                reply_ephemeral(ctx, format!("❌ Categoria '{category}' não encontrada.")).await?;
            }
        }
        Ok(())
    }

    /// Deletes a category together with all of its items.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn category_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Category to delete"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: String,
        #[description = "Confirm permanent deletion of the category and its items"]
        confirm: Option<bool>,
    ) -> Result<()> {
        let confirmed = confirm.unwrap_or(false);
        let warning = OnceLock::new();
        let answer = |prompt: &str| {
            let _ = warning.set(prompt.to_string());
            confirmed
        };

        let outcome = {
            let mut session = ctx.data().session.lock().await;
            let found = session.inventory().find_category(&category).map(|c| c.id.clone());
            let Some(id) = found else {
                drop(session);
                return reply_ephemeral(ctx, format!("❌ Categoria '{category}' não encontrada."))
                    .await;
            };
            session.delete_category(&id, &answer).await?
        };

        match outcome {
            Deletion::Deleted(deleted) => {
                ctx.say(format!(
                    "🗑️ Categoria **{}** excluída com {} item(ns).",
                    deleted.category.name, deleted.removed_items
                ))
                .await?;
            }
            Deletion::Declined => {
                let warning = warning.get().cloned().unwrap_or_default();
                reply_ephemeral(
                    ctx,
                    format!("{warning}\nRepita o comando com `confirm: True` para excluir."),
                )
                .await?;
            }
            Deletion::NotFound => {
                reply_ephemeral(ctx, format!("❌ Categoria '{category}' não encontrada.")).await?;
            }
        }
        Ok(())
    }

    /// Makes a category the active one and shows its items.
    #[poise::command(slash_command, rename = "select")]
    pub async fn category_select(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Category to show"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: String,
    ) -> Result<()> {
        let embed = {
            let mut session = ctx.data().session.lock().await;
            let found = session.inventory().find_category(&category).map(|c| c.id.clone());
            let Some(id) = found else {
                drop(session);
                return reply_ephemeral(ctx, format!("❌ Categoria '{category}' não encontrada."))
                    .await;
            };
            session.select_category(&id);
            let inventory = session.inventory();
            inventory
                .active_category()
                .map(|active| views::category_embed(inventory, active))
        };

        if let Some(embed) = embed {
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Ok(())
    }

    /// Lists categories with their item counts.
    #[poise::command(slash_command, rename = "list")]
    pub async fn category_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        use poise::serenity_prelude as serenity;

        let (text, color) = {
            let session = ctx.data().session.lock().await;
            let inventory = session.inventory();
            (
                views::category_list_text(inventory),
                inventory.settings().theme.accent(),
            )
        };
        let embed = serenity::CreateEmbed::new()
            .title("📂 Categorias")
            .description(text)
            .color(color);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
