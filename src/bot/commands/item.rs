//! Item Discord commands - add, delete, toggle, list and photo.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            commands::{download_image, reply_ephemeral},
            handlers::autocomplete,
            views,
        },
        core::inventory::{Deletion, NewItem},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::sync::OnceLock;

    /// Parent command for managing items.
    #[poise::command(
        slash_command,
        subcommands("item_add", "item_delete", "item_toggle", "item_list", "item_photo")
    )]
    pub async fn item(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Gerenciamento de itens. Subcomandos disponíveis:\n\
            `/item add` - Cadastra um item\n\
            `/item delete` - Exclui um item\n\
            `/item toggle` - Marca ou desmarca o item para o total\n\
            `/item list` - Lista os itens de uma categoria\n\
            `/item photo` - Mostra o cartão e a foto de um item";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Adds an item to a category (the active one by default).
    ///
    /// The quantity is read leniently: leading digits count, anything else
    /// becomes 0.
    #[poise::command(slash_command, rename = "add")]
    pub async fn item_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Item name (e.g., 'Vaca Mimosa')"] name: String,
        #[description = "Quantity (e.g., 12)"] quantity: String,
        #[description = "Category (defaults to the active one)"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
        #[description = "Optional photo of the item"] photo: Option<serenity::Attachment>,
    ) -> Result<()> {
        if name.trim().is_empty() {
            return reply_ephemeral(ctx, "❌ O nome do item não pode ficar vazio.").await;
        }

        let category_id = {
            let session = ctx.data().session.lock().await;
            let inventory = session.inventory();
            match &category {
                Some(query) => inventory.find_category(query).map(|c| c.id.clone()),
                None => inventory.active_category().map(|c| c.id.clone()),
            }
        };
        let Some(category_id) = category_id else {
            return reply_ephemeral(
                ctx,
                "❌ Categoria não encontrada. Crie uma com `/category add` ou escolha outra.",
            )
            .await;
        };

        // Downloading may take a while; the session is not locked meanwhile
        let upload = match &photo {
            Some(attachment) => {
                ctx.defer().await?;
                Some(download_image(attachment).await?)
            }
            None => None,
        };

        let new_item = NewItem {
            name,
            quantity,
            category_id,
            photo: None,
        };
        let item = {
            let mut session = ctx.data().session.lock().await;
            match upload {
                Some(upload) => session.add_item_with_photo(new_item, upload).await?,
                None => session.add_item(new_item).await?,
            }
        };

        ctx.say(format!(
            "✅ **{}** adicionado com quantidade {}{}.",
            item.name,
            item.quantity,
            if item.photo.is_some() { " e foto" } else { "" }
        ))
        .await?;
        Ok(())
    }

    /// Deletes an item.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn item_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Item to delete"]
        #[autocomplete = "autocomplete::autocomplete_item"]
        item: String,
        #[description = "Confirm deletion"] confirm: Option<bool>,
    ) -> Result<()> {
        let confirmed = confirm.unwrap_or(false);
        let warning = OnceLock::new();
        let answer = |prompt: &str| {
            let _ = warning.set(prompt.to_string());
            confirmed
        };

        let outcome = {
            let mut session = ctx.data().session.lock().await;
            let found = session.inventory().find_item(&item).map(|i| i.id.clone());
            let Some(id) = found else {
                drop(session);
                return reply_ephemeral(ctx, format!("❌ Item '{item}' não encontrado.")).await;
            };
            session.delete_item(&id, &answer).await?
        };

        match outcome {
            Deletion::Deleted(deleted) => {
                ctx.say(format!("🗑️ Item **{}** excluído.", deleted.name))
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
                reply_ephemeral(ctx, format!("❌ Item '{item}' não encontrado.")).await?;
            }
        }
        Ok(())
    }

    /// Marks or unmarks an item for the selected total.
    #[poise::command(slash_command, rename = "toggle")]
    pub async fn item_toggle(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Item to mark or unmark"]
        #[autocomplete = "autocomplete::autocomplete_item"]
        item: String,
    ) -> Result<()> {
        let result = {
            let mut session = ctx.data().session.lock().await;
            let found = session
                .inventory()
                .find_item(&item)
                .map(|i| (i.id.clone(), i.name.clone()));
            match found {
                Some((id, name)) => session
                    .toggle_selection(&id)
                    .await?
                    .map(|selected| (name, selected, session.inventory().selected_total())),
                None => None,
            }
        };

        let Some((name, selected, total)) = result else {
            return reply_ephemeral(ctx, format!("❌ Item '{item}' não encontrado.")).await;
        };
        let state = if selected { "entra" } else { "não entra mais" };
        ctx.say(format!(
            "☑ **{name}** {state} no total. Total Selecionado: {total}"
        ))
        .await?;
        Ok(())
    }

    /// Lists the items of a category (the active one by default).
    #[poise::command(slash_command, rename = "list")]
    pub async fn item_list(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Category (defaults to the active one)"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
    ) -> Result<()> {
        let embed = {
            let session = ctx.data().session.lock().await;
            let inventory = session.inventory();
            let target = match &category {
                Some(query) => inventory.find_category(query),
                None => inventory.active_category(),
            };
            target.map(|c| views::category_embed(inventory, c))
        };

        match embed {
            Some(embed) => {
                ctx.send(poise::CreateReply::default().embed(embed)).await?;
            }
            None => {
                reply_ephemeral(ctx, "❌ Categoria não encontrada.").await?;
            }
        }
        Ok(())
    }

    /// Shows the card of one item, with its photo.
    #[poise::command(slash_command, rename = "photo")]
    pub async fn item_photo(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Item to show"]
        #[autocomplete = "autocomplete::autocomplete_item"]
        item: String,
    ) -> Result<()> {
        let card = {
            let session = ctx.data().session.lock().await;
            let inventory = session.inventory();
            inventory.find_item(&item).map(|found| {
                let category = inventory.find_category(&found.category_id);
                views::item_embed(found, category, inventory.settings())
            })
        };

        let Some((embed, attachment)) = card else {
            return reply_ephemeral(ctx, format!("❌ Item '{item}' não encontrado.")).await;
        };
        let reply = poise::CreateReply::default().embed(embed);
        let reply = match attachment {
            Some(file) => reply.attachment(file),
            None => reply,
        };
        ctx.send(reply).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
