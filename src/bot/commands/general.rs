//! General Discord commands - ping, help, overview and the selected total.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, views},
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**AgroGestão - Ajuda**\n\
        Controle do inventário da fazenda por categorias.\n\n\
        **Visão geral**\n\
        • `/overview` - Fazenda, categorias, total e itens da categoria ativa.\n\
        • `/total` - Soma das quantidades marcadas.\n\n\
        **Categorias**\n\
        • `/category add|rename|delete|select|list`\n\n\
        **Itens**\n\
        • `/item add <nome> <quantidade> [categoria] [foto]`\n\
        • `/item delete|toggle|photo <item>` e `/item list [categoria]`\n\n\
        **Configurações**\n\
        • `/settings show|farm_name|theme|card_option|background|email`\n\n\
        **Sincronização**\n\
        • `/sync export` - Gera o código de sincronização.\n\
        • `/sync import <código ou arquivo>` - Substitui todos os dados.\n\n\
        **Inteligência**\n\
        • `/summary` - Resumo do inventário pela IA.\n\
        • `/insights <pergunta> [latitude] [longitude]` - Locais próximos.";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Shows the farm header, categories and the items of the active category.
    #[poise::command(slash_command)]
    pub async fn overview(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let reply = {
            let session = ctx.data().session.lock().await;
            let (embed, attachment) = views::overview_embed(session.inventory());
            let reply = poise::CreateReply::default().embed(embed);
            match attachment {
                Some(file) => reply.attachment(file),
                None => reply,
            }
        };
        ctx.send(reply).await?;
        Ok(())
    }

    /// Shows the sum of quantities over items marked for the total.
    #[poise::command(slash_command)]
    pub async fn total(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let (total, selected, count) = {
            let session = ctx.data().session.lock().await;
            let inventory = session.inventory();
            (
                inventory.selected_total(),
                inventory
                    .items()
                    .iter()
                    .filter(|item| item.is_selected_for_sum)
                    .count(),
                inventory.items().len(),
            )
        };
        ctx.say(format!(
            "🧮 **Total Selecionado:** {total} ({selected} de {count} itens marcados)"
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
