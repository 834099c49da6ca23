//! Settings Discord commands - farm name, theme, card options, background and
//! export address.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            commands::{download_image, reply_ephemeral},
            views,
        },
        errors::{Error, Result},
        models::{CardOption, Theme},
    };
    use poise::{ChoiceParameter, serenity_prelude as serenity};

    /// Theme offered as a slash command choice.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum ThemeChoice {
        #[name = "Esmeralda"]
        Emerald,
        #[name = "Azul"]
        Blue,
        #[name = "Âmbar"]
        Amber,
        #[name = "Ardósia"]
        Slate,
        #[name = "Rosa"]
        Rose,
        #[name = "Marrom"]
        Brown,
    }

    impl From<ThemeChoice> for Theme {
        fn from(choice: ThemeChoice) -> Self {
            match choice {
                ThemeChoice::Emerald => Self::Emerald,
                ThemeChoice::Blue => Self::Blue,
                ThemeChoice::Amber => Self::Amber,
                ThemeChoice::Slate => Self::Slate,
                ThemeChoice::Rose => Self::Rose,
                ThemeChoice::Brown => Self::Brown,
            }
        }
    }

    /// Card option offered as a slash command choice.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum CardOptionChoice {
        #[name = "Foto"]
        Photo,
        #[name = "Ref/ID"]
        Ref,
        #[name = "Quantidade"]
        Quantity,
        #[name = "Data"]
        Date,
        #[name = "Checkbox"]
        Checkbox,
    }

    impl From<CardOptionChoice> for CardOption {
        fn from(choice: CardOptionChoice) -> Self {
            match choice {
                CardOptionChoice::Photo => Self::Photo,
                CardOptionChoice::Ref => Self::Ref,
                CardOptionChoice::Quantity => Self::Quantity,
                CardOptionChoice::Date => Self::Date,
                CardOptionChoice::Checkbox => Self::Checkbox,
            }
        }
    }

    /// Parent command for the farm settings.
    #[poise::command(
        slash_command,
        subcommands(
            "settings_show",
            "settings_farm_name",
            "settings_theme",
            "settings_card_option",
            "settings_background",
            "settings_email"
        )
    )]
    pub async fn settings(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Configurações. Subcomandos disponíveis:\n\
            `/settings show` - Mostra as configurações\n\
            `/settings farm_name` - Renomeia a fazenda\n\
            `/settings theme` - Troca o tema de cores\n\
            `/settings card_option` - Liga ou desliga um campo dos cartões\n\
            `/settings background` - Troca a imagem de fundo\n\
            `/settings email` - Define o e-mail de sincronização";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Shows the current settings.
    #[poise::command(slash_command, rename = "show")]
    pub async fn settings_show(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let embed = {
            let session = ctx.data().session.lock().await;
            views::settings_embed(session.inventory().settings())
        };
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Renames the farm (or spreadsheet, or field).
    #[poise::command(slash_command, rename = "farm_name")]
    pub async fn settings_farm_name(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "New name"] name: String,
    ) -> Result<()> {
        if name.trim().is_empty() {
            return reply_ephemeral(ctx, "❌ O nome não pode ficar vazio.").await;
        }
        {
            let mut session = ctx.data().session.lock().await;
            session.set_farm_name(&name).await?;
        }
        ctx.say(format!("🏡 Agora a fazenda se chama **{}**.", name.trim()))
            .await?;
        Ok(())
    }

    /// Switches the colour theme.
    #[poise::command(slash_command, rename = "theme")]
    pub async fn settings_theme(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Theme"] theme: ThemeChoice,
    ) -> Result<()> {
        {
            let mut session = ctx.data().session.lock().await;
            session.set_theme(theme.into()).await?;
        }
        ctx.say(format!("🎨 Tema alterado para **{}**.", theme.name()))
            .await?;
        Ok(())
    }

    /// Shows or hides one field on item cards.
    #[poise::command(slash_command, rename = "card_option")]
    pub async fn settings_card_option(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Field to toggle"] option: CardOptionChoice,
    ) -> Result<()> {
        let shown = {
            let mut session = ctx.data().session.lock().await;
            session.toggle_card_option(option.into()).await?
        };
        let state = if shown { "visível" } else { "oculto" };
        ctx.say(format!("🗂️ Campo **{}** agora está {state}.", option.name()))
            .await?;
        Ok(())
    }

    /// Replaces the background image with an upload or a URL.
    #[poise::command(slash_command, rename = "background")]
    pub async fn settings_background(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Image to upload"] image: Option<serenity::Attachment>,
        #[description = "Or an image URL"] url: Option<String>,
    ) -> Result<()> {
        match (image, url) {
            (Some(attachment), _) => {
                ctx.defer().await?;
                let upload = download_image(&attachment).await?;
                let mut session = ctx.data().session.lock().await;
                session.set_background_upload(upload).await?;
            }
            (None, Some(url)) if url.starts_with("http://") || url.starts_with("https://") => {
                let mut session = ctx.data().session.lock().await;
                session.set_background_image(url.trim().to_string()).await?;
            }
            _ => {
                return reply_ephemeral(
                    ctx,
                    "❌ Envie uma imagem ou informe uma URL começando com http(s)://.",
                )
                .await;
            }
        }
        ctx.say("🖼️ Imagem de fundo atualizada.").await?;
        Ok(())
    }

    /// Sets or clears the address sync codes are mailed to.
    #[poise::command(slash_command, rename = "email")]
    pub async fn settings_email(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "E-mail address (leave empty to clear)"] address: Option<String>,
    ) -> Result<()> {
        let address = address.filter(|a| !a.trim().is_empty());
        if let Some(a) = &address {
            if !a.contains('@') {
                return reply_ephemeral(ctx, format!("❌ '{a}' não parece um e-mail.")).await;
            }
        }
        {
            let mut session = ctx.data().session.lock().await;
            session.set_user_email(address.as_deref()).await?;
        }
        let message = address.map_or_else(
            || "📧 E-mail de sincronização removido.".to_string(),
            |a| format!("📧 Códigos de sincronização serão enviados para **{}**.", a.trim()),
        );
        reply_ephemeral(ctx, message).await
    }
}

// Re-export all commands
pub use inner::*;
