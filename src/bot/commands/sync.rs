//! Sync Discord commands - export and import of sync codes.
//!
//! Codes are usually longer than a Discord message, so exports are sent as a
//! text attachment and imports accept either pasted text or a file.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::reply_ephemeral, views},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    /// File name of exported codes
    const EXPORT_FILENAME: &str = "agro-sync.txt";

    /// Longest `mailto:` link still shown inline
    const MAX_INLINE_LINK: usize = 1500;

    /// Largest code file accepted on import
    const MAX_CODE_BYTES: u32 = 16 * 1024 * 1024;

    /// Parent command for moving the inventory between installations.
    #[poise::command(slash_command, subcommands("sync_export", "sync_import"))]
    pub async fn sync(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Sincronização. Subcomandos disponíveis:\n\
            `/sync export` - Gera o código com todos os dados\n\
            `/sync import` - Substitui os dados por um código recebido";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Generates a sync code with every category, item and setting.
    #[poise::command(slash_command, rename = "export")]
    pub async fn sync_export(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer_ephemeral().await?;
        let export = {
            let mut session = ctx.data().session.lock().await;
            session.export().await?
        };

        let mut content = format!(
            "🔄 Código de sincronização gerado em {}. Importe o arquivo anexo no outro dispositivo com `/sync import`.",
            views::format_date(export.synced_at)
        );
        match export.mailto.as_deref() {
            Some(link) if link.len() <= MAX_INLINE_LINK => {
                let _ = write!(content, "\n📧 Enviar por e-mail: <{link}>");
            }
            Some(_) => {
                content.push_str("\n📧 O código é grande demais para um link de e-mail; anexe o arquivo à mensagem.");
            }
            None => {}
        }

        let file = serenity::CreateAttachment::bytes(export.code.into_bytes(), EXPORT_FILENAME);
        ctx.send(
            poise::CreateReply::default()
                .content(content)
                .attachment(file)
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Replaces all data with the contents of a sync code.
    #[poise::command(slash_command, rename = "import")]
    pub async fn sync_import(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Pasted sync code"] code: Option<String>,
        #[description = "Or the exported .txt file"] file: Option<serenity::Attachment>,
        #[description = "Confirm that all current data will be replaced"] confirm: Option<bool>,
    ) -> Result<()> {
        if !confirm.unwrap_or(false) {
            return reply_ephemeral(
                ctx,
                "⚠️ Importar substitui TODAS as categorias e itens atuais. \
                 Repita o comando com `confirm: True` para continuar.",
            )
            .await;
        }

        let code = match (code, file) {
            (Some(code), _) if !code.trim().is_empty() => code,
            (_, Some(attachment)) => {
                if attachment.size > MAX_CODE_BYTES {
                    return reply_ephemeral(ctx, "❌ Arquivo grande demais.").await;
                }
                ctx.defer_ephemeral().await?;
                let bytes = attachment.download().await?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
            _ => {
                return reply_ephemeral(ctx, "❌ Cole o código ou anexe o arquivo exportado.").await;
            }
        };

        let result = {
            let mut session = ctx.data().session.lock().await;
            session.import(&code).await
        };

        match result {
            Ok(summary) => {
                let settings = if summary.settings_replaced {
                    " e configurações"
                } else {
                    ""
                };
                reply_ephemeral(
                    ctx,
                    format!(
                        "✅ Dados sincronizados com sucesso! {} categorias, {} itens{settings}.",
                        summary.categories, summary.items
                    ),
                )
                .await
            }
            Err(Error::Decode(e)) => {
                tracing::warn!("Rejected sync code: {e}");
                reply_ephemeral(ctx, "❌ Código de sincronização inválido.").await
            }
            Err(e) => Err(e),
        }
    }
}

// Re-export all commands
pub use inner::*;
