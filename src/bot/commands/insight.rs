//! AI Discord commands - inventory summary and location insights.
//!
//! The session lock is only held long enough to take a snapshot; the gateway
//! call runs without it so the inventory stays editable meanwhile.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::reply_ephemeral, views},
        core::location::{Coordinates, LocationFix, PositionOptions, locate},
        errors::{Error, GatewayError, Result},
    };
    use poise::serenity_prelude as serenity;

    fn gateway_message(error: &GatewayError) -> String {
        match error {
            GatewayError::Busy => "⏳ Já existe uma consulta em andamento. Aguarde.".to_string(),
            GatewayError::NotConfigured => {
                "⚙️ A IA não está configurada. Defina `GEMINI_API_KEY` no servidor.".to_string()
            }
            GatewayError::AuthorizationRequired { .. } => "🔑 A ferramenta de Mapas pode exigir uma chave de API paga e com faturamento ativado. \
                 Verifique se a chave está configurada corretamente e se o faturamento está ativo \
                 para o Google Maps Platform no seu projeto Google Cloud."
                .to_string(),
            other => format!("❌ Não foi possível consultar a IA: {other}"),
        }
    }

    /// Asks the AI for a short analysis of the inventory.
    #[poise::command(slash_command)]
    pub async fn summary(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        if data.gateway.is_summary_busy() {
            return reply_ephemeral(ctx, gateway_message(&GatewayError::Busy)).await;
        }

        ctx.defer().await?;
        let (snapshot, color) = {
            let session = data.session.lock().await;
            (session.snapshot(), session.inventory().settings().theme.accent())
        };

        match data.gateway.inventory_summary(&snapshot).await {
            Ok(text) => {
                let text = if text.trim().is_empty() {
                    "Nenhuma resposta.".to_string()
                } else {
                    text
                };
                let embed = serenity::CreateEmbed::new()
                    .title(format!("✨ Resumo de {}", snapshot.farm_name))
                    .description(text.chars().take(4000).collect::<String>())
                    .color(color);
                ctx.send(poise::CreateReply::default().embed(embed)).await?;
                Ok(())
            }
            Err(e) => reply_ephemeral(ctx, gateway_message(&e)).await,
        }
    }

    /// Asks about places near the farm (stores, vets, cooperatives...).
    ///
    /// Uses the given coordinates, or the configured farm location. When
    /// neither is available the question is still answered, just without a
    /// position.
    #[poise::command(slash_command)]
    pub async fn insights(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "What to look for (e.g., 'lojas de ração próximas')"] query: String,
        #[description = "Latitude in decimal degrees"] latitude: Option<f64>,
        #[description = "Longitude in decimal degrees"] longitude: Option<f64>,
    ) -> Result<()> {
        let data = ctx.data();
        if query.trim().is_empty() {
            return reply_ephemeral(ctx, "❌ Informe o que deseja explorar no mapa.").await;
        }
        if data.gateway.is_location_busy() {
            return reply_ephemeral(ctx, gateway_message(&GatewayError::Busy)).await;
        }

        let explicit = match (latitude, longitude) {
            (Some(lat), Some(lon)) => match Coordinates::new(lat, lon) {
                Some(coordinates) => Some(coordinates),
                None => {
                    return reply_ephemeral(ctx, "❌ Coordenadas fora do intervalo válido.").await;
                }
            },
            (None, None) => None,
            _ => {
                return reply_ephemeral(ctx, "❌ Informe latitude e longitude juntas.").await;
            }
        };

        ctx.defer().await?;
        let (coordinates, notice) = match explicit {
            Some(coordinates) => (Some(coordinates), None),
            None => match locate(&data.location, &PositionOptions::default()).await {
                LocationFix::Known(coordinates) => (Some(coordinates), None),
                LocationFix::Unknown(reason) => (
                    None,
                    Some(format!(
                        "Não foi possível obter sua localização: {reason}. \
                         As informações de mapa podem ser menos precisas."
                    )),
                ),
            },
        };

        match data.gateway.location_insights(query.trim(), coordinates).await {
            Ok(insight) => {
                let color = data.session.lock().await.inventory().settings().theme.accent();
                let mut embed = serenity::CreateEmbed::new()
                    .title(format!("📍 {}", query.trim()))
                    .description(views::insight_text(&insight))
                    .color(color);
                if let Some(notice) = notice {
                    embed = embed.footer(serenity::CreateEmbedFooter::new(notice));
                }
                ctx.send(poise::CreateReply::default().embed(embed)).await?;
                Ok(())
            }
            Err(e) => reply_ephemeral(ctx, gateway_message(&e)).await,
        }
    }
}

// Re-export all commands
pub use inner::*;
