//! Discord command implementations organized by area.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Category management commands
pub mod category;

/// General utility and overview commands
pub mod general;

/// AI summary and location insight commands
pub mod insight;

/// Item management commands
pub mod item;

/// Settings commands
pub mod settings;

/// Sync code export and import
pub mod sync;

// Export commands
pub use category::*;
pub use general::*;
pub use insight::*;
pub use item::*;
pub use settings::*;
pub use sync::*;

use crate::{
    bot::{BotData, Context},
    core::photo::PhotoUpload,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;

/// Largest upload accepted as a photo or background
pub const MAX_UPLOAD_BYTES: u32 = 8 * 1024 * 1024;

/// Every command registered with Discord.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![
        ping(),
        help(),
        overview(),
        total(),
        category(),
        item(),
        settings(),
        sync(),
        summary(),
        insights(),
    ]
}

/// Replies with a message only the invoking user sees.
pub async fn reply_ephemeral(ctx: Context<'_>, text: impl Into<String>) -> Result<()> {
    ctx.send(
        poise::CreateReply::default()
            .content(text)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Checks that an attachment is an image of acceptable size.
pub fn validate_image(attachment: &serenity::Attachment) -> Result<()> {
    let is_image = attachment
        .content_type
        .as_deref()
        .map_or_else(
            || mime_guess::from_path(&attachment.filename).first_or_octet_stream().type_() == "image",
            |ct| ct.starts_with("image/"),
        );
    if !is_image {
        return Err(Error::Photo {
            message: format!("\"{}\" não é uma imagem", attachment.filename),
        });
    }
    if attachment.size > MAX_UPLOAD_BYTES {
        return Err(Error::Photo {
            message: format!(
                "\"{}\" tem {} KB; o limite é {} KB",
                attachment.filename,
                attachment.size / 1024,
                MAX_UPLOAD_BYTES / 1024
            ),
        });
    }
    Ok(())
}

/// Downloads an image attachment so it can be embedded.
pub async fn download_image(attachment: &serenity::Attachment) -> Result<PhotoUpload> {
    validate_image(attachment)?;
    let bytes = attachment.download().await?;
    tracing::debug!("Downloaded {} ({} bytes)", attachment.filename, bytes.len());
    Ok(PhotoUpload {
        filename: attachment.filename.clone(),
        content_type: attachment.content_type.clone(),
        bytes,
    })
}
