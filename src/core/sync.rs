//! Sync codes - portable text encoding of the whole inventory.
//!
//! A sync code is the state serialized to JSON, taken as UTF-8 bytes and
//! encoded with standard base64. It has no transport of its own: users copy it
//! into a mail or chat message and paste it on the other device.
//!
//! Decoding is all-or-nothing. Anything that is not a complete, well-formed
//! state is rejected with a [`DecodeError`] before the inventory is touched.

use crate::{
    errors::{DecodeError, Result},
    models::{AppSettings, AppState, Category, InventoryItem, SettingsDefaults},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A decoded sync code. Settings are optional: codes without them replace
/// categories and items only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPayload {
    /// Imported categories
    pub categories: Vec<Category>,
    /// Imported items
    pub items: Vec<InventoryItem>,
    /// Imported settings, if the code carried them
    pub settings: Option<AppSettings>,
}

/// Encodes the full state into a sync code.
///
/// # Errors
/// Returns [`crate::errors::Error::Serialization`] if the state cannot be
/// serialized.
pub fn encode(state: &AppState) -> Result<String> {
    let json = serde_json::to_string(state)?;
    Ok(STANDARD.encode(json.as_bytes()))
}

/// Decodes a sync code into a complete state, applying the built-in settings
/// defaults.
///
/// # Errors
/// Returns a [`DecodeError`] describing the first problem found.
pub fn decode(code: &str) -> std::result::Result<AppState, DecodeError> {
    let payload = decode_payload(code)?;
    let defaults = SettingsDefaults::default();
    Ok(AppState {
        categories: payload.categories,
        items: payload.items,
        settings: payload
            .settings
            .unwrap_or_default()
            .merged_with(&defaults),
    })
}

/// Decodes a sync code without filling in settings defaults.
///
/// Whitespace anywhere in the code is ignored, since mail clients tend to wrap
/// long lines.
///
/// # Errors
/// Returns a [`DecodeError`] if the code is not base64, not UTF-8, not a JSON
/// object, lacks `categories` or `items`, has fields of the wrong shape, or
/// contains an item whose category is not part of the code.
pub fn decode_payload(code: &str) -> std::result::Result<SyncPayload, DecodeError> {
    let compact: String = code.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| DecodeError::Encoding(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|_| DecodeError::Utf8)?;
    let document: Value =
        serde_json::from_str(&text).map_err(|e| DecodeError::Json(e.to_string()))?;

    let Value::Object(mut fields) = document else {
        return Err(DecodeError::NotAnObject);
    };

    let categories: Vec<Category> = take_required(&mut fields, "categories")?;
    let items: Vec<InventoryItem> = take_required(&mut fields, "items")?;
    let settings = match fields.remove("settings") {
        None | Some(Value::Null) => None,
        Some(value) => Some(from_field::<AppSettings>("settings", value)?),
    };

    let known: HashSet<&str> = categories.iter().map(|c| c.id.as_str()).collect();
    if let Some(orphan) = items
        .iter()
        .find(|item| !known.contains(item.category_id.as_str()))
    {
        return Err(DecodeError::OrphanItem {
            item_id: orphan.id.clone(),
            category_id: orphan.category_id.clone(),
        });
    }

    Ok(SyncPayload {
        categories,
        items,
        settings,
    })
}

fn take_required<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    name: &'static str,
) -> std::result::Result<T, DecodeError> {
    match fields.remove(name) {
        None | Some(Value::Null) => Err(DecodeError::MissingField(name)),
        Some(value) => from_field(name, value),
    }
}

fn from_field<T: DeserializeOwned>(
    name: &str,
    value: Value,
) -> std::result::Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|e| DecodeError::Shape(format!("{name}: {e}")))
}

/// Builds the `mailto:` link that sends a sync code to the configured address.
#[must_use]
pub fn mailto_link(settings: &AppSettings, code: &str) -> String {
    let recipient = settings.user_email.as_deref().unwrap_or_default();
    let subject = format!("Sincronização {}", settings.display_name());
    let body = format!("Código de sincronização: \r\n\r\n{code}");

    format!(
        "mailto:{}?subject={}&body={}",
        utf8_percent_encode(recipient, NON_ALPHANUMERIC)
            .to_string()
            .replace("%40", "@"),
        utf8_percent_encode(&subject, NON_ALPHANUMERIC),
        utf8_percent_encode(&body, NON_ALPHANUMERIC),
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::models::{CardOptions, Theme};
    use proptest::prelude::*;

    fn sample_state() -> AppState {
        AppState {
            categories: vec![Category {
                id: "cat-1".to_string(),
                name: "Gado de Corte 🐄".to_string(),
                icon: "cow".to_string(),
            }],
            items: vec![InventoryItem {
                id: "item-1".to_string(),
                name: "Vaca Mimosa — nº 1".to_string(),
                quantity: 12,
                photo: Some("data:image/jpeg;base64,/9j/4AAQ".to_string()),
                category_id: "cat-1".to_string(),
                created_at: 1_717_000_000_000,
                is_selected_for_sum: true,
            }],
            settings: AppSettings {
                farm_name: Some("Fazenda São João".to_string()),
                theme: Theme::Brown,
                ..AppSettings::default()
            }
            .merged_with(&SettingsDefaults::default()),
        }
    }

    fn code_of(json: &str) -> String {
        STANDARD.encode(json.as_bytes())
    }

    #[test]
    fn test_round_trip_with_unicode() {
        let state = sample_state();
        let code = encode(&state).unwrap();
        assert_eq!(decode(&code).unwrap(), state);
    }

    #[test]
    fn test_code_matches_browser_encoding() {
        // btoa(unescape(encodeURIComponent('{"categories":[],"items":[],"settings":{"farmName":"Sítio"}}')))
        let code = "eyJjYXRlZ29yaWVzIjpbXSwiaXRlbXMiOltdLCJzZXR0aW5ncyI6eyJmYXJtTmFtZSI6IlPDrXRpbyJ9fQ==";
        let state = decode(code).unwrap();
        assert_eq!(state.settings.farm_name.as_deref(), Some("Sítio"));
        assert!(state.categories.is_empty());
    }

    #[test]
    fn test_decode_ignores_line_breaks() {
        let code = encode(&sample_state()).unwrap();
        let wrapped: String = code
            .as_bytes()
            .chunks(20)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("\r\n");
        assert_eq!(decode(&format!("  {wrapped}\n")).unwrap(), sample_state());
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert!(matches!(
            decode("not*base64!"),
            Err(DecodeError::Encoding(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_utf8() {
        let code = STANDARD.encode([0xff, 0xfe, 0xfd]);
        assert_eq!(decode(&code), Err(DecodeError::Utf8));
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(matches!(
            decode(&code_of("hello")),
            Err(DecodeError::Json(_))
        ));
        assert_eq!(decode(&code_of("[1,2]")), Err(DecodeError::NotAnObject));
    }

    #[test]
    fn test_decode_requires_categories_and_items() {
        assert_eq!(
            decode(&code_of(r#"{"items":[]}"#)),
            Err(DecodeError::MissingField("categories"))
        );
        assert_eq!(
            decode(&code_of(r#"{"categories":[],"items":null}"#)),
            Err(DecodeError::MissingField("items"))
        );
    }

    #[test]
    fn test_decode_rejects_wrong_shapes() {
        assert!(matches!(
            decode(&code_of(r#"{"categories":[{"id":"c"}],"items":[]}"#)),
            Err(DecodeError::Shape(_))
        ));
        assert!(matches!(
            decode(&code_of(
                r#"{"categories":[],"items":[],"settings":{"theme":"purple"}}"#
            )),
            Err(DecodeError::Shape(_))
        ));
    }

    #[test]
    fn test_decode_rejects_orphan_items() {
        let json = r#"{"categories":[],"items":[{"id":"i","name":"n","quantity":1,"categoryId":"ghost","createdAt":1,"isSelectedForSum":true}]}"#;
        assert_eq!(
            decode(&code_of(json)),
            Err(DecodeError::OrphanItem {
                item_id: "i".to_string(),
                category_id: "ghost".to_string(),
            })
        );
    }

    #[test]
    fn test_payload_without_settings() {
        let payload = decode_payload(&code_of(r#"{"categories":[],"items":[]}"#)).unwrap();
        assert!(payload.settings.is_none());

        let state = decode(&code_of(r#"{"categories":[],"items":[]}"#)).unwrap();
        assert_eq!(state.settings.card_options, CardOptions::default());
        assert!(state.settings.background_image.is_some());
    }

    #[test]
    fn test_mailto_link() {
        let settings = AppSettings {
            user_email: Some("dono@fazenda.com".to_string()),
            farm_name: Some("Boa Vista".to_string()),
            ..AppSettings::default()
        };
        let link = mailto_link(&settings, "abc+/=");

        assert!(link.starts_with("mailto:dono@fazenda%2Ecom?subject=Sincroniza%C3%A7%C3%A3o%20Boa%20Vista&body="));
        assert!(link.ends_with("abc%2B%2F%3D"));
    }

    fn arb_text() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-zA-Z0-9 ]{0,12}",
            "\\PC{0,12}",
            Just("Maquinário ção 牛 🐄".to_string()),
        ]
    }

    fn arb_state() -> impl Strategy<Value = AppState> {
        (
            prop::collection::vec((arb_text(), "[a-z]{1,8}"), 0..4),
            prop::collection::vec(
                (
                    arb_text(),
                    any::<u32>(),
                    any::<bool>(),
                    any::<i64>(),
                    prop::option::of("[A-Za-z0-9+/]{0,16}"),
                    any::<usize>(),
                ),
                0..6,
            ),
            prop::option::of(arb_text()),
            prop::option::of("[a-z]{1,6}@[a-z]{1,6}\\.com"),
            any::<bool>(),
        )
            .prop_map(|(cats, raw_items, farm, email, show_date)| {
                let categories: Vec<Category> = cats
                    .into_iter()
                    .enumerate()
                    .map(|(i, (name, icon))| Category {
                        id: format!("cat-{i}"),
                        name,
                        icon,
                    })
                    .collect();
                let items = if categories.is_empty() {
                    Vec::new()
                } else {
                    raw_items
                        .into_iter()
                        .enumerate()
                        .map(|(i, (name, quantity, selected, created_at, photo, cat))| {
                            InventoryItem {
                                id: format!("item-{i}"),
                                name,
                                quantity,
                                photo: photo.map(|p| format!("data:image/png;base64,{p}")),
                                category_id: categories[cat % categories.len()].id.clone(),
                                created_at,
                                is_selected_for_sum: selected,
                            }
                        })
                        .collect()
                };
                let settings = AppSettings {
                    farm_name: farm,
                    user_email: email,
                    card_options: CardOptions {
                        show_date,
                        ..CardOptions::default()
                    },
                    ..AppSettings::default()
                }
                .merged_with(&SettingsDefaults::default());
                AppState {
                    categories,
                    items,
                    settings,
                }
            })
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(state in arb_state()) {
            let code = encode(&state).unwrap();
            prop_assert_eq!(decode(&code).unwrap(), state);
        }
    }
}
