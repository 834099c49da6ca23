//! Application configuration loading from config.toml
//!
//! The TOML file supplies the seed categories used on first run, the fallback
//! values for settings, the insight gateway endpoint and the optional farm
//! coordinates. Every section is optional; a missing file means built-in
//! defaults.

use crate::{
    core::location::Coordinates,
    errors::{Error, Result},
    models::{Category, SettingsDefaults, default_categories, normalize_icon},
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default Gemini model used for insights
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default base URL of the Generative Language API
pub const DEFAULT_GATEWAY_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Categories to seed when no categories are stored yet
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    /// Fallbacks merged into settings on every load
    #[serde(default)]
    pub defaults: SettingsDefaults,
    /// Insight gateway endpoint
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Farm coordinates used when a command does not pass its own
    #[serde(default)]
    pub location: Option<LocationConfig>,
}

/// A seed category
#[derive(Debug, Deserialize, Clone)]
pub struct CategorySeed {
    /// Stable id; generated as `cat-<n>` when omitted
    #[serde(default)]
    pub id: Option<String>,
    /// Display name
    pub name: String,
    /// Icon key
    #[serde(default)]
    pub icon: Option<String>,
}

/// Insight gateway settings. The API key itself comes from the environment.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    /// Model name, e.g. `gemini-2.5-flash`
    pub model: String,
    /// API base URL without a trailing slash
    pub base_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_GATEWAY_URL.to_string(),
        }
    }
}

/// Fixed farm coordinates
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct LocationConfig {
    /// Degrees north
    pub latitude: f64,
    /// Degrees east
    pub longitude: f64,
}

impl From<LocationConfig> for Coordinates {
    fn from(value: LocationConfig) -> Self {
        Self {
            latitude: value.latitude,
            longitude: value.longitude,
        }
    }
}

impl AppConfig {
    /// Seed categories from the configuration, or the built-in seeds when the
    /// file does not list any.
    #[must_use]
    pub fn seed_categories(&self) -> Vec<Category> {
        if self.categories.is_empty() {
            return default_categories();
        }

        self.categories
            .iter()
            .enumerate()
            .map(|(index, seed)| Category {
                id: seed
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("cat-{}", index + 1)),
                name: seed.name.trim().to_string(),
                icon: normalize_icon(seed.icon.as_deref().unwrap_or_default()).to_string(),
            })
            .collect()
    }
}

/// Loads the configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Path of the configuration file: `AGRO_CONFIG` or `./config.toml`
#[must_use]
pub fn config_path() -> PathBuf {
    std::env::var("AGRO_CONFIG").map_or_else(|_| PathBuf::from("config.toml"), PathBuf::from)
}

/// Loads the configuration from [`config_path`]. A missing file is not an
/// error: the built-in defaults are used instead.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = config_path();
    if !path.exists() {
        tracing::info!(
            "No configuration file at {}, using built-in defaults",
            path.display()
        );
        return Ok(AppConfig::default());
    }
    load_config(&path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::models::{DEFAULT_FARM_NAME, DEFAULT_ICON};

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [defaults]
            farm_name = "Fazenda Boa Vista"

            [[categories]]
            id = "gado"
            name = "Gado de Corte"
            icon = "cow"

            [[categories]]
            name = "Ferramentas"
            icon = "hammer"

            [gateway]
            model = "gemini-2.0-flash"

            [location]
            latitude = -15.79
            longitude = -47.88
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.defaults.farm_name, "Fazenda Boa Vista");
        assert!(!config.defaults.background_image.is_empty());
        assert_eq!(config.gateway.model, "gemini-2.0-flash");
        assert_eq!(config.gateway.base_url, DEFAULT_GATEWAY_URL);

        let seeds = config.seed_categories();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].id, "gado");
        assert_eq!(seeds[1].id, "cat-2");
        assert_eq!(seeds[1].icon, DEFAULT_ICON);

        let coordinates: Coordinates = config.location.unwrap().into();
        assert_eq!(coordinates.latitude, -15.79);
    }

    #[test]
    fn test_empty_config_uses_builtin_seeds() {
        let config: AppConfig = toml::from_str("").unwrap();
        let seeds = config.seed_categories();

        assert_eq!(seeds.len(), 3);
        assert_eq!(seeds[0].name, "Gado de Corte");
        assert_eq!(config.defaults.farm_name, DEFAULT_FARM_NAME);
        assert_eq!(config.gateway.model, DEFAULT_MODEL);
        assert!(config.location.is_none());
    }

    #[test]
    fn test_load_config_missing_file_is_config_error() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
