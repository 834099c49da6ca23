//! Inventory domain types.
//!
//! These are the documents persisted in the key-value store and carried in
//! sync codes. Field names serialize in camelCase so stored documents and
//! codes keep the same JSON shape across every device that shares them.

use serde::{Deserialize, Deserializer, Serialize};

/// Icon keys a category may use. Anything else renders as [`DEFAULT_ICON`].
pub const ICONS: [&str; 12] = [
    "box",
    "cow",
    "tractor",
    "wheat",
    "horse",
    "pig",
    "chicken",
    "sheep",
    "seedling",
    "tools",
    "warehouse",
    "droplet",
];

/// Fallback icon for unknown keys
pub const DEFAULT_ICON: &str = "box";

/// Farm name used when settings do not carry one
pub const DEFAULT_FARM_NAME: &str = "AgroGestão Pro";

/// Background used when settings do not carry one
pub const DEFAULT_BACKGROUND_IMAGE: &str = "https://images.unsplash.com/photo-1596733430284-f7437764b1a9?q=80&w=2070&auto=format&fit=crop";

/// Returns `icon` if it belongs to [`ICONS`], otherwise [`DEFAULT_ICON`].
#[must_use]
pub fn normalize_icon(icon: &str) -> &'static str {
    let wanted = icon.trim();
    ICONS
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(wanted))
        .unwrap_or(DEFAULT_ICON)
}

/// A user-defined grouping (tab) for items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Opaque unique token
    pub id: String,
    /// Display name, e.g. "Gado de Corte"
    pub name: String,
    /// Symbolic key into [`ICONS`]
    pub icon: String,
}

/// A single tracked record belonging to exactly one [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    /// Opaque unique token
    pub id: String,
    /// Display name, e.g. "Vaca 01"
    pub name: String,
    /// Units on hand
    #[serde(deserialize_with = "lenient_quantity")]
    pub quantity: u32,
    /// Embedded `data:` URI of the item's photo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// Owning category
    pub category_id: String,
    /// Creation time in milliseconds since the Unix epoch
    pub created_at: i64,
    /// Whether the quantity counts toward the selected total
    pub is_selected_for_sum: bool,
}

/// Older documents may carry negative or fractional quantities; they are
/// clamped into `0..=u32::MAX` and truncated instead of failing the whole
/// collection.
fn lenient_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw <= 0.0 {
        return Ok(0);
    }
    if raw >= f64::from(u32::MAX) {
        return Ok(u32::MAX);
    }
    // Range checked above
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(raw.trunc() as u32)
}

/// Colour palette of the interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Green (default)
    #[default]
    Emerald,
    /// Blue
    Blue,
    /// Amber
    Amber,
    /// Slate grey
    Slate,
    /// Rose
    Rose,
    /// Brown
    Brown,
}

impl Theme {
    /// All themes in display order
    pub const ALL: [Self; 6] = [
        Self::Emerald,
        Self::Blue,
        Self::Amber,
        Self::Slate,
        Self::Rose,
        Self::Brown,
    ];

    /// Lowercase key used in stored documents
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Emerald => "emerald",
            Self::Blue => "blue",
            Self::Amber => "amber",
            Self::Slate => "slate",
            Self::Rose => "rose",
            Self::Brown => "brown",
        }
    }

    /// Primary accent colour as `0xRRGGBB`
    #[must_use]
    pub const fn accent(self) -> u32 {
        match self {
            Self::Emerald => 0x0005_9669,
            Self::Blue => 0x0025_63EB,
            Self::Amber => 0x00D9_7706,
            Self::Slate => 0x0047_5569,
            Self::Rose => 0x00E1_1D48,
            Self::Brown => 0x009A_3412,
        }
    }
}

/// Which fields an item card shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CardOptions {
    /// Show the item photo
    pub show_photo: bool,
    /// Show the short item reference
    pub show_ref: bool,
    /// Show the quantity
    pub show_quantity: bool,
    /// Show the creation date
    pub show_date: bool,
    /// Show the selected-for-total checkbox
    pub show_checkbox: bool,
}

impl Default for CardOptions {
    fn default() -> Self {
        Self {
            show_photo: true,
            show_ref: true,
            show_quantity: true,
            show_date: false,
            show_checkbox: true,
        }
    }
}

/// One of the five [`CardOptions`] switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardOption {
    /// [`CardOptions::show_photo`]
    Photo,
    /// [`CardOptions::show_ref`]
    Ref,
    /// [`CardOptions::show_quantity`]
    Quantity,
    /// [`CardOptions::show_date`]
    Date,
    /// [`CardOptions::show_checkbox`]
    Checkbox,
}

impl CardOptions {
    /// Current value of one switch
    #[must_use]
    pub const fn get(&self, option: CardOption) -> bool {
        match option {
            CardOption::Photo => self.show_photo,
            CardOption::Ref => self.show_ref,
            CardOption::Quantity => self.show_quantity,
            CardOption::Date => self.show_date,
            CardOption::Checkbox => self.show_checkbox,
        }
    }

    /// Flips one switch and returns its new value
    pub const fn toggle(&mut self, option: CardOption) -> bool {
        let slot = match option {
            CardOption::Photo => &mut self.show_photo,
            CardOption::Ref => &mut self.show_ref,
            CardOption::Quantity => &mut self.show_quantity,
            CardOption::Date => &mut self.show_date,
            CardOption::Checkbox => &mut self.show_checkbox,
        };
        *slot = !*slot;
        *slot
    }
}

/// Singleton settings record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// `data:` URI or URL of the background image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    /// Address that export mails are addressed to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    /// Milliseconds since the epoch of the last export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<i64>,
    /// Colour palette
    #[serde(default)]
    pub theme: Theme,
    /// Name of the farm or spreadsheet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_name: Option<String>,
    /// Card field visibility
    #[serde(default)]
    pub card_options: CardOptions,
}

/// Values settings fall back to when a stored or imported record lacks them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SettingsDefaults {
    /// Farm name for records without one
    pub farm_name: String,
    /// Background for records without one (or with an empty one)
    pub background_image: String,
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            farm_name: DEFAULT_FARM_NAME.to_string(),
            background_image: DEFAULT_BACKGROUND_IMAGE.to_string(),
        }
    }
}

impl AppSettings {
    /// Fresh settings with every default applied
    #[must_use]
    pub fn with_defaults(defaults: &SettingsDefaults) -> Self {
        Self::default().merged_with(defaults)
    }

    /// Fills the fields serde cannot default on its own. Runs on every load
    /// and every import; theme and card options are already defaulted per
    /// field during deserialization.
    #[must_use]
    pub fn merged_with(mut self, defaults: &SettingsDefaults) -> Self {
        if self.farm_name.is_none() {
            self.farm_name = Some(defaults.farm_name.clone());
        }
        if self.background_image.as_deref().is_none_or(str::is_empty) {
            self.background_image = Some(defaults.background_image.clone());
        }
        self
    }

    /// Farm name for display
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.farm_name.as_deref().unwrap_or(DEFAULT_FARM_NAME)
    }
}

/// The full exportable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// All categories in display order
    pub categories: Vec<Category>,
    /// All items in insertion order
    pub items: Vec<InventoryItem>,
    /// Settings record
    pub settings: AppSettings,
}

/// Built-in seed categories used when nothing is stored and the
/// configuration does not provide its own list.
#[must_use]
pub fn default_categories() -> Vec<Category> {
    [
        ("cat-1", "Gado de Corte", "cow"),
        ("cat-2", "Maquinário", "tractor"),
        ("cat-3", "Insumos", "wheat"),
    ]
    .into_iter()
    .map(|(id, name, icon)| Category {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
    })
    .collect()
}
