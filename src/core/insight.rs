//! AI insight gateway.
//!
//! The inventory depends on two request/response calls it does not implement
//! itself: a prose summary of the current inventory and location-grounded
//! answers to a free-text question. [`InsightProvider`] is that seam;
//! [`crate::core::gemini::GeminiClient`] is the production implementation.
//!
//! [`InsightGateway`] fronts a provider with one busy flag per operation: a
//! second call of the same kind while one is outstanding is refused with
//! [`GatewayError::Busy`], never queued. There is no timeout and no retry.

use crate::{
    core::location::Coordinates,
    errors::GatewayError,
    models::{Category, InventoryItem},
};
use async_trait::async_trait;
use std::{
    fmt::Write,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tracing::{info, warn};

/// Photo-free copy of the inventory sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySnapshot {
    /// Farm name for context
    pub farm_name: String,
    /// Categories in display order
    pub categories: Vec<Category>,
    /// Items without photos
    pub items: Vec<InventoryItem>,
}

/// A citation returned with a location insight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingLink {
    /// Link target
    pub uri: String,
    /// Place or page title
    pub title: Option<String>,
    /// Short excerpt, e.g. a review
    pub snippet: Option<String>,
}

/// Prose answer plus citations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocationInsight {
    /// Answer text (may be empty on a successful but empty answer)
    pub text: String,
    /// Zero or more citations
    pub links: Vec<GroundingLink>,
}

/// The external AI service.
#[async_trait]
pub trait InsightProvider: Send + Sync {
    /// Free-form prose about the inventory
    async fn inventory_summary(&self, snapshot: &InventorySnapshot)
    -> Result<String, GatewayError>;

    /// Answer to `query`, grounded on maps data near `coordinates` if known
    async fn location_insights(
        &self,
        query: &str,
        coordinates: Option<Coordinates>,
    ) -> Result<LocationInsight, GatewayError>;
}

/// Provider used when no API key is configured; every call fails with
/// [`GatewayError::NotConfigured`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredProvider;

#[async_trait]
impl InsightProvider for UnconfiguredProvider {
    async fn inventory_summary(
        &self,
        _snapshot: &InventorySnapshot,
    ) -> Result<String, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn location_insights(
        &self,
        _query: &str,
        _coordinates: Option<Coordinates>,
    ) -> Result<LocationInsight, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}

/// Clears a busy flag when dropped, whether the call succeeded or failed.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, GatewayError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| GatewayError::Busy)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Busy-guarded front for an [`InsightProvider`].
pub struct InsightGateway {
    provider: Arc<dyn InsightProvider>,
    summary_busy: AtomicBool,
    location_busy: AtomicBool,
}

impl InsightGateway {
    /// Wraps `provider`
    #[must_use]
    pub fn new(provider: Arc<dyn InsightProvider>) -> Self {
        Self {
            provider,
            summary_busy: AtomicBool::new(false),
            location_busy: AtomicBool::new(false),
        }
    }

    /// True while a summary request is outstanding
    #[must_use]
    pub fn is_summary_busy(&self) -> bool {
        self.summary_busy.load(Ordering::Acquire)
    }

    /// True while a location request is outstanding
    #[must_use]
    pub fn is_location_busy(&self) -> bool {
        self.location_busy.load(Ordering::Acquire)
    }

    /// Requests a summary of `snapshot`.
    ///
    /// # Errors
    /// [`GatewayError::Busy`] if a summary is already being generated, or
    /// whatever the provider reports.
    pub async fn inventory_summary(
        &self,
        snapshot: &InventorySnapshot,
    ) -> Result<String, GatewayError> {
        let _guard = BusyGuard::acquire(&self.summary_busy)?;
        info!(
            "Requesting inventory summary ({} categories, {} items)",
            snapshot.categories.len(),
            snapshot.items.len()
        );
        self.provider
            .inventory_summary(snapshot)
            .await
            .inspect_err(|e| warn!("Inventory summary failed: {e}"))
    }

    /// Requests location-grounded insights for `query`.
    ///
    /// # Errors
    /// [`GatewayError::Busy`] if a location request is already running, or
    /// whatever the provider reports.
    pub async fn location_insights(
        &self,
        query: &str,
        coordinates: Option<Coordinates>,
    ) -> Result<LocationInsight, GatewayError> {
        let _guard = BusyGuard::acquire(&self.location_busy)?;
        info!(
            "Requesting location insights (location known: {})",
            coordinates.is_some()
        );
        self.provider
            .location_insights(query, coordinates)
            .await
            .inspect_err(|e| warn!("Location insights failed: {e}"))
    }
}

/// Prompt asking for an inventory summary.
#[must_use]
pub fn summary_prompt(snapshot: &InventorySnapshot) -> String {
    let mut prompt = format!(
        "You are an agricultural management consultant. Analyse the inventory of \"{}\" \
         below and write a short summary in Brazilian Portuguese: highlight the main \
         assets, anything that looks low or unbalanced, and one or two practical \
         recommendations.\n\n",
        snapshot.farm_name
    );

    for category in &snapshot.categories {
        let items: Vec<&InventoryItem> = snapshot
            .items
            .iter()
            .filter(|item| item.category_id == category.id)
            .collect();
        let total: u64 = items.iter().map(|item| u64::from(item.quantity)).sum();

        // Writing to a String cannot fail
        let _ = writeln!(prompt, "## {} ({} items, total {total})", category.name, items.len());
        for item in items {
            let _ = writeln!(prompt, "- {}: {}", item.name, item.quantity);
        }
    }

    if snapshot.items.is_empty() {
        prompt.push_str("\nThe inventory is currently empty.\n");
    }
    prompt
}

/// Prompt for a location question.
#[must_use]
pub fn location_prompt(query: &str, coordinates: Option<Coordinates>) -> String {
    coordinates.map_or_else(
        || format!("{query}\n\nAnswer in Brazilian Portuguese."),
        |c| {
            format!(
                "{query}\n\nThe user is at latitude {:.5}, longitude {:.5}. \
                 Answer in Brazilian Portuguese.",
                c.latitude, c.longitude
            )
        },
    )
}
