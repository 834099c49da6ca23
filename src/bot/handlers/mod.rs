//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions such as autocomplete
//! and other non-command interactions.

/// Autocomplete handlers for category names, item names and icons
pub mod autocomplete;
