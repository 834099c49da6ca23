//! `AgroInventory` - A Discord bot for tracking farm inventory
//!
//! Categories of farm assets (livestock, machinery, supplies) hold counted items.
//! The inventory persists in `SQLite`, moves between installations as a base64
//! sync code, and can be summarised or queried against nearby places through
//! an AI gateway.

#![deny(
    unsafe_code,
    unreachable_code,
    unreachable_patterns,
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// poise-generated command functions carry no docs, hence warn rather than deny
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unwrap_used,
    clippy::enum_glob_use,
    clippy::wildcard_imports,
    future_incompatible,
    rust_2018_idioms,
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
)]

/// Discord bot interface - commands, handlers, views and bot context
pub mod bot;
/// Configuration management for database and application settings
pub mod config;
/// Core business logic - framework-agnostic inventory, persistence, sync and insights
pub mod core;
/// SeaORM entity definitions for database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// Domain records shared by every layer
pub mod models;

#[cfg(test)]
pub mod test_utils;
