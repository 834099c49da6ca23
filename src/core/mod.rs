//! Core inventory logic, independent of Discord.

/// Gemini HTTP client implementing the insight provider
pub mod gemini;
/// Busy-guarded AI insight gateway and prompts
pub mod insight;
/// In-memory inventory state and its operations
pub mod inventory;
/// Best-effort position lookup
pub mod location;
/// Upload encoding into `data:` URIs
pub mod photo;
/// Inventory bound to the store, committing after each change
pub mod session;
/// Key-value document persistence
pub mod store;
/// Sync code encoding and decoding
pub mod sync;
