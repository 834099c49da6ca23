//! Entity module - Contains the SeaORM entity definitions for the database.
//! The inventory is stored as JSON documents in a single key-value table.

pub mod kv_entry;

pub use kv_entry::{Column as KvEntryColumn, Entity as KvEntry, Model as KvEntryModel};
