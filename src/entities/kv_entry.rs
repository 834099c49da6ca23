//! Key-value entry entity - one row per persisted JSON document.
//!
//! The inventory keeps each collection (categories, items, settings) as a
//! whole JSON document under a fixed key. Writes replace the document in
//! full; there is no versioning and the last writer wins.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key-value entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "kv_entries")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Document key (e.g., `"agro_items"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Serialized JSON document
    #[sea_orm(column_type = "Text")]
    pub value: String,
    /// When the document was last written
    pub updated_at: DateTime,
}

/// `KvEntry` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
