//! Records managed by a toggled collection.
//!
//! A collection only ever looks at an item's identity. Everything else the
//! caller stored (name, location, logo, category tags, certifications and so
//! on) is payload that must survive a save/restore cycle unchanged.
//!
//! Two record shapes ship with the crate:
//!
//! - [`Entity`]: an `id` plus an arbitrary JSON object. This is what the FFI
//!   surface stores, so hosts can put whatever fields their cards render.
//! - [`Manufacturer`]: the typed listing the matchmaking dashboards use. It
//!   serializes to the same wire shape. Every field except `id` has a
//!   default, so records a host stored with only some fields still load as
//!   listings. Fields a `Manufacturer` does not know are dropped when it is
//!   written back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Identity of a record within one collection's domain.
pub type EntityId = i64;

/// Anything a toggled collection can hold.
///
/// Equality inside the collection is defined by [`Keyed::key`] alone; two
/// records with the same id but different payload are the same item.
pub trait Keyed {
    fn key(&self) -> EntityId;
}

/// A record with an integer identity and opaque payload.
///
/// # Examples
///
/// ```rust
/// use shortlist_core::entity::{Entity, Keyed};
/// use serde_json::json;
///
/// let entity: Entity = serde_json::from_value(json!({
///     "id": 7,
///     "name": "Northwind Textiles",
///     "certifications": ["ISO 9001", "OEKO-TEX"]
/// }))?;
///
/// assert_eq!(entity.key(), 7);
/// assert_eq!(entity.fields["name"], "Northwind Textiles");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier, the only field the store inspects.
    pub id: EntityId,

    /// Every other field, kept as-is.
    #[serde(flatten)]
    pub fields: Map<String, JsonValue>,
}

impl Entity {
    /// Record with an id and no payload.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    /// Adds one payload field, builder style.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

impl Keyed for Entity {
    fn key(&self) -> EntityId {
        self.id
    }
}

/// A manufacturer listing as shown on search results and dashboard cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manufacturer {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    /// Logo reference (URL or asset path).
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    /// Minimum order quantity as displayed, e.g. `"500 units"`.
    #[serde(default)]
    pub min_order: String,
    #[serde(default)]
    pub established: i32,
    #[serde(default)]
    pub rating: f64,
}

impl Keyed for Manufacturer {
    fn key(&self) -> EntityId {
        self.id
    }
}

impl TryFrom<&Manufacturer> for Entity {
    type Error = serde_json::Error;

    fn try_from(manufacturer: &Manufacturer) -> Result<Self, Self::Error> {
        serde_json::from_value(serde_json::to_value(manufacturer)?)
    }
}
