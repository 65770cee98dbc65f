//! Catalog product type.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product in the store catalog.
///
/// Products come from the remote catalog and are treated as immutable
/// values: the cart and the sale records copy them rather than refer back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Catalog number (unique per product).
    pub catalog_id: ProductId,
    /// Display name.
    pub name: String,
    /// Primary category (the Pokémon's main type, e.g. "Fuego").
    pub primary_category: String,
    /// Price of one unit.
    pub unit_price: Price,
    /// Free-form description.
    pub description: String,
    /// Image URL or local asset path.
    pub image_ref: String,
}
