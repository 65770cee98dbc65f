//! Product catalog backed by the remote API.
//!
//! The remote API speaks Spanish field names (`nombre`, `tipo`, `precio`);
//! this module maps them into [`Product`] and caches the full listing with
//! `moka`. Inventory mutations invalidate the cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use pokestore_core::{Price, Product, ProductId};

use crate::api::{ApiClient, ApiError};

/// Listing endpoint.
pub const PRODUCTS_PATH: &str = "/v2/pokemones";
/// Seeding endpoint (admin).
pub const SEED_PATH: &str = "/v2/pokemones/seed";

/// Description shown when the backend has none.
pub const FALLBACK_DESCRIPTION: &str = "Sin descripción";
/// Image shown when the backend has none.
pub const DEFAULT_FALLBACK_IMAGE: &str = "app/assets/img/pokeball.webp";

const LISTING_KEY: &str = "products";

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An update request that changes nothing.
    #[error("update has no fields set")]
    EmptyUpdate,
}

/// A product as the backend sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackendProduct {
    id: i64,
    nombre: String,
    #[serde(default)]
    tipo: String,
    #[serde(default)]
    imagen_url: Option<String>,
    precio: Decimal,
    #[serde(default)]
    descripcion: Option<String>,
}

impl BackendProduct {
    /// Map into a [`Product`], filling in the fallbacks.
    ///
    /// Returns `None` for a negative price.
    fn into_product(self, fallback_image: &str) -> Option<Product> {
        let Ok(unit_price) = Price::new(self.precio) else {
            warn!(id = self.id, precio = %self.precio, "Skipping product with negative price");
            return None;
        };

        let image_ref = self
            .imagen_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| fallback_image.to_string());

        let description = self
            .descripcion
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string());

        Some(Product {
            catalog_id: ProductId::new(self.id),
            name: self.nombre,
            primary_category: self.tipo,
            unit_price,
            description,
            image_ref,
        })
    }
}

/// Fields to change on an existing product.
///
/// Unset fields are left out of the PATCH body, so the backend keeps them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "tipo", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        rename = "precio",
        skip_serializing_if = "Option::is_none",
        serialize_with = "price_as_number"
    )]
    pub price: Option<Price>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "imagenUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl UpdateProduct {
    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
    }
}

// =============================================================================
// CatalogQuery
// =============================================================================

/// Category value that disables the category filter.
pub const ALL_CATEGORIES: &str = "all";

/// Filter over the catalog listing.
///
/// A product's category may list several types separated by commas
/// ("Fuego, Volador"); the category filter matches any one of them.
/// Comparisons ignore case and surrounding whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Type to keep; `None`, blank or `"all"` keeps every type.
    pub category: Option<String>,
    /// Search term matched against the name and the catalog id.
    pub term: Option<String>,
    /// Require the name to equal the term instead of containing it.
    pub exact: bool,
}

impl CatalogQuery {
    /// Whether `product` passes both filters.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_category(product) && self.matches_term(product)
    }

    fn matches_category(&self, product: &Product) -> bool {
        let wanted = match self.category.as_deref().map(str::trim) {
            None | Some("") => return true,
            Some(category) if category.eq_ignore_ascii_case(ALL_CATEGORIES) => return true,
            Some(category) => category.to_lowercase(),
        };

        product
            .primary_category
            .split(',')
            .any(|part| part.trim().to_lowercase() == wanted)
    }

    fn matches_term(&self, product: &Product) -> bool {
        let term = match self.term.as_deref().map(str::trim) {
            None | Some("") => return true,
            Some(term) => term.to_lowercase(),
        };

        let name = product.name.to_lowercase();
        if self.exact {
            return name == term;
        }
        name.contains(&term) || product.catalog_id.to_string().contains(&term)
    }
}

// =============================================================================
// CatalogService
// =============================================================================

/// Read and manage the product catalog.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    api: ApiClient,
    cache: Cache<&'static str, Arc<[Product]>>,
    fallback_image: String,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("fallback_image", &self.inner.fallback_image)
            .finish_non_exhaustive()
    }
}

impl CatalogService {
    /// Create a catalog that caches the listing for `ttl`.
    #[must_use]
    pub fn new(api: ApiClient, ttl: Duration, fallback_image: impl Into<String>) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();

        Self {
            inner: Arc::new(CatalogInner {
                api,
                cache,
                fallback_image: fallback_image.into(),
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All products, in backend order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Api` if the listing cannot be fetched.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Arc<[Product]>, CatalogError> {
        if let Some(products) = self.inner.cache.get(LISTING_KEY).await {
            debug!(count = products.len(), "Catalog cache hit");
            return Ok(products);
        }

        let raw: Vec<BackendProduct> = self.inner.api.get_json(PRODUCTS_PATH).await?;
        let products: Arc<[Product]> = raw
            .into_iter()
            .filter_map(|p| p.into_product(&self.inner.fallback_image))
            .collect();

        debug!(count = products.len(), "Fetched catalog");
        self.inner.cache.insert(LISTING_KEY, products.clone()).await;
        Ok(products)
    }

    /// Look up one product by catalog id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Api` if the listing cannot be fetched.
    pub async fn find_product(&self, catalog_id: ProductId) -> Result<Option<Product>, CatalogError> {
        let products = self.list_products().await?;
        Ok(products.iter().find(|p| p.catalog_id == catalog_id).cloned())
    }

    /// Products passing `query`, in backend order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Api` if the listing cannot be fetched.
    pub async fn search(&self, query: &CatalogQuery) -> Result<Vec<Product>, CatalogError> {
        let products = self.list_products().await?;
        let matched: Vec<Product> = products.iter().filter(|p| query.matches(p)).cloned().collect();
        debug!(total = products.len(), matched = matched.len(), "Filtered catalog");
        Ok(matched)
    }

    // =========================================================================
    // Inventory (admin)
    // =========================================================================

    /// Ask the backend to load its initial product set.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Api` if the backend rejects the request.
    #[instrument(skip(self))]
    pub async fn seed(&self) -> Result<(), CatalogError> {
        self.inner.api.post::<()>(SEED_PATH, None).await?;
        info!("Catalog seeded");
        self.invalidate().await;
        Ok(())
    }

    /// Change fields of an existing product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::EmptyUpdate` when `update` sets nothing, or
    /// `CatalogError::Api` if the backend rejects the request.
    #[instrument(skip(self, update))]
    pub async fn update_product(
        &self,
        catalog_id: ProductId,
        update: &UpdateProduct,
    ) -> Result<(), CatalogError> {
        if update.is_empty() {
            return Err(CatalogError::EmptyUpdate);
        }
        self.inner
            .api
            .patch(&product_path(catalog_id), update)
            .await?;
        info!("Product updated");
        self.invalidate().await;
        Ok(())
    }

    /// Remove a product from the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Api` if the backend rejects the request.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, catalog_id: ProductId) -> Result<(), CatalogError> {
        self.inner.api.delete(&product_path(catalog_id)).await?;
        info!("Product deleted");
        self.invalidate().await;
        Ok(())
    }

    /// Drop the cached listing.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

/// The backend wants `precio` as a JSON number.
fn price_as_number<S: serde::Serializer>(price: &Option<Price>, serializer: S) -> Result<S::Ok, S::Error> {
    rust_decimal::serde::float_option::serialize(&price.map(|p| p.amount()), serializer)
}

fn product_path(catalog_id: ProductId) -> String {
    format!("{PRODUCTS_PATH}/{catalog_id}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn backend(value: serde_json::Value) -> BackendProduct {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_maps_backend_fields() {
        let product = backend(json!({
            "id": 25,
            "nombre": "Pikachu",
            "tipo": "Eléctrico",
            "imagenUrl": "https://img.example/25.png",
            "precio": 75000,
            "descripcion": "Ratón eléctrico",
        }))
        .into_product(DEFAULT_FALLBACK_IMAGE)
        .unwrap();

        assert_eq!(product.catalog_id, ProductId::new(25));
        assert_eq!(product.name, "Pikachu");
        assert_eq!(product.primary_category, "Eléctrico");
        assert_eq!(product.unit_price, Price::from_pesos(75_000));
        assert_eq!(product.image_ref, "https://img.example/25.png");
        assert_eq!(product.description, "Ratón eléctrico");
    }

    #[test]
    fn test_null_image_and_empty_description_fall_back() {
        let product = backend(json!({
            "id": 1,
            "nombre": "Bulbasaur",
            "tipo": "Planta",
            "imagenUrl": null,
            "precio": 40000,
            "descripcion": "  ",
        }))
        .into_product("fallback.webp")
        .unwrap();

        assert_eq!(product.image_ref, "fallback.webp");
        assert_eq!(product.description, FALLBACK_DESCRIPTION);
    }

    #[test]
    fn test_fractional_price_is_kept_exact() {
        let product = backend(json!({
            "id": 2,
            "nombre": "Ivysaur",
            "tipo": "Planta",
            "precio": 1999.5,
            "descripcion": "x",
        }))
        .into_product(DEFAULT_FALLBACK_IMAGE)
        .unwrap();

        assert_eq!(product.unit_price.amount(), Decimal::new(19995, 1));
    }

    #[test]
    fn test_negative_price_is_skipped() {
        let product = backend(json!({
            "id": 3,
            "nombre": "Venusaur",
            "tipo": "Planta",
            "precio": -1,
            "descripcion": "x",
        }))
        .into_product(DEFAULT_FALLBACK_IMAGE);

        assert!(product.is_none());
    }

    #[test]
    fn test_update_body_only_has_set_fields() {
        let update = UpdateProduct {
            name: Some("Raichu".to_string()),
            price: Some(Price::from_pesos(90_000)),
            ..UpdateProduct::default()
        };
        let body = serde_json::to_value(&update).unwrap();
        let object = body.as_object().unwrap();

        assert_eq!(object.len(), 2);
        assert_eq!(object["nombre"], "Raichu");
        assert_eq!(object["precio"], json!(90000.0));
    }

    #[test]
    fn test_empty_update() {
        assert!(UpdateProduct::default().is_empty());
        assert!(
            !UpdateProduct {
                image_url: Some("x.png".to_string()),
                ..UpdateProduct::default()
            }
            .is_empty()
        );
    }

    fn charizard() -> Product {
        let mut product = crate::test_support::product(6, "Charizard", 120_000);
        product.primary_category = "Fuego, Volador".to_string();
        product
    }

    fn query(category: Option<&str>, term: Option<&str>, exact: bool) -> CatalogQuery {
        CatalogQuery {
            category: category.map(str::to_string),
            term: term.map(str::to_string),
            exact,
        }
    }

    #[test]
    fn test_default_query_matches_everything() {
        assert!(CatalogQuery::default().matches(&charizard()));
        assert!(query(Some("  "), Some(" "), true).matches(&charizard()));
        assert!(query(Some("ALL"), None, false).matches(&charizard()));
    }

    #[test]
    fn test_category_matches_any_listed_type() {
        assert!(query(Some("volador"), None, false).matches(&charizard()));
        assert!(query(Some(" FUEGO "), None, false).matches(&charizard()));
        assert!(!query(Some("Agua"), None, false).matches(&charizard()));
        // Whole types only.
        assert!(!query(Some("fue"), None, false).matches(&charizard()));
    }

    #[test]
    fn test_term_matches_name_or_id() {
        assert!(query(None, Some("CHAR"), false).matches(&charizard()));
        assert!(query(None, Some("6"), false).matches(&charizard()));
        assert!(!query(None, Some("pika"), false).matches(&charizard()));
    }

    #[test]
    fn test_exact_term_requires_whole_name() {
        assert!(query(None, Some(" charizard "), true).matches(&charizard()));
        assert!(!query(None, Some("char"), true).matches(&charizard()));
        assert!(!query(None, Some("6"), true).matches(&charizard()));
    }

    #[test]
    fn test_category_and_term_both_apply() {
        assert!(query(Some("Fuego"), Some("izard"), false).matches(&charizard()));
        assert!(!query(Some("Planta"), Some("izard"), false).matches(&charizard()));
    }

    #[test]
    fn test_product_path() {
        assert_eq!(product_path(ProductId::new(6)), "/v2/pokemones/6");
    }
}
