//! Fixtures shared by unit tests.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::SecretString;
use url::Url;

use pokestore_core::{Price, Product, ProductId};
use pokestore_storefront::storage::MemoryStorage;
use pokestore_storefront::{Storefront, StorefrontConfig};

/// A storefront over fresh in-memory storage and an unreachable API.
#[allow(clippy::unwrap_used)]
pub fn storefront() -> Storefront {
    let config = StorefrontConfig::with_api_url(Url::parse("http://127.0.0.1:9").unwrap());
    Storefront::with_storage(config, Arc::new(MemoryStorage::new())).unwrap()
}

/// Replace the session with one carrying `claims`.
#[allow(clippy::unwrap_used)]
pub fn log_in(store: &Storefront, claims: &serde_json::Value) {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    let token = format!("{header}.{payload}.signature");
    store
        .session()
        .establish(SecretString::from(token))
        .unwrap();
}

pub fn product(id: i64, pesos: u64) -> Product {
    Product {
        catalog_id: ProductId::new(id),
        name: format!("Pokémon #{id}"),
        primary_category: "Normal".to_string(),
        unit_price: Price::from_pesos(pesos),
        description: String::new(),
        image_ref: format!("{id}.png"),
    }
}
