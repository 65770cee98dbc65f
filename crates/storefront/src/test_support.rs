//! Fixtures shared by unit tests.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use pokestore_core::{Price, Product, ProductId};

/// Build an unsigned bearer token carrying `claims` as its payload.
pub fn token_for(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

/// A catalog product with a whole-peso price.
pub fn product(id: i64, name: &str, pesos: u64) -> Product {
    Product {
        catalog_id: ProductId::new(id),
        name: name.to_string(),
        primary_category: "Normal".to_string(),
        unit_price: Price::from_pesos(pesos),
        description: format!("{name} de prueba"),
        image_ref: format!("https://img.example/{id}.png"),
    }
}
