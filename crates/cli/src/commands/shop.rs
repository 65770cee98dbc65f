//! Catalog, cart and checkout commands.

use tracing::info;

use pokestore_core::ProductId;
use pokestore_storefront::catalog::CatalogQuery;
use pokestore_storefront::{Storefront, StorefrontError};

use super::output;

pub async fn list_catalog(store: &Storefront, query: &CatalogQuery) -> Result<(), StorefrontError> {
    let products = store.catalog().search(query).await?;
    if products.is_empty() {
        output::line("No se encontraron productos.");
    }
    for product in &products {
        output::product(product);
    }
    Ok(())
}

pub async fn add_to_cart(store: &Storefront, id: ProductId) -> Result<(), StorefrontError> {
    let product = store.add_product(id).await?;
    let cart = store.cart();
    let quantity = cart.line(id).map_or(0, |line| line.quantity);
    output::line(format!("{} en el carrito: {quantity}", product.name));
    output::line(format!("Total: {}", cart.total_price()));
    Ok(())
}

pub fn remove_from_cart(store: &Storefront, id: ProductId) {
    let mut cart = store.cart();
    cart.remove_from_cart(id);
    output::cart(&cart);
}

pub fn clear_cart(store: &Storefront) {
    store.cart().clear_cart();
    output::line("Carrito vaciado.");
}

pub fn show_cart(store: &Storefront) {
    output::cart(&store.cart());
}

/// Buy the cart as the logged-in user.
///
/// Fails when nobody is logged in; an empty cart is reported, not an error.
pub fn checkout(store: &Storefront) -> Result<(), StorefrontError> {
    match store.checkout()? {
        Some(record) => {
            info!(sale_id = %record.id, "Checkout complete");
            output::line("¡Gracias por tu compra!");
            output::sale(&record);
        }
        None if store.identity().is_none() => return Err(StorefrontError::NotAuthenticated),
        None => output::line("El carrito está vacío."),
    }
    Ok(())
}

pub fn history(store: &Storefront) -> Result<(), StorefrontError> {
    let records = store.purchase_history()?;
    if records.is_empty() {
        output::line("Aún no tienes compras.");
    }
    for record in &records {
        output::sale(record);
    }
    Ok(())
}
