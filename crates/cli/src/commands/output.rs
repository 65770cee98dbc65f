//! Terminal output.
//!
//! Results go to stdout; diagnostics go through `tracing` to stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use pokestore_core::Product;
use pokestore_storefront::cart::CartStore;
use pokestore_storefront::sales::SaleRecord;

/// Print one line of results.
pub fn line(text: impl AsRef<str>) {
    println!("{}", text.as_ref());
}

/// Print an error the user can act on.
pub fn failure(error: &impl std::fmt::Display) {
    eprintln!("Error: {error}");
}

pub fn product(product: &Product) {
    println!(
        "{:<6} {:<16} {:<12} {:>10}",
        format!("#{}", product.catalog_id),
        product.name,
        product.primary_category,
        product.unit_price.to_string()
    );
}

pub fn cart(cart: &CartStore) {
    if cart.is_empty() {
        println!("El carrito está vacío.");
        return;
    }
    for line in cart.lines() {
        println!(
            "{:<6} {:<16} x{:<3} {:>10}",
            format!("#{}", line.product.catalog_id),
            line.product.name,
            line.quantity,
            line.subtotal().to_string()
        );
    }
    println!(
        "Total: {} unidades, {}",
        cart.total_quantity(),
        cart.total_price()
    );
}

pub fn sale(record: &SaleRecord) {
    println!(
        "Compra {} ({}) - {} unidades, {}",
        record.id,
        record.timestamp.format("%Y-%m-%d %H:%M"),
        record.total_quantity(),
        record.total_price()
    );
    for item in &record.items {
        println!(
            "  {:<6} {:<16} x{:<3} {:>10}",
            format!("#{}", item.catalog_id),
            item.name,
            item.quantity,
            item.subtotal().to_string()
        );
    }
}
