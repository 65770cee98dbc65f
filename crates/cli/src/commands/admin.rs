//! Back-office commands.
//!
//! # Usage
//!
//! ```bash
//! pokestore admin sales
//! pokestore admin top --limit 3
//! pokestore admin seed
//! pokestore admin update 25 --name Raichu --price 90000
//! pokestore admin delete 25
//! ```

use rust_decimal::Decimal;

use pokestore_admin::{AdminConsole, AdminError};
use pokestore_core::{Price, ProductId};
use pokestore_storefront::Storefront;
use pokestore_storefront::catalog::UpdateProduct;

use super::output;
use crate::CliError;

pub fn sales(store: &Storefront) -> Result<(), AdminError> {
    let history = AdminConsole::open(store)?.sales_history()?;

    for row in &history.rows {
        output::line(format!(
            "{}  {}  usuario {:<6} {:>4} u. {:>12}",
            row.sale_id,
            row.timestamp.format("%Y-%m-%d %H:%M"),
            row.owner_user_id,
            row.units,
            row.total.to_string()
        ));
    }
    output::line(format!(
        "{} ventas, {} unidades, total recaudado {}",
        history.summary.record_count, history.summary.units_sold, history.summary.revenue
    ));
    Ok(())
}

pub fn top(store: &Storefront, limit: usize) -> Result<(), AdminError> {
    let report = AdminConsole::open(store)?.top_selling(limit)?;

    if report.rows.is_empty() {
        output::line("Sin ventas registradas.");
    }
    for row in &report.rows {
        output::line(format!(
            "{}. {:<16} {:>5} u. {:>6}%",
            row.rank,
            row.stat.name,
            row.stat.total_quantity_sold,
            row.share_percent.to_string()
        ));
    }
    output::line(format!("Unidades vendidas: {}", report.grand_total));
    Ok(())
}

pub async fn seed(store: &Storefront) -> Result<(), AdminError> {
    AdminConsole::open(store)?.seed_inventory().await?;
    output::line("Inventario inicial cargado.");
    Ok(())
}

/// Turn command-line options into an update.
pub fn build_update(
    name: Option<String>,
    category: Option<String>,
    price: Option<Decimal>,
    description: Option<String>,
    image: Option<String>,
) -> Result<UpdateProduct, CliError> {
    let price = price
        .map(Price::new)
        .transpose()
        .map_err(|e| CliError::Usage(e.to_string()))?;

    let update = UpdateProduct {
        name,
        category,
        price,
        description,
        image_url: image,
    };
    if update.is_empty() {
        return Err(CliError::Usage(
            "nothing to update; pass at least one of --name, --category, --price, --description, --image"
                .to_string(),
        ));
    }
    Ok(update)
}

pub async fn update(
    store: &Storefront,
    id: ProductId,
    update: &UpdateProduct,
) -> Result<(), AdminError> {
    AdminConsole::open(store)?.update_product(id, update).await?;
    output::line(format!("Producto #{id} actualizado."));
    Ok(())
}

pub async fn delete(store: &Storefront, id: ProductId) -> Result<(), AdminError> {
    AdminConsole::open(store)?.delete_product(id).await?;
    output::line(format!("Producto #{id} eliminado."));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_update_requires_a_field() {
        let err = build_update(None, None, None, None, None).unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn test_build_update_rejects_negative_price() {
        let err = build_update(None, None, Some(Decimal::from(-5)), None, None).unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn test_build_update_maps_options() {
        let update = build_update(
            Some("Raichu".to_string()),
            None,
            Some(Decimal::from(90_000)),
            None,
            Some("raichu.png".to_string()),
        )
        .unwrap();
        assert_eq!(update.name.as_deref(), Some("Raichu"));
        assert_eq!(update.price, Some(Price::from_pesos(90_000)));
        assert_eq!(update.image_url.as_deref(), Some("raichu.png"));
        assert!(update.category.is_none());
    }
}
