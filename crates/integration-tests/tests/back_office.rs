//! Admin reports and inventory management against the mock API.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;

use pokestore_admin::{AdminConsole, AdminError, DEFAULT_TOP_LIMIT};
use pokestore_core::{Price, ProductId};
use pokestore_integration_tests::{ADMIN_EMAIL, ADMIN_PASSWORD, MockApi, token_for};
use pokestore_storefront::Storefront;
use pokestore_storefront::api::ApiError;
use pokestore_storefront::catalog::{CatalogError, UpdateProduct};
use pokestore_storefront::session::SessionStatus;

const BULBASAUR: ProductId = ProductId::new(1);
const CHARMANDER: ProductId = ProductId::new(4);
const PIKACHU: ProductId = ProductId::new(25);

fn secret(password: &str) -> SecretString {
    SecretString::from(password.to_owned())
}

async fn log_in_admin(store: &Storefront) {
    store
        .auth()
        .login(ADMIN_EMAIL, &secret(ADMIN_PASSWORD))
        .await
        .unwrap();
}

/// Register `email` and buy each basket in turn, then log out.
async fn shop(store: &Storefront, name: &str, email: &str, baskets: &[&[ProductId]]) {
    store
        .auth()
        .register(name, email, &secret("pokemon"))
        .await
        .unwrap();
    for basket in baskets {
        for id in *basket {
            store.add_product(*id).await.unwrap();
        }
        store.checkout().unwrap().unwrap();
    }
    let _ = store.logout();
}

// ============================================================================
// Access control
// ============================================================================

#[tokio::test]
async fn test_back_office_requires_admin() {
    let mock = MockApi::start().await;
    let store = mock.storefront();

    assert!(matches!(
        AdminConsole::open(&store),
        Err(AdminError::NotAuthenticated)
    ));

    store
        .auth()
        .register("Brock", "brock@pewter.gym", &secret("onix123"))
        .await
        .unwrap();
    assert!(matches!(
        AdminConsole::open(&store),
        Err(AdminError::Forbidden)
    ));
}

#[tokio::test]
async fn test_console_rechecks_session_on_every_call() {
    let mock = MockApi::start().await;
    let store = mock.storefront();
    log_in_admin(&store).await;

    let console = AdminConsole::open(&store).unwrap();
    assert!(console.sales_history().is_ok());

    let _ = store.logout();
    assert!(matches!(
        console.sales_history(),
        Err(AdminError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_unauthorized_response_keeps_session() {
    let mock = MockApi::start().await;
    let store = mock.storefront();

    // A well-formed admin token the server never issued.
    let forged = token_for(&json!({
        "sub": 1,
        "email": ADMIN_EMAIL,
        "role": "admin",
    }));
    store.session().establish(SecretString::from(forged)).unwrap();

    let console = AdminConsole::open(&store).unwrap();
    let err = console.seed_inventory().await.unwrap_err();

    assert!(matches!(
        err,
        AdminError::Catalog(CatalogError::Api(ApiError::Unauthorized { .. }))
    ));
    assert_eq!(store.status(), SessionStatus::Authenticated);
}

// ============================================================================
// Reports
// ============================================================================

#[tokio::test]
async fn test_sales_from_every_user_are_listed_most_recent_first() {
    let mock = MockApi::start().await;
    let store = mock.storefront();

    shop(
        &store,
        "Misty",
        "misty@cerulean.gym",
        &[&[PIKACHU, PIKACHU], &[CHARMANDER]],
    )
    .await;
    shop(&store, "Brock", "brock@pewter.gym", &[&[PIKACHU, BULBASAUR]]).await;

    log_in_admin(&store).await;
    let console = AdminConsole::open(&store).unwrap();
    let history = console.sales_history().unwrap();

    assert_eq!(history.rows.len(), 3);
    assert!(
        history
            .rows
            .windows(2)
            .all(|pair| pair[0].timestamp >= pair[1].timestamp)
    );
    let owners: BTreeSet<_> = history.rows.iter().map(|r| r.owner_user_id.as_str()).collect();
    assert_eq!(owners.len(), 2);

    assert_eq!(history.summary.record_count, 3);
    assert_eq!(history.summary.units_sold, 5);
    assert_eq!(
        history.summary.revenue,
        Price::from_pesos(99_990 * 3 + 52_000 + 45_000)
    );
    assert_eq!(console.total_revenue().unwrap(), history.summary.revenue);
}

#[tokio::test]
async fn test_top_selling_ranks_products_across_users() {
    let mock = MockApi::start().await;
    let store = mock.storefront();

    shop(
        &store,
        "Misty",
        "misty@cerulean.gym",
        &[&[PIKACHU, PIKACHU], &[CHARMANDER]],
    )
    .await;
    shop(&store, "Brock", "brock@pewter.gym", &[&[PIKACHU, BULBASAUR]]).await;

    log_in_admin(&store).await;
    // Ties keep first-encountered order, and Brock's sale is the most recent.
    let report = AdminConsole::open(&store)
        .unwrap()
        .top_selling(DEFAULT_TOP_LIMIT)
        .unwrap();

    assert_eq!(report.grand_total, 5);
    let ranked: Vec<_> = report
        .rows
        .iter()
        .map(|row| (row.rank, row.stat.name.as_str(), row.stat.total_quantity_sold))
        .collect();
    assert_eq!(
        ranked,
        [(1, "Pikachu", 3), (2, "Bulbasaur", 1), (3, "Charmander", 1)]
    );
    assert_eq!(report.rows[0].share_percent, Decimal::new(600, 1));
    assert_eq!(report.rows[1].share_percent, Decimal::new(200, 1));
}

#[tokio::test]
async fn test_admin_is_notified_of_new_sales() {
    let mock = MockApi::start().await;
    let store = mock.storefront();
    log_in_admin(&store).await;

    let mut sales = AdminConsole::open(&store).unwrap().subscribe_sales().unwrap();
    store.add_product(BULBASAUR).await.unwrap();
    let record = store.checkout().unwrap().unwrap();

    let event = sales.recv().await.unwrap();
    assert_eq!(event.owner_user_id, "1");
    assert_eq!(event.new_record, record);
}

// ============================================================================
// Inventory
// ============================================================================

#[tokio::test]
async fn test_inventory_update_reaches_backend_and_refreshes_catalog() {
    let mock = MockApi::start().await;
    let store = mock.storefront();
    log_in_admin(&store).await;
    let console = AdminConsole::open(&store).unwrap();

    // Warm the cache so the update has something to invalidate.
    console.inventory().await.unwrap();

    let update = UpdateProduct {
        name: Some("Raichu".to_string()),
        price: Some(Price::from_pesos(80_000)),
        ..UpdateProduct::default()
    };
    console.update_product(PIKACHU, &update).await.unwrap();

    let stored = mock
        .products()
        .into_iter()
        .find(|p| p["id"] == 25)
        .unwrap();
    assert_eq!(stored["nombre"], "Raichu");
    assert!(stored["precio"].is_number());
    assert_eq!(stored["precio"].as_f64(), Some(80_000.0));

    let inventory = console.inventory().await.unwrap();
    let raichu = inventory.iter().find(|p| p.catalog_id == PIKACHU).unwrap();
    assert_eq!(raichu.name, "Raichu");
    assert_eq!(raichu.unit_price, Price::from_pesos(80_000));
    assert_eq!(raichu.primary_category, "Eléctrico");
}

#[tokio::test]
async fn test_inventory_delete_and_reseed() {
    let mock = MockApi::start().await;
    let store = mock.storefront();
    log_in_admin(&store).await;
    let console = AdminConsole::open(&store).unwrap();

    console.delete_product(CHARMANDER).await.unwrap();
    let inventory = console.inventory().await.unwrap();
    assert_eq!(inventory.len(), 2);
    assert!(inventory.iter().all(|p| p.catalog_id != CHARMANDER));

    let err = console.delete_product(CHARMANDER).await.unwrap_err();
    assert!(matches!(
        err,
        AdminError::Catalog(CatalogError::Api(ApiError::Status { status: 404, .. }))
    ));

    console.seed_inventory().await.unwrap();
    assert_eq!(console.inventory().await.unwrap().len(), 3);
}
