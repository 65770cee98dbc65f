//! The storefront context shared by every front end.
//!
//! One `Storefront` owns the session, the cart and the purchase recorder for
//! a running client, built explicitly from configuration and persisted
//! state instead of living in globals.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{info, instrument};

use pokestore_core::{Identity, Product, ProductId};

use crate::api::ApiClient;
use crate::auth::{AuthService, TokenDecoder};
use crate::cart::CartStore;
use crate::catalog::CatalogService;
use crate::config::StorefrontConfig;
use crate::error::StorefrontError;
use crate::events::{Route, SalesUpdated};
use crate::sales::{self, PurchaseRecorder, SaleRecord};
use crate::session::{SessionStatus, SessionStore};
use crate::storage::{FileStorage, Storage, StorageError};

/// Storefront context.
///
/// This struct is cheaply cloneable via `Arc`; clones share every store.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    storage: Arc<dyn Storage>,
    session: SessionStore,
    auth: AuthService,
    catalog: CatalogService,
    cart: Mutex<CartStore>,
    recorder: PurchaseRecorder,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("config", &self.inner.config)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Open the storefront with file-backed storage in `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the HTTP
    /// client cannot be built.
    pub fn open(config: StorefrontConfig) -> Result<Self, StorefrontError> {
        let storage = FileStorage::open(&config.data_dir)?;
        Self::with_storage(config, Arc::new(storage))
    }

    /// Build the storefront over any storage and restore the session.
    ///
    /// The cart is rehydrated and the session restored before this returns,
    /// so the session is never observed in the `Loading` state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(
        config: StorefrontConfig,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, StorefrontError> {
        let session = SessionStore::new(
            storage.clone(),
            TokenDecoder::new(config.enforce_token_expiry),
        );
        let status = session.restore_session();

        let api = ApiClient::new(config.api_url.clone(), config.http_timeout, session.clone())?;
        let auth = AuthService::new(api.clone(), session.clone());
        let catalog = CatalogService::new(api, config.catalog_cache_ttl, config.fallback_image.clone());
        let cart = CartStore::load(storage.clone());
        let recorder = PurchaseRecorder::new(storage.clone());

        info!(?status, cart_lines = cart.lines().len(), "Storefront ready");

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                storage,
                session,
                auth,
                catalog,
                cart: Mutex::new(cart),
                recorder,
            }),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Lock the cart.
    ///
    /// Do not hold the guard across an `.await`.
    pub fn cart(&self) -> MutexGuard<'_, CartStore> {
        self.inner
            .cart
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.inner.session.status()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.inner.session.identity()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.inner.session.is_admin()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Add one unit of the catalog product `catalog_id` to the cart.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::ProductNotFound` for an unknown id, or a
    /// catalog error if the listing cannot be fetched.
    #[instrument(skip(self))]
    pub async fn add_product(&self, catalog_id: ProductId) -> Result<Product, StorefrontError> {
        let product = self
            .inner
            .catalog
            .find_product(catalog_id)
            .await?
            .ok_or(StorefrontError::ProductNotFound(catalog_id))?;

        self.cart().add_to_cart(&product);
        Ok(product)
    }

    /// Record the current cart as a purchase by the logged-in user.
    ///
    /// The cart is cleared only when a record was written. Returns
    /// `Ok(None)` when nobody is logged in or the cart is empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be written; the cart is
    /// left untouched.
    pub fn checkout(&self) -> Result<Option<SaleRecord>, StorageError> {
        let identity = self.inner.session.identity();
        let mut cart = self.cart();

        let record = self
            .inner
            .recorder
            .record_purchase(cart.lines(), identity.as_ref())?;
        if record.is_some() {
            cart.clear_cart();
        }
        Ok(record)
    }

    /// The logged-in user's purchases, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::NotAuthenticated` when nobody is logged in.
    pub fn purchase_history(&self) -> Result<Vec<SaleRecord>, StorefrontError> {
        let identity = self
            .inner
            .session
            .identity()
            .ok_or(StorefrontError::NotAuthenticated)?;
        Ok(sales::purchases_for(
            self.inner.storage.as_ref(),
            &identity.id.owner_key(),
        )?)
    }

    /// Every user's sale records, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store fails.
    pub fn all_sales(&self) -> Result<Vec<SaleRecord>, StorageError> {
        sales::get_all_sales(self.inner.storage.as_ref())
    }

    /// Subscribe to purchases recorded from now on.
    #[must_use]
    pub fn subscribe_sales(&self) -> broadcast::Receiver<SalesUpdated> {
        self.inner.recorder.subscribe()
    }

    /// Log out. The returned route must be shown.
    #[must_use]
    pub fn logout(&self) -> Route {
        self.inner.session.logout()
    }
}
