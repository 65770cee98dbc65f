//! Admin access gate.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use pokestore_core::Identity;
use pokestore_storefront::Storefront;
use pokestore_storefront::events::SalesUpdated;

use crate::error::AdminError;

/// Entry point to every back-office operation.
///
/// The admin role is checked when the console is opened and again on every
/// operation, so a console kept across a logout stops working.
#[derive(Debug, Clone)]
pub struct AdminConsole {
    storefront: Storefront,
}

impl AdminConsole {
    /// Open the console for the currently logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::NotAuthenticated` when nobody is logged in and
    /// `AdminError::Forbidden` when the user is not an administrator.
    pub fn open(storefront: &Storefront) -> Result<Self, AdminError> {
        let admin = authorize(storefront)?;
        debug!(user_id = %admin.id, "Admin console opened");
        Ok(Self {
            storefront: storefront.clone(),
        })
    }

    /// The administrator using the console.
    ///
    /// # Errors
    ///
    /// Returns an error if the session no longer belongs to an administrator.
    pub fn admin(&self) -> Result<Identity, AdminError> {
        authorize(&self.storefront)
    }

    /// Subscribe to purchases recorded from now on, to refresh reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the session no longer belongs to an administrator.
    pub fn subscribe_sales(&self) -> Result<broadcast::Receiver<SalesUpdated>, AdminError> {
        self.admin()?;
        Ok(self.storefront.subscribe_sales())
    }

    pub(crate) fn storefront(&self) -> Result<&Storefront, AdminError> {
        self.admin()?;
        Ok(&self.storefront)
    }
}

fn authorize(storefront: &Storefront) -> Result<Identity, AdminError> {
    let identity = storefront.identity().ok_or(AdminError::NotAuthenticated)?;
    if !identity.is_admin() {
        warn!(user_id = %identity.id, "Non-admin tried to use the back-office");
        return Err(AdminError::Forbidden);
    }
    Ok(identity)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::{log_in, storefront};

    #[test]
    fn test_anonymous_is_not_authenticated() {
        let store = storefront();
        assert!(matches!(
            AdminConsole::open(&store),
            Err(AdminError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_customer_is_forbidden() {
        let store = storefront();
        log_in(&store, &json!({ "sub": 2, "email": "ash@pallet.town", "role": "user" }));
        assert!(matches!(AdminConsole::open(&store), Err(AdminError::Forbidden)));
    }

    #[test]
    fn test_admin_with_role_string_or_array() {
        let store = storefront();
        log_in(&store, &json!({ "sub": 1, "email": "oak@lab.org", "role": "admin" }));
        assert!(AdminConsole::open(&store).is_ok());

        log_in(&store, &json!({ "sub": 1, "email": "oak@lab.org", "roles": ["user", "admin"] }));
        assert!(AdminConsole::open(&store).is_ok());
    }

    #[test]
    fn test_console_stops_after_logout() {
        let store = storefront();
        log_in(&store, &json!({ "sub": 1, "email": "oak@lab.org", "role": "admin" }));
        let console = AdminConsole::open(&store).unwrap();
        assert_eq!(console.admin().unwrap().id.get(), 1);

        let _ = store.logout();
        assert!(matches!(console.admin(), Err(AdminError::NotAuthenticated)));
        assert!(console.subscribe_sales().is_err());
    }
}
