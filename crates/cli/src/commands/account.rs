//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! pokestore register -n "Ash Ketchum" -e ash@pallet.town -p pikachu
//! pokestore login -e ash@pallet.town -p pikachu
//! pokestore whoami
//! pokestore logout
//! ```

use secrecy::SecretString;

use pokestore_core::Identity;
use pokestore_storefront::{Storefront, StorefrontError};

use super::output;

/// Log in and persist the session.
pub async fn login(store: &Storefront, email: &str, password: String) -> Result<(), StorefrontError> {
    let password = SecretString::from(password);
    let identity = store.auth().login(email, &password).await?;
    welcome(&identity);
    Ok(())
}

/// Register, then log in with the same credentials.
pub async fn register(
    store: &Storefront,
    name: &str,
    email: &str,
    password: String,
) -> Result<(), StorefrontError> {
    let password = SecretString::from(password);
    let identity = store.auth().register(name, email, &password).await?;
    welcome(&identity);
    Ok(())
}

pub fn logout(store: &Storefront) {
    let route = store.logout();
    output::line(format!("Sesión cerrada. Vuelve a entrar en {}", route.path()));
}

pub fn whoami(store: &Storefront) {
    match store.identity() {
        Some(identity) => output::line(format!(
            "{} <{}> - {} (id {})",
            identity.display_name,
            identity.email,
            identity.role_label(),
            identity.id
        )),
        None => output::line("No has iniciado sesión."),
    }
}

fn welcome(identity: &Identity) {
    output::line(format!(
        "¡Hola, {}! Sesión iniciada como {}.",
        identity.display_name,
        identity.role_label()
    ));
}
