//! Authentication service.
//!
//! Logs users in and registers them against the remote API, then hands the
//! issued bearer token to the [`SessionStore`]. Registration does not open a
//! session by itself; it is followed by a login with the same credentials.

mod error;
mod token;

pub use error::{
    AuthError, INVALID_EMAIL, LOGIN_REJECTED, REGISTER_REJECTED, SERVER_UNREACHABLE, SHORT_PASSWORD,
};
pub use token::{DecodedToken, TokenDecodeError, TokenDecoder};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use pokestore_core::{Email, Identity};

use crate::api::ApiClient;
use crate::events::Route;
use crate::session::SessionStore;

/// Login endpoint.
const LOGIN_PATH: &str = "/auth/login";

/// Registration endpoint.
const REGISTER_PATH: &str = "/auth/register";

/// Shortest password accepted at registration, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

/// Login, registration and logout.
#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
    session: SessionStore,
}

impl AuthService {
    #[must_use]
    pub const fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    /// Log in with email and password.
    ///
    /// On success the token is persisted and the session is authenticated.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidEmail` / `AuthError::Validation` for bad input
    /// - `AuthError::Rejected` with the server's message when credentials are refused
    /// - `AuthError::Unreachable` when the server cannot be reached
    /// - `AuthError::TokenRejected` when the issued token cannot be decoded
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Identity, AuthError> {
        let email = Email::parse(email)?;
        if password.expose_secret().is_empty() {
            return Err(AuthError::Validation("La contraseña es obligatoria."));
        }

        let response: LoginResponse = self
            .api
            .post_json(
                LOGIN_PATH,
                &LoginRequest {
                    email: email.as_str(),
                    password: password.expose_secret(),
                },
            )
            .await
            .map_err(|e| AuthError::from_api(e, LOGIN_REJECTED))?;

        let identity = self
            .session
            .establish(SecretString::from(response.access_token))?;
        info!(user_id = %identity.id, admin = identity.is_admin(), "Logged in");
        Ok(identity)
    }

    /// Register a new account, then log in with the same credentials.
    ///
    /// # Errors
    ///
    /// - `AuthError::Validation` for a blank name or a password shorter
    ///   than [`MIN_PASSWORD_LEN`] characters
    /// - `AuthError::Rejected` with the server's message on duplicate email
    ///   or server-side validation failure
    /// - any error from [`AuthService::login`]
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::Validation("El nombre es obligatorio."));
        }
        let parsed = Email::parse(email)?;
        let password_len = password.expose_secret().chars().count();
        if password_len == 0 {
            return Err(AuthError::Validation("La contraseña es obligatoria."));
        }
        if password_len < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(SHORT_PASSWORD));
        }

        self.api
            .post(
                REGISTER_PATH,
                Some(&RegisterRequest {
                    name,
                    email: parsed.as_str(),
                    password: password.expose_secret(),
                }),
            )
            .await
            .map_err(|e| AuthError::from_api(e, REGISTER_REJECTED))?;

        info!(email = %parsed, "Registered account");
        self.login(parsed.as_str(), password).await
    }

    /// Log out. The caller must navigate to the returned route.
    #[must_use = "logout ends the current view; navigate to the returned route"]
    pub fn logout(&self) -> Route {
        self.session.logout()
    }

    /// Whether the current identity is an admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    /// The session this service authenticates.
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }
}
