//! Authentication error types.

use thiserror::Error;

use pokestore_core::EmailError;

use super::TokenDecodeError;
use crate::api::ApiError;
use crate::session::SessionError;
use crate::storage::StorageError;

/// Shown when the server rejects a login without saying why.
pub const LOGIN_REJECTED: &str = "Correo o contraseña incorrectos.";

/// Shown when the server rejects a registration without saying why.
pub const REGISTER_REJECTED: &str = "No se pudo completar el registro.";

/// Shown when a registration password is too short.
pub const SHORT_PASSWORD: &str = "La contraseña debe tener al menos 6 caracteres.";

/// Shown when the email is not an address.
pub const INVALID_EMAIL: &str = "El correo electrónico no es válido.";

/// Shown when the server cannot be reached.
pub const SERVER_UNREACHABLE: &str = "No se pudo conectar con el servidor. Inténtalo nuevamente.";

/// Errors that can occur during login and registration.
///
/// The `Display` text is the reason shown to the user.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email is not an address.
    #[error("El correo electrónico no es válido.")]
    InvalidEmail(#[from] EmailError),

    /// A form field failed validation before contacting the server.
    #[error("{0}")]
    Validation(&'static str),

    /// The server rejected the request; the message is the server's own
    /// where it sent one.
    #[error("{0}")]
    Rejected(String),

    /// The server could not be reached or answered nonsense.
    #[error("No se pudo conectar con el servidor. Inténtalo nuevamente.")]
    Unreachable(#[source] ApiError),

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,

    /// The server issued a token that does not decode (or is already expired).
    #[error("the server issued an unusable token: {0}")]
    TokenRejected(#[source] TokenDecodeError),

    /// The token could not be persisted.
    #[error("could not save the session: {0}")]
    Storage(#[source] StorageError),
}

impl AuthError {
    /// Map an API failure, using `fallback` when a rejection carries no message.
    #[must_use]
    pub fn from_api(error: ApiError, fallback: &str) -> Self {
        match error {
            ApiError::Cancelled => Self::Cancelled,
            ApiError::Unauthorized { message } | ApiError::Status { message, .. } => {
                Self::Rejected(message.unwrap_or_else(|| fallback.to_owned()))
            }
            other => Self::Unreachable(other),
        }
    }

    /// The reason to show the user.
    #[must_use]
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

impl From<ApiError> for AuthError {
    fn from(error: ApiError) -> Self {
        Self::from_api(error, LOGIN_REJECTED)
    }
}

impl From<SessionError> for AuthError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Token(e) => Self::TokenRejected(e),
            SessionError::Storage(e) => Self::Storage(e),
        }
    }
}
