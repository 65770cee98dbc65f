//! Bearer token decoding.
//!
//! Tokens are JWTs issued by the remote API. Decoding is purely local: the
//! payload segment is base64url-decoded into a raw claim bag, then
//! normalized into an [`Identity`] by [`TokenDecoder::decode`]. The signature
//! is not verified; the server does that on every request.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use pokestore_core::{Email, EmailError, Identity, RoleClaim, Roles, UserId};

/// Why a token could not be turned into an identity.
#[derive(Debug, Error)]
pub enum TokenDecodeError {
    /// Not three dot-separated segments.
    #[error("token is not a JWT")]
    Malformed,

    /// The payload segment is not valid base64url.
    #[error("token payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The payload is not a JSON claim object.
    #[error("token payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required claim is absent.
    #[error("token is missing the {0} claim")]
    MissingClaim(&'static str),

    /// The user id claim is not an integer.
    #[error("token user id is not numeric: {0}")]
    InvalidUserId(String),

    /// The email claim is not an address.
    #[error("token email is invalid: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The `exp` claim is in the past.
    #[error("token expired at {0}")]
    Expired(DateTime<Utc>),
}

/// A numeric claim some issuers send as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumericClaim {
    Int(i64),
    Text(String),
}

/// Claims exactly as they appear in the payload, before normalization.
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<NumericClaim>,
    id: Option<NumericClaim>,
    email: Option<String>,
    name: Option<String>,
    nombre: Option<String>,
    role: Option<RoleClaim>,
    roles: Option<RoleClaim>,
    exp: Option<i64>,
}

/// The result of decoding a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    /// The normalized identity.
    pub identity: Identity,
    /// When the token stops being accepted by the server, if it says.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Decodes bearer tokens into identities.
#[derive(Debug, Clone, Copy)]
pub struct TokenDecoder {
    enforce_expiry: bool,
}

impl TokenDecoder {
    /// Create a decoder. With `enforce_expiry` set, a token whose `exp`
    /// is not in the future fails with [`TokenDecodeError::Expired`].
    #[must_use]
    pub const fn new(enforce_expiry: bool) -> Self {
        Self { enforce_expiry }
    }

    /// Decode `token` as of `now`.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenDecodeError`] if the token is structurally invalid,
    /// lacks an id or email, or (when enforced) has expired.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<DecodedToken, TokenDecodeError> {
        let mut segments = token.trim().split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenDecodeError::Malformed);
        };

        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        let claims: RawClaims = serde_json::from_slice(&bytes)?;

        let expires_at = claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0));
        if self.enforce_expiry {
            if let Some(expires_at) = expires_at.filter(|at| *at <= now) {
                return Err(TokenDecodeError::Expired(expires_at));
            }
        }

        Ok(DecodedToken {
            identity: normalize(claims)?,
            expires_at,
        })
    }
}

impl Default for TokenDecoder {
    fn default() -> Self {
        Self::new(true)
    }
}

/// The single place where raw claims become an [`Identity`].
fn normalize(claims: RawClaims) -> Result<Identity, TokenDecodeError> {
    let id = match claims.sub.or(claims.id) {
        Some(NumericClaim::Int(id)) => UserId::new(id),
        Some(NumericClaim::Text(text)) => text
            .parse()
            .map_err(|_| TokenDecodeError::InvalidUserId(text))?,
        None => return Err(TokenDecodeError::MissingClaim("sub")),
    };

    let email = Email::parse(
        claims
            .email
            .as_deref()
            .ok_or(TokenDecodeError::MissingClaim("email"))?,
    )?;

    let display_name = claims
        .name
        .or(claims.nombre)
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| email.local_part().to_owned());

    let roles = Roles::from_claims(claims.role.into_iter().chain(claims.roles));

    Ok(Identity {
        id,
        email,
        display_name,
        roles,
    })
}
