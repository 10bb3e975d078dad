//! Identity providers: turn request credentials into a [`Caller`].
//!
//! Credential issuance happens elsewhere; these providers only verify what a
//! request presents. Missing credentials yield [`Caller::Anonymous`], and so do
//! invalid ones (with a warning), so that read endpoints keep working and
//! writes fail later with `Unauthenticated`.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use tracing::warn;

use crate::services::access::Caller;

/// Resolves the caller of a request.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Name of the request header carrying the credential.
    fn header_name(&self) -> &str;

    /// Resolve the header value (if present) into a caller.
    async fn identify(&self, credential: Option<&str>) -> Caller;
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Verifies HS256 bearer tokens signed with a shared secret.
///
/// Accepts both `Bearer <token>` and `JWT <token>` schemes. The `sub` claim
/// is the user id; `exp` is required.
pub struct JwtIdentityProvider {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    /// Create a provider for `secret`, optionally pinning the `iss` claim.
    #[must_use]
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    fn token(header: &str) -> Option<&str> {
        let (scheme, token) = header.trim().split_once(' ')?;
        if scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("jwt") {
            let token = token.trim();
            (!token.is_empty()).then_some(token)
        } else {
            None
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for JwtIdentityProvider {
    fn header_name(&self) -> &str {
        "authorization"
    }

    async fn identify(&self, credential: Option<&str>) -> Caller {
        let Some(header) = credential else {
            return Caller::Anonymous;
        };

        let Some(token) = Self::token(header) else {
            warn!("Unsupported authorization scheme");
            return Caller::Anonymous;
        };

        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) if !data.claims.sub.is_empty() => Caller::User(data.claims.sub),
            Ok(_) => {
                warn!("Token has an empty subject");
                Caller::Anonymous
            }
            Err(e) => {
                warn!(error = %e, "Rejected bearer token");
                Caller::Anonymous
            }
        }
    }
}

/// Trusts a user id header set by an authenticating gateway in front of the API.
pub struct TrustedHeaderIdentityProvider {
    header: String,
}

impl TrustedHeaderIdentityProvider {
    /// Create a provider reading `header`.
    #[must_use]
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into().to_ascii_lowercase(),
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for TrustedHeaderIdentityProvider {
    fn header_name(&self) -> &str {
        &self.header
    }

    async fn identify(&self, credential: Option<&str>) -> Caller {
        match credential.map(str::trim) {
            Some(id) if !id.is_empty() => Caller::User(id.to_string()),
            _ => Caller::Anonymous,
        }
    }
}
