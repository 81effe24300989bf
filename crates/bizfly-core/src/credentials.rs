//! Authentication material and tenant scope.
//!
//! [`CredentialStore`] owns the auth mode chosen at construction together with
//! the mutable scope: project id, region and the currently issued bearer
//! token. Scope updates replace whole logical units under a single lock, and
//! [`CredentialStore::snapshot`] hands out one consistent copy for header
//! composition.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};

/// How the client authenticates against the identity service.
#[derive(Clone)]
pub enum AuthMethod {
    /// Username and password exchanged for a bearer token.
    Password {
        /// Account login
        username: String,
        /// Account password
        password: SecretString,
    },
    /// Application credential id and secret exchanged for a bearer token.
    ApplicationCredential {
        /// Application credential id
        id: String,
        /// Application credential secret
        secret: SecretString,
    },
    /// Pre-encoded HTTP basic-auth material sent with every request.
    Basic(SecretString),
    /// Caller-supplied bearer tokens only; no refresh is possible.
    Token,
}

impl AuthMethod {
    /// Basic-auth material from a username and password.
    #[must_use]
    pub fn basic(username: &str, password: &str) -> Self {
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        Self::Basic(SecretString::from(encoded))
    }

    /// Value sent in the `X-Auth-Type` header.
    #[must_use]
    pub const fn auth_type(&self) -> &'static str {
        match self {
            Self::Password { .. } => "password",
            Self::ApplicationCredential { .. } => "application-credential",
            Self::Basic(_) | Self::Token => "token",
        }
    }

    /// Returns true when the identity service can issue tokens for this mode.
    #[must_use]
    pub const fn can_issue_tokens(&self) -> bool {
        matches!(self, Self::Password { .. } | Self::ApplicationCredential { .. })
    }
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::ApplicationCredential { id, .. } => f
                .debug_struct("ApplicationCredential")
                .field("id", id)
                .finish_non_exhaustive(),
            Self::Basic(_) => f.write_str("Basic(..)"),
            Self::Token => f.write_str("Token"),
        }
    }
}

/// A bearer token issued by the identity service.
#[derive(Clone)]
pub struct IssuedToken {
    token: SecretString,
    expires_at: DateTime<Utc>,
    project_id: String,
}

impl IssuedToken {
    /// Create a token record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the token string is empty.
    pub fn new(
        token: impl Into<String>,
        expires_at: DateTime<Utc>,
        project_id: impl Into<String>,
    ) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::ValidationError("token must not be empty".to_string()));
        }
        Ok(Self {
            token: SecretString::from(token),
            expires_at,
            project_id: project_id.into(),
        })
    }

    /// The opaque bearer string.
    #[must_use]
    pub fn secret(&self) -> &str {
        self.token.expose_secret()
    }

    /// Absolute expiry.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Project the token is scoped to.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Returns true if the token expires within `margin` of `now`.
    #[must_use]
    pub fn is_expiring(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        now.checked_add_signed(margin)
            .map_or(true, |limit| self.expires_at <= limit)
    }
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("expires_at", &self.expires_at)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct Scope {
    project_id: String,
    region: String,
    token: Option<IssuedToken>,
}

/// Consistent view of the credential state for one header composition.
#[derive(Debug, Clone)]
pub struct CredentialSnapshot {
    /// Current project scope (empty before the first token).
    pub project_id: String,
    /// Current region.
    pub region: String,
    /// Current bearer token, if any.
    pub token: Option<IssuedToken>,
    /// Value for the `X-Auth-Type` header.
    pub auth_type: &'static str,
    /// Basic-auth material, when configured.
    pub basic_auth: Option<SecretString>,
}

/// Owner of the client's authentication state.
#[derive(Debug)]
pub struct CredentialStore {
    method: AuthMethod,
    scope: RwLock<Scope>,
}

impl CredentialStore {
    /// Create a store for the given auth mode and initial scope.
    #[must_use]
    pub fn new(
        method: AuthMethod,
        project_id: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            method,
            scope: RwLock::new(Scope {
                project_id: project_id.into(),
                region: region.into(),
                token: None,
            }),
        }
    }

    /// The auth mode fixed at construction.
    #[must_use]
    pub const fn method(&self) -> &AuthMethod {
        &self.method
    }

    /// Current region.
    #[must_use]
    pub fn region(&self) -> String {
        self.read(|scope| scope.region.clone())
    }

    /// Current project id.
    #[must_use]
    pub fn project_id(&self) -> String {
        self.read(|scope| scope.project_id.clone())
    }

    /// Current token, if any.
    #[must_use]
    pub fn token(&self) -> Option<IssuedToken> {
        self.read(|scope| scope.token.clone())
    }

    /// Replace the region used for catalog lookups.
    pub fn set_region(&self, region: impl Into<String>) {
        let region = region.into();
        self.write(|scope| scope.region = region);
    }

    /// Replace the project scope.
    pub fn set_project_id(&self, project_id: impl Into<String>) {
        let project_id = project_id.into();
        self.write(|scope| scope.project_id = project_id);
    }

    /// Install a caller-supplied token.
    ///
    /// The token, its expiry and its project id replace the current values in
    /// one step. An empty project id keeps the current project scope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the expiry is not in the future.
    pub fn set_token(&self, token: IssuedToken) -> Result<()> {
        if token.expires_at <= Utc::now() {
            return Err(Error::ValidationError(format!(
                "token expiry {} is not in the future",
                token.expires_at
            )));
        }
        self.store_token(token);
        Ok(())
    }

    /// Install a token issued by the identity service without the expiry
    /// check; an already-expired token is simply refreshed on the next call.
    pub(crate) fn store_token(&self, token: IssuedToken) {
        self.write(|scope| {
            if !token.project_id.is_empty() {
                scope.project_id = token.project_id.clone();
            }
            scope.token = Some(token);
        });
    }

    /// Drop the current token.
    pub fn clear_token(&self) {
        self.write(|scope| scope.token = None);
    }

    /// Copy the state needed to compose request headers.
    #[must_use]
    pub fn snapshot(&self) -> CredentialSnapshot {
        let basic_auth = match &self.method {
            AuthMethod::Basic(material) => Some(material.clone()),
            _ => None,
        };
        self.read(|scope| CredentialSnapshot {
            project_id: scope.project_id.clone(),
            region: scope.region.clone(),
            token: scope.token.clone(),
            auth_type: self.method.auth_type(),
            basic_auth,
        })
    }

    fn read<T>(&self, f: impl FnOnce(&Scope) -> T) -> T {
        let guard = self.scope.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write(&self, f: impl FnOnce(&mut Scope)) {
        let mut guard = self.scope.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}
