//! Bearer token issuance and refresh.
//!
//! [`TokenManager`] keeps a usable token in the [`CredentialStore`]. Refreshes
//! are single-flight: concurrent callers that find the token missing or about
//! to expire queue on one guard, the first of them performs the exchange, and
//! the rest observe its outcome instead of issuing requests of their own.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogStore, ServiceCatalog, ServiceEntry};
use crate::context::Context;
use crate::credentials::{AuthMethod, CredentialSnapshot, CredentialStore, IssuedToken};
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::request::{PreparedRequest, RequestSpec};
use crate::response::read_json;
use crate::types::ServiceName;

/// Path of the token endpoint on the identity service.
pub const TOKEN_PATH: &str = "/token";

/// Default window before expiry in which a token counts as expired.
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 30;

/// Result of a successful token exchange.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    /// The issued token.
    pub token: IssuedToken,
    /// Service catalog returned alongside the token, if any.
    pub catalog: Option<ServiceCatalog>,
}

/// Exchanges credentials for a bearer token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Issue a token for `method`, scoped to `project_id` when non-empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity service rejects the credentials or
    /// cannot be reached.
    async fn issue(&self, ctx: &Context, method: &AuthMethod, project_id: &str)
        -> Result<TokenGrant>;
}

impl fmt::Debug for dyn TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSource")
    }
}

#[derive(Debug)]
struct RefreshOutcome {
    generation: u64,
    result: Result<()>,
}

/// Keeps a valid bearer token in the credential store.
pub struct TokenManager {
    credentials: Arc<CredentialStore>,
    catalog: Arc<CatalogStore>,
    source: Arc<dyn TokenSource>,
    margin: chrono::Duration,
    generation: AtomicU64,
    guard: Mutex<RefreshOutcome>,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("margin", &self.margin)
            .field("generation", &self.generation.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a manager writing into `credentials` and `catalog`.
    #[must_use]
    pub fn new(
        credentials: Arc<CredentialStore>,
        catalog: Arc<CatalogStore>,
        source: Arc<dyn TokenSource>,
        margin: chrono::Duration,
    ) -> Self {
        Self {
            credentials,
            catalog,
            source,
            margin,
            generation: AtomicU64::new(0),
            guard: Mutex::new(RefreshOutcome {
                generation: 0,
                result: Ok(()),
            }),
        }
    }

    /// The exchange backing this manager.
    #[must_use]
    pub fn source(&self) -> &Arc<dyn TokenSource> {
        &self.source
    }

    /// Number of token exchanges attempted so far.
    #[must_use]
    pub fn exchanges(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Make sure the store holds a token that is not about to expire.
    ///
    /// A token the identity service issues already expired is still stored
    /// and used once; the next call exchanges again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] if no usable token exists and the
    /// configured auth mode cannot obtain one, or the error of the exchange.
    pub async fn ensure_token(&self, ctx: &Context) -> Result<()> {
        if self.is_fresh() {
            return Ok(());
        }
        if !self.credentials.method().can_issue_tokens() {
            return match self.credentials.token() {
                Some(token) if token.expires_at() > Utc::now() => Ok(()),
                _ => Err(Error::Unauthorized(
                    "no valid token and the configured credentials cannot issue one".to_string(),
                )),
            };
        }

        let observed = self.generation.load(Ordering::Acquire);
        let mut outcome = ctx.run(self.guard.lock()).await?;
        if outcome.generation != observed {
            debug!("Token refreshed by a concurrent caller");
            return outcome.result.clone();
        }
        if self.is_fresh() {
            return Ok(());
        }
        self.exchange(ctx, &mut outcome).await
    }

    /// Replace a token the server rejected.
    ///
    /// `stale` is the token the rejected request carried. When another caller
    /// already replaced it the fresh token is kept and no exchange happens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] if the configured auth mode cannot
    /// obtain tokens, or the error of the exchange.
    pub async fn refresh(&self, ctx: &Context, stale: Option<&str>) -> Result<()> {
        if !self.credentials.method().can_issue_tokens() {
            return Err(Error::Unauthorized(
                "token rejected and the configured credentials cannot issue a new one".to_string(),
            ));
        }

        let observed = self.generation.load(Ordering::Acquire);
        let mut outcome = ctx.run(self.guard.lock()).await?;
        if outcome.generation != observed {
            return outcome.result.clone();
        }
        let replaced = self
            .credentials
            .token()
            .is_some_and(|current| Some(current.secret()) != stale);
        if replaced && self.is_fresh() {
            return Ok(());
        }
        self.exchange(ctx, &mut outcome).await
    }

    fn is_fresh(&self) -> bool {
        self.credentials
            .token()
            .is_some_and(|token| !token.is_expiring(Utc::now(), self.margin))
    }

    async fn exchange(&self, ctx: &Context, outcome: &mut RefreshOutcome) -> Result<()> {
        let project_id = self.credentials.project_id();
        let result = match self
            .source
            .issue(ctx, self.credentials.method(), &project_id)
            .await
        {
            Ok(grant) => {
                info!(
                    expires_at = %grant.token.expires_at(),
                    project_id = grant.token.project_id(),
                    "Issued Bizfly token"
                );
                if grant.token.expires_at() <= Utc::now() {
                    warn!(
                        expires_at = %grant.token.expires_at(),
                        "Identity service issued an expired token"
                    );
                }
                self.credentials.store_token(grant.token);
                if let Some(catalog) = grant.catalog {
                    info!(entries = catalog.entries().len(), "Replaced service catalog");
                    self.catalog.replace(catalog);
                }
                Ok(())
            }
            Err(Error::Cancelled(message)) => {
                // Waiters keep their own context and retry the exchange.
                debug!(%message, "Token exchange cancelled");
                return Err(Error::Cancelled(message));
            }
            Err(err) => {
                warn!(%err, "Token exchange failed");
                self.credentials.clear_token();
                Err(match err {
                    Error::PermissionDenied(message) => Error::Unauthorized(message),
                    other => other,
                })
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        outcome.generation = generation;
        outcome.result = result.clone();
        result
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    auth_method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    credential_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret: Option<&'a str>,
    #[serde(skip_serializing_if = "str::is_empty")]
    project_id: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    services: Option<Vec<ServiceEntry>>,
}

/// [`TokenSource`] backed by the identity service's token endpoint.
#[derive(Debug)]
pub struct IdentityTokenSource {
    executor: Executor,
    catalog: Arc<CatalogStore>,
    credentials: Arc<CredentialStore>,
    user_agent: String,
}

impl IdentityTokenSource {
    /// Create a source that posts to `{identity}/token`.
    #[must_use]
    pub fn new(
        executor: Executor,
        catalog: Arc<CatalogStore>,
        credentials: Arc<CredentialStore>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            catalog,
            credentials,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl TokenSource for IdentityTokenSource {
    async fn issue(
        &self,
        ctx: &Context,
        method: &AuthMethod,
        project_id: &str,
    ) -> Result<TokenGrant> {
        let body = match method {
            AuthMethod::Password { username, password } => TokenRequest {
                auth_method: "password",
                username: Some(username),
                password: Some(password.expose_secret()),
                credential_id: None,
                secret: None,
                project_id,
            },
            AuthMethod::ApplicationCredential { id, secret } => TokenRequest {
                auth_method: "application_credential",
                username: None,
                password: None,
                credential_id: Some(id),
                secret: Some(secret.expose_secret()),
                project_id,
            },
            AuthMethod::Basic(_) | AuthMethod::Token => {
                return Err(Error::ConfigError(
                    "token issuance requires password or application credentials".to_string(),
                ))
            }
        };

        let spec = RequestSpec::post(ServiceName::Auth, TOKEN_PATH).json(&body)?;
        let snapshot = CredentialSnapshot {
            project_id: project_id.to_string(),
            region: self.credentials.region(),
            token: None,
            auth_type: method.auth_type(),
            basic_auth: None,
        };
        let request = PreparedRequest::prepare(
            &spec,
            &self.catalog.identity_url(),
            &snapshot,
            &self.user_agent,
        )?;

        let response = match self.executor.execute(ctx, &request).await {
            Err(Error::Unauthorized(message) | Error::PermissionDenied(message)) => {
                return Err(Error::Unauthorized(format!(
                    "identity service rejected credentials: {message}"
                )))
            }
            other => other?,
        };
        let issued: TokenResponse = read_json(ctx, response).await?;

        let token = IssuedToken::new(
            issued.token,
            issued.expires_at,
            issued.project_id.unwrap_or_else(|| project_id.to_string()),
        )?;
        Ok(TokenGrant {
            token,
            catalog: issued.services.map(ServiceCatalog::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn password() -> AuthMethod {
        AuthMethod::Password {
            username: "ops".to_string(),
            password: "secret".to_string().into(),
        }
    }

    fn grant(token: &str) -> TokenGrant {
        TokenGrant {
            token: IssuedToken::new(token, Utc::now() + chrono::Duration::hours(1), "project-1")
                .unwrap(),
            catalog: None,
        }
    }

    fn manager(
        method: AuthMethod,
        source: Arc<dyn TokenSource>,
    ) -> (TokenManager, Arc<CredentialStore>) {
        let credentials = Arc::new(CredentialStore::new(method, "", "HN"));
        let catalog = Arc::new(CatalogStore::new("https://manage.bizflycloud.vn/api").unwrap());
        let manager = TokenManager::new(
            Arc::clone(&credentials),
            catalog,
            source,
            chrono::Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS),
        );
        (manager, credentials)
    }

    struct SlowSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TokenSource for SlowSource {
        async fn issue(&self, _: &Context, _: &AuthMethod, _: &str) -> Result<TokenGrant> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            if self.fail {
                Err(Error::Unauthorized("bad password".to_string()))
            } else {
                Ok(grant(&format!("token-{n}")))
            }
        }
    }

    struct CancellableSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenSource for CancellableSource {
        async fn issue(&self, ctx: &Context, _: &AuthMethod, _: &str) -> Result<TokenGrant> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            ctx.run(tokio::time::sleep(Duration::from_millis(200))).await?;
            Ok(grant(&format!("token-{n}")))
        }
    }

    #[tokio::test]
    async fn test_ensure_token_issues_when_empty() {
        let mut source = MockTokenSource::new();
        source
            .expect_issue()
            .times(1)
            .returning(|_, _, _| Ok(grant("fresh")));
        let (manager, credentials) = manager(password(), Arc::new(source));

        manager.ensure_token(&Context::new()).await.unwrap();
        assert_eq!(credentials.token().unwrap().secret(), "fresh");
        assert_eq!(credentials.project_id(), "project-1");

        // Still valid: no second exchange.
        manager.ensure_token(&Context::new()).await.unwrap();
        assert_eq!(manager.exchanges(), 1);
    }

    #[tokio::test]
    async fn test_expiring_token_is_refreshed() {
        let mut source = MockTokenSource::new();
        source
            .expect_issue()
            .times(1)
            .returning(|_, _, _| Ok(grant("renewed")));
        let (manager, credentials) = manager(password(), Arc::new(source));
        credentials.store_token(
            IssuedToken::new("old", Utc::now() + chrono::Duration::seconds(10), "").unwrap(),
        );

        manager.ensure_token(&Context::new()).await.unwrap();
        assert_eq!(credentials.token().unwrap().secret(), "renewed");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refreshers_share_one_exchange() {
        let source = Arc::new(SlowSource {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let (manager, credentials) = manager(password(), source.clone());
        let manager = Arc::new(manager);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                manager.ensure_token(&Context::new()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(credentials.token().unwrap().secret(), "token-0");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refreshers_share_failure() {
        let source = Arc::new(SlowSource {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let (manager, credentials) = manager(password(), source.clone());
        let manager = Arc::new(manager);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                manager.ensure_token(&Context::new()).await
            }));
        }
        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(err, Error::Unauthorized(_)));
        }

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(credentials.token().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_leader_does_not_fail_waiters() {
        let source = Arc::new(CancellableSource {
            calls: AtomicUsize::new(0),
        });
        let (manager, credentials) = manager(password(), source.clone());
        credentials.store_token(
            IssuedToken::new("kept", Utc::now() + chrono::Duration::seconds(5), "").unwrap(),
        );
        let manager = Arc::new(manager);

        let leader = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                let ctx = Context::new().with_timeout(Duration::from_millis(50));
                manager.ensure_token(&ctx).await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let waiter_ctx = Context::new();
        let waiter = manager.ensure_token(&waiter_ctx).await;

        assert!(matches!(leader.await.unwrap(), Err(Error::Cancelled(_))));
        waiter.unwrap();
        assert!(!waiter_ctx.is_done());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(manager.exchanges(), 1);
        assert_eq!(credentials.token().unwrap().secret(), "token-1");
    }

    #[tokio::test]
    async fn test_cancelled_exchange_keeps_current_token() {
        let source = Arc::new(CancellableSource {
            calls: AtomicUsize::new(0),
        });
        let (manager, credentials) = manager(password(), source);
        credentials.store_token(
            IssuedToken::new("kept", Utc::now() + chrono::Duration::seconds(5), "").unwrap(),
        );

        let ctx = Context::new().with_timeout(Duration::from_millis(20));
        assert!(matches!(
            manager.ensure_token(&ctx).await,
            Err(Error::Cancelled(_))
        ));
        assert_eq!(credentials.token().unwrap().secret(), "kept");
        assert_eq!(manager.exchanges(), 0);
    }

    #[tokio::test]
    async fn test_refresh_skips_when_token_already_replaced() {
        let mut source = MockTokenSource::new();
        source.expect_issue().never();
        let (manager, credentials) = manager(password(), Arc::new(source));
        credentials.store_token(
            IssuedToken::new("newer", Utc::now() + chrono::Duration::hours(1), "").unwrap(),
        );

        manager
            .refresh(&Context::new(), Some("rejected"))
            .await
            .unwrap();
        assert_eq!(credentials.token().unwrap().secret(), "newer");
    }

    #[tokio::test]
    async fn test_refresh_replaces_rejected_token() {
        let mut source = MockTokenSource::new();
        source
            .expect_issue()
            .times(1)
            .returning(|_, _, _| Ok(grant("replacement")));
        let (manager, credentials) = manager(password(), Arc::new(source));
        credentials.store_token(
            IssuedToken::new("rejected", Utc::now() + chrono::Duration::hours(1), "").unwrap(),
        );

        manager
            .refresh(&Context::new(), Some("rejected"))
            .await
            .unwrap();
        assert_eq!(credentials.token().unwrap().secret(), "replacement");
    }

    #[tokio::test]
    async fn test_token_only_mode_cannot_refresh() {
        let mut source = MockTokenSource::new();
        source.expect_issue().never();
        let (manager, _) = manager(AuthMethod::Token, Arc::new(source));

        assert!(matches!(
            manager.ensure_token(&Context::new()).await,
            Err(Error::Unauthorized(_))
        ));
        assert!(matches!(
            manager.refresh(&Context::new(), None).await,
            Err(Error::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_permission_denied_becomes_unauthorized() {
        let mut source = MockTokenSource::new();
        source
            .expect_issue()
            .returning(|_, _, _| Err(Error::PermissionDenied("locked".to_string())));
        let (manager, _) = manager(password(), Arc::new(source));

        assert_eq!(
            manager.ensure_token(&Context::new()).await.unwrap_err(),
            Error::Unauthorized("locked".to_string())
        );
    }

    #[tokio::test]
    async fn test_cancelled_context_does_not_exchange() {
        let mut source = MockTokenSource::new();
        source.expect_issue().never();
        let (manager, _) = manager(password(), Arc::new(source));
        let ctx = Context::new();
        ctx.cancel();

        assert!(matches!(
            manager.ensure_token(&ctx).await,
            Err(Error::Cancelled(_))
        ));
    }

    #[test]
    fn test_token_request_shape() {
        let body = TokenRequest {
            auth_method: "application_credential",
            username: None,
            password: None,
            credential_id: Some("cred-1"),
            secret: Some("s3cret"),
            project_id: "",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "auth_method": "application_credential",
                "credential_id": "cred-1",
                "secret": "s3cret"
            })
        );
    }
}
