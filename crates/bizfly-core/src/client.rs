//! The Bizfly API client, its transport settings and retry policy.
//!
//! A [`Client`] owns the credential store, the token manager, the service
//! catalog and one shared HTTP transport. It is cheap to clone; clones share
//! all of that state, so a token refreshed through one clone is visible to
//! every other.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Response;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogStore, ServiceCatalog, ServiceEntry};
use crate::config::CloudConfig;
use crate::context::Context;
use crate::credentials::{AuthMethod, CredentialStore, IssuedToken};
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::request::{PreparedRequest, RequestSpec, DEFAULT_USER_AGENT};
use crate::response::{drain, read_json};
use crate::token::{IdentityTokenSource, TokenManager, TokenSource, DEFAULT_REFRESH_MARGIN_SECS};
use crate::types::{ServiceName, DEFAULT_BASE_URL, DEFAULT_REGION};

// Connection pool settings

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Default TCP connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

// Retry settings

/// Default total number of attempts per request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Default maximum retry delay in milliseconds (for exponential backoff)
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 16000;

/// Path of the catalog bootstrap endpoint on the identity service.
pub const CATALOG_PATH: &str = "/auth/service";

/// Retry policy with exponential backoff.
///
/// Applies to gateway failures (502, 503, 504) and transport errors only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first
    pub max_attempts: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Maximum delay between retries (cap for exponential backoff)
    pub max_delay: Duration,

    /// Backoff multiplier (typically 2 for exponential backoff)
    pub backoff_multiplier: u32,
}

impl RetryPolicy {
    /// Create a new retry policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            backoff_multiplier: 2,
        }
    }

    /// Create a retry policy that makes a single attempt.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
            backoff_multiplier: 1,
        }
    }

    /// Set the total number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the initial delay.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier.
    #[must_use]
    pub const fn with_backoff_multiplier(mut self, multiplier: u32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Delay to wait after the given failed attempt (1-based).
    ///
    /// Uses exponential backoff: delay = min(initial_delay * multiplier^(attempt-1), max_delay)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_secs(0);
        }

        let multiplier = self.backoff_multiplier.saturating_pow(attempt - 1);
        let initial_ms = u64::try_from(self.initial_delay.as_millis()).unwrap_or(u64::MAX);
        let delay = Duration::from_millis(initial_ms.saturating_mul(u64::from(multiplier)));

        std::cmp::min(delay, self.max_delay)
    }

    /// Check if retries are enabled.
    #[must_use]
    pub const fn has_retries(&self) -> bool {
        self.max_attempts > 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP transport configuration.
///
/// Has no overall request timeout: the [`Context`]
/// passed to each call carries the deadline.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Enable response compression
    pub enable_compression: bool,
}

impl HttpConfig {
    /// Create a new transport configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            enable_compression: true,
        }
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }

    /// Build a transport from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the TLS backend cannot be initialised.
    pub fn build_transport(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .gzip(self.enable_compression)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {e}")))
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct ClientInner {
    credentials: Arc<CredentialStore>,
    catalog: Arc<CatalogStore>,
    tokens: TokenManager,
    executor: Executor,
    user_agent: String,
}

/// Client for the Bizfly Cloud API.
///
/// Service crates wrap a `Client` in façades; it can also be driven directly
/// through [`Client::call`] with a [`RequestSpec`].
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    services: Vec<ServiceEntry>,
}

impl Client {
    /// Start building a client.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Current region.
    #[must_use]
    pub fn region(&self) -> String {
        self.inner.credentials.region()
    }

    /// Switch the region used for endpoint selection and headers.
    pub fn set_region(&self, region: impl Into<String>) {
        self.inner.credentials.set_region(region);
    }

    /// Current project scope.
    #[must_use]
    pub fn project_id(&self) -> String {
        self.inner.credentials.project_id()
    }

    /// Switch the project scope sent with each request.
    pub fn set_project_id(&self, project_id: impl Into<String>) {
        self.inner.credentials.set_project_id(project_id);
    }

    /// Current bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<IssuedToken> {
        self.inner.credentials.token()
    }

    /// Install a caller-supplied token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the token is already expired.
    pub fn set_token(&self, token: IssuedToken) -> Result<()> {
        self.inner.credentials.set_token(token)
    }

    /// Current service catalog snapshot.
    #[must_use]
    pub fn catalog(&self) -> Arc<ServiceCatalog> {
        self.inner.catalog.snapshot()
    }

    /// Replace the service catalog.
    pub fn set_catalog(&self, catalog: ServiceCatalog) {
        self.inner.catalog.replace(catalog);
    }

    /// Base URL for `service` in the current region.
    #[must_use]
    pub fn url_for(&self, service: ServiceName) -> String {
        self.inner
            .catalog
            .url_for(service, &self.inner.credentials.region())
    }

    /// Retry policy in effect.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        self.inner.executor.retry_policy()
    }

    /// Make sure a usable token is available, obtaining one if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] when no token can be obtained.
    pub async fn ensure_token(&self, ctx: &Context) -> Result<()> {
        self.inner.tokens.ensure_token(ctx).await
    }

    /// Replace the current token, unless a concurrent caller already did.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] when the configured credentials cannot
    /// issue tokens, or the error of the exchange.
    pub async fn refresh_token(&self, ctx: &Context) -> Result<()> {
        let current = self.inner.credentials.token();
        self.inner
            .tokens
            .refresh(ctx, current.as_ref().map(IssuedToken::secret))
            .await
    }

    /// Exchange `method` for a token without touching this client's state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] if the identity service rejects the
    /// credentials, or any pipeline error of the exchange.
    pub async fn issue_token(
        &self,
        ctx: &Context,
        method: &AuthMethod,
        project_id: &str,
    ) -> Result<IssuedToken> {
        ctx.check()?;
        let grant = self.inner.tokens.source().issue(ctx, method, project_id).await?;
        Ok(grant.token)
    }

    /// Fetch the service catalog from the identity service and install it.
    ///
    /// # Errors
    ///
    /// Returns any pipeline error of the bootstrap request.
    pub async fn refresh_catalog(&self, ctx: &Context) -> Result<Arc<ServiceCatalog>> {
        let response: CatalogResponse = self
            .call(ctx, RequestSpec::get(ServiceName::Auth, CATALOG_PATH))
            .await?;
        let catalog = ServiceCatalog::new(response.services);
        info!(entries = catalog.entries().len(), "Loaded service catalog");
        self.inner.catalog.replace(catalog);
        Ok(self.inner.catalog.snapshot())
    }

    /// Run `spec` through the pipeline and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns the classified pipeline error, or [`Error::Serialization`] if
    /// the body does not decode as `R`.
    pub async fn call<R>(&self, ctx: &Context, spec: RequestSpec) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = self.execute(ctx, spec).await?;
        read_json(ctx, response).await
    }

    /// Run `spec` through the pipeline and discard the response body.
    ///
    /// # Errors
    ///
    /// Returns the classified pipeline error.
    pub async fn call_empty(&self, ctx: &Context, spec: RequestSpec) -> Result<()> {
        let response = self.execute(ctx, spec).await?;
        drain(ctx, response).await
    }

    /// Run `spec` through the pipeline and return the raw successful response.
    ///
    /// A 401 answer triggers one token refresh and one replay of the request.
    /// The replay does not count against the transient retry budget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if `ctx` is finished, [`Error::Unauthorized`]
    /// if the request is still rejected after re-authentication, or the
    /// classified error of the final attempt.
    pub async fn execute(&self, ctx: &Context, spec: RequestSpec) -> Result<Response> {
        ctx.check()?;
        let inner = &self.inner;
        let can_issue = inner.credentials.method().can_issue_tokens();
        if can_issue {
            inner.tokens.ensure_token(ctx).await?;
        }

        let snapshot = inner.credentials.snapshot();
        let base = inner.catalog.url_for(spec.service(), &snapshot.region);
        let request = PreparedRequest::prepare(&spec, &base, &snapshot, &inner.user_agent)?;

        match inner.executor.execute(ctx, &request).await {
            Err(Error::Unauthorized(message)) if can_issue => {
                info!(url = %request.url(), "Token rejected, re-authenticating");
                debug!(%message, "Rejection detail");
                let stale = snapshot.token.as_ref().map(IssuedToken::secret);
                inner.tokens.refresh(ctx, stale).await?;

                let snapshot = inner.credentials.snapshot();
                let base = inner.catalog.url_for(spec.service(), &snapshot.region);
                let request =
                    PreparedRequest::prepare(&spec, &base, &snapshot, &inner.user_agent)?;
                match inner.executor.execute(ctx, &request).await {
                    Err(Error::Unauthorized(message)) => {
                        warn!(url = %request.url(), "Request rejected after re-authentication");
                        Err(Error::Unauthorized(format!(
                            "request rejected after re-authentication: {message}"
                        )))
                    }
                    other => other,
                }
            }
            other => other,
        }
    }
}

/// Builder for [`Client`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    region: Option<String>,
    project_id: Option<String>,
    user_agent: Option<String>,
    method: Option<AuthMethod>,
    token: Option<IssuedToken>,
    http: Option<reqwest::Client>,
    http_config: HttpConfig,
    retry_policy: RetryPolicy,
    refresh_margin: Option<chrono::Duration>,
    token_source: Option<Arc<dyn TokenSource>>,
    config_error: Option<Error>,
}

impl ClientBuilder {
    /// Create a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply every setting from `config`.
    ///
    /// An invalid configuration makes [`ClientBuilder::build`] fail with
    /// [`Error::ConfigError`].
    #[must_use]
    pub fn with_config(mut self, config: &CloudConfig) -> Self {
        if let Err(err) = config.check() {
            self.config_error = Some(err);
            return self;
        }
        self.base_url = Some(config.base_url.clone());
        self.region = Some(config.region.clone());
        if let Some(project_id) = &config.project_id {
            self.project_id = Some(project_id.clone());
        }
        if let Some(user_agent) = &config.user_agent {
            self.user_agent = Some(user_agent.clone());
        }
        self.retry_policy = config.retry_policy();
        self.http_config = self.http_config.with_connect_timeout(config.connect_timeout());
        self.refresh_margin = Some(config.refresh_margin());
        self
    }

    /// Root URL of the API, e.g. `https://manage.bizflycloud.vn/api`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Use an existing transport instead of building one.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Transport settings used when no client is supplied.
    #[must_use]
    pub fn with_http_config(mut self, config: HttpConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Initial region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Initial project scope.
    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Authenticate every request with HTTP basic credentials.
    #[must_use]
    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.method = Some(AuthMethod::basic(username, password));
        self
    }

    /// Obtain tokens with a username and password.
    #[must_use]
    pub fn with_password(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.method = Some(AuthMethod::Password {
            username: username.into(),
            password: SecretString::from(password.into()),
        });
        self
    }

    /// Obtain tokens with an application credential.
    #[must_use]
    pub fn with_application_credential(
        mut self,
        id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.method = Some(AuthMethod::ApplicationCredential {
            id: id.into(),
            secret: SecretString::from(secret.into()),
        });
        self
    }

    /// Use a caller-supplied token. Without password or application
    /// credentials the token is never refreshed.
    #[must_use]
    pub fn with_token(mut self, token: IssuedToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Retry policy for transient failures.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// How long before expiry a token is refreshed.
    #[must_use]
    pub fn with_refresh_margin(mut self, margin: chrono::Duration) -> Self {
        self.refresh_margin = Some(margin);
        self
    }

    /// Replace the identity-service token exchange.
    #[must_use]
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for an invalid configuration or an
    /// unusable base URL or transport,
    /// and [`Error::ValidationError`] if an explicit token is already expired.
    pub fn build(self) -> Result<Client> {
        if let Some(err) = self.config_error {
            return Err(err);
        }
        let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let catalog = Arc::new(CatalogStore::new(base_url)?);

        let method = self.method.unwrap_or(AuthMethod::Token);
        let credentials = Arc::new(CredentialStore::new(
            method,
            self.project_id.unwrap_or_default(),
            self.region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
        ));
        if let Some(token) = self.token {
            credentials.set_token(token)?;
        }

        let http = match self.http {
            Some(http) => http,
            None => self.http_config.build_transport()?,
        };
        let executor = Executor::new(http, self.retry_policy);
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let source = self.token_source.unwrap_or_else(|| {
            Arc::new(IdentityTokenSource::new(
                executor.clone(),
                Arc::clone(&catalog),
                Arc::clone(&credentials),
                user_agent.clone(),
            ))
        });
        let tokens = TokenManager::new(
            Arc::clone(&credentials),
            Arc::clone(&catalog),
            source,
            self.refresh_margin
                .unwrap_or_else(|| chrono::Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS)),
        );

        debug!(base_url, region = %credentials.region(), "Built Bizfly client");
        Ok(Client {
            inner: Arc::new(ClientInner {
                credentials,
                catalog,
                tokens,
                executor,
                user_agent,
            }),
        })
    }
}
