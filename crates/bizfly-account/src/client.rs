//! Account and token façades.

use crate::models::{Region, RegionMap, UserInfo};
use crate::Result;
use bizfly_core::{
    path_segment, AuthMethod, Client, Context, Error, IssuedToken, RequestSpec, ServiceName,
};
use tracing::info;

/// Account operations: regions and the current user.
#[derive(Debug, Clone)]
pub struct Account {
    client: Client,
}

impl Account {
    /// Create the façade over a shared client.
    #[must_use]
    pub fn new(client: &Client) -> Self {
        Self {
            client: client.clone(),
        }
    }

    /// Token management for the same client.
    #[must_use]
    pub fn tokens(&self) -> TokenService {
        TokenService::new(&self.client)
    }

    /// List available regions keyed by short code.
    pub async fn list_regions(&self, ctx: &Context) -> Result<RegionMap> {
        self.client
            .call(ctx, RequestSpec::get(ServiceName::Account, "/regions"))
            .await
    }

    /// Fetch one region by short code.
    pub async fn get_region(&self, ctx: &Context, code: &str) -> Result<Region> {
        let code = path_segment("region code", code)?;
        self.list_regions(ctx)
            .await?
            .remove(code)
            .ok_or_else(|| Error::NotFound(format!("region {code} not found")))
    }

    /// Profile of the authenticated user.
    pub async fn get_user_info(&self, ctx: &Context) -> Result<UserInfo> {
        self.client
            .call(ctx, RequestSpec::get(ServiceName::Account, "/user/info"))
            .await
    }
}

/// Explicit identity token operations.
#[derive(Debug, Clone)]
pub struct TokenService {
    client: Client,
}

impl TokenService {
    /// Create the façade over a shared client.
    #[must_use]
    pub fn new(client: &Client) -> Self {
        Self {
            client: client.clone(),
        }
    }

    /// Issue a token for arbitrary credentials.
    ///
    /// The client's own token is left untouched.
    pub async fn create(
        &self,
        ctx: &Context,
        method: &AuthMethod,
        project_id: &str,
    ) -> Result<IssuedToken> {
        let token = self.client.issue_token(ctx, method, project_id).await?;
        info!(expires_at = %token.expires_at(), "Created token");
        Ok(token)
    }

    /// Make sure the client holds a usable token and return it.
    pub async fn init(&self, ctx: &Context) -> Result<IssuedToken> {
        self.client.ensure_token(ctx).await?;
        self.current()
    }

    /// Replace the client's token and return the new one.
    pub async fn refresh(&self, ctx: &Context) -> Result<IssuedToken> {
        self.client.refresh_token(ctx).await?;
        self.current()
    }

    fn current(&self) -> Result<IssuedToken> {
        self.client
            .token()
            .ok_or_else(|| Error::Unauthorized("no token available".to_string()))
    }
}
