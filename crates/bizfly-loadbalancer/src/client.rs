//! Load balancer façades.

use crate::models::{
    CreateListenerRequest, CreateLoadBalancerRequest, CreatePoolRequest, Listener, ListenerBody,
    ListenerList, LoadBalancer, LoadBalancerBody, LoadBalancerList, Pool, PoolBody, PoolList,
    UpdateListenerRequest, UpdateLoadBalancerRequest, UpdatePoolRequest,
};
use crate::Result;
use bizfly_core::{
    path_segment, Client, Context, ListOptions, QueryParams, RequestSpec, ServiceName,
};
use tracing::info;

const SERVICE: ServiceName = ServiceName::LoadBalancer;

fn lb_path(id: &str) -> Result<String> {
    Ok(format!("/loadbalancers/{}", path_segment("load balancer id", id)?))
}

/// Load balancer operations.
#[derive(Debug, Clone)]
pub struct LoadBalancerService {
    client: Client,
}

impl LoadBalancerService {
    /// Create the façade over a shared client.
    #[must_use]
    pub fn new(client: &Client) -> Self {
        Self {
            client: client.clone(),
        }
    }

    /// Listener operations.
    #[must_use]
    pub fn listeners(&self) -> ListenerService {
        ListenerService {
            client: self.client.clone(),
        }
    }

    /// Pool operations.
    #[must_use]
    pub fn pools(&self) -> PoolService {
        PoolService {
            client: self.client.clone(),
        }
    }

    /// List one page of load balancers.
    pub async fn list(&self, ctx: &Context, options: &ListOptions) -> Result<Vec<LoadBalancer>> {
        let list: LoadBalancerList = self
            .client
            .call(ctx, RequestSpec::get(SERVICE, "/loadbalancers").list_options(options))
            .await?;
        Ok(list.loadbalancers)
    }

    /// Fetch a load balancer by id.
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<LoadBalancer> {
        self.client
            .call(ctx, RequestSpec::get(SERVICE, lb_path(id)?))
            .await
    }

    /// Create a load balancer.
    pub async fn create(
        &self,
        ctx: &Context,
        request: &CreateLoadBalancerRequest,
    ) -> Result<LoadBalancer> {
        info!(name = %request.name, "Creating load balancer");
        let body = LoadBalancerBody {
            loadbalancer: request,
        };
        self.client
            .call(ctx, RequestSpec::post(SERVICE, "/loadbalancers").json(&body)?)
            .await
    }

    /// Update a load balancer.
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        request: &UpdateLoadBalancerRequest,
    ) -> Result<LoadBalancer> {
        let body = LoadBalancerBody {
            loadbalancer: request,
        };
        self.client
            .call(ctx, RequestSpec::put(SERVICE, lb_path(id)?).json(&body)?)
            .await
    }

    /// Delete a load balancer; `cascade` also removes its listeners and pools.
    pub async fn delete(&self, ctx: &Context, id: &str, cascade: bool) -> Result<()> {
        let mut query = QueryParams::new();
        if cascade {
            query.push("cascade", true);
        }
        self.client
            .call_empty(ctx, RequestSpec::delete(SERVICE, lb_path(id)?).query(query))
            .await
    }
}

/// Listener operations.
#[derive(Debug, Clone)]
pub struct ListenerService {
    client: Client,
}

impl ListenerService {
    /// List the listeners of a load balancer.
    pub async fn list(
        &self,
        ctx: &Context,
        lb_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<Listener>> {
        let path = format!("{}/listeners", lb_path(lb_id)?);
        let list: ListenerList = self
            .client
            .call(ctx, RequestSpec::get(SERVICE, path).list_options(options))
            .await?;
        Ok(list.listeners)
    }

    /// Fetch a listener by id.
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Listener> {
        let path = format!("/listeners/{}", path_segment("listener id", id)?);
        self.client.call(ctx, RequestSpec::get(SERVICE, path)).await
    }

    /// Create a listener on a load balancer.
    pub async fn create(
        &self,
        ctx: &Context,
        lb_id: &str,
        request: &CreateListenerRequest,
    ) -> Result<Listener> {
        let path = format!("{}/listeners", lb_path(lb_id)?);
        let body = ListenerBody { listener: request };
        self.client
            .call(ctx, RequestSpec::post(SERVICE, path).json(&body)?)
            .await
    }

    /// Update a listener.
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        request: &UpdateListenerRequest,
    ) -> Result<Listener> {
        let path = format!("/listeners/{}", path_segment("listener id", id)?);
        let body = ListenerBody { listener: request };
        self.client
            .call(ctx, RequestSpec::put(SERVICE, path).json(&body)?)
            .await
    }

    /// Delete a listener.
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        let path = format!("/listeners/{}", path_segment("listener id", id)?);
        self.client
            .call_empty(ctx, RequestSpec::delete(SERVICE, path))
            .await
    }
}

/// Backend pool operations.
#[derive(Debug, Clone)]
pub struct PoolService {
    client: Client,
}

impl PoolService {
    /// List the pools of a load balancer.
    pub async fn list(
        &self,
        ctx: &Context,
        lb_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<Pool>> {
        let path = format!("{}/pools", lb_path(lb_id)?);
        let list: PoolList = self
            .client
            .call(ctx, RequestSpec::get(SERVICE, path).list_options(options))
            .await?;
        Ok(list.pools)
    }

    /// Fetch a pool by id.
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Pool> {
        let path = format!("/pools/{}", path_segment("pool id", id)?);
        self.client.call(ctx, RequestSpec::get(SERVICE, path)).await
    }

    /// Create a pool on a load balancer.
    pub async fn create(
        &self,
        ctx: &Context,
        lb_id: &str,
        request: &CreatePoolRequest,
    ) -> Result<Pool> {
        let path = format!("{}/pools", lb_path(lb_id)?);
        let body = PoolBody { pool: request };
        self.client
            .call(ctx, RequestSpec::post(SERVICE, path).json(&body)?)
            .await
    }

    /// Update a pool.
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        request: &UpdatePoolRequest,
    ) -> Result<Pool> {
        let path = format!("/pools/{}", path_segment("pool id", id)?);
        let body = PoolBody { pool: request };
        self.client
            .call(ctx, RequestSpec::put(SERVICE, path).json(&body)?)
            .await
    }

    /// Delete a pool.
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        let path = format!("/pools/{}", path_segment("pool id", id)?);
        self.client
            .call_empty(ctx, RequestSpec::delete(SERVICE, path))
            .await
    }
}
