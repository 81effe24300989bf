//! Kubernetes engine façade.

use crate::models::{
    AddWorkerPools, Cluster, ClusterList, CreateClusterRequest, KubernetesVersion,
    UpdateWorkerPoolRequest, VersionList, WorkerPool, WorkerPoolList, WorkerPoolSpec,
};
use crate::Result;
use bizfly_core::{path_segment, Client, Context, ListOptions, RequestSpec, ServiceName};
use tracing::info;

const SERVICE: ServiceName = ServiceName::KubernetesEngine;

fn cluster_path(id: &str) -> Result<String> {
    Ok(format!("/clusters/{}", path_segment("cluster id", id)?))
}

fn pool_path(cluster_id: &str, pool_id: &str) -> Result<String> {
    Ok(format!(
        "{}/pools/{}",
        cluster_path(cluster_id)?,
        path_segment("worker pool id", pool_id)?
    ))
}

/// Cluster and worker pool operations.
#[derive(Debug, Clone)]
pub struct KubernetesEngine {
    client: Client,
}

impl KubernetesEngine {
    /// Create the façade over a shared client.
    #[must_use]
    pub fn new(client: &Client) -> Self {
        Self {
            client: client.clone(),
        }
    }

    /// List one page of clusters.
    pub async fn list_clusters(
        &self,
        ctx: &Context,
        options: &ListOptions,
    ) -> Result<Vec<Cluster>> {
        let list: ClusterList = self
            .client
            .call(ctx, RequestSpec::get(SERVICE, "/clusters").list_options(options))
            .await?;
        Ok(list.clusters)
    }

    /// Fetch a cluster, including its worker pools.
    pub async fn get_cluster(&self, ctx: &Context, id: &str) -> Result<Cluster> {
        self.client
            .call(ctx, RequestSpec::get(SERVICE, cluster_path(id)?))
            .await
    }

    /// Create a cluster.
    pub async fn create_cluster(
        &self,
        ctx: &Context,
        request: &CreateClusterRequest,
    ) -> Result<Cluster> {
        info!(
            name = %request.name,
            pools = request.worker_pools.len(),
            "Creating Kubernetes cluster"
        );
        self.client
            .call(ctx, RequestSpec::post(SERVICE, "/clusters").json(request)?)
            .await
    }

    /// Delete a cluster and all of its nodes.
    pub async fn delete_cluster(&self, ctx: &Context, id: &str) -> Result<()> {
        self.client
            .call_empty(ctx, RequestSpec::delete(SERVICE, cluster_path(id)?))
            .await
    }

    /// Add worker pools to a cluster.
    pub async fn add_worker_pools(
        &self,
        ctx: &Context,
        cluster_id: &str,
        pools: &[WorkerPoolSpec],
    ) -> Result<Vec<WorkerPool>> {
        let path = format!("{}/pools", cluster_path(cluster_id)?);
        let body = AddWorkerPools {
            worker_pools: pools,
        };
        let list: WorkerPoolList = self
            .client
            .call(ctx, RequestSpec::post(SERVICE, path).json(&body)?)
            .await?;
        Ok(list.worker_pools)
    }

    /// Fetch a worker pool.
    pub async fn get_worker_pool(
        &self,
        ctx: &Context,
        cluster_id: &str,
        pool_id: &str,
    ) -> Result<WorkerPool> {
        self.client
            .call(ctx, RequestSpec::get(SERVICE, pool_path(cluster_id, pool_id)?))
            .await
    }

    /// Resize or reconfigure autoscaling of a worker pool.
    pub async fn update_worker_pool(
        &self,
        ctx: &Context,
        cluster_id: &str,
        pool_id: &str,
        request: &UpdateWorkerPoolRequest,
    ) -> Result<()> {
        self.client
            .call_empty(
                ctx,
                RequestSpec::patch(SERVICE, pool_path(cluster_id, pool_id)?).json(request)?,
            )
            .await
    }

    /// Delete a worker pool.
    pub async fn delete_worker_pool(
        &self,
        ctx: &Context,
        cluster_id: &str,
        pool_id: &str,
    ) -> Result<()> {
        self.client
            .call_empty(ctx, RequestSpec::delete(SERVICE, pool_path(cluster_id, pool_id)?))
            .await
    }

    /// Kubernetes versions available for new clusters.
    pub async fn list_versions(&self, ctx: &Context) -> Result<Vec<KubernetesVersion>> {
        let list: VersionList = self
            .client
            .call(ctx, RequestSpec::get(SERVICE, "/k8s_versions"))
            .await?;
        Ok(list.controller_versions)
    }
}
