//! Kubernetes engine data models for clusters and worker pools.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A managed Kubernetes cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cluster {
    /// Cluster id.
    #[serde(alias = "uid")]
    pub id: String,
    /// Cluster name.
    pub name: String,
    /// Kubernetes version.
    #[serde(default)]
    pub version: String,
    /// VPC network the nodes join.
    #[serde(default)]
    pub vpc_network_id: String,
    /// Upgrade the control plane automatically.
    #[serde(default)]
    pub auto_upgrade: bool,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Provisioning status.
    #[serde(default)]
    pub provision_status: String,
    /// Cluster health status.
    #[serde(default)]
    pub cluster_status: String,
    /// Number of worker pools.
    #[serde(default)]
    pub worker_pools_count: u32,
    /// Worker pools, present on single-cluster responses.
    #[serde(default)]
    pub worker_pools: Vec<WorkerPool>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A group of identically configured worker nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerPool {
    /// Pool id.
    #[serde(alias = "uid")]
    pub id: String,
    /// Pool name.
    pub name: String,
    /// Node flavor.
    #[serde(default)]
    pub flavor: String,
    /// Node category (`premium`, `basic`, ...).
    #[serde(default)]
    pub profile_type: String,
    /// Root volume class.
    #[serde(default)]
    pub volume_type: String,
    /// Root volume size in GB.
    #[serde(default)]
    pub volume_size: u32,
    /// Availability zone.
    #[serde(default)]
    pub availability_zone: String,
    /// Desired node count.
    #[serde(default)]
    pub desired_size: u32,
    /// Scale between `min_size` and `max_size` automatically.
    #[serde(default)]
    pub enable_autoscaling: bool,
    /// Lower autoscaling bound.
    #[serde(default)]
    pub min_size: u32,
    /// Upper autoscaling bound.
    #[serde(default)]
    pub max_size: u32,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Node labels.
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Provisioning status.
    #[serde(default)]
    pub provision_status: String,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Specification of a worker pool to create.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerPoolSpec {
    /// Pool name.
    pub name: String,
    /// Node flavor.
    pub flavor: String,
    /// Node category.
    pub profile_type: String,
    /// Root volume class.
    pub volume_type: String,
    /// Root volume size in GB.
    pub volume_size: u32,
    /// Availability zone.
    pub availability_zone: String,
    /// Desired node count.
    pub desired_size: u32,
    /// Scale automatically.
    #[serde(default)]
    pub enable_autoscaling: bool,
    /// Lower autoscaling bound.
    #[serde(default)]
    pub min_size: u32,
    /// Upper autoscaling bound.
    #[serde(default)]
    pub max_size: u32,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Node labels.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
}

/// Request payload to create a cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateClusterRequest {
    /// Cluster name.
    pub name: String,
    /// Kubernetes version id.
    pub version: String,
    /// VPC network the nodes join.
    pub vpc_network_id: String,
    /// Upgrade the control plane automatically.
    #[serde(default)]
    pub auto_upgrade: bool,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Initial worker pools.
    pub worker_pools: Vec<WorkerPoolSpec>,
}

/// Request payload to resize a worker pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateWorkerPoolRequest {
    /// Desired node count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_size: Option<u32>,
    /// Scale automatically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_autoscaling: Option<bool>,
    /// Lower autoscaling bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u32>,
    /// Upper autoscaling bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u32>,
}

/// A Kubernetes version offered for new clusters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KubernetesVersion {
    /// Version id to pass on create.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClusterList {
    #[serde(default)]
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkerPoolList {
    #[serde(default)]
    pub worker_pools: Vec<WorkerPool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddWorkerPools<'a> {
    pub worker_pools: &'a [WorkerPoolSpec],
}

#[derive(Debug, Deserialize)]
pub(crate) struct VersionList {
    #[serde(default)]
    pub controller_versions: Vec<KubernetesVersion>,
}
