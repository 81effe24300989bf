//! Kubernetes engine client and data models for Bizfly Cloud.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::KubernetesEngine;
pub use models::{
    Cluster, CreateClusterRequest, KubernetesVersion, UpdateWorkerPoolRequest, WorkerPool,
    WorkerPoolSpec,
};

/// Convenient result alias sharing the `bizfly-core` error type.
pub type Result<T> = bizfly_core::Result<T>;
