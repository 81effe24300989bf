//! Load balancer client and data models for Bizfly Cloud.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{ListenerService, LoadBalancerService, PoolService};
pub use models::{
    CreateListenerRequest, CreateLoadBalancerRequest, CreatePoolRequest, Listener, LoadBalancer,
    Pool, ResourceRef, SessionPersistence, UpdateListenerRequest, UpdateLoadBalancerRequest,
    UpdatePoolRequest,
};

/// Convenient result alias sharing the `bizfly-core` error type.
pub type Result<T> = bizfly_core::Result<T>;
