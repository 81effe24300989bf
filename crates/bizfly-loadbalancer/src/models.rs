//! Load balancer data models for load balancers, listeners and pools.

use serde::{Deserialize, Serialize};

/// Reference to a child resource by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceRef {
    /// Referenced resource id.
    pub id: String,
}

/// A load balancer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadBalancer {
    /// Load balancer id.
    pub id: String,
    /// Load balancer name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: String,
    /// Size class (`small`, `medium`, `large`).
    #[serde(default, rename = "type")]
    pub lb_type: String,
    /// Network the VIP is placed on (`external`, `internal`).
    #[serde(default)]
    pub network_type: String,
    /// Virtual IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vip_address: Option<String>,
    /// Provisioning status (ACTIVE, PENDING_CREATE, ...).
    #[serde(default)]
    pub provisioning_status: String,
    /// Operating status (ONLINE, OFFLINE, ...).
    #[serde(default)]
    pub operating_status: String,
    /// Listeners attached to this load balancer.
    #[serde(default)]
    pub listeners: Vec<ResourceRef>,
    /// Pools attached to this load balancer.
    #[serde(default)]
    pub pools: Vec<ResourceRef>,
    /// Creation time as reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Request payload to create a load balancer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateLoadBalancerRequest {
    /// Load balancer name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Size class.
    #[serde(rename = "type")]
    pub lb_type: String,
    /// Network the VIP is placed on.
    pub network_type: String,
}

/// Request payload to update a load balancer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateLoadBalancerRequest {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Enable or disable the load balancer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_state_up: Option<bool>,
}

/// A listener accepting traffic on one port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listener {
    /// Listener id.
    pub id: String,
    /// Listener name.
    #[serde(default)]
    pub name: String,
    /// Protocol (HTTP, HTTPS, TCP, `TERMINATED_HTTPS`).
    pub protocol: String,
    /// Port accepting traffic.
    pub protocol_port: u16,
    /// Pool receiving traffic by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_pool_id: Option<String>,
    /// Certificate container for TLS termination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tls_container_ref: Option<String>,
    /// Provisioning status.
    #[serde(default)]
    pub provisioning_status: String,
    /// Operating status.
    #[serde(default)]
    pub operating_status: String,
}

/// Request payload to create a listener.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateListenerRequest {
    /// Listener name.
    pub name: String,
    /// Protocol.
    pub protocol: String,
    /// Port accepting traffic.
    pub protocol_port: u16,
    /// Pool receiving traffic by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_pool_id: Option<String>,
    /// Certificate container for TLS termination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tls_container_ref: Option<String>,
}

/// Request payload to update a listener.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateListenerRequest {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New default pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_pool_id: Option<String>,
    /// New certificate container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tls_container_ref: Option<String>,
}

/// Sticky-session settings of a pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionPersistence {
    /// Persistence kind (`SOURCE_IP`, `HTTP_COOKIE`, `APP_COOKIE`).
    #[serde(rename = "type")]
    pub persistence_type: String,
    /// Cookie name for `APP_COOKIE`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_name: Option<String>,
}

/// A backend pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pool {
    /// Pool id.
    pub id: String,
    /// Pool name.
    #[serde(default)]
    pub name: String,
    /// Backend protocol.
    pub protocol: String,
    /// Balancing algorithm (`ROUND_ROBIN`, `LEAST_CONNECTIONS`, `SOURCE_IP`).
    pub lb_algorithm: String,
    /// Sticky-session settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_persistence: Option<SessionPersistence>,
    /// Pool members.
    #[serde(default)]
    pub members: Vec<ResourceRef>,
    /// Provisioning status.
    #[serde(default)]
    pub provisioning_status: String,
    /// Operating status.
    #[serde(default)]
    pub operating_status: String,
}

/// Request payload to create a pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatePoolRequest {
    /// Pool name.
    pub name: String,
    /// Backend protocol.
    pub protocol: String,
    /// Balancing algorithm.
    pub lb_algorithm: String,
    /// Listener that forwards to this pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listener_id: Option<String>,
    /// Sticky-session settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_persistence: Option<SessionPersistence>,
}

/// Request payload to update a pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdatePoolRequest {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New balancing algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lb_algorithm: Option<String>,
    /// New sticky-session settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_persistence: Option<SessionPersistence>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoadBalancerBody<'a, T> {
    pub loadbalancer: &'a T,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListenerBody<'a, T> {
    pub listener: &'a T,
}

#[derive(Debug, Serialize)]
pub(crate) struct PoolBody<'a, T> {
    pub pool: &'a T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoadBalancerList {
    #[serde(default)]
    pub loadbalancers: Vec<LoadBalancer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListenerList {
    #[serde(default)]
    pub listeners: Vec<Listener>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PoolList {
    #[serde(default)]
    pub pools: Vec<Pool>,
}
