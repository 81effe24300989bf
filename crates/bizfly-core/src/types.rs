//! Core Bizfly Cloud domain types.
//!
//! This module enumerates the cloud's services by their canonical catalog
//! names, which are the keys used for base-URL lookups.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default root base URL of the public API.
pub const DEFAULT_BASE_URL: &str = "https://manage.bizflycloud.vn/api";
/// Default region used for catalog lookups.
pub const DEFAULT_REGION: &str = "HN";
/// Path suffix every identity-service URL ends with.
pub const API_PATH_SUFFIX: &str = "/api";

/// Supported Bizfly Cloud services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceName {
    /// Identity and token issuance
    Auth,
    /// Account, user and region information
    Account,
    /// Cloud servers, volumes and snapshots
    CloudServer,
    /// Load balancers
    LoadBalancer,
    /// Kubernetes engine
    KubernetesEngine,
    /// DNS zones and records
    Dns,
    /// Managed databases
    CloudDatabase,
    /// Container registry
    ContainerRegistry,
    /// Autoscaling groups
    AutoScaling,
    /// Cloud backup
    #[serde(rename = "cloud-backup")]
    CloudBackup,
    /// Monitoring alerts
    Alert,
    /// Object storage buckets
    SimpleStorage,
}

impl ServiceName {
    /// Returns the canonical catalog name of the service.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Account => "account",
            Self::CloudServer => "cloud_server",
            Self::LoadBalancer => "load_balancer",
            Self::KubernetesEngine => "kubernetes_engine",
            Self::Dns => "dns",
            Self::CloudDatabase => "cloud_database",
            Self::ContainerRegistry => "container_registry",
            Self::AutoScaling => "auto_scaling",
            Self::CloudBackup => "cloud-backup",
            Self::Alert => "alert",
            Self::SimpleStorage => "simple_storage",
        }
    }

    /// Returns all available services.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Auth,
            Self::Account,
            Self::CloudServer,
            Self::LoadBalancer,
            Self::KubernetesEngine,
            Self::Dns,
            Self::CloudDatabase,
            Self::ContainerRegistry,
            Self::AutoScaling,
            Self::CloudBackup,
            Self::Alert,
            Self::SimpleStorage,
        ]
    }

    /// Returns true for the identity service, whose URL is derived from the
    /// root base URL instead of the catalog.
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        matches!(self, Self::Auth)
    }
}

impl FromStr for ServiceName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|service| service.name() == normalized)
            .ok_or_else(|| Error::ValidationError(format!("Unknown service: {s}")))
    }
}

impl std::fmt::Display for ServiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_name() {
        assert_eq!(ServiceName::CloudServer.name(), "cloud_server");
        assert_eq!(ServiceName::LoadBalancer.name(), "load_balancer");
        assert_eq!(ServiceName::KubernetesEngine.name(), "kubernetes_engine");
        assert_eq!(ServiceName::CloudBackup.name(), "cloud-backup");
        assert_eq!(ServiceName::Auth.name(), "auth");
    }

    #[test]
    fn test_service_all_is_unique() {
        let all = ServiceName::all();
        assert_eq!(all.len(), 12);
        let names: std::collections::HashSet<_> = all.iter().map(ServiceName::name).collect();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn test_service_from_str() {
        assert_eq!(
            "cloud_database".parse::<ServiceName>().unwrap(),
            ServiceName::CloudDatabase
        );
        assert_eq!(
            "CLOUD-BACKUP".parse::<ServiceName>().unwrap(),
            ServiceName::CloudBackup
        );
        assert!("nope".parse::<ServiceName>().is_err());
    }

    #[test]
    fn test_service_serde_matches_catalog_name() {
        for service in ServiceName::all() {
            let json = serde_json::to_string(service).unwrap();
            assert_eq!(json, format!("\"{}\"", service.name()));
            let back: ServiceName = serde_json::from_str(&json).unwrap();
            assert_eq!(&back, service);
        }
    }

    #[test]
    fn test_only_auth_is_identity() {
        assert!(ServiceName::Auth.is_identity());
        assert!(!ServiceName::Dns.is_identity());
    }
}
