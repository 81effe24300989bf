//! Service catalog: (service name, region) to base URL.
//!
//! The catalog is populated explicitly: from the `services` array of an
//! identity token response, from [`crate::Client::refresh_catalog`], or by
//! installing a snapshot with [`crate::Client::set_catalog`]. Until then it is
//! empty and every lookup falls back to the configured root base URL.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::types::{ServiceName, API_PATH_SUFFIX};

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Canonical service name (e.g. `load_balancer`).
    #[serde(rename = "canonical_name")]
    pub name: String,
    /// Region the URL serves.
    pub region: String,
    /// Base URL, without a trailing slash.
    #[serde(rename = "service_url")]
    pub url: String,
}

impl ServiceEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(name: impl Into<String>, region: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            url: url.into(),
        }
    }
}

/// Immutable catalog snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalog {
    #[serde(rename = "services", default)]
    entries: Vec<ServiceEntry>,
}

impl ServiceCatalog {
    /// Build a snapshot, keeping the first entry for each (name, region) pair.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = ServiceEntry>) -> Self {
        let mut unique: Vec<ServiceEntry> = Vec::new();
        for entry in entries {
            if !unique
                .iter()
                .any(|e| e.name == entry.name && e.region == entry.region)
            {
                unique.push(entry);
            }
        }
        Self { entries: unique }
    }

    /// Entries in the snapshot.
    #[must_use]
    pub fn entries(&self) -> &[ServiceEntry] {
        &self.entries
    }

    /// Returns true if the snapshot has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the base URL for a service in a region.
    #[must_use]
    pub fn lookup(&self, service: &str, region: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.name == service && entry.region == region)
            .map(|entry| entry.url.as_str())
    }
}

/// Holder of the current catalog snapshot and the root base URL.
#[derive(Debug)]
pub struct CatalogStore {
    root: String,
    snapshot: RwLock<Arc<ServiceCatalog>>,
}

impl CatalogStore {
    /// Create an empty catalog around the configured root base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if `root` is not an absolute URL.
    pub fn new(root: &str) -> Result<Self> {
        let parsed = Url::parse(root)
            .map_err(|err| Error::ConfigError(format!("Invalid base URL `{root}`: {err}")))?;
        if parsed.cannot_be_a_base() {
            return Err(Error::ConfigError(format!(
                "Base URL `{root}` cannot be used as a base"
            )));
        }
        Ok(Self {
            root: root.trim_end_matches('/').to_string(),
            snapshot: RwLock::new(Arc::new(ServiceCatalog::default())),
        })
    }

    /// The configured root base URL, without a trailing slash.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The identity-service URL: the root with the `/api` suffix ensured.
    #[must_use]
    pub fn identity_url(&self) -> String {
        if self.root.ends_with(API_PATH_SUFFIX) {
            self.root.clone()
        } else {
            format!("{}{API_PATH_SUFFIX}", self.root)
        }
    }

    /// Base URL for `service` in `region`, falling back to the root.
    #[must_use]
    pub fn url_for(&self, service: ServiceName, region: &str) -> String {
        if service.is_identity() {
            return self.identity_url();
        }
        let snapshot = self.snapshot();
        snapshot
            .lookup(service.name(), region)
            .map_or_else(|| self.root.clone(), |url| url.trim_end_matches('/').to_string())
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ServiceCatalog> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the snapshot as a whole.
    pub fn replace(&self, catalog: ServiceCatalog) {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(catalog);
    }
}
