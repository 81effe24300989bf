//! DNS data models for zones and records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A hosted DNS zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Zone {
    /// Zone id.
    pub id: String,
    /// Domain name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: String,
    /// Whether the zone is served.
    #[serde(default)]
    pub active: bool,
    /// Default TTL in seconds.
    #[serde(default)]
    pub ttl: u32,
    /// Authoritative name servers.
    #[serde(default)]
    pub nameserver: Vec<String>,
    /// Records, present on single-zone responses.
    #[serde(default)]
    pub record_set: Vec<Record>,
    /// Creation time as reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Paging metadata of a zone listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMeta {
    /// Page size used by the server.
    #[serde(default)]
    pub max_results: u32,
    /// Total number of zones.
    #[serde(default)]
    pub total: u32,
    /// Current page.
    #[serde(default)]
    pub page: u32,
}

/// One page of zones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ZonePage {
    /// Zones on this page.
    #[serde(default)]
    pub zones: Vec<Zone>,
    /// Paging metadata.
    #[serde(default, rename = "_meta")]
    pub meta: PageMeta,
}

/// Request payload to create a zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateZoneRequest {
    /// Domain name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Require ownership verification before serving.
    #[serde(default)]
    pub required: bool,
}

/// A DNS record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    /// Record id.
    pub id: String,
    /// Owner name relative to the zone.
    pub name: String,
    /// Record type (A, AAAA, CNAME, MX, TXT, ...).
    #[serde(rename = "type")]
    pub record_type: String,
    /// TTL in seconds.
    #[serde(default)]
    pub ttl: u32,
    /// Type-specific record data.
    #[serde(default)]
    pub data: Value,
}

/// Request payload to create or replace a record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordRequest {
    /// Owner name relative to the zone.
    pub name: String,
    /// Record type.
    #[serde(rename = "type")]
    pub record_type: String,
    /// TTL in seconds.
    pub ttl: u32,
    /// Type-specific record data.
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecordBody<'a> {
    pub record: &'a RecordRequest,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RecordEnvelope {
    Wrapped { record: Record },
    Bare(Record),
}

impl RecordEnvelope {
    pub(crate) fn into_record(self) -> Record {
        match self {
            Self::Wrapped { record } | Self::Bare(record) => record,
        }
    }
}
