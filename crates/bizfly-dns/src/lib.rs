//! DNS client and data models for Bizfly Cloud.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::Dns;
pub use models::{CreateZoneRequest, PageMeta, Record, RecordRequest, Zone, ZonePage};

/// Convenient result alias sharing the `bizfly-core` error type.
pub type Result<T> = bizfly_core::Result<T>;
