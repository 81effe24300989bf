//! Cloud server client and data models for Bizfly Cloud.
//!
//! Covers servers, block volumes and volume snapshots, all served by the
//! `cloud_server` endpoint of the current region.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{CloudServer, ServerService, SnapshotService, VolumeService};
pub use models::{
    CreateServerRequest, CreateSnapshotRequest, CreateVolumeRequest, Disk, OsSpec, Server,
    ServerTask, Snapshot, Volume, VolumeAttachment,
};

/// Convenient result alias sharing the `bizfly-core` error type.
pub type Result<T> = bizfly_core::Result<T>;
