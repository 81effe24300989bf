//! Cloud database client and data models for Bizfly Cloud.
//!
//! [`CloudDatabase`] owns one sub-façade per resource family: instances,
//! nodes, backups and configuration groups.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{BackupService, CloudDatabase, ConfigurationService, InstanceService, NodeService};
pub use models::{
    ActionResult, Backup, Configuration, CreateBackupRequest, CreateConfigurationRequest,
    CreateInstanceRequest, Datastore, Instance, InstanceAction, Node, NodeAction,
    UpdateConfigurationRequest,
};

/// Convenient result alias sharing the `bizfly-core` error type.
pub type Result<T> = bizfly_core::Result<T>;
