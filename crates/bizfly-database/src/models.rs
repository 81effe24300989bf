//! Cloud database data models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Database engine and version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Datastore {
    /// Engine (`MySQL`, `MariaDB`, `MongoDB`, `PostgreSQL`, `Redis`).
    #[serde(rename = "type")]
    pub engine: String,
    /// Engine version.
    #[serde(alias = "version_id")]
    pub version: String,
}

/// A managed database instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instance {
    /// Instance id.
    pub id: String,
    /// Instance name.
    pub name: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: String,
    /// Engine and version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datastore: Option<Datastore>,
    /// Topology (`Single`, `Replica`, `Cluster`).
    #[serde(default)]
    pub instance_type: String,
    /// Number of nodes.
    #[serde(default)]
    pub node_count: u32,
    /// Whether the instance is reachable from the internet.
    #[serde(default)]
    pub public_access: bool,
    /// Creation time as reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Request payload to create an instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateInstanceRequest {
    /// Instance name.
    pub name: String,
    /// Engine and version.
    pub datastore: Datastore,
    /// Node flavor.
    pub flavor_name: String,
    /// Data volume size in GB.
    pub volume_size: u32,
    /// Topology (`Single`, `Replica`, `Cluster`).
    pub instance_type: String,
    /// Availability zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    /// Expose the instance on a public address.
    #[serde(default)]
    pub public_access: bool,
    /// Restore from this backup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_id: Option<String>,
    /// Apply this configuration group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_group_id: Option<String>,
}

/// Action on a database instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InstanceAction {
    /// Start all nodes.
    Start,
    /// Stop all nodes.
    Stop,
    /// Restart all nodes.
    Restart,
    /// Move every node to another flavor.
    ResizeFlavor {
        /// Target flavor.
        flavor_name: String,
    },
    /// Grow the data volume of every node.
    ResizeVolume {
        /// New size in GB.
        new_size: u32,
    },
}

/// Action on a single database node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NodeAction {
    /// Start the node.
    Start,
    /// Stop the node.
    Stop,
    /// Restart the node.
    Restart,
    /// Promote a replica to a standalone instance.
    DetachReplica,
}

/// Acknowledgement of an asynchronous action.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionResult {
    /// Status message.
    #[serde(default)]
    pub message: String,
    /// Task to poll, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

/// One node of a database instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    /// Node id.
    pub id: String,
    /// Node name.
    #[serde(default)]
    pub name: String,
    /// Role within the instance (`primary`, `secondary`).
    #[serde(default)]
    pub role: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: String,
    /// Owning instance.
    #[serde(default)]
    pub instance_id: String,
    /// Node flavor.
    #[serde(default)]
    pub flavor: String,
    /// Data volume size in GB.
    #[serde(default)]
    pub volume_size: u32,
}

/// A database backup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Backup {
    /// Backup id.
    pub id: String,
    /// Backup name.
    #[serde(default)]
    pub name: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: String,
    /// Size in GB.
    #[serde(default)]
    pub size: f64,
    /// Source instance.
    #[serde(default)]
    pub instance_id: String,
    /// Source node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Creation time as reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Request payload to back up an instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateBackupRequest {
    /// Backup name.
    pub name: String,
    /// Back up this node instead of the primary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

/// A configuration group of engine parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Configuration {
    /// Configuration id.
    pub id: String,
    /// Configuration name.
    pub name: String,
    /// Engine the parameters apply to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datastore: Option<Datastore>,
    /// Parameter values.
    #[serde(default)]
    pub values: Map<String, Value>,
}

/// Request payload to create a configuration group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateConfigurationRequest {
    /// Configuration name.
    pub name: String,
    /// Engine the parameters apply to.
    pub datastore: Datastore,
    /// Parameter values.
    pub values: Map<String, Value>,
}

/// Request payload to replace the values of a configuration group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateConfigurationRequest {
    /// Parameter values.
    pub values: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InstanceList {
    #[serde(default)]
    pub instances: Vec<Instance>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodeList {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BackupList {
    #[serde(default)]
    pub backups: Vec<Backup>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfigurationList {
    #[serde(default)]
    pub configurations: Vec<Configuration>,
}
