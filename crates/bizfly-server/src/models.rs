//! Cloud server data models for servers, volumes and snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A cloud server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Server {
    /// Server identifier.
    pub id: String,
    /// Server name.
    pub name: String,
    /// Lifecycle status (ACTIVE, SHUTOFF, ...).
    #[serde(default)]
    pub status: String,
    /// Flavor name, e.g. `2c_2g`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_name: Option<String>,
    /// Name of the injected SSH key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    /// Availability zone.
    #[serde(
        default,
        rename = "OS-EXT-AZ:availability_zone",
        skip_serializing_if = "Option::is_none"
    )]
    pub availability_zone: Option<String>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Creation time.
    #[serde(default, rename = "created", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default, rename = "updated", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Disk definition used when creating a server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Disk {
    /// Disk class (`HDD`, `SSD`).
    #[serde(rename = "type")]
    pub disk_type: String,
    /// Size in GB.
    pub size: u32,
}

/// Boot source of a new server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OsSpec {
    /// Source kind (`image`, `snapshot`, `volume`).
    #[serde(rename = "type")]
    pub source_type: String,
    /// Source identifier.
    pub id: String,
}

/// Request payload to create one or more servers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateServerRequest {
    /// Server name.
    pub name: String,
    /// Flavor name.
    pub flavor_name: String,
    /// Server category (`basic`, `premium`, `enterprise`).
    #[serde(rename = "type")]
    pub server_type: String,
    /// Root disk.
    pub rootdisk: Disk,
    /// Additional data disks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datadisks: Vec<Disk>,
    /// Boot source.
    pub os: OsSpec,
    /// Availability zone.
    pub availability_zone: String,
    /// SSH key to inject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sshkey: Option<String>,
    /// Email a generated password to the account owner.
    #[serde(default)]
    pub password: bool,
    /// Number of servers to create.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Asynchronous task accepted by the server service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerTask {
    /// Task identifiers to poll.
    #[serde(default, deserialize_with = "one_or_many")]
    pub task_id: Vec<String>,
    /// Optional status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(id) => vec![id],
        OneOrMany::Many(ids) => ids,
    })
}

#[derive(Debug, Serialize)]
pub(crate) struct ServerAction<'a> {
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavor_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<&'a str>,
}

/// Attachment of a volume to a server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VolumeAttachment {
    /// Server the volume is attached to.
    pub server_id: String,
    /// Device path on the server.
    #[serde(default)]
    pub device: String,
}

/// A block volume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Volume {
    /// Volume identifier.
    pub id: String,
    /// Volume name.
    #[serde(default)]
    pub name: String,
    /// Size in GB.
    pub size: u32,
    /// Lifecycle status (available, in-use, ...).
    #[serde(default)]
    pub status: String,
    /// Volume class.
    #[serde(default)]
    pub volume_type: String,
    /// Whether the volume can boot a server.
    #[serde(default)]
    pub bootable: bool,
    /// Availability zone.
    #[serde(default)]
    pub availability_zone: String,
    /// Snapshot the volume was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    /// Current attachments.
    #[serde(default)]
    pub attachments: Vec<VolumeAttachment>,
    /// Creation time as reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Request payload to create a volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateVolumeRequest {
    /// Volume name.
    pub name: String,
    /// Size in GB.
    pub size: u32,
    /// Volume class (`HDD`, `SSD`).
    pub volume_type: String,
    /// Availability zone.
    pub availability_zone: String,
    /// Restore from this snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    /// Attach to this server once created.
    #[serde(default, rename = "instance_uuid", skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VolumeAction<'a> {
    #[serde(rename = "type")]
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_uuid: Option<&'a str>,
}

/// A volume snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    /// Snapshot identifier.
    pub id: String,
    /// Snapshot name.
    #[serde(default)]
    pub name: String,
    /// Size in GB.
    pub size: u32,
    /// Lifecycle status.
    #[serde(default)]
    pub status: String,
    /// Source volume.
    #[serde(default)]
    pub volume_id: String,
    /// Creation time as reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Request payload to snapshot a volume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateSnapshotRequest {
    /// Snapshot name.
    pub name: String,
    /// Volume to snapshot.
    pub volume_id: String,
    /// Snapshot even while the volume is attached.
    #[serde(default)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_task_accepts_single_id() {
        let task: ServerTask = serde_json::from_value(json!({"task_id": "t-1"})).unwrap();
        assert_eq!(task.task_id, vec!["t-1"]);

        let task: ServerTask =
            serde_json::from_value(json!({"task_id": ["t-1", "t-2"], "message": "ok"})).unwrap();
        assert_eq!(task.task_id.len(), 2);
        assert_eq!(task.message.as_deref(), Some("ok"));

        let task: ServerTask = serde_json::from_value(json!({})).unwrap();
        assert!(task.task_id.is_empty());
    }

    #[test]
    fn server_decodes_timestamps() {
        let server: Server = serde_json::from_value(json!({
            "id": "s-1",
            "name": "web",
            "status": "ACTIVE",
            "OS-EXT-AZ:availability_zone": "HN1",
            "created": "2020-04-07T03:45:28Z"
        }))
        .unwrap();
        assert_eq!(server.availability_zone.as_deref(), Some("HN1"));
        assert!(server.created_at.is_some());
        assert!(server.metadata.is_empty());
    }

    #[test]
    fn create_server_request_shape() {
        let request = CreateServerRequest {
            name: "web".into(),
            flavor_name: "2c_2g".into(),
            server_type: "premium".into(),
            rootdisk: Disk {
                disk_type: "SSD".into(),
                size: 40,
            },
            datadisks: Vec::new(),
            os: OsSpec {
                source_type: "image".into(),
                id: "img-1".into(),
            },
            availability_zone: "HN1".into(),
            sshkey: None,
            password: true,
            quantity: 1,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["type"], "premium");
        assert_eq!(value["rootdisk"], json!({"type": "SSD", "size": 40}));
        assert!(value.get("datadisks").is_none());
        assert!(value.get("sshkey").is_none());
    }
}
