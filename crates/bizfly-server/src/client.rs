//! Cloud server façades.

use crate::models::{
    CreateServerRequest, CreateSnapshotRequest, CreateVolumeRequest, Server, ServerAction,
    ServerTask, Snapshot, Volume, VolumeAction,
};
use crate::Result;
use bizfly_core::{path_segment, Client, Context, ListOptions, RequestSpec, ServiceName};
use tracing::info;

const SERVICE: ServiceName = ServiceName::CloudServer;

/// Entry point for the `cloud_server` endpoint.
#[derive(Debug, Clone)]
pub struct CloudServer {
    client: Client,
}

impl CloudServer {
    /// Create the façade over a shared client.
    #[must_use]
    pub fn new(client: &Client) -> Self {
        Self {
            client: client.clone(),
        }
    }

    /// Server operations.
    #[must_use]
    pub fn servers(&self) -> ServerService {
        ServerService {
            client: self.client.clone(),
        }
    }

    /// Volume operations.
    #[must_use]
    pub fn volumes(&self) -> VolumeService {
        VolumeService {
            client: self.client.clone(),
        }
    }

    /// Snapshot operations.
    #[must_use]
    pub fn snapshots(&self) -> SnapshotService {
        SnapshotService {
            client: self.client.clone(),
        }
    }
}

/// Server operations.
#[derive(Debug, Clone)]
pub struct ServerService {
    client: Client,
}

impl ServerService {
    /// List one page of servers.
    pub async fn list(&self, ctx: &Context, options: &ListOptions) -> Result<Vec<Server>> {
        self.client
            .call(ctx, RequestSpec::get(SERVICE, "/servers").list_options(options))
            .await
    }

    /// Fetch a server by id.
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Server> {
        let path = format!("/servers/{}", path_segment("server id", id)?);
        self.client.call(ctx, RequestSpec::get(SERVICE, path)).await
    }

    /// Create servers; returns the provisioning tasks.
    pub async fn create(&self, ctx: &Context, request: &CreateServerRequest) -> Result<ServerTask> {
        info!(name = %request.name, quantity = request.quantity, "Creating server");
        self.client
            .call(ctx, RequestSpec::post(SERVICE, "/servers").json(request)?)
            .await
    }

    /// Delete a server.
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        let path = format!("/servers/{}", path_segment("server id", id)?);
        self.client
            .call_empty(ctx, RequestSpec::delete(SERVICE, path))
            .await
    }

    /// Change the flavor of a server.
    pub async fn resize(&self, ctx: &Context, id: &str, flavor_name: &str) -> Result<ServerTask> {
        self.action(ctx, id, "resize", Some(flavor_name), None).await
    }

    /// Power a server on.
    pub async fn start(&self, ctx: &Context, id: &str) -> Result<ServerTask> {
        self.action(ctx, id, "start", None, None).await
    }

    /// Power a server off.
    pub async fn stop(&self, ctx: &Context, id: &str) -> Result<ServerTask> {
        self.action(ctx, id, "stop", None, None).await
    }

    /// Reboot a server through the guest OS.
    pub async fn reboot(&self, ctx: &Context, id: &str) -> Result<ServerTask> {
        self.action(ctx, id, "soft_reboot", None, None).await
    }

    /// Power-cycle a server.
    pub async fn hard_reboot(&self, ctx: &Context, id: &str) -> Result<ServerTask> {
        self.action(ctx, id, "hard_reboot", None, None).await
    }

    /// Reinstall a server from an image.
    pub async fn rebuild(&self, ctx: &Context, id: &str, image_id: &str) -> Result<ServerTask> {
        self.action(ctx, id, "rebuild", None, Some(image_id)).await
    }

    async fn action(
        &self,
        ctx: &Context,
        id: &str,
        action: &'static str,
        flavor_name: Option<&str>,
        image: Option<&str>,
    ) -> Result<ServerTask> {
        let path = format!("/servers/{}/action", path_segment("server id", id)?);
        let body = ServerAction {
            action,
            flavor_name,
            image,
        };
        info!(server_id = id, action, "Server action");
        self.client
            .call(ctx, RequestSpec::post(SERVICE, path).json(&body)?)
            .await
    }
}

/// Block volume operations.
#[derive(Debug, Clone)]
pub struct VolumeService {
    client: Client,
}

impl VolumeService {
    /// List one page of volumes.
    pub async fn list(&self, ctx: &Context, options: &ListOptions) -> Result<Vec<Volume>> {
        self.client
            .call(ctx, RequestSpec::get(SERVICE, "/volumes").list_options(options))
            .await
    }

    /// Fetch a volume by id.
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Volume> {
        let path = format!("/volumes/{}", path_segment("volume id", id)?);
        self.client.call(ctx, RequestSpec::get(SERVICE, path)).await
    }

    /// Create a volume.
    pub async fn create(&self, ctx: &Context, request: &CreateVolumeRequest) -> Result<Volume> {
        self.client
            .call(ctx, RequestSpec::post(SERVICE, "/volumes").json(request)?)
            .await
    }

    /// Delete a volume.
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        let path = format!("/volumes/{}", path_segment("volume id", id)?);
        self.client
            .call_empty(ctx, RequestSpec::delete(SERVICE, path))
            .await
    }

    /// Grow a volume to `new_size` GB.
    pub async fn extend(&self, ctx: &Context, id: &str, new_size: u32) -> Result<()> {
        let body = VolumeAction {
            action: "extend",
            new_size: Some(new_size),
            instance_uuid: None,
        };
        self.action(ctx, id, &body).await
    }

    /// Attach a volume to a server.
    pub async fn attach(&self, ctx: &Context, id: &str, server_id: &str) -> Result<()> {
        let body = VolumeAction {
            action: "attach",
            new_size: None,
            instance_uuid: Some(path_segment("server id", server_id)?),
        };
        self.action(ctx, id, &body).await
    }

    /// Detach a volume from a server.
    pub async fn detach(&self, ctx: &Context, id: &str, server_id: &str) -> Result<()> {
        let body = VolumeAction {
            action: "detach",
            new_size: None,
            instance_uuid: Some(path_segment("server id", server_id)?),
        };
        self.action(ctx, id, &body).await
    }

    async fn action(&self, ctx: &Context, id: &str, body: &VolumeAction<'_>) -> Result<()> {
        let path = format!("/volumes/{}/action", path_segment("volume id", id)?);
        self.client
            .call_empty(ctx, RequestSpec::post(SERVICE, path).json(body)?)
            .await
    }
}

/// Volume snapshot operations.
#[derive(Debug, Clone)]
pub struct SnapshotService {
    client: Client,
}

impl SnapshotService {
    /// List one page of snapshots.
    pub async fn list(&self, ctx: &Context, options: &ListOptions) -> Result<Vec<Snapshot>> {
        self.client
            .call(ctx, RequestSpec::get(SERVICE, "/snapshots").list_options(options))
            .await
    }

    /// Fetch a snapshot by id.
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Snapshot> {
        let path = format!("/snapshots/{}", path_segment("snapshot id", id)?);
        self.client.call(ctx, RequestSpec::get(SERVICE, path)).await
    }

    /// Snapshot a volume.
    pub async fn create(&self, ctx: &Context, request: &CreateSnapshotRequest) -> Result<Snapshot> {
        self.client
            .call(ctx, RequestSpec::post(SERVICE, "/snapshots").json(request)?)
            .await
    }

    /// Delete a snapshot.
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        let path = format!("/snapshots/{}", path_segment("snapshot id", id)?);
        self.client
            .call_empty(ctx, RequestSpec::delete(SERVICE, path))
            .await
    }
}
