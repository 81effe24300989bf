//! Cloud database façades.

use crate::models::{
    ActionResult, Backup, BackupList, Configuration, ConfigurationList, CreateBackupRequest,
    CreateConfigurationRequest, CreateInstanceRequest, Instance, InstanceAction, InstanceList,
    Node, NodeAction, NodeList, UpdateConfigurationRequest,
};
use crate::Result;
use bizfly_core::{path_segment, Client, Context, ListOptions, RequestSpec, ServiceName};
use tracing::info;

const SERVICE: ServiceName = ServiceName::CloudDatabase;

fn instance_path(id: &str) -> Result<String> {
    Ok(format!("/instances/{}", path_segment("instance id", id)?))
}

fn node_path(id: &str) -> Result<String> {
    Ok(format!("/nodes/{}", path_segment("node id", id)?))
}

fn backup_path(id: &str) -> Result<String> {
    Ok(format!("/backups/{}", path_segment("backup id", id)?))
}

fn configuration_path(id: &str) -> Result<String> {
    Ok(format!(
        "/configurations/{}",
        path_segment("configuration id", id)?
    ))
}

/// Cloud database operations, grouped by resource family.
#[derive(Debug, Clone)]
pub struct CloudDatabase {
    instances: InstanceService,
    nodes: NodeService,
    backups: BackupService,
    configurations: ConfigurationService,
}

impl CloudDatabase {
    /// Create the façade over a shared client.
    #[must_use]
    pub fn new(client: &Client) -> Self {
        Self {
            instances: InstanceService {
                client: client.clone(),
            },
            nodes: NodeService {
                client: client.clone(),
            },
            backups: BackupService {
                client: client.clone(),
            },
            configurations: ConfigurationService {
                client: client.clone(),
            },
        }
    }

    /// Instance operations.
    #[must_use]
    pub const fn instances(&self) -> &InstanceService {
        &self.instances
    }

    /// Node operations.
    #[must_use]
    pub const fn nodes(&self) -> &NodeService {
        &self.nodes
    }

    /// Backup operations.
    #[must_use]
    pub const fn backups(&self) -> &BackupService {
        &self.backups
    }

    /// Configuration group operations.
    #[must_use]
    pub const fn configurations(&self) -> &ConfigurationService {
        &self.configurations
    }
}

/// Database instance operations.
#[derive(Debug, Clone)]
pub struct InstanceService {
    client: Client,
}

impl InstanceService {
    /// List one page of instances.
    pub async fn list(&self, ctx: &Context, options: &ListOptions) -> Result<Vec<Instance>> {
        let list: InstanceList = self
            .client
            .call(ctx, RequestSpec::get(SERVICE, "/instances").list_options(options))
            .await?;
        Ok(list.instances)
    }

    /// Fetch an instance by id.
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Instance> {
        self.client
            .call(ctx, RequestSpec::get(SERVICE, instance_path(id)?))
            .await
    }

    /// Create an instance.
    pub async fn create(&self, ctx: &Context, request: &CreateInstanceRequest) -> Result<Instance> {
        info!(
            name = %request.name,
            engine = %request.datastore.engine,
            "Creating database instance"
        );
        self.client
            .call(ctx, RequestSpec::post(SERVICE, "/instances").json(request)?)
            .await
    }

    /// Delete an instance and all of its nodes.
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        self.client
            .call_empty(ctx, RequestSpec::delete(SERVICE, instance_path(id)?))
            .await
    }

    /// Run an action on every node of an instance.
    pub async fn action(
        &self,
        ctx: &Context,
        id: &str,
        action: &InstanceAction,
    ) -> Result<ActionResult> {
        let path = format!("{}/action", instance_path(id)?);
        self.client
            .call(ctx, RequestSpec::post(SERVICE, path).json(action)?)
            .await
    }
}

/// Database node operations.
#[derive(Debug, Clone)]
pub struct NodeService {
    client: Client,
}

impl NodeService {
    /// List the nodes of an instance.
    pub async fn list(&self, ctx: &Context, instance_id: &str) -> Result<Vec<Node>> {
        let path = format!("{}/nodes", instance_path(instance_id)?);
        let list: NodeList = self.client.call(ctx, RequestSpec::get(SERVICE, path)).await?;
        Ok(list.nodes)
    }

    /// Fetch a node by id.
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Node> {
        self.client
            .call(ctx, RequestSpec::get(SERVICE, node_path(id)?))
            .await
    }

    /// Run an action on one node.
    pub async fn action(
        &self,
        ctx: &Context,
        id: &str,
        action: &NodeAction,
    ) -> Result<ActionResult> {
        let path = format!("{}/action", node_path(id)?);
        self.client
            .call(ctx, RequestSpec::post(SERVICE, path).json(action)?)
            .await
    }
}

/// Database backup operations.
#[derive(Debug, Clone)]
pub struct BackupService {
    client: Client,
}

impl BackupService {
    /// List one page of backups.
    pub async fn list(&self, ctx: &Context, options: &ListOptions) -> Result<Vec<Backup>> {
        let list: BackupList = self
            .client
            .call(ctx, RequestSpec::get(SERVICE, "/backups").list_options(options))
            .await?;
        Ok(list.backups)
    }

    /// Fetch a backup by id.
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Backup> {
        self.client
            .call(ctx, RequestSpec::get(SERVICE, backup_path(id)?))
            .await
    }

    /// Back up an instance.
    pub async fn create(
        &self,
        ctx: &Context,
        instance_id: &str,
        request: &CreateBackupRequest,
    ) -> Result<Backup> {
        let path = format!("{}/backups", instance_path(instance_id)?);
        self.client
            .call(ctx, RequestSpec::post(SERVICE, path).json(request)?)
            .await
    }

    /// Delete a backup.
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        self.client
            .call_empty(ctx, RequestSpec::delete(SERVICE, backup_path(id)?))
            .await
    }
}

/// Configuration group operations.
#[derive(Debug, Clone)]
pub struct ConfigurationService {
    client: Client,
}

impl ConfigurationService {
    /// List one page of configuration groups.
    pub async fn list(&self, ctx: &Context, options: &ListOptions) -> Result<Vec<Configuration>> {
        let list: ConfigurationList = self
            .client
            .call(ctx, RequestSpec::get(SERVICE, "/configurations").list_options(options))
            .await?;
        Ok(list.configurations)
    }

    /// Fetch a configuration group by id.
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Configuration> {
        self.client
            .call(ctx, RequestSpec::get(SERVICE, configuration_path(id)?))
            .await
    }

    /// Create a configuration group.
    pub async fn create(
        &self,
        ctx: &Context,
        request: &CreateConfigurationRequest,
    ) -> Result<Configuration> {
        self.client
            .call(ctx, RequestSpec::post(SERVICE, "/configurations").json(request)?)
            .await
    }

    /// Replace the values of a configuration group.
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        request: &UpdateConfigurationRequest,
    ) -> Result<Configuration> {
        self.client
            .call(ctx, RequestSpec::put(SERVICE, configuration_path(id)?).json(request)?)
            .await
    }

    /// Delete a configuration group.
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        self.client
            .call_empty(ctx, RequestSpec::delete(SERVICE, configuration_path(id)?))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Datastore;
    use bizfly_core::Error;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn database(server: &MockServer) -> CloudDatabase {
        let client = Client::builder()
            .with_base_url(server.uri())
            .with_basic_auth("user", "pass")
            .build()
            .unwrap();
        CloudDatabase::new(&client)
    }

    #[tokio::test]
    async fn list_then_get_instance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instances": [{"id": "db-1", "name": "orders", "status": "ACTIVE"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/instances/db-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "db-1",
                "name": "orders",
                "status": "ACTIVE",
                "datastore": {"type": "MySQL", "version": "8.0"},
                "instance_type": "Replica",
                "node_count": 2
            })))
            .mount(&server)
            .await;

        let instances = database(&server);
        let ctx = Context::new();
        let page = instances
            .instances()
            .list(&ctx, &ListOptions::new())
            .await
            .unwrap();
        let instance = instances.instances().get(&ctx, &page[0].id).await.unwrap();
        assert_eq!(instance.id, page[0].id);
        assert_eq!(instance.node_count, 2);
        assert_eq!(instance.datastore.unwrap().engine, "MySQL");
    }

    #[tokio::test]
    async fn instance_action_posts_tagged_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/instances/db-1/action"))
            .and(body_json(json!({"action": "resize_flavor", "flavor_name": "2c_4g"})))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "message": "Resizing",
                "task_id": "t-9"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = database(&server)
            .instances()
            .action(
                &Context::new(),
                "db-1",
                &InstanceAction::ResizeFlavor {
                    flavor_name: "2c_4g".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(result.task_id.as_deref(), Some("t-9"));
    }

    #[tokio::test]
    async fn node_restart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/nodes/node-1/action"))
            .and(body_json(json!({"action": "restart"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "Restarting"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = database(&server)
            .nodes()
            .action(&Context::new(), "node-1", &NodeAction::Restart)
            .await
            .unwrap();
        assert_eq!(result.message, "Restarting");
    }

    #[tokio::test]
    async fn create_backup_for_instance() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/instances/db-1/backups"))
            .and(body_json(json!({"name": "nightly"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "bk-1",
                "name": "nightly",
                "status": "BUILDING",
                "instance_id": "db-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = CreateBackupRequest {
            name: "nightly".into(),
            node_id: None,
        };
        let backup = database(&server)
            .backups()
            .create(&Context::new(), "db-1", &request)
            .await
            .unwrap();
        assert_eq!(backup.name, request.name);
        assert_eq!(backup.instance_id, "db-1");
    }

    #[tokio::test]
    async fn create_configuration_echoes_values() {
        let server = MockServer::start().await;
        let mut values = serde_json::Map::new();
        values.insert("max_connections".into(), json!(500));
        Mock::given(method("POST"))
            .and(path("/configurations"))
            .and(body_json(json!({
                "name": "tuned",
                "datastore": {"type": "MySQL", "version": "8.0"},
                "values": {"max_connections": 500}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "cfg-1",
                "name": "tuned",
                "values": {"max_connections": 500}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = CreateConfigurationRequest {
            name: "tuned".into(),
            datastore: Datastore {
                engine: "MySQL".into(),
                version: "8.0".into(),
            },
            values,
        };
        let configuration = database(&server)
            .configurations()
            .create(&Context::new(), &request)
            .await
            .unwrap();
        assert_eq!(configuration.values, request.values);
    }

    #[tokio::test]
    async fn delete_then_get_backup_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/backups/bk-1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/backups/bk-1"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "backup not found"})),
            )
            .mount(&server)
            .await;

        let backups = database(&server).backups().clone();
        let ctx = Context::new();
        backups.delete(&ctx, "bk-1").await.unwrap();
        assert!(matches!(backups.get(&ctx, "bk-1").await, Err(Error::NotFound(_))));
        assert!(matches!(backups.get(&ctx, "").await, Err(Error::ValidationError(_))));
        assert!(matches!(backups.get(&ctx, "..").await, Err(Error::ValidationError(_))));
    }
}
