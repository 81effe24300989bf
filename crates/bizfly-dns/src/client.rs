//! DNS façade.

use crate::models::{
    CreateZoneRequest, Record, RecordBody, RecordEnvelope, RecordRequest, Zone, ZonePage,
};
use crate::Result;
use bizfly_core::{path_segment, Client, Context, ListOptions, RequestSpec, ServiceName};

const SERVICE: ServiceName = ServiceName::Dns;

fn zone_path(id: &str) -> Result<String> {
    Ok(format!("/zones/{}", path_segment("zone id", id)?))
}

fn record_path(id: &str) -> Result<String> {
    Ok(format!("/records/{}", path_segment("record id", id)?))
}

/// Zone and record operations.
#[derive(Debug, Clone)]
pub struct Dns {
    client: Client,
}

impl Dns {
    /// Create the façade over a shared client.
    #[must_use]
    pub fn new(client: &Client) -> Self {
        Self {
            client: client.clone(),
        }
    }

    /// List one page of zones.
    pub async fn list_zones(&self, ctx: &Context, options: &ListOptions) -> Result<ZonePage> {
        self.client
            .call(ctx, RequestSpec::get(SERVICE, "/zones").list_options(options))
            .await
    }

    /// Fetch a zone, including its records.
    pub async fn get_zone(&self, ctx: &Context, id: &str) -> Result<Zone> {
        self.client
            .call(ctx, RequestSpec::get(SERVICE, zone_path(id)?))
            .await
    }

    /// Create a zone.
    pub async fn create_zone(&self, ctx: &Context, request: &CreateZoneRequest) -> Result<Zone> {
        self.client
            .call(ctx, RequestSpec::post(SERVICE, "/zones").json(request)?)
            .await
    }

    /// Delete a zone.
    pub async fn delete_zone(&self, ctx: &Context, id: &str) -> Result<()> {
        self.client
            .call_empty(ctx, RequestSpec::delete(SERVICE, zone_path(id)?))
            .await
    }

    /// Fetch a record.
    pub async fn get_record(&self, ctx: &Context, id: &str) -> Result<Record> {
        let envelope: RecordEnvelope = self
            .client
            .call(ctx, RequestSpec::get(SERVICE, record_path(id)?))
            .await?;
        Ok(envelope.into_record())
    }

    /// Create a record in a zone.
    pub async fn create_record(
        &self,
        ctx: &Context,
        zone_id: &str,
        request: &RecordRequest,
    ) -> Result<Record> {
        let path = format!("{}/records", zone_path(zone_id)?);
        let body = RecordBody { record: request };
        let envelope: RecordEnvelope = self
            .client
            .call(ctx, RequestSpec::post(SERVICE, path).json(&body)?)
            .await?;
        Ok(envelope.into_record())
    }

    /// Replace a record.
    pub async fn update_record(
        &self,
        ctx: &Context,
        id: &str,
        request: &RecordRequest,
    ) -> Result<Record> {
        let body = RecordBody { record: request };
        let envelope: RecordEnvelope = self
            .client
            .call(ctx, RequestSpec::put(SERVICE, record_path(id)?).json(&body)?)
            .await?;
        Ok(envelope.into_record())
    }

    /// Delete a record.
    pub async fn delete_record(&self, ctx: &Context, id: &str) -> Result<()> {
        self.client
            .call_empty(ctx, RequestSpec::delete(SERVICE, record_path(id)?))
            .await
    }
}
