//! MQ Provider implementation
//!
//! Implements the core Provider trait on top of the uniform [`ControlApi`]
//! boundary. Every mutating operation submits the call, then runs a wait
//! built from the resource's lifecycle data before reporting the settled
//! state back to the caller.

use strato_core::provider::{BoxFuture, Provider, ProviderError, ProviderResult};
use strato_core::resource::{Resource, ResourceId, State};
use strato_core::wait::WaitSpec;

use crate::client::ControlApi;
use crate::config::MqConfig;
use crate::lifecycle::{Lifecycle, wait_for};
use crate::resources;

/// Provider for the message-queue control plane
pub struct MqProvider<C> {
    client: C,
    config: MqConfig,
}

impl<C: ControlApi> MqProvider<C> {
    pub fn new(client: C, config: MqConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn lifecycle_for(id: &ResourceId) -> ProviderResult<Lifecycle> {
        resources::for_type(&id.resource_type).ok_or_else(|| {
            ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
                .for_resource(id.clone())
        })
    }

    /// Apply deployment-level timings onto a lifecycle-built wait spec
    fn tune(&self, spec: WaitSpec) -> WaitSpec {
        spec.with_poll_interval(self.config.poll_interval())
            .with_delay(self.config.wait_delay())
    }

    async fn read_state(
        &self,
        id: ResourceId,
        identifier: Option<String>,
    ) -> ProviderResult<State> {
        // Without a remote identifier the resource cannot have been created
        let Some(identifier) = identifier else {
            return Ok(State::not_found(id));
        };
        let lifecycle = Self::lifecycle_for(&id)?;

        match self.client.describe(lifecycle.type_name, &identifier).await {
            Ok(properties) => Ok(State::existing(id, properties).with_identifier(identifier)),
            Err(err) if err.is_not_found() => Ok(State::not_found(id)),
            Err(err) => Err(ProviderError::new("Failed to describe resource")
                .with_cause(err)
                .for_resource(id)),
        }
    }

    async fn create_state(&self, resource: Resource) -> ProviderResult<State> {
        let lifecycle = Self::lifecycle_for(&resource.id)?;

        let identifier = self
            .client
            .create(lifecycle.type_name, resource.properties.clone())
            .await
            .map_err(|err| {
                ProviderError::new("Failed to create resource")
                    .with_cause(err)
                    .for_resource(resource.id.clone())
            })?;
        tracing::info!(resource = %resource.id, %identifier, "created, waiting until available");

        let spec = self.tune(lifecycle.creation_wait());
        wait_for(&self.client, &lifecycle, &identifier, &spec)
            .await
            .into_result()
            .map_err(|err| {
                ProviderError::new("Resource did not become available")
                    .with_cause(err)
                    .for_resource(resource.id.clone())
            })?;

        self.read_state(resource.id, Some(identifier)).await
    }

    async fn update_state(
        &self,
        id: ResourceId,
        identifier: String,
        to: Resource,
    ) -> ProviderResult<State> {
        let lifecycle = Self::lifecycle_for(&id)?;

        self.client
            .update(lifecycle.type_name, &identifier, to.properties.clone())
            .await
            .map_err(|err| {
                ProviderError::new("Failed to update resource")
                    .with_cause(err)
                    .for_resource(id.clone())
            })?;
        tracing::info!(resource = %id, %identifier, "update submitted, waiting until settled");

        let spec = self.tune(lifecycle.update_wait());
        wait_for(&self.client, &lifecycle, &identifier, &spec)
            .await
            .into_result()
            .map_err(|err| {
                ProviderError::new("Resource did not settle after update")
                    .with_cause(err)
                    .for_resource(id.clone())
            })?;

        self.read_state(id, Some(identifier)).await
    }

    async fn delete_state(&self, id: ResourceId, identifier: String) -> ProviderResult<()> {
        let lifecycle = Self::lifecycle_for(&id)?;

        self.client
            .delete(lifecycle.type_name, &identifier)
            .await
            .map_err(|err| {
                ProviderError::new("Failed to delete resource")
                    .with_cause(err)
                    .for_resource(id.clone())
            })?;
        tracing::info!(resource = %id, %identifier, "delete submitted, waiting for removal");

        let spec = self.tune(lifecycle.deletion_wait());
        wait_for(&self.client, &lifecycle, &identifier, &spec)
            .await
            .into_result()
            .map_err(|err| {
                ProviderError::new("Resource was not removed")
                    .with_cause(err)
                    .for_resource(id.clone())
            })?;
        Ok(())
    }
}

impl<C: ControlApi> Provider for MqProvider<C> {
    fn name(&self) -> &'static str {
        "mq"
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(str::to_string);
        Box::pin(self.read_state(id, identifier))
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(self.create_state(resource))
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let to = to.clone();
        Box::pin(self.update_state(id, identifier, to))
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(self.delete_state(id, identifier))
    }
}
