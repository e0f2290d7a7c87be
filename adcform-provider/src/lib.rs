//! adcform ADC Provider
//!
//! Provider for application delivery controllers managed over the iControl
//! REST management API.
//!
//! ## Module Structure
//!
//! - `client` - Authenticated HTTP client and file upload
//! - `config` - Connection settings (provider block and environment)
//! - `schemas` - Field tables for every resource and data source type
//! - `codec` - Field-table encoding to and from appliance JSON
//! - `provider` - AdcProvider implementation
//! - `handlers` - Resources whose lifecycle is not a flat field copy
//! - `data_sources` - Lookups and document builders
//! - `as3` / `discovery` / `waf` - Declarative document builders
//! - `utils` - Full path and destination helpers

pub mod as3;
pub mod client;
pub mod codec;
pub mod config;
pub mod data_sources;
pub mod discovery;
pub mod handlers;
pub mod provider;
pub mod resources;
pub mod schemas;
pub mod utils;
pub mod waf;

// Re-export main types
pub use client::{ApplianceClient, ClientError};
pub use config::ProviderConfig;
pub use provider::AdcProvider;

use adcform_core::provider::{BoxFuture, Provider, ProviderResult, ResourceType};
use adcform_core::resource::{Resource, ResourceId, State};

use resources::{data_source_types, resource_types};

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for AdcProvider {
    fn name(&self) -> &'static str {
        "adc"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resource_types()
    }

    fn data_source_types(&self) -> Vec<Box<dyn ResourceType>> {
        data_source_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move { self.read_resource(&id, identifier.as_deref()).await })
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { data_sources::evaluate(self.client(), &resource).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let to = to.clone();
        Box::pin(async move { self.update_resource(id, &identifier, to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }
}
