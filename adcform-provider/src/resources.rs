//! Resource and data source type definitions
//!
//! Every type is backed by its schema config; see [`crate::schemas`].

use adcform_core::provider::ResourceType;
use adcform_core::schema::ResourceSchema;

use crate::schemas::{AdcSchemaConfig, DataSourceConfig, configs, data_source_configs};

// =============================================================================
// Resource Type Definitions
// =============================================================================

/// A managed resource type
pub struct AdcResourceType {
    config: AdcSchemaConfig,
}

impl ResourceType for AdcResourceType {
    fn name(&self) -> &'static str {
        self.config.type_name
    }

    fn schema(&self) -> ResourceSchema {
        self.config.schema()
    }
}

/// A data source type
pub struct AdcDataSourceType {
    config: DataSourceConfig,
}

impl ResourceType for AdcDataSourceType {
    fn name(&self) -> &'static str {
        self.config.type_name
    }

    fn schema(&self) -> ResourceSchema {
        self.config.schema()
    }
}

/// Returns all managed resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    configs()
        .into_iter()
        .map(|config| Box::new(AdcResourceType { config }) as Box<dyn ResourceType>)
        .collect()
}

/// Returns all data source types supported by this provider
pub fn data_source_types() -> Vec<Box<dyn ResourceType>> {
    data_source_configs()
        .into_iter()
        .map(|config| Box::new(AdcDataSourceType { config }) as Box<dyn ResourceType>)
        .collect()
}
