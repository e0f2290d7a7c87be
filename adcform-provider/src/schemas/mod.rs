//! Appliance resource and data source schemas
//!
//! Every type is described by a static field table. The same table drives
//! schema validation, the request body sent to the appliance, and the
//! read-back of observed attributes.

pub mod as3;
pub mod cm;
pub mod ilx;
pub mod ltm;
pub mod net;
pub mod ssl;
pub mod sys;
pub mod waf;

use adcform_core::resource::Value;
use adcform_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

/// Wire encoding of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    /// Appliance object name; the default partition prefix is dropped on read
    ObjectRef,
    Int,
    /// Int restricted to 0-65535
    Port,
    Bool,
    StringList,
    IntList,
    /// Bool sent as "yes" / "no"
    YesNo,
    /// Bool sent as "enabled" / "disabled"
    EnabledDisabled,
    /// List sent as "a and b" (monitor rules)
    AndList,
    /// List sent as [{"name": a}, {"name": b}]
    NameList,
    /// List sent as a bare string when it holds only "all", "none" or "default"
    ServiceList,
    /// List of nested objects
    Objects,
    /// JSON document, structured or as text
    Json,
    /// List of JSON documents
    JsonList,
}

/// Who sets a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    Computed,
}

/// Schema default for a field
#[derive(Debug, Clone, Copy)]
pub enum Fallback {
    None,
    Str(&'static str),
    Int(i64),
    Bool(bool),
}

/// One row of a field-mapping table
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// Configuration attribute name
    pub name: &'static str,
    /// Appliance property name; `None` when a handler maps the field itself
    pub api: Option<&'static str>,
    pub kind: FieldKind,
    pub presence: Presence,
    pub fallback: Fallback,
    pub sensitive: bool,
}

impl Field {
    pub const fn required(name: &'static str, api: &'static str, kind: FieldKind) -> Self {
        Self::new(name, Some(api), kind, Presence::Required)
    }

    pub const fn optional(name: &'static str, api: &'static str, kind: FieldKind) -> Self {
        Self::new(name, Some(api), kind, Presence::Optional)
    }

    pub const fn computed(name: &'static str, api: &'static str, kind: FieldKind) -> Self {
        Self::new(name, Some(api), kind, Presence::Computed)
    }

    /// Field with no direct appliance property
    pub const fn local(name: &'static str, kind: FieldKind, presence: Presence) -> Self {
        Self::new(name, None, kind, presence)
    }

    const fn new(
        name: &'static str,
        api: Option<&'static str>,
        kind: FieldKind,
        presence: Presence,
    ) -> Self {
        Self {
            name,
            api,
            kind,
            presence,
            fallback: Fallback::None,
            sensitive: false,
        }
    }

    pub const fn default_str(self, value: &'static str) -> Self {
        Self {
            fallback: Fallback::Str(value),
            ..self
        }
    }

    pub const fn default_int(self, value: i64) -> Self {
        Self {
            fallback: Fallback::Int(value),
            ..self
        }
    }

    pub const fn default_bool(self, value: bool) -> Self {
        Self {
            fallback: Fallback::Bool(value),
            ..self
        }
    }

    pub const fn sensitive(self) -> Self {
        Self {
            sensitive: true,
            ..self
        }
    }

    pub fn is_computed(&self) -> bool {
        self.presence == Presence::Computed
    }

    pub fn attribute_type(&self) -> AttributeType {
        match self.kind {
            FieldKind::String => AttributeType::String,
            FieldKind::Int => AttributeType::Int,
            FieldKind::ObjectRef => types::object_name(),
            FieldKind::Port => types::port(),
            FieldKind::Bool | FieldKind::YesNo | FieldKind::EnabledDisabled => AttributeType::Bool,
            FieldKind::StringList
            | FieldKind::AndList
            | FieldKind::NameList
            | FieldKind::ServiceList => AttributeType::List(Box::new(AttributeType::String)),
            FieldKind::IntList => AttributeType::List(Box::new(AttributeType::Int)),
            FieldKind::Objects => {
                AttributeType::List(Box::new(AttributeType::Map(Box::new(AttributeType::Any))))
            }
            FieldKind::Json => AttributeType::Json,
            FieldKind::JsonList => AttributeType::List(Box::new(AttributeType::Json)),
        }
    }

    pub fn to_schema(&self) -> AttributeSchema {
        let mut schema = AttributeSchema::new(self.name, self.attribute_type());
        if let Some(api) = self.api {
            schema = schema.with_provider_name(api);
        }
        match self.presence {
            Presence::Required => schema = schema.required(),
            Presence::Computed => schema = schema.computed(),
            Presence::Optional => {}
        }
        if self.sensitive {
            schema = schema.sensitive();
        }
        match self.fallback {
            Fallback::None => schema,
            Fallback::Str(s) => schema.with_default(Value::String(s.to_string())),
            Fallback::Int(i) => schema.with_default(Value::Int(i)),
            Fallback::Bool(b) => schema.with_default(Value::Bool(b)),
        }
    }
}

/// REST location of a table-driven resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Collection of named objects (POST to create, PUT/DELETE on members)
    Collection(&'static str),
    /// A single system object that always exists (PUT only)
    Singleton(&'static str),
    /// `/mgmt/tm/ltm/monitor/<parent type>`
    Monitor,
    /// Paths owned by a dedicated handler
    Handler,
}

/// How a resource is identified on the appliance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// `name` is the full path (e.g., "/Common/web")
    FullPath,
    /// `name` is a plain name (partitions)
    Name,
    /// `name` plus `partition` (default "Common")
    PartitionedName,
    /// Fixed identifier of a singleton
    Singleton,
    /// Identifier built by the handler
    Handler,
}

/// Whether the appliance offers an API for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    Supported,
    Unsupported,
}

/// Which code path performs CRUD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Table,
    PoolAttachment,
    Certificate,
    Key,
    As3,
    WafPolicy,
}

/// Appliance schema configuration of a managed resource
pub struct AdcSchemaConfig {
    pub type_name: &'static str,
    pub description: &'static str,
    pub endpoint: Endpoint,
    pub identity: Identity,
    pub fields: &'static [Field],
    pub update: Support,
    pub delete: Support,
    pub handler: Handler,
}

impl AdcSchemaConfig {
    pub fn schema(&self) -> ResourceSchema {
        let mut schema = ResourceSchema::new(self.type_name).with_description(self.description);
        for attr in identity_attributes(self.identity) {
            schema = schema.attribute(attr);
        }
        for field in self.fields {
            schema = schema.attribute(field.to_schema());
        }
        schema
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn identity_attributes(identity: Identity) -> Vec<AttributeSchema> {
    match identity {
        Identity::FullPath => vec![
            AttributeSchema::new("name", types::full_path())
                .required()
                .with_description("Full path of the object, e.g. /Common/web"),
        ],
        Identity::Name => vec![AttributeSchema::new("name", AttributeType::String).required()],
        Identity::PartitionedName => vec![
            AttributeSchema::new("name", AttributeType::String).required(),
            AttributeSchema::new("partition", AttributeType::String)
                .with_default(Value::String("Common".to_string())),
            AttributeSchema::new("full_path", AttributeType::String).computed(),
        ],
        Identity::Singleton | Identity::Handler => vec![],
    }
}

/// How a data source is evaluated
#[derive(Clone, Copy)]
pub enum DataSourceKind {
    /// Look up an existing object of a managed type by name and partition
    Lookup(fn() -> AdcSchemaConfig),
    /// Build a JSON document from arguments, optionally reading the appliance
    Builder,
}

/// Appliance schema configuration of a data source
pub struct DataSourceConfig {
    pub type_name: &'static str,
    pub description: &'static str,
    pub fields: &'static [Field],
    pub kind: DataSourceKind,
}

impl DataSourceConfig {
    pub fn schema(&self) -> ResourceSchema {
        let mut schema = ResourceSchema::new(self.type_name)
            .with_description(self.description)
            .with_read_only(true);

        if let DataSourceKind::Lookup(config) = self.kind {
            schema = schema
                .attribute(AttributeSchema::new("name", AttributeType::String).required())
                .attribute(
                    AttributeSchema::new("partition", AttributeType::String)
                        .with_default(Value::String("Common".to_string())),
                )
                .attribute(AttributeSchema::new("full_path", AttributeType::String).computed());
            for field in config().fields {
                if field.api.is_some() && !field.sensitive && field.name != "partition" {
                    schema = schema.attribute(field.to_schema().computed());
                }
            }
        }

        for field in self.fields {
            schema = schema.attribute(field.to_schema());
        }
        schema
    }
}

/// Returns all managed resource configs
pub fn configs() -> Vec<AdcSchemaConfig> {
    vec![
        ltm::node_config(),
        ltm::pool_config(),
        ltm::pool_attachment_config(),
        ltm::monitor_config(),
        ltm::virtual_server_config(),
        ltm::irule_config(),
        ssl::certificate_config(),
        ssl::key_config(),
        sys::snmp_config(),
        sys::snmp_traps_config(),
        sys::dns_config(),
        sys::ntp_config(),
        sys::partition_config(),
        net::vlan_config(),
        net::selfip_config(),
        net::route_config(),
        cm::device_config(),
        cm::devicegroup_config(),
        as3::as3_config(),
        waf::policy_config(),
        ilx::workspace_config(),
    ]
}

/// Returns all data source configs
pub fn data_source_configs() -> Vec<DataSourceConfig> {
    vec![
        ltm::pool_data_config(),
        ltm::node_data_config(),
        ltm::irule_data_config(),
        ltm::monitor_data_config(),
        ssl::certificate_data_config(),
        as3::pool_data_config(),
        as3::service_data_config(),
        as3::certificate_data_config(),
        as3::application_data_config(),
        as3::tenant_data_config(),
        as3::adc_data_config(),
        as3::service_discovery_data_config(),
        waf::entity_url_data_config(),
        waf::entity_parameter_data_config(),
        waf::signatures_data_config(),
        waf::pb_suggestions_data_config(),
    ]
}

/// Get the config of a managed resource type
pub fn get_config(resource_type: &str) -> Option<AdcSchemaConfig> {
    configs().into_iter().find(|c| c.type_name == resource_type)
}

/// Get the config of a data source type
pub fn get_data_source_config(resource_type: &str) -> Option<DataSourceConfig> {
    data_source_configs()
        .into_iter()
        .find(|c| c.type_name == resource_type)
}
