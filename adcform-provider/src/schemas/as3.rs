//! AS3 declarations and the data sources that assemble them

use super::{
    AdcSchemaConfig, DataSourceConfig, DataSourceKind, Endpoint, Field, FieldKind, Handler,
    Identity, Presence, Support,
};

const AS3_FIELDS: &[Field] = &[
    Field::local("as3_json", FieldKind::Json, Presence::Required),
    Field::local("tenant_list", FieldKind::StringList, Presence::Computed),
];

pub fn as3_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "as3",
        description: "An AS3 declaration posted atomically; identified by its tenant list",
        endpoint: Endpoint::Handler,
        identity: Identity::Handler,
        fields: AS3_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::As3,
    }
}

const FRAGMENT: Field = Field::local("fragment", FieldKind::Json, Presence::Computed);

const POOL_FIELDS: &[Field] = &[
    Field::local("name", FieldKind::String, Presence::Required),
    // Each member: {"service_port": 80, "server_addresses": [...]} or a
    // "discovery" entry holding a service_discovery fragment
    Field::local("members", FieldKind::Objects, Presence::Optional),
    Field::local("monitors", FieldKind::StringList, Presence::Optional),
    Field::local("load_balancing_mode", FieldKind::String, Presence::Optional),
    Field::local("minimum_members_active", FieldKind::Int, Presence::Optional),
    Field::local("remark", FieldKind::String, Presence::Optional),
    Field::local("pool_json", FieldKind::String, Presence::Computed),
    FRAGMENT,
];

pub fn pool_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "as3_pool",
        description: "Build an AS3 Pool fragment",
        fields: POOL_FIELDS,
        kind: DataSourceKind::Builder,
    }
}

const SERVICE_FIELDS: &[Field] = &[
    Field::local("name", FieldKind::String, Presence::Required),
    Field::local("service_type", FieldKind::String, Presence::Optional)
        .default_str("Service_HTTP"),
    Field::local("virtual_addresses", FieldKind::StringList, Presence::Required),
    Field::local("virtual_port", FieldKind::Port, Presence::Optional),
    Field::local("pool", FieldKind::String, Presence::Optional),
    Field::local("irules", FieldKind::StringList, Presence::Optional),
    Field::local("persistence_methods", FieldKind::StringList, Presence::Optional),
    Field::local("snat", FieldKind::String, Presence::Optional),
    Field::local("server_tls", FieldKind::String, Presence::Optional),
    Field::local("client_tls", FieldKind::String, Presence::Optional),
    Field::local("redirect80", FieldKind::Bool, Presence::Optional),
    Field::local("remark", FieldKind::String, Presence::Optional),
    Field::local("service_json", FieldKind::String, Presence::Computed),
    FRAGMENT,
];

pub fn service_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "as3_service",
        description: "Build an AS3 Service_* fragment",
        fields: SERVICE_FIELDS,
        kind: DataSourceKind::Builder,
    }
}

const CERTIFICATE_FIELDS: &[Field] = &[
    Field::local("name", FieldKind::String, Presence::Required),
    Field::local("certificate", FieldKind::String, Presence::Required),
    Field::local("private_key", FieldKind::String, Presence::Optional).sensitive(),
    Field::local("chain_ca", FieldKind::String, Presence::Optional),
    Field::local("remark", FieldKind::String, Presence::Optional),
    Field::local("certificate_json", FieldKind::String, Presence::Computed).sensitive(),
    FRAGMENT.sensitive(),
];

pub fn certificate_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "as3_certificate",
        description: "Build an AS3 Certificate fragment",
        fields: CERTIFICATE_FIELDS,
        kind: DataSourceKind::Builder,
    }
}

const APPLICATION_FIELDS: &[Field] = &[
    Field::local("name", FieldKind::String, Presence::Required),
    Field::local("template", FieldKind::String, Presence::Optional).default_str("generic"),
    Field::local("fragments", FieldKind::JsonList, Presence::Optional),
    Field::local("remark", FieldKind::String, Presence::Optional),
    Field::local("application_json", FieldKind::String, Presence::Computed),
    FRAGMENT,
];

pub fn application_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "as3_application",
        description: "Assemble pool, service and certificate fragments into an Application",
        fields: APPLICATION_FIELDS,
        kind: DataSourceKind::Builder,
    }
}

const TENANT_FIELDS: &[Field] = &[
    Field::local("name", FieldKind::String, Presence::Required),
    Field::local("applications", FieldKind::JsonList, Presence::Optional),
    Field::local("remark", FieldKind::String, Presence::Optional),
    Field::local("tenant_json", FieldKind::String, Presence::Computed),
    FRAGMENT,
];

pub fn tenant_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "as3_tenant",
        description: "Assemble application fragments into a Tenant",
        fields: TENANT_FIELDS,
        kind: DataSourceKind::Builder,
    }
}

const ADC_FIELDS: &[Field] = &[
    Field::local("tenants", FieldKind::JsonList, Presence::Optional),
    Field::local("id", FieldKind::String, Presence::Optional).default_str("adcform"),
    Field::local("label", FieldKind::String, Presence::Optional),
    Field::local("remark", FieldKind::String, Presence::Optional),
    Field::local("schema_version", FieldKind::String, Presence::Optional).default_str("3.36.0"),
    Field::local("persist", FieldKind::Bool, Presence::Optional).default_bool(true),
    Field::local("as3_json", FieldKind::String, Presence::Computed),
    Field::local("tenant_list", FieldKind::StringList, Presence::Computed),
];

pub fn adc_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "as3_adc",
        description: "Assemble tenant fragments into a complete AS3 declaration",
        fields: ADC_FIELDS,
        kind: DataSourceKind::Builder,
    }
}

const SERVICE_DISCOVERY_FIELDS: &[Field] = &[
    Field::local("address_discovery", FieldKind::String, Presence::Required),
    Field::local("service_port", FieldKind::Port, Presence::Required),
    Field::local("update_interval", FieldKind::Int, Presence::Optional).default_int(60),
    Field::local("address_realm", FieldKind::String, Presence::Optional),
    Field::local("tag_key", FieldKind::String, Presence::Optional),
    Field::local("tag_value", FieldKind::String, Presence::Optional),
    Field::local("region", FieldKind::String, Presence::Optional),
    Field::local("role_arn", FieldKind::String, Presence::Optional),
    Field::local("access_key_id", FieldKind::String, Presence::Optional),
    Field::local("secret_access_key", FieldKind::String, Presence::Optional).sensitive(),
    Field::local("resource_group", FieldKind::String, Presence::Optional),
    Field::local("subscription_id", FieldKind::String, Presence::Optional),
    Field::local("directory_id", FieldKind::String, Presence::Optional),
    Field::local("application_id", FieldKind::String, Presence::Optional),
    Field::local("api_access_key", FieldKind::String, Presence::Optional).sensitive(),
    Field::local("resource_type", FieldKind::String, Presence::Optional),
    Field::local("resource_id", FieldKind::String, Presence::Optional),
    Field::local("project_id", FieldKind::String, Presence::Optional),
    Field::local("encoded_credentials", FieldKind::String, Presence::Optional).sensitive(),
    Field::local("uri", FieldKind::String, Presence::Optional),
    Field::local("encoded_token", FieldKind::String, Presence::Optional).sensitive(),
    Field::local("reject_unauthorized", FieldKind::Bool, Presence::Optional),
    Field::local("discovery_json", FieldKind::String, Presence::Computed).sensitive(),
    FRAGMENT.sensitive(),
];

pub fn service_discovery_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "service_discovery",
        description: "Build a cloud service-discovery pool member block",
        fields: SERVICE_DISCOVERY_FIELDS,
        kind: DataSourceKind::Builder,
    }
}
