//! Device cluster management

use super::{AdcSchemaConfig, Endpoint, Field, FieldKind, Handler, Identity, Support};

const DEVICE_FIELDS: &[Field] = &[
    Field::required("configsync_ip", "configsyncIp", FieldKind::String),
    Field::optional("mirror_ip", "mirrorIp", FieldKind::String),
    Field::optional("mirror_secondary_ip", "mirrorSecondaryIp", FieldKind::String),
    Field::optional("description", "description", FieldKind::String),
    Field::computed("failover_state", "failoverState", FieldKind::String),
];

pub fn device_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "cm_device",
        description: "A device trust member with its config-sync and mirroring addresses",
        endpoint: Endpoint::Collection("/mgmt/tm/cm/device"),
        identity: Identity::FullPath,
        fields: DEVICE_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::Table,
    }
}

const DEVICEGROUP_FIELDS: &[Field] = &[
    Field::optional("type", "type", FieldKind::String).default_str("sync-only"),
    Field::optional("auto_sync", "autoSync", FieldKind::EnabledDisabled).default_bool(false),
    Field::optional("network_failover", "networkFailover", FieldKind::EnabledDisabled),
    Field::optional(
        "incremental_config_sync_size_max",
        "incrementalConfigSyncSizeMax",
        FieldKind::Int,
    )
    .default_int(1024),
    Field::optional("devices", "devices", FieldKind::NameList),
    Field::optional("description", "description", FieldKind::String),
];

pub fn devicegroup_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "cm_devicegroup",
        description: "A sync-only or sync-failover device group",
        endpoint: Endpoint::Collection("/mgmt/tm/cm/device-group"),
        identity: Identity::FullPath,
        fields: DEVICEGROUP_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::Table,
    }
}
