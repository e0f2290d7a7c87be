//! Local traffic manager: nodes, pools, pool members, monitors, virtual servers, iRules

use super::{
    AdcSchemaConfig, DataSourceConfig, DataSourceKind, Endpoint, Field, FieldKind, Handler,
    Identity, Presence, Support,
};

const NODE_FIELDS: &[Field] = &[
    Field::required("address", "address", FieldKind::String),
    Field::optional("connection_limit", "connectionLimit", FieldKind::Int).default_int(0),
    Field::optional("dynamic_ratio", "dynamicRatio", FieldKind::Int).default_int(1),
    Field::optional("ratio", "ratio", FieldKind::Int).default_int(1),
    Field::optional("rate_limit", "rateLimit", FieldKind::String).default_str("disabled"),
    Field::optional("monitor", "monitor", FieldKind::String),
    Field::optional("description", "description", FieldKind::String),
    Field::computed("session", "session", FieldKind::String),
    Field::computed("state", "state", FieldKind::String),
];

pub fn node_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "ltm_node",
        description: "A pool member host addressed by IP or FQDN",
        endpoint: Endpoint::Collection("/mgmt/tm/ltm/node"),
        identity: Identity::FullPath,
        fields: NODE_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::Table,
    }
}

const POOL_FIELDS: &[Field] = &[
    Field::optional("allow_nat", "allowNat", FieldKind::YesNo).default_bool(true),
    Field::optional("allow_snat", "allowSnat", FieldKind::YesNo).default_bool(true),
    Field::optional("load_balancing_mode", "loadBalancingMode", FieldKind::String)
        .default_str("round-robin"),
    Field::optional("monitors", "monitor", FieldKind::AndList),
    Field::optional("slow_ramp_time", "slowRampTime", FieldKind::Int).default_int(10),
    Field::optional("reselect_tries", "reselectTries", FieldKind::Int).default_int(0),
    Field::optional("service_down_action", "serviceDownAction", FieldKind::String)
        .default_str("none"),
    Field::optional("min_active_members", "minActiveMembers", FieldKind::Int).default_int(0),
    Field::optional("description", "description", FieldKind::String),
];

pub fn pool_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "ltm_pool",
        description: "A load-balancing pool",
        endpoint: Endpoint::Collection("/mgmt/tm/ltm/pool"),
        identity: Identity::FullPath,
        fields: POOL_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::Table,
    }
}

const POOL_ATTACHMENT_FIELDS: &[Field] = &[
    Field::local("pool", FieldKind::String, Presence::Required),
    Field::local("node", FieldKind::String, Presence::Required),
    Field::optional("ratio", "ratio", FieldKind::Int),
    Field::optional("priority_group", "priorityGroup", FieldKind::Int),
    Field::optional("connection_limit", "connectionLimit", FieldKind::Int),
    Field::optional("dynamic_ratio", "dynamicRatio", FieldKind::Int),
    Field::optional("monitor", "monitor", FieldKind::String),
];

pub fn pool_attachment_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "ltm_pool_attachment",
        description: "Membership of a node (\"/Common/10.0.0.1:80\") in a pool",
        endpoint: Endpoint::Handler,
        identity: Identity::Handler,
        fields: POOL_ATTACHMENT_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::PoolAttachment,
    }
}

/// Monitor types probed when a monitor is read by name alone
pub const MONITOR_TYPES: &[&str] = &[
    "http",
    "https",
    "tcp",
    "tcp-half-open",
    "udp",
    "icmp",
    "gateway-icmp",
    "ftp",
    "ldap",
    "mysql",
    "postgresql",
    "external",
];

const MONITOR_FIELDS: &[Field] = &[
    Field::required("parent", "defaultsFrom", FieldKind::String),
    Field::optional("interval", "interval", FieldKind::Int).default_int(5),
    Field::optional("timeout", "timeout", FieldKind::Int).default_int(16),
    Field::optional("time_until_up", "timeUntilUp", FieldKind::Int).default_int(0),
    Field::optional("send", "send", FieldKind::String),
    Field::optional("receive", "recv", FieldKind::String),
    Field::optional("receive_disable", "recvDisable", FieldKind::String),
    Field::optional("destination", "destination", FieldKind::String).default_str("*:*"),
    Field::optional("reverse", "reverse", FieldKind::EnabledDisabled),
    Field::optional("transparent", "transparent", FieldKind::EnabledDisabled),
    Field::optional("manual_resume", "manualResume", FieldKind::EnabledDisabled),
    Field::optional("ip_dscp", "ipDscp", FieldKind::Int),
    Field::optional("username", "username", FieldKind::String),
    Field::optional("password", "password", FieldKind::String).sensitive(),
    Field::optional("description", "description", FieldKind::String),
];

pub fn monitor_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "ltm_monitor",
        description: "A health monitor derived from a parent monitor (e.g., /Common/http)",
        endpoint: Endpoint::Monitor,
        identity: Identity::FullPath,
        fields: MONITOR_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::Table,
    }
}

const VIRTUAL_SERVER_FIELDS: &[Field] = &[
    Field::local("destination", FieldKind::String, Presence::Required),
    Field::local("port", FieldKind::Port, Presence::Required),
    Field::optional("source", "source", FieldKind::String).default_str("0.0.0.0/0"),
    Field::optional("mask", "mask", FieldKind::String),
    Field::optional("pool", "pool", FieldKind::String),
    Field::optional("ip_protocol", "ipProtocol", FieldKind::String).default_str("tcp"),
    Field::optional("profiles", "profiles", FieldKind::NameList),
    Field::optional("irules", "rules", FieldKind::StringList),
    Field::optional("persistence_profiles", "persist", FieldKind::NameList),
    Field::optional(
        "fallback_persistence_profile",
        "fallbackPersistence",
        FieldKind::String,
    ),
    Field::optional("policies", "policies", FieldKind::NameList),
    Field::optional("vlans", "vlans", FieldKind::StringList),
    Field::local("vlans_enabled", FieldKind::Bool, Presence::Optional),
    Field::optional("translate_address", "translateAddress", FieldKind::EnabledDisabled)
        .default_bool(true),
    Field::optional("translate_port", "translatePort", FieldKind::EnabledDisabled)
        .default_bool(true),
    Field::local(
        "source_address_translation",
        FieldKind::String,
        Presence::Optional,
    ),
    Field::local("snatpool", FieldKind::String, Presence::Optional),
    Field::optional("description", "description", FieldKind::String),
];

pub fn virtual_server_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "ltm_virtual_server",
        description: "A virtual server listening on destination:port",
        endpoint: Endpoint::Collection("/mgmt/tm/ltm/virtual"),
        identity: Identity::FullPath,
        fields: VIRTUAL_SERVER_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::Table,
    }
}

const IRULE_FIELDS: &[Field] = &[Field::required("irule", "apiAnonymous", FieldKind::String)];

pub fn irule_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "ltm_irule",
        description: "An iRule (TCL event script)",
        endpoint: Endpoint::Collection("/mgmt/tm/ltm/rule"),
        identity: Identity::FullPath,
        fields: IRULE_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::Table,
    }
}

pub fn pool_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "ltm_pool",
        description: "Look up an existing pool",
        fields: &[],
        kind: DataSourceKind::Lookup(pool_config),
    }
}

pub fn node_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "ltm_node",
        description: "Look up an existing node",
        fields: &[],
        kind: DataSourceKind::Lookup(node_config),
    }
}

pub fn irule_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "ltm_irule",
        description: "Look up an existing iRule",
        fields: &[],
        kind: DataSourceKind::Lookup(irule_config),
    }
}

pub fn monitor_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "ltm_monitor",
        description: "Look up an existing monitor of any type",
        fields: &[],
        kind: DataSourceKind::Lookup(monitor_config),
    }
}
