//! System services: SNMP, DNS, NTP, administrative partitions

use super::{AdcSchemaConfig, Endpoint, Field, FieldKind, Handler, Identity, Support};

const SNMP_FIELDS: &[Field] = &[
    Field::optional("sys_contact", "sysContact", FieldKind::String),
    Field::optional("sys_location", "sysLocation", FieldKind::String),
    Field::optional("allowed_addresses", "allowedAddresses", FieldKind::StringList),
];

pub fn snmp_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "sys_snmp",
        description: "System SNMP agent settings",
        endpoint: Endpoint::Singleton("/mgmt/tm/sys/snmp"),
        identity: Identity::Singleton,
        fields: SNMP_FIELDS,
        update: Support::Supported,
        delete: Support::Unsupported,
        handler: Handler::Table,
    }
}

const SNMP_TRAPS_FIELDS: &[Field] = &[
    Field::required("host", "host", FieldKind::String),
    Field::optional("port", "port", FieldKind::Port).default_int(162),
    Field::optional("version", "version", FieldKind::String).default_str("2c"),
    Field::optional("community", "community", FieldKind::String).sensitive(),
    Field::optional("auth_protocol", "authProtocol", FieldKind::String),
    Field::optional("auth_password", "authPassword", FieldKind::String).sensitive(),
    Field::optional("privacy_protocol", "privacyProtocol", FieldKind::String),
    Field::optional("privacy_password", "privacyPassword", FieldKind::String).sensitive(),
    Field::optional("security_level", "securityLevel", FieldKind::String),
    Field::optional("security_name", "securityName", FieldKind::String),
    Field::optional("engine_id", "engineId", FieldKind::String),
    Field::optional("description", "description", FieldKind::String),
];

pub fn snmp_traps_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "sys_snmp_traps",
        description: "An SNMP trap destination",
        endpoint: Endpoint::Collection("/mgmt/tm/sys/snmp/traps"),
        identity: Identity::FullPath,
        fields: SNMP_TRAPS_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::Table,
    }
}

const DNS_FIELDS: &[Field] = &[
    Field::optional("name_servers", "nameServers", FieldKind::StringList),
    Field::optional("search", "search", FieldKind::StringList),
    Field::optional("number_of_dots", "numberOfDots", FieldKind::Int),
    Field::optional("description", "description", FieldKind::String),
];

pub fn dns_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "sys_dns",
        description: "System DNS resolver settings",
        endpoint: Endpoint::Singleton("/mgmt/tm/sys/dns"),
        identity: Identity::Singleton,
        fields: DNS_FIELDS,
        update: Support::Supported,
        delete: Support::Unsupported,
        handler: Handler::Table,
    }
}

const NTP_FIELDS: &[Field] = &[
    Field::optional("servers", "servers", FieldKind::StringList),
    Field::optional("timezone", "timezone", FieldKind::String),
    Field::optional("description", "description", FieldKind::String),
];

pub fn ntp_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "sys_ntp",
        description: "System NTP settings",
        endpoint: Endpoint::Singleton("/mgmt/tm/sys/ntp"),
        identity: Identity::Singleton,
        fields: NTP_FIELDS,
        update: Support::Supported,
        delete: Support::Unsupported,
        handler: Handler::Table,
    }
}

const PARTITION_FIELDS: &[Field] = &[
    Field::optional("route_domain_id", "defaultRouteDomain", FieldKind::Int).default_int(0),
    Field::optional("description", "description", FieldKind::String),
];

pub fn partition_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "sys_partition",
        description: "An administrative partition",
        endpoint: Endpoint::Collection("/mgmt/tm/auth/partition"),
        identity: Identity::Name,
        fields: PARTITION_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::Table,
    }
}
