//! Networking: VLANs, self IPs, static routes

use super::{AdcSchemaConfig, Endpoint, Field, FieldKind, Handler, Identity, Presence, Support};

const VLAN_FIELDS: &[Field] = &[
    Field::optional("tag", "tag", FieldKind::Int),
    Field::optional("mtu", "mtu", FieldKind::Int).default_int(1500),
    // [{"vlanport": "1.1", "tagged": true}]
    Field::local("interfaces", FieldKind::Objects, Presence::Optional),
    Field::optional("description", "description", FieldKind::String),
];

pub fn vlan_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "net_vlan",
        description: "A VLAN and its member interfaces",
        endpoint: Endpoint::Collection("/mgmt/tm/net/vlan"),
        identity: Identity::FullPath,
        fields: VLAN_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::Table,
    }
}

const SELFIP_FIELDS: &[Field] = &[
    Field::required("ip", "address", FieldKind::String),
    Field::required("vlan", "vlan", FieldKind::ObjectRef),
    Field::optional("traffic_group", "trafficGroup", FieldKind::ObjectRef)
        .default_str("traffic-group-local-only"),
    Field::optional("port_lockdown", "allowService", FieldKind::ServiceList),
    Field::computed("floating", "floating", FieldKind::EnabledDisabled),
];

pub fn selfip_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "net_selfip",
        description: "A self IP address bound to a VLAN",
        endpoint: Endpoint::Collection("/mgmt/tm/net/self"),
        identity: Identity::FullPath,
        fields: SELFIP_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::Table,
    }
}

const ROUTE_FIELDS: &[Field] = &[
    Field::required("network", "network", FieldKind::String),
    Field::optional("gw", "gw", FieldKind::String),
    Field::optional("tm_interface", "tmInterface", FieldKind::String),
    Field::optional("pool", "pool", FieldKind::String),
    Field::optional("mtu", "mtu", FieldKind::Int),
    Field::optional("description", "description", FieldKind::String),
];

pub fn route_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "net_route",
        description: "A static route",
        endpoint: Endpoint::Collection("/mgmt/tm/net/route"),
        identity: Identity::FullPath,
        fields: ROUTE_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::Table,
    }
}
