//! SSL certificates and keys uploaded to the appliance file store

use super::{
    AdcSchemaConfig, DataSourceConfig, DataSourceKind, Endpoint, Field, FieldKind, Handler,
    Identity, Presence, Support,
};

const CERTIFICATE_FIELDS: &[Field] = &[
    Field::local("content", FieldKind::String, Presence::Required),
    Field::computed("expiration_date", "expirationDate", FieldKind::Int),
    Field::computed("issuer", "issuer", FieldKind::String),
    Field::computed("subject", "subject", FieldKind::String),
    Field::computed("fingerprint", "fingerprint", FieldKind::String),
    Field::computed("key_type", "keyType", FieldKind::String),
];

pub fn certificate_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "ssl_certificate",
        description: "A PEM certificate uploaded and installed on the appliance",
        endpoint: Endpoint::Handler,
        identity: Identity::PartitionedName,
        fields: CERTIFICATE_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::Certificate,
    }
}

const KEY_FIELDS: &[Field] = &[
    Field::local("content", FieldKind::String, Presence::Required).sensitive(),
    Field::local("passphrase", FieldKind::String, Presence::Optional).sensitive(),
    Field::computed("key_type", "keyType", FieldKind::String),
    Field::computed("key_size", "keySize", FieldKind::Int),
    Field::computed("security_type", "securityType", FieldKind::String),
];

pub fn key_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "ssl_key",
        description: "A PEM private key uploaded and installed on the appliance",
        endpoint: Endpoint::Handler,
        identity: Identity::PartitionedName,
        fields: KEY_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::Key,
    }
}

pub fn certificate_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "ssl_certificate",
        description: "Look up an installed certificate",
        fields: &[],
        kind: DataSourceKind::Lookup(certificate_config),
    }
}
