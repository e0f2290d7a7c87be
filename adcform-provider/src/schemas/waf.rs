//! Web application firewall policies and their building blocks

use super::{
    AdcSchemaConfig, DataSourceConfig, DataSourceKind, Endpoint, Field, FieldKind, Handler,
    Identity, Presence, Support,
};

const POLICY_FIELDS: &[Field] = &[
    Field::optional("enforcement_mode", "enforcementMode", FieldKind::String)
        .default_str("blocking"),
    Field::optional("application_language", "applicationLanguage", FieldKind::String)
        .default_str("utf-8"),
    Field::optional("case_insensitive", "caseInsensitive", FieldKind::Bool).default_bool(false),
    Field::optional("type", "type", FieldKind::String).default_str("security"),
    Field::optional("description", "description", FieldKind::String),
    // Entities produced by waf_entity_url / waf_entity_parameter / waf_signatures
    Field::local("urls", FieldKind::JsonList, Presence::Optional),
    Field::local("parameters", FieldKind::JsonList, Presence::Optional),
    Field::local("signatures", FieldKind::JsonList, Presence::Optional),
    Field::computed("policy_id", "id", FieldKind::String),
    Field::local("policy_export_json", FieldKind::String, Presence::Computed),
];

pub fn policy_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "waf_policy",
        description: "An application security policy with its URL and parameter entities",
        endpoint: Endpoint::Handler,
        identity: Identity::FullPath,
        fields: POLICY_FIELDS,
        update: Support::Supported,
        delete: Support::Supported,
        handler: Handler::WafPolicy,
    }
}

const JSON_OUTPUT: Field = Field::local("json", FieldKind::String, Presence::Computed);

const URL_FIELDS: &[Field] = &[
    Field::local("name", FieldKind::String, Presence::Required),
    Field::local("description", FieldKind::String, Presence::Optional),
    Field::local("type", FieldKind::String, Presence::Optional).default_str("explicit"),
    Field::local("protocol", FieldKind::String, Presence::Optional).default_str("http"),
    Field::local("method", FieldKind::String, Presence::Optional).default_str("*"),
    Field::local("perform_staging", FieldKind::Bool, Presence::Optional).default_bool(false),
    Field::local("signature_overrides_disable", FieldKind::IntList, Presence::Optional),
    Field::local("method_overrides_allow", FieldKind::StringList, Presence::Optional),
    Field::local("method_overrides_disallow", FieldKind::StringList, Presence::Optional),
    JSON_OUTPUT,
];

pub fn entity_url_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "waf_entity_url",
        description: "Build a WAF URL entity",
        fields: URL_FIELDS,
        kind: DataSourceKind::Builder,
    }
}

const PARAMETER_FIELDS: &[Field] = &[
    Field::local("name", FieldKind::String, Presence::Required),
    Field::local("description", FieldKind::String, Presence::Optional),
    Field::local("type", FieldKind::String, Presence::Optional).default_str("explicit"),
    Field::local("value_type", FieldKind::String, Presence::Optional).default_str("user-input"),
    Field::local("level", FieldKind::String, Presence::Optional).default_str("global"),
    Field::local("url", FieldKind::String, Presence::Optional),
    Field::local("allow_empty_type", FieldKind::Bool, Presence::Optional).default_bool(true),
    Field::local("allow_repeated_parameter_name", FieldKind::Bool, Presence::Optional)
        .default_bool(true),
    Field::local("attack_signatures_check", FieldKind::Bool, Presence::Optional)
        .default_bool(true),
    Field::local("perform_staging", FieldKind::Bool, Presence::Optional).default_bool(false),
    Field::local("is_base64", FieldKind::Bool, Presence::Optional).default_bool(false),
    Field::local("is_cookie", FieldKind::Bool, Presence::Optional).default_bool(false),
    Field::local("is_header", FieldKind::Bool, Presence::Optional).default_bool(false),
    Field::local("mandatory", FieldKind::Bool, Presence::Optional).default_bool(false),
    Field::local("sensitive_parameter", FieldKind::Bool, Presence::Optional).default_bool(false),
    Field::local("signature_overrides_disable", FieldKind::IntList, Presence::Optional),
    JSON_OUTPUT,
];

pub fn entity_parameter_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "waf_entity_parameter",
        description: "Build a WAF parameter entity",
        fields: PARAMETER_FIELDS,
        kind: DataSourceKind::Builder,
    }
}

const SIGNATURE_FIELDS: &[Field] = &[
    Field::local("signature_id", FieldKind::Int, Presence::Required),
    Field::local("enabled", FieldKind::Bool, Presence::Optional).default_bool(true),
    Field::local("perform_staging", FieldKind::Bool, Presence::Optional).default_bool(true),
    Field::local("name", FieldKind::String, Presence::Computed),
    Field::local("system_signature_id", FieldKind::String, Presence::Computed),
    Field::local("signature_type", FieldKind::String, Presence::Computed),
    Field::local("accuracy", FieldKind::String, Presence::Computed),
    Field::local("risk", FieldKind::String, Presence::Computed),
    JSON_OUTPUT,
];

pub fn signatures_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "waf_signatures",
        description: "Read an attack signature and build the policy signature entry",
        fields: SIGNATURE_FIELDS,
        kind: DataSourceKind::Builder,
    }
}

const SUGGESTION_FIELDS: &[Field] = &[
    Field::local("policy_name", FieldKind::String, Presence::Required),
    Field::local("minimum_learning_score", FieldKind::Int, Presence::Optional).default_int(0),
    Field::local("policy_id", FieldKind::String, Presence::Computed),
    JSON_OUTPUT,
];

pub fn pb_suggestions_data_config() -> DataSourceConfig {
    DataSourceConfig {
        type_name: "waf_pb_suggestions",
        description: "Export policy-builder suggestions for a policy",
        fields: SUGGESTION_FIELDS,
        kind: DataSourceKind::Builder,
    }
}
