//! iRules LX workspaces

use super::{AdcSchemaConfig, Endpoint, Field, FieldKind, Handler, Identity, Support};

const WORKSPACE_FIELDS: &[Field] = &[
    Field::computed("staged_directory", "stagedDirectory", FieldKind::String),
    Field::computed("version", "version", FieldKind::String),
];

pub fn workspace_config() -> AdcSchemaConfig {
    AdcSchemaConfig {
        type_name: "ilx_workspace",
        description: "An iRules LX workspace; the appliance cannot modify one in place",
        endpoint: Endpoint::Collection("/mgmt/tm/ilx/workspace"),
        identity: Identity::FullPath,
        fields: WORKSPACE_FIELDS,
        update: Support::Unsupported,
        delete: Support::Supported,
        handler: Handler::Table,
    }
}
