//! Effect - A side effect described as a value
//!
//! Effects are produced by the differ and only executed by the interpreter.

use crate::resource::{Resource, ResourceId, State};

/// A single operation against the appliance
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Evaluate a data source
    Read(Resource),
    /// Create a resource
    Create(Resource),
    /// Modify an existing resource
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Remove a resource known by its appliance identifier
    Delete { id: ResourceId, identifier: String },
}

impl Effect {
    /// Returns true if this Effect changes the appliance
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(r) | Effect::Create(r) => &r.id,
            Effect::Update { id, .. } | Effect::Delete { id, .. } => id,
        }
    }
}
