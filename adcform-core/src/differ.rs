//! Differ - Compare desired state with current state to generate a Plan
//!
//! Compares the "desired state" declared in the configuration with the
//! "current state" observed on the appliance, and generates the list of
//! required Effects (Plan).

use std::collections::HashMap;

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Resource, ResourceId, State, Value};

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes);

    if changed.is_empty() {
        Diff::NoChange(desired.id.clone())
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find changed attributes between desired and current state
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, desired_value) in desired {
        match current.get(key) {
            Some(current_value) if values_equivalent(desired_value, current_value) => {}
            _ => changed.push(key.clone()),
        }
    }

    changed.sort();
    changed
}

/// Equality that ignores JSON formatting: two strings holding the same JSON
/// document, or a JSON string and the structured value it encodes, are equal.
pub fn values_equivalent(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (as_json_document(a), as_json_document(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn as_json_document(value: &Value) -> Option<serde_json::Value> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                serde_json::from_str(s).ok()
            } else {
                None
            }
        }
        Value::Map(_) | Value::List(_) if !value.has_refs() => value.to_json(),
        _ => None,
    }
}

/// Compute Diff for multiple resources and generate a Plan
///
/// Data sources never produce effects here; they are evaluated while the
/// current state is refreshed. `orphans` are states that are still recorded
/// but no longer declared, and are planned for deletion.
pub fn create_plan(
    desired: &[Resource],
    current_states: &HashMap<ResourceId, State>,
    orphans: &[State],
) -> Plan {
    let mut plan = Plan::new();

    for resource in desired.iter().filter(|r| !r.is_data_source()) {
        let current = current_states
            .get(&resource.id)
            .cloned()
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        match diff(resource, &current) {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Update {
                id,
                from,
                to,
                changed_attributes,
            } => {
                plan.add(Effect::Update {
                    id,
                    from,
                    to,
                    changed_attributes,
                });
            }
            Diff::NoChange(_) => {}
        }
    }

    for orphan in orphans {
        if let Some(identifier) = &orphan.identifier {
            plan.add(Effect::Delete {
                id: orphan.id.clone(),
                identifier: identifier.clone(),
            });
        }
    }

    plan
}
