//! Observed-state snapshot shared by plan and apply

use std::collections::{HashMap, HashSet};

use adcform_core::effect::Effect;
use adcform_core::interpreter::{EffectOutcome, Interpreter};
use adcform_core::provider::Provider;
use adcform_core::resource::{Resource, ResourceId, State, Value};
use adcform_state::{ResourceState, StateBackend, StateFile};
use log::debug;

/// Attributes visible to `${...}` references, keyed by binding
pub type Bindings = HashMap<String, HashMap<String, Value>>;

/// Declared objects resolved against what the appliance currently holds
#[derive(Debug, Default)]
pub struct Snapshot {
    pub bindings: Bindings,
    /// Managed resources with every known reference substituted
    pub desired: Vec<Resource>,
    /// Observed managed resources and evaluated data sources
    pub current: HashMap<ResourceId, State>,
    /// Data sources that can only be evaluated during apply
    pub deferred: Vec<Resource>,
    /// Bindings of objects that do not exist yet
    pub pending: HashSet<String>,
    /// Recorded objects no longer declared, in deletion order
    pub orphans: Vec<State>,
}

impl Snapshot {
    pub fn is_deferred(&self, id: &ResourceId) -> bool {
        self.deferred.iter().any(|r| &r.id == id)
    }
}

/// Read every declared object in dependency order
pub async fn refresh<P: Provider>(
    interpreter: &Interpreter<P>,
    sorted: &[Resource],
    recorded: &StateFile,
) -> Result<Snapshot, String> {
    let mut snapshot = Snapshot::default();

    for resource in sorted {
        let binding = resource.binding();

        if resource.is_data_source() {
            if resource
                .dependencies()
                .iter()
                .any(|dep| snapshot.pending.contains(dep))
            {
                debug!("deferring {} until apply", binding);
                snapshot.pending.insert(binding);
                snapshot.deferred.push(resource.clone());
                continue;
            }
            let state = evaluate(interpreter, resource.resolved(&snapshot.bindings)).await?;
            snapshot.bindings.insert(binding, state.attributes.clone());
            snapshot.current.insert(resource.id.clone(), state);
            continue;
        }

        let resolved = resource.resolved(&snapshot.bindings);
        let record = recorded.find_resource(&resource.id.resource_type, &resource.id.name);
        let state = observe(interpreter, &resource.id, record).await?;
        if state.exists {
            snapshot
                .bindings
                .insert(binding, bound_attributes(&resolved, &state));
        } else {
            snapshot.pending.insert(binding);
        }
        snapshot.current.insert(resource.id.clone(), state);
        snapshot.desired.push(resolved);
    }

    snapshot.orphans = orphans(sorted, recorded);
    Ok(snapshot)
}

/// Evaluate one data source
pub async fn evaluate<P: Provider>(
    interpreter: &Interpreter<P>,
    resource: Resource,
) -> Result<State, String> {
    let binding = resource.binding();
    match interpreter.execute(&Effect::Read(resource)).await {
        Ok(EffectOutcome::Read { state }) => Ok(state),
        Ok(other) => Err(format!("Unexpected outcome reading {}: {:?}", binding, other)),
        Err(e) => Err(format!("Failed to read {}: {}", binding, e)),
    }
}

/// Observed state of one managed object, with persisted attributes filled in
pub async fn observe<P: Provider>(
    interpreter: &Interpreter<P>,
    id: &ResourceId,
    record: Option<&ResourceState>,
) -> Result<State, String> {
    let identifier = record.and_then(|r| r.identifier.as_deref());
    let state = interpreter
        .provider()
        .read(id, identifier)
        .await
        .map_err(|e| format!("Failed to read {}: {}", id, e))?;

    Ok(match record {
        Some(record) => state.merged_with(&record.values()),
        None => state,
    })
}

/// Declared values win; observed values fill in the computed ones
pub fn bound_attributes(declared: &Resource, state: &State) -> HashMap<String, Value> {
    let mut attributes: HashMap<String, Value> = declared
        .attributes
        .iter()
        .filter(|(_, v)| !v.has_refs())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (k, v) in &state.attributes {
        attributes.entry(k.clone()).or_insert_with(|| v.clone());
    }
    attributes
}

/// Recorded state of a resource, as last written
pub fn recorded_state(record: &ResourceState) -> State {
    let state = State::existing(record.resource_id(), record.values());
    match &record.identifier {
        Some(identifier) => state.with_identifier(identifier.clone()),
        None => state,
    }
}

/// Recorded objects that are no longer declared, newest first
fn orphans(declared: &[Resource], recorded: &StateFile) -> Vec<State> {
    let declared: HashSet<ResourceId> = declared.iter().map(|r| r.id.clone()).collect();
    recorded
        .resources
        .iter()
        .rev()
        .filter(|record| !declared.contains(&record.resource_id()))
        .map(recorded_state)
        .collect()
}

/// Read the state file; a first run starts from an empty one
pub async fn load_state(backend: &dyn StateBackend) -> Result<StateFile, String> {
    Ok(backend
        .read_state()
        .await
        .map_err(|e| format!("Failed to read state: {}", e))?
        .unwrap_or_default())
}

/// Persist the state file under a new serial
pub async fn save_state(backend: &dyn StateBackend, state: &mut StateFile) -> Result<(), String> {
    state.increment_serial();
    backend
        .write_state(state)
        .await
        .map_err(|e| format!("Failed to write state: {}", e))
}
