//! Executing changes against the appliance and recording them in state

use std::collections::HashSet;

use adcform_core::differ::{self, Diff};
use adcform_core::effect::Effect;
use adcform_core::interpreter::{EffectOutcome, Interpreter};
use adcform_core::provider::Provider;
use adcform_core::resource::{Resource, State};
use adcform_state::{ResourceState, StateBackend, StateFile};
use colored::Colorize;
use log::info;

use crate::display::format_effect;
use crate::session::{bound_attributes, observe, recorded_state, save_state, Snapshot};

/// Outcome counts of one run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub succeeded: usize,
    pub failed: usize,
    pub unsupported: usize,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Walk the declared objects in dependency order, then remove orphans.
///
/// Each object is re-diffed once the objects it references are applied.
/// Objects that reference a failed one are skipped.
pub async fn apply_changes<P: Provider>(
    interpreter: &Interpreter<P>,
    sorted: &[Resource],
    snapshot: &Snapshot,
    state: &mut StateFile,
    backend: &dyn StateBackend,
) -> Result<Report, String> {
    let provider_name = interpreter.provider().name();
    let mut bindings = snapshot.bindings.clone();
    let mut failed: HashSet<String> = HashSet::new();
    let mut report = Report::default();

    for resource in sorted {
        let binding = resource.binding();

        if let Some(dep) = resource
            .dependencies()
            .into_iter()
            .find(|dep| failed.contains(dep))
        {
            println!(
                "  {} {} - skipped, depends on failed {}",
                "✗".red(),
                binding,
                dep
            );
            failed.insert(binding);
            report.failed += 1;
            continue;
        }

        let resolved = resource.resolved(&bindings);
        let effect = if resource.is_data_source() {
            if !snapshot.is_deferred(&resource.id) {
                continue;
            }
            Effect::Read(resolved.clone())
        } else {
            let current = snapshot
                .current
                .get(&resource.id)
                .cloned()
                .unwrap_or_else(|| State::not_found(resource.id.clone()));
            match differ::diff(&resolved, &current) {
                Diff::Create(r) => Effect::Create(r),
                Diff::Update {
                    id,
                    from,
                    to,
                    changed_attributes,
                } => Effect::Update {
                    id,
                    from,
                    to,
                    changed_attributes,
                },
                Diff::NoChange(_) => continue,
            }
        };

        match interpreter.execute(&effect).await {
            Ok(EffectOutcome::Read { state: observed }) => {
                info!("evaluated {}", binding);
                bindings.insert(binding, observed.attributes);
            }
            Ok(EffectOutcome::Created { state: observed } | EffectOutcome::Updated { state: observed }) => {
                let observed = observed.merged_with(&resolved.attributes);
                bindings.insert(binding, bound_attributes(&resolved, &observed));
                state.upsert_resource(ResourceState::from_state(&observed, provider_name));
                save_state(backend, state).await?;
                println!("  {} {}", "✓".green(), format_effect(&effect));
                report.succeeded += 1;
            }
            Ok(EffectOutcome::Unsupported { reason }) => {
                println!("  {} {} - {}", "⚠".yellow(), format_effect(&effect), reason);
                report.unsupported += 1;
            }
            Ok(EffectOutcome::Deleted | EffectOutcome::Skipped { .. }) => {}
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), format_effect(&effect), e);
                failed.insert(binding);
                report.failed += 1;
            }
        }
    }

    for orphan in &snapshot.orphans {
        delete_one(interpreter, orphan, state, backend, &mut report).await?;
    }

    Ok(report)
}

/// Objects destroy removes: declared ones in reverse dependency order, then
/// the remaining recorded ones, newest first. Unrecorded objects are left alone.
pub fn destroy_targets(sorted: &[Resource], state: &StateFile) -> Vec<State> {
    let mut targets: Vec<State> = sorted
        .iter()
        .rev()
        .filter(|r| !r.is_data_source())
        .filter_map(|r| state.find_resource(&r.id.resource_type, &r.id.name))
        .map(recorded_state)
        .collect();

    let declared: HashSet<_> = targets.iter().map(|t| t.id.clone()).collect();
    targets.extend(
        state
            .resources
            .iter()
            .rev()
            .filter(|r| !declared.contains(&r.resource_id()))
            .map(recorded_state),
    );
    targets
}

/// Delete every target that still exists on the appliance
pub async fn destroy<P: Provider>(
    interpreter: &Interpreter<P>,
    targets: &[State],
    state: &mut StateFile,
    backend: &dyn StateBackend,
) -> Result<Report, String> {
    let mut report = Report::default();

    for target in targets {
        let record = state
            .find_resource(&target.id.resource_type, &target.id.name)
            .cloned();
        let observed = match observe(interpreter, &target.id, record.as_ref()).await {
            Ok(observed) => observed,
            Err(e) => {
                println!("  {} {}", "✗".red(), e);
                report.failed += 1;
                continue;
            }
        };

        if !observed.exists {
            println!("  {} {} - already absent", "✓".green(), target.id);
            state.remove_resource(&target.id.resource_type, &target.id.name);
            save_state(backend, state).await?;
            report.succeeded += 1;
            continue;
        }

        delete_one(interpreter, target, state, backend, &mut report).await?;
    }

    Ok(report)
}

/// Re-read every recorded object and drop the ones that vanished
pub async fn refresh_records<P: Provider>(
    interpreter: &Interpreter<P>,
    state: &mut StateFile,
    backend: &dyn StateBackend,
) -> Result<Report, String> {
    let provider_name = interpreter.provider().name();
    let mut report = Report::default();

    for record in state.resources.clone() {
        let id = record.resource_id();
        match observe(interpreter, &id, Some(&record)).await {
            Ok(observed) if observed.exists => {
                state.upsert_resource(ResourceState::from_state(&observed, provider_name));
                println!("  {} {}", "✓".green(), id);
                report.succeeded += 1;
            }
            Ok(_) => {
                state.remove_resource(&id.resource_type, &id.name);
                println!("  {} {} - no longer exists, removed from state", "-".red(), id);
                report.succeeded += 1;
            }
            Err(e) => {
                println!("  {} {}", "✗".red(), e);
                report.failed += 1;
            }
        }
    }

    save_state(backend, state).await?;
    Ok(report)
}

/// Delete one recorded object; an unsupported delete drops it from state only
async fn delete_one<P: Provider>(
    interpreter: &Interpreter<P>,
    target: &State,
    state: &mut StateFile,
    backend: &dyn StateBackend,
    report: &mut Report,
) -> Result<(), String> {
    let Some(identifier) = target.identifier.clone() else {
        state.remove_resource(&target.id.resource_type, &target.id.name);
        return save_state(backend, state).await;
    };

    let effect = Effect::Delete {
        id: target.id.clone(),
        identifier,
    };
    match interpreter.execute(&effect).await {
        Ok(EffectOutcome::Deleted) => {
            state.remove_resource(&target.id.resource_type, &target.id.name);
            save_state(backend, state).await?;
            println!("  {} {}", "✓".green(), format_effect(&effect));
            report.succeeded += 1;
        }
        Ok(EffectOutcome::Unsupported { reason }) => {
            state.remove_resource(&target.id.resource_type, &target.id.name);
            save_state(backend, state).await?;
            println!(
                "  {} {} - {}; removed from state, left on the appliance",
                "⚠".yellow(),
                format_effect(&effect),
                reason
            );
            report.unsupported += 1;
        }
        Ok(_) => {}
        Err(e) => {
            println!("  {} {} - {}", "✗".red(), format_effect(&effect), e);
            report.failed += 1;
        }
    }
    Ok(())
}
