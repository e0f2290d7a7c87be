//! Plan rendering

use adcform_core::effect::Effect;
use adcform_core::plan::Plan;
use adcform_core::resource::{Resource, ResourceId, State, Value};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};

use crate::catalog::Catalog;

const ATTR_INDENT: &str = "      ";

pub fn format_effect(effect: &Effect) -> String {
    match effect {
        Effect::Create(r) => format!("Create {}", r.id),
        Effect::Update { id, .. } => format!("Update {}", id),
        Effect::Delete { id, .. } => format!("Delete {}", id),
        Effect::Read(r) => format!("Read {}", r.binding()),
    }
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let strs: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", strs.join(", "))
        }
        Value::Map(map) => {
            let mut strs: Vec<_> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, format_value(v)))
                .collect();
            strs.sort();
            format!("{{{}}}", strs.join(", "))
        }
        Value::ResourceRef(binding, attr) => {
            format!("(known after apply: {}.{})", binding, attr)
        }
    }
}

/// Pretty-printed form of a string that holds a JSON document
fn json_document(value: &Value) -> Option<String> {
    let Value::String(s) = value else {
        return None;
    };
    let trimmed = s.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return None;
    }
    let document: serde_json::Value = serde_json::from_str(s).ok()?;
    serde_json::to_string_pretty(&document).ok()
}

/// Unified line diff of two JSON documents
pub fn document_diff(from: &str, to: &str) -> Vec<String> {
    TextDiff::from_lines(from, to)
        .iter_all_changes()
        .filter(|change| change.tag() != ChangeTag::Equal)
        .map(|change| {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            format!("{}{}", sign, change.value().trim_end())
        })
        .collect()
}

pub fn print_plan(plan: &Plan, deferred: &[Resource], catalog: &Catalog) {
    if plan.is_empty() && deferred.is_empty() {
        println!(
            "{}",
            "No changes. Appliance configuration is up-to-date.".green()
        );
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    for resource in deferred {
        println!(
            "  {} {} {}",
            "<=".cyan().bold(),
            resource.binding().cyan().bold(),
            "(read during apply)".dimmed()
        );
    }

    for effect in plan.effects() {
        match effect {
            Effect::Create(r) => {
                println!("  {} {}", "+".green().bold(), r.id.to_string().cyan().bold());
                print_attributes(&r.id, &r.attributes, catalog);
            }
            Effect::Update {
                id,
                from,
                to,
                changed_attributes,
            } => {
                println!("  {} {}", "~".yellow().bold(), id.to_string().cyan().bold());
                print_changes(id, from, to, changed_attributes, catalog);
            }
            Effect::Delete { id, identifier } => {
                println!(
                    "  {} {} {}",
                    "-".red().bold(),
                    id.to_string().cyan().bold(),
                    format!("({})", identifier).dimmed()
                );
            }
            Effect::Read(r) => {
                println!("  {} {}", "<=".cyan().bold(), r.binding().cyan().bold());
            }
        }
    }

    println!();
    println!("{}", plan.summary().to_string().bold());
}

fn print_attributes(
    id: &ResourceId,
    attributes: &std::collections::HashMap<String, Value>,
    catalog: &Catalog,
) {
    let mut keys: Vec<_> = attributes.keys().collect();
    keys.sort();
    for key in keys {
        let value = &attributes[key];
        if catalog.is_sensitive(&id.resource_type, false, key) {
            println!("{}{}: {}", ATTR_INDENT, key, "(sensitive)".dimmed());
        } else if let Some(document) = json_document(value) {
            println!("{}{}:", ATTR_INDENT, key);
            for line in document.lines() {
                println!("{}  {}", ATTR_INDENT, line.green());
            }
        } else {
            println!("{}{}: {}", ATTR_INDENT, key, format_value(value).green());
        }
    }
}

fn print_changes(
    id: &ResourceId,
    from: &State,
    to: &Resource,
    changed_attributes: &[String],
    catalog: &Catalog,
) {
    for key in changed_attributes {
        let old = from.attributes.get(key);
        let Some(new) = to.attributes.get(key) else {
            continue;
        };

        if catalog.is_sensitive(&id.resource_type, false, key) {
            println!("{}{}: {}", ATTR_INDENT, key, "(sensitive)".dimmed());
            continue;
        }

        match (old.and_then(json_document), json_document(new)) {
            (Some(old_doc), Some(new_doc)) => {
                println!("{}{}:", ATTR_INDENT, key);
                for line in document_diff(&old_doc, &new_doc) {
                    let styled = if line.starts_with('+') {
                        line.green()
                    } else {
                        line.red()
                    };
                    println!("{}  {}", ATTR_INDENT, styled);
                }
            }
            _ => {
                let old = old.map(format_value).unwrap_or_else(|| "(none)".to_string());
                println!(
                    "{}{}: {} → {}",
                    ATTR_INDENT,
                    key,
                    old.red(),
                    format_value(new).green()
                );
            }
        }
    }
}
