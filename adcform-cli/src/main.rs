mod apply;
mod catalog;
mod display;
mod session;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use log::info;

use adcform_core::config::{self, ParsedConfig};
use adcform_core::differ::create_plan;
use adcform_core::interpreter::Interpreter;
use adcform_core::resource::Resource;
use adcform_provider::{AdcProvider, ProviderConfig};
use adcform_state::{BackendConfig, LockInfo, StateBackend, create_backend};

use crate::apply::Report;
use crate::catalog::Catalog;
use crate::display::print_plan;
use crate::session::{load_state, refresh};

#[derive(Parser)]
#[command(name = "adcform")]
#[command(
    about = "Declarative configuration management for application delivery controllers",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file
    Validate {
        /// Path to the configuration document
        #[arg(default_value = "main.json")]
        file: PathBuf,
    },
    /// Show execution plan without applying changes
    Plan {
        /// Path to the configuration document
        #[arg(default_value = "main.json")]
        file: PathBuf,
    },
    /// Apply changes to reach the desired state
    Apply {
        /// Path to the configuration document
        #[arg(default_value = "main.json")]
        file: PathBuf,

        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
    /// Destroy every object recorded in state
    Destroy {
        /// Path to the configuration document
        #[arg(default_value = "main.json")]
        file: PathBuf,

        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
    /// Re-read recorded objects from the appliance and update state
    Refresh {
        /// Path to the configuration document
        #[arg(default_value = "main.json")]
        file: PathBuf,
    },
    /// Show resource and data source schemas
    Schema {
        /// Type to describe; lists every type when omitted
        resource_type: Option<String>,

        /// Describe data sources instead of managed resources
        #[arg(long)]
        data: bool,
    },
    /// Release a stale state lock
    ForceUnlock {
        /// Lock ID reported by the failing command
        lock_id: String,

        /// Path to the configuration document
        #[arg(default_value = "main.json")]
        file: PathBuf,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Plan { file } => run_plan(&file).await,
        Commands::Apply { file, auto_approve } => run_apply(&file, auto_approve).await,
        Commands::Destroy { file, auto_approve } => run_destroy(&file, auto_approve).await,
        Commands::Refresh { file } => run_refresh(&file).await,
        Commands::Schema {
            resource_type,
            data,
        } => run_schema(resource_type.as_deref(), data),
        Commands::ForceUnlock { lock_id, file } => run_force_unlock(&file, &lock_id).await,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "adcform", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

// =============================================================================
// Setup
// =============================================================================

/// Parse, default, validate and order a configuration document
fn load(file: &Path, catalog: &Catalog) -> Result<(ParsedConfig, Vec<Resource>), String> {
    let content = fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
    let parsed = config::parse(&content).map_err(|e| format!("Parse error: {}", e))?;
    let sorted = catalog.prepare(&parsed.resources)?;
    Ok((parsed, sorted))
}

fn provider_config(parsed: &ParsedConfig) -> Result<ProviderConfig, String> {
    let config = ProviderConfig::from_json(&parsed.provider)
        .map_err(|e| e.to_string())?
        .with_env_overrides();
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn connect(parsed: &ParsedConfig) -> Result<Interpreter<AdcProvider>, String> {
    let config = provider_config(parsed)?;
    info!("connecting to {}", config.base_url());
    let provider = AdcProvider::new(&config).map_err(|e| e.to_string())?;
    Ok(Interpreter::new(provider))
}

async fn open_backend(parsed: &ParsedConfig) -> Result<Box<dyn StateBackend>, String> {
    create_backend(&BackendConfig::from_block(parsed.backend.as_ref()))
        .await
        .map_err(|e| format!("Failed to open state backend: {}", e))
}

async fn lock(backend: &dyn StateBackend, operation: &str) -> Result<LockInfo, String> {
    backend
        .acquire_lock(operation)
        .await
        .map_err(|e| format!("Failed to acquire state lock: {}", e))
}

async fn unlock(backend: &dyn StateBackend, lock: &LockInfo) {
    if let Err(e) = backend.release_lock(lock).await {
        eprintln!(
            "{} failed to release state lock {}: {}",
            "Warning:".yellow().bold(),
            lock.id,
            e
        );
    }
}

fn confirm(prompt: &str) -> Result<bool, String> {
    println!("{}", prompt.yellow());
    print!("  Enter a value: ");
    io::stdout().flush().map_err(|e| e.to_string())?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| format!("Failed to read input: {}", e))?;
    Ok(input.trim() == "yes")
}

fn finish(report: &Report, verb: &str) -> Result<(), String> {
    println!();
    let mut summary = format!("{} {} succeeded", verb, report.succeeded);
    if report.unsupported > 0 {
        summary.push_str(&format!(", {} unsupported", report.unsupported));
    }
    if report.is_success() {
        println!("{}", summary.green().bold());
        Ok(())
    } else {
        println!("{}", format!("{}, {} failed", summary, report.failed).red().bold());
        Err(format!("{} operation(s) failed", report.failed))
    }
}

// =============================================================================
// Commands
// =============================================================================

fn run_validate(file: &Path) -> Result<(), String> {
    let catalog = Catalog::load();
    let (parsed, sorted) = load(file, &catalog)?;
    ProviderConfig::from_json(&parsed.provider).map_err(|e| e.to_string())?;

    let data_sources = sorted.iter().filter(|r| r.is_data_source()).count();
    println!("{}", "Configuration is valid.".green().bold());
    println!(
        "  {} resources, {} data sources",
        sorted.len() - data_sources,
        data_sources
    );
    Ok(())
}

async fn run_plan(file: &Path) -> Result<(), String> {
    let catalog = Catalog::load();
    let (parsed, sorted) = load(file, &catalog)?;
    let interpreter = connect(&parsed)?;
    let backend = open_backend(&parsed).await?;
    let state = load_state(backend.as_ref()).await?;

    let snapshot = refresh(&interpreter, &sorted, &state).await?;
    let plan = create_plan(&snapshot.desired, &snapshot.current, &snapshot.orphans);
    print_plan(&plan, &snapshot.deferred, &catalog);
    Ok(())
}

async fn run_apply(file: &Path, auto_approve: bool) -> Result<(), String> {
    let catalog = Catalog::load();
    let (parsed, sorted) = load(file, &catalog)?;
    let interpreter = connect(&parsed)?;
    let backend = open_backend(&parsed).await?;

    let lock = lock(backend.as_ref(), "apply").await?;
    let result = apply_locked(&interpreter, &catalog, &sorted, backend.as_ref(), auto_approve).await;
    unlock(backend.as_ref(), &lock).await;
    result
}

async fn apply_locked(
    interpreter: &Interpreter<AdcProvider>,
    catalog: &Catalog,
    sorted: &[Resource],
    backend: &dyn StateBackend,
    auto_approve: bool,
) -> Result<(), String> {
    let mut state = load_state(backend).await?;
    let snapshot = refresh(interpreter, sorted, &state).await?;
    let plan = create_plan(&snapshot.desired, &snapshot.current, &snapshot.orphans);

    if plan.is_empty() {
        println!("{}", "No changes needed.".green());
        return Ok(());
    }

    print_plan(&plan, &snapshot.deferred, catalog);
    println!();

    if !auto_approve
        && !confirm("Do you want to perform these actions? Only 'yes' will be accepted.")?
    {
        println!("{}", "Apply cancelled.".yellow());
        return Ok(());
    }

    println!("{}", "Applying changes...".cyan().bold());
    println!();

    let report = apply::apply_changes(interpreter, sorted, &snapshot, &mut state, backend).await?;
    finish(&report, "Apply complete!")
}

async fn run_destroy(file: &Path, auto_approve: bool) -> Result<(), String> {
    let catalog = Catalog::load();
    let (parsed, sorted) = load(file, &catalog)?;
    let interpreter = connect(&parsed)?;
    let backend = open_backend(&parsed).await?;

    let lock = lock(backend.as_ref(), "destroy").await?;
    let result = destroy_locked(&interpreter, &sorted, backend.as_ref(), auto_approve).await;
    unlock(backend.as_ref(), &lock).await;
    result
}

async fn destroy_locked(
    interpreter: &Interpreter<AdcProvider>,
    sorted: &[Resource],
    backend: &dyn StateBackend,
    auto_approve: bool,
) -> Result<(), String> {
    let mut state = load_state(backend).await?;
    let targets = apply::destroy_targets(sorted, &state);

    if targets.is_empty() {
        println!("{}", "No resources to destroy.".green());
        return Ok(());
    }

    println!("{}", "Destroy Plan:".red().bold());
    println!();
    for target in &targets {
        println!(
            "  {} {} {}",
            "-".red().bold(),
            target.id.to_string().cyan().bold(),
            format!("({})", target.identifier.as_deref().unwrap_or("unidentified")).dimmed()
        );
    }
    println!();
    println!(
        "Plan: {} to destroy",
        targets.len().to_string().red()
    );
    println!();

    if !auto_approve
        && !confirm("This action cannot be undone. Type 'yes' to confirm.")?
    {
        println!("{}", "Destroy cancelled.".yellow());
        return Ok(());
    }

    println!("{}", "Destroying resources...".red().bold());
    println!();

    let report = apply::destroy(interpreter, &targets, &mut state, backend).await?;
    finish(&report, "Destroy complete!")
}

async fn run_refresh(file: &Path) -> Result<(), String> {
    let catalog = Catalog::load();
    let (parsed, _) = load(file, &catalog)?;
    let interpreter = connect(&parsed)?;
    let backend = open_backend(&parsed).await?;

    let lock = lock(backend.as_ref(), "refresh").await?;
    let result = async {
        let mut state = load_state(backend.as_ref()).await?;
        println!("{}", "Refreshing state...".cyan().bold());
        println!();
        apply::refresh_records(&interpreter, &mut state, backend.as_ref()).await
    }
    .await;
    unlock(backend.as_ref(), &lock).await;
    finish(&result?, "Refresh complete!")
}

async fn run_force_unlock(file: &Path, lock_id: &str) -> Result<(), String> {
    let content = fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
    let parsed = config::parse(&content).map_err(|e| format!("Parse error: {}", e))?;
    let backend = open_backend(&parsed).await?;

    backend
        .force_unlock(lock_id)
        .await
        .map_err(|e| format!("Failed to unlock: {}", e))?;
    println!("{}", format!("Lock {} released.", lock_id).green());
    Ok(())
}

fn run_schema(resource_type: Option<&str>, data_source: bool) -> Result<(), String> {
    let catalog = Catalog::load();
    let kind = if data_source { "data source" } else { "resource" };

    let Some(resource_type) = resource_type else {
        let heading = if data_source { "Data sources:" } else { "Resources:" };
        println!("{}", heading.cyan().bold());
        for name in catalog.names(data_source) {
            let description = catalog
                .lookup(name, data_source)
                .and_then(|s| s.description.as_deref())
                .unwrap_or("");
            println!("  {:<28} {}", name, description.dimmed());
        }
        return Ok(());
    };

    let schema = catalog
        .lookup(resource_type, data_source)
        .ok_or_else(|| format!("Unknown {} type '{}'", kind, resource_type))?;

    println!("{} {}", kind.cyan().bold(), schema.resource_type.bold());
    if let Some(description) = &schema.description {
        println!("  {}", description);
    }
    println!();

    let mut attributes: Vec<_> = schema.attributes.values().collect();
    attributes.sort_by(|a, b| a.name.cmp(&b.name));
    for attr in attributes {
        let mut flags = Vec::new();
        if attr.required {
            flags.push("required".to_string());
        }
        if attr.computed {
            flags.push("computed".to_string());
        }
        if attr.sensitive {
            flags.push("sensitive".to_string());
        }
        if let Some(default) = &attr.default {
            flags.push(format!("default {}", display::format_value(default)));
        }
        println!(
            "  {:<28} {:<16} {}",
            attr.name,
            attr.attr_type.to_string(),
            flags.join(", ").dimmed()
        );
        if let Some(description) = &attr.description {
            println!("  {:<28} {}", "", description.dimmed());
        }
    }
    Ok(())
}
