use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::config::{
    CliOverrides, get_config_path, load_config, save_config, write_private_file,
};
use crate::provider::{CronJobProvider, MISSING_API_KEY_MESSAGE};
use crate::schema::data::SENSITIVE_PLACEHOLDER;
use crate::schema::{Block, ResourceData, Schema};

#[derive(Parser, Debug)]
#[command(name = "terraform-provider-cronjoborg")]
#[command(about = "Manage cron-job.org jobs, folders and status pages")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Enable verbose logging (DEBUG level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file (default: ~/.cronjoborg/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the cron-job.org API
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// API key (overrides CRON_JOB_API_KEY)
    #[arg(long, global = true, value_name = "KEY")]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Display version information
    Version,

    /// Save the API URL and key to the configuration file
    Init,

    /// Print the provider, resource and data source schemas as JSON
    Schema {
        /// Only print the schema of this resource or data source type
        #[arg(long = "type", value_name = "TYPE")]
        type_name: Option<String>,
    },

    /// Validate a configuration file against a schema without calling the API
    Validate {
        #[command(flatten)]
        target: Target,

        /// Configuration file (JSON object of attributes)
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        /// Validate against the data source schema instead of the resource schema
        #[arg(long)]
        data_source: bool,
    },

    /// Read a data source
    Data {
        #[command(flatten)]
        target: Target,

        /// Configuration file (JSON object of attributes)
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Set an argument, e.g. --set job_id=123 (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        #[command(flatten)]
        output: Output,
    },

    /// Create a resource and print its state
    Create {
        #[command(flatten)]
        target: Target,

        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        output: Output,
    },

    /// Refresh a resource state from the API
    Read {
        #[command(flatten)]
        target: Target,

        /// State file produced by create, read or update
        #[arg(short, long, value_name = "FILE")]
        state: PathBuf,

        #[command(flatten)]
        output: Output,
    },

    /// Show the changes needed to move a state to a configuration
    Plan {
        #[command(flatten)]
        target: Target,

        #[arg(short, long, value_name = "FILE")]
        state: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        /// Refresh the state from the API before planning
        #[arg(long)]
        refresh: bool,
    },

    /// Apply a configuration to an existing resource
    Update {
        #[command(flatten)]
        target: Target,

        #[arg(short, long, value_name = "FILE")]
        state: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        output: Output,
    },

    /// Delete a resource
    Delete {
        #[command(flatten)]
        target: Target,

        #[arg(short, long, value_name = "FILE")]
        state: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct Target {
    /// Resource or data source type, e.g. cronjoborg_job
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub type_name: String,
}

#[derive(Args, Debug)]
pub struct Output {
    /// Write the resulting state to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Print sensitive values instead of masking them
    #[arg(long)]
    pub show_sensitive: bool,
}

pub async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        print_help();
        return Ok(());
    };

    let overrides = CliOverrides {
        config_path: cli.config,
        api_url: cli.api_url,
        api_key: cli.api_key,
    };

    match command {
        Commands::Version => {
            print_version();
            Ok(())
        }
        Commands::Init => handle_init(overrides),
        Commands::Schema { type_name } => handle_schema(type_name.as_deref()),
        Commands::Validate {
            target,
            file,
            data_source,
        } => handle_validate(&target.type_name, &file, data_source),
        Commands::Data {
            target,
            file,
            set,
            output,
        } => {
            let mut config = match file {
                Some(path) => read_config_file(&path)?,
                None => Map::new(),
            };
            for assignment in &set {
                let (key, value) = parse_assignment(assignment)?;
                config.insert(key, value);
            }

            let provider = configured_provider(overrides)?;
            let data = provider.read_data_source(&target.type_name, config).await?;
            let schema = provider.data_source(&target.type_name)?.schema();
            write_state(&data, &schema, &output)
        }
        Commands::Create {
            target,
            file,
            output,
        } => {
            let config = read_config_file(&file)?;
            let provider = configured_provider(overrides)?;
            let data = provider.create(&target.type_name, config).await?;
            tracing::info!(type_name = %target.type_name, id = %data.id(), "Resource created");

            let schema = provider.resource(&target.type_name)?.schema();
            write_state(&data, &schema, &output)
        }
        Commands::Read {
            target,
            state,
            output,
        } => {
            let state = read_state_file(&state)?;
            let provider = configured_provider(overrides)?;
            let data = provider.read(&target.type_name, state).await?;
            if !data.exists() {
                tracing::warn!(type_name = %target.type_name, "Resource no longer exists");
            }

            let schema = provider.resource(&target.type_name)?.schema();
            write_state(&data, &schema, &output)
        }
        Commands::Plan {
            target,
            state,
            file,
            refresh,
        } => {
            let mut state = read_state_file(&state)?;
            let config = read_config_file(&file)?;
            let provider = if refresh {
                let provider = configured_provider(overrides)?;
                state = provider.read(&target.type_name, state).await?;
                provider
            } else {
                CronJobProvider::new()?
            };

            let plan = provider.plan(&target.type_name, &state, config)?;
            let schema = provider.resource(&target.type_name)?.schema();
            print_json(&redact_plan(serde_json::to_value(&plan)?, &schema))
        }
        Commands::Update {
            target,
            state,
            file,
            output,
        } => {
            let state = read_state_file(&state)?;
            let config = read_config_file(&file)?;
            let provider = configured_provider(overrides)?;
            let data = provider.update(&target.type_name, state, config).await?;

            let schema = provider.resource(&target.type_name)?.schema();
            write_state(&data, &schema, &output)
        }
        Commands::Delete { target, state } => {
            let state = read_state_file(&state)?;
            let provider = configured_provider(overrides)?;
            let id = state.id().to_string();
            provider.delete(&target.type_name, state).await?;
            tracing::info!(type_name = %target.type_name, id = %id, "Resource deleted");
            Ok(())
        }
    }
}

fn configured_provider(overrides: CliOverrides) -> Result<CronJobProvider> {
    let config = load_config(overrides)?;
    let mut provider = CronJobProvider::new()?;
    provider.configure(&config)?;
    Ok(provider)
}

/// Merges file, environment and flags, then writes the result back to the
/// configuration file with 0600 permissions
fn handle_init(overrides: CliOverrides) -> Result<()> {
    let Some(path) = overrides.config_path.clone().or_else(get_config_path) else {
        bail!("Could not determine the home directory, pass --config");
    };

    let config = load_config(overrides)?;
    if config.api_key.as_deref().is_none_or(str::is_empty) {
        bail!(MISSING_API_KEY_MESSAGE);
    }

    save_config(&config, &path)?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

fn handle_schema(type_name: Option<&str>) -> Result<()> {
    let provider = CronJobProvider::new()?;

    let Some(type_name) = type_name else {
        let mut resources = Map::new();
        for name in provider.resource_types() {
            resources.insert(
                name.to_string(),
                serde_json::to_value(provider.resource(name)?.schema())?,
            );
        }
        let mut data_sources = Map::new();
        for name in provider.data_source_types() {
            data_sources.insert(
                name.to_string(),
                serde_json::to_value(provider.data_source(name)?.schema())?,
            );
        }
        return print_json(&json!({
            "provider": CronJobProvider::schema(),
            "resource_schemas": resources,
            "data_source_schemas": data_sources,
        }));
    };

    let mut found = Map::new();
    if let Ok(resource) = provider.resource(type_name) {
        found.insert("resource".to_string(), serde_json::to_value(resource.schema())?);
    }
    if let Ok(data_source) = provider.data_source(type_name) {
        found.insert("data_source".to_string(), serde_json::to_value(data_source.schema())?);
    }
    if found.is_empty() {
        bail!("Unknown resource or data source type: {}", type_name);
    }
    print_json(&Value::Object(found))
}

fn handle_validate(type_name: &str, file: &Path, data_source: bool) -> Result<()> {
    let provider = CronJobProvider::new()?;
    let config = read_config_file(file)?;

    if data_source {
        provider.validate_data_source(type_name, &config)?;
    } else {
        provider.validate_resource(type_name, &config)?;
    }
    println!("Configuration for {} is valid", type_name);
    Ok(())
}

fn read_config_file(path: &Path) -> Result<Map<String, Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Configuration file is not valid JSON: {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("Configuration file must contain a JSON object: {}", path.display()),
    }
}

fn read_state_file(path: &Path) -> Result<ResourceData> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("State file is not valid: {}", path.display()))
}

/// Parses `key=value`; the value is taken as JSON when it parses, as a
/// string otherwise
fn parse_assignment(assignment: &str) -> Result<(String, Value)> {
    let Some((key, raw)) = assignment.split_once('=') else {
        bail!("Invalid --set value '{}', expected KEY=VALUE", assignment);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Invalid --set value '{}', key is empty", assignment);
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Prints the state, or writes it unmasked to `--out` with 0600 permissions
/// so it can be fed back into read, plan, update and delete
fn write_state(data: &ResourceData, schema: &Schema, output: &Output) -> Result<()> {
    if let Some(path) = &output.out {
        let json = serde_json::to_string_pretty(data)?;
        write_private_file(path, json.as_bytes())
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;
        tracing::info!(path = %path.display(), "State written");
        return Ok(());
    }

    if output.show_sensitive {
        print_json(data)
    } else {
        print_json(&data.redacted(&schema.block))
    }
}

/// Masks plan values of sensitive attributes
fn redact_plan(mut plan: Value, schema: &Schema) -> Value {
    let sensitive = sensitive_paths(&schema.block, "");
    if let Some(changes) = plan.get_mut("changes").and_then(Value::as_array_mut) {
        for change in changes {
            let path = change
                .get("path")
                .and_then(Value::as_str)
                .map(strip_indices)
                .unwrap_or_default();
            if sensitive.contains(&path) {
                for key in ["old", "new"] {
                    if let Some(value) = change.get_mut(key) {
                        if !value.is_null() {
                            *value = Value::String(SENSITIVE_PLACEHOLDER.to_string());
                        }
                    }
                }
            }
        }
    }
    plan
}

fn sensitive_paths(block: &Block, prefix: &str) -> Vec<String> {
    let join = |name: &str| {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", prefix, name)
        }
    };
    let mut paths: Vec<String> = block.sensitive_attributes().map(join).collect();
    for (name, nested) in &block.blocks {
        paths.extend(sensitive_paths(&nested.block, &join(name)));
    }
    paths
}

/// `auth.0.password` -> `auth.password`
fn strip_indices(path: &str) -> String {
    path.split('.')
        .filter(|segment| segment.parse::<usize>().is_err())
        .collect::<Vec<_>>()
        .join(".")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_version() {
    println!("terraform-provider-cronjoborg {}", env!("CARGO_PKG_VERSION"));
}

fn print_help() {
    println!("terraform-provider-cronjoborg - Manage cron-job.org jobs, folders and status pages");
    println!();
    println!("Usage: terraform-provider-cronjoborg <COMMAND>");
    println!();
    println!("Commands:");
    println!("  version   Display version information");
    println!("  init      Save the API URL and key to the configuration file");
    println!("  schema    Print the provider, resource and data source schemas as JSON");
    println!("  validate  Validate a configuration file against a schema");
    println!("  data      Read a data source");
    println!("  create    Create a resource and print its state");
    println!("  read      Refresh a resource state from the API");
    println!("  plan      Show the changes needed to move a state to a configuration");
    println!("  update    Apply a configuration to an existing resource");
    println!("  delete    Delete a resource");
    println!("  help      Print this message or the help of the given subcommand(s)");
    println!();
    println!("Options:");
    println!("  -v, --verbose  Enable verbose logging");
    println!("  -V, --version  Print version");
    println!("  -h, --help     Print help");
}
