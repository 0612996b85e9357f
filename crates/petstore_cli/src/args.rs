//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use petstore_core::StoreConfig;
use std::path::PathBuf;

/// Pet catalog over a selectable storage backend.
#[derive(Parser, Debug)]
#[command(name = "petstore", version, about, long_about = None)]
pub struct Cli {
    /// Storage backend
    #[arg(
        short,
        long,
        value_enum,
        global = true,
        default_value = "sqlite-memory",
        env = "PETSTORE_BACKEND"
    )]
    pub backend: BackendArg,

    /// Database file, connection URL or document directory, depending on the backend
    #[arg(short, long, global = true, env = "PETSTORE_LOCATION")]
    pub location: Option<String>,

    /// Absolute directory for rotating log files; logging is off when unset
    #[arg(long, global = true, env = "PETSTORE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Insert the demo catalog before running the command (ignored by `seed`)
    #[arg(long, global = true)]
    pub seed: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    SqliteMemory,
    Sqlite,
    Postgres,
    Orm,
    DocumentMemory,
    Document,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Insert the demo catalog and print the generated ids
    Seed,
    /// List pets joined with their kind
    Pets,
    /// List kinds
    Kinds,
    /// Show one pet
    Pet { id: String },
    /// Show one kind
    Kind { id: String },
    /// Create a kind from `key=value` form fields
    AddKind(FieldArgs),
    /// Create a pet from `key=value` form fields
    AddPet(FieldArgs),
    /// Merge `key=value` form fields into a kind
    UpdateKind(UpdateArgs),
    /// Merge `key=value` form fields into a pet
    UpdatePet(UpdateArgs),
    /// Delete a kind no pet references
    DeleteKind { id: String },
    /// Delete a pet
    DeletePet { id: String },
}

#[derive(Parser, Debug)]
pub struct FieldArgs {
    /// Form field, repeatable (`--field name=Rex --field age=7`)
    #[arg(short, long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,
}

#[derive(Parser, Debug)]
pub struct UpdateArgs {
    pub id: String,
    #[command(flatten)]
    pub form: FieldArgs,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

impl Cli {
    /// Whether `--seed` should run before the command; `seed` itself already seeds.
    pub fn seeds_before_command(&self) -> bool {
        self.seed && !matches!(self.command, Command::Seed)
    }

    /// Maps backend and location flags onto a store configuration.
    pub fn store_config(&self) -> Result<StoreConfig, String> {
        let location = || {
            self.location
                .clone()
                .ok_or_else(|| format!("--location is required for the {:?} backend", self.backend))
        };
        Ok(match self.backend {
            BackendArg::SqliteMemory => StoreConfig::SqliteMemory,
            BackendArg::Sqlite => StoreConfig::Sqlite {
                path: PathBuf::from(location()?),
            },
            BackendArg::Postgres => StoreConfig::Postgres { url: location()? },
            BackendArg::Orm => StoreConfig::Orm { url: location()? },
            BackendArg::DocumentMemory => StoreConfig::DocumentMemory,
            BackendArg::Document => StoreConfig::Document {
                dir: PathBuf::from(location()?),
            },
        })
    }
}
