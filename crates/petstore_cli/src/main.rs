//! Command-line front end for the pet catalog.
//!
//! # Responsibility
//! - Map flags and environment onto a `StoreConfig`.
//! - Run one repository operation and print plain records as JSON.

mod args;

use args::{Cli, Command};
use clap::Parser;
use log::error;
use petstore_core::{
    default_log_level, init_logging, open_repository, DynRepository, FormFields, RecordId,
};
use serde::Serialize;
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = &cli.log_dir {
        let log_dir = std::path::absolute(log_dir)?;
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let config = cli.store_config()?;
    let repo = open_repository(&config)?;
    if cli.seeds_before_command() {
        repo.seed_demo_catalog()?;
    }
    execute(&repo, &cli.command)
}

fn execute(repo: &DynRepository, command: &Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Seed => print_json(&repo.seed_demo_catalog()?),
        Command::Pets => print_json(&repo.list_pets()?),
        Command::Kinds => print_json(&repo.list_kinds()?),
        Command::Pet { id } => print_json(&repo.get_pet(&RecordId::new(id.as_str()))?),
        Command::Kind { id } => print_json(&repo.get_kind(&RecordId::new(id.as_str()))?),
        Command::AddKind(args) => print_json(&repo.create_kind(&form(&args.fields))?),
        Command::AddPet(args) => print_json(&repo.create_pet(&form(&args.fields))?),
        Command::UpdateKind(args) => {
            repo.update_kind(&RecordId::new(args.id.as_str()), &form(&args.form.fields))?;
            Ok(())
        }
        Command::UpdatePet(args) => {
            repo.update_pet(&RecordId::new(args.id.as_str()), &form(&args.form.fields))?;
            Ok(())
        }
        Command::DeleteKind { id } => Ok(repo.delete_kind(&RecordId::new(id.as_str()))?),
        Command::DeletePet { id } => Ok(repo.delete_pet(&RecordId::new(id.as_str()))?),
    }
}

fn form(fields: &[(String, String)]) -> FormFields {
    fields.iter().cloned().collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
