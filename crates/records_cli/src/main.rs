//! Command-line front end for the record catalog.
//!
//! # Responsibility
//! - Map subcommands onto `RecordService` / `RecordStore` calls.
//! - Print results as JSON so output stays scriptable.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use log::info;
use records_core::{
    default_log_level, init_logging, load_config, Address, AddressMatcher, ChangeNotifier,
    RecordForm, RecordQuery, RecordService, RecordStore, RecordValues, SaveOutcome, Selection,
    SqliteRecordStore, StoreResult,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "records")]
#[command(version)]
#[command(about = "Vinyl record catalog backed by SQLite")]
struct Cli {
    /// Config file (defaults to ./records.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overrides the config value
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Absolute directory for log files; logging stays off when unset
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the core library is linked
    Ping,
    /// List catalog summaries, oldest first
    List,
    /// Show every field of one or more records
    Show {
        /// Record id, or an address such as content://com.example.android.records/records/3
        address: String,
    },
    /// Add a record
    Add(AddArgs),
    /// Change fields of the records behind an address
    Update {
        address: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete the records behind an address
    Delete { address: String },
    /// Print the type tag of an address
    Type { address: String },
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    album: String,
    #[arg(long)]
    band: String,
    #[arg(long, default_value = "")]
    quantity: String,
    #[arg(long, default_value = "")]
    price: String,
    #[arg(long)]
    cover: Option<String>,
    #[arg(long)]
    supplier: String,
    #[arg(long)]
    email: String,
}

#[derive(Args)]
struct FieldArgs {
    #[arg(long)]
    album: Option<String>,
    #[arg(long)]
    band: Option<String>,
    #[arg(long)]
    quantity: Option<i64>,
    #[arg(long)]
    price: Option<i64>,
    #[arg(long)]
    cover: Option<String>,
    #[arg(long)]
    supplier: Option<String>,
    #[arg(long)]
    email: Option<String>,
}

impl From<FieldArgs> for RecordValues {
    fn from(value: FieldArgs) -> Self {
        RecordValues {
            album_name: value.album,
            band_name: value.band,
            quantity: value.quantity,
            price: value.price,
            cover: value.cover,
            supplier_name: value.supplier,
            supplier_email: value.email,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Ping = cli.command {
        println!("records_core ping={}", records_core::ping());
        println!("records_core version={}", records_core::core_version());
        return Ok(());
    }

    let mut config = load_config(cli.config.as_deref()).context("failed to load config")?;
    if let Some(database) = cli.database {
        config.database = database;
    }
    if let Some(log_dir) = cli.log_dir.or_else(|| config.log_dir.clone()) {
        let level = cli
            .log_level
            .or_else(|| config.log_level.clone())
            .unwrap_or_else(|| default_log_level().to_string());
        init_logging(&level, &log_dir).context("failed to initialize logging")?;
    }

    let store = config
        .open_store(Arc::new(ChangeNotifier::new()))
        .with_context(|| format!("failed to open {}", config.database.display()))?;
    info!(
        "event=cli_start module=cli status=ok authority={}",
        store.matcher().authority()
    );
    run(cli.command, RecordService::new(store))
}

fn run(command: Commands, service: RecordService<SqliteRecordStore>) -> anyhow::Result<()> {
    let store = service.store();
    match command {
        Commands::Ping => {}
        Commands::List => {
            let summaries = service.list_summaries()?;
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Commands::Show { address } => {
            let address = target(store.matcher(), &address)?;
            let records = store.query(address, &RecordQuery::all())?.records()?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Add(args) => {
            let form = RecordForm {
                album_name: args.album,
                band_name: args.band,
                quantity: args.quantity,
                price: args.price,
                cover: args.cover,
                supplier_name: args.supplier,
                supplier_email: args.email,
            };
            let outcome = service
                .save(None, &form)
                .map_err(|err| anyhow::anyhow!("{}: {err}", err.message()))?;
            match outcome {
                SaveOutcome::Inserted(address) => {
                    println!("{} {}", outcome.message(), store.uri_for(&address));
                }
                other => println!("{}", other.message()),
            }
        }
        Commands::Update { address, fields } => {
            let values = RecordValues::from(fields);
            if values.is_empty() {
                bail!("nothing to update; pass at least one field option");
            }
            let address = target(store.matcher(), &address)?;
            let changed = store.update(address, &values, &Selection::all())?;
            println!("updated {changed} record(s)");
        }
        Commands::Delete { address } => {
            let address = target(store.matcher(), &address)?;
            let deleted = store.delete(address, &Selection::all())?;
            println!("deleted {deleted} record(s)");
        }
        Commands::Type { address } => {
            println!("{}", store.resolve_type(target(store.matcher(), &address)?)?);
        }
    }
    Ok(())
}

/// Bare ids (ASCII digits only) address one record; anything else must be a
/// full address. Both go through the matcher.
fn target(matcher: &AddressMatcher, arg: &str) -> StoreResult<Address> {
    let arg = arg.trim();
    if !arg.is_empty() && arg.bytes().all(|byte| byte.is_ascii_digit()) {
        let collection = matcher.uri_for(&Address::Collection);
        return matcher.resolve(&format!("{collection}/{arg}"));
    }
    matcher.resolve(arg)
}
