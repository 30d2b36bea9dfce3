use clap::Parser;
use docloader::{
    setup_info_logger, start_loader, ConnectionConfigError, ConnectionSettings, InputSource,
    LoadOutcome, MemoryTable, StartDetails,
};
use serde_json::{Map, Value};

use crate::{
    cli_interface::CLI,
    console::{print_error_message, print_success_message, print_warn_message},
};

mod cli_interface;
mod console;

fn print_memory_table(table: &MemoryTable) {
    for row in table.rows() {
        let object: Map<String, Value> = table
            .columns()
            .iter()
            .zip(row)
            .map(|(column, value)| {
                (column.clone(), value.clone().map(Value::String).unwrap_or(Value::Null))
            })
            .collect();
        println!("{}", Value::Object(object));
    }
}

/// A dry run never connects, so the environment is not consulted for it.
fn resolve_connection<F>(
    cli: &CLI,
    from_env: F,
) -> Result<ConnectionSettings, ConnectionConfigError>
where
    F: FnOnce() -> Result<ConnectionSettings, ConnectionConfigError>,
{
    if cli.dry_run {
        return Ok(ConnectionSettings::default());
    }

    match &cli.database_url {
        Some(url) => Ok(ConnectionSettings::Url(url.clone())),
        None => from_env(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = CLI::parse();
    setup_info_logger();

    let connection = match resolve_connection(&cli, ConnectionSettings::from_env) {
        Ok(settings) => settings,
        Err(e) => {
            print_error_message(&format!("Invalid connection settings: {}", e));
            std::process::exit(1);
        }
    };

    let details = StartDetails {
        input: cli.file.map(InputSource::File).unwrap_or(InputSource::Stdin),
        table: cli.table,
        connection,
        dry_run: cli.dry_run,
    };

    match start_loader(details).await {
        Ok(LoadOutcome::NothingToLoad) => print_warn_message("Input was empty, nothing loaded"),
        Ok(LoadOutcome::Loaded { summary, table }) => {
            if let Some(table) = table {
                println!("columns: {}", table.columns().join(", "));
                print_memory_table(&table);
            }
            print_success_message(&format!(
                "Loaded {} rows into {}",
                summary.rows_inserted, summary.table
            ));
        }
        // Already logged, a failed load does not change the exit code
        Ok(LoadOutcome::Failed(e)) => print_error_message(&format!("Nothing was loaded: {}", e)),
        Err(e) => {
            print_error_message(&e.to_string());
            std::process::exit(1);
        }
    }
}
