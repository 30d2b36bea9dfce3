use std::path::PathBuf;

use clap::Parser;
use docloader::DEFAULT_TABLE;

#[allow(clippy::upper_case_acronyms)]
#[derive(Parser, Debug)]
#[clap(name = "docloader", about, version)]
/// Loads a JSON array of flat objects into a postgres table.
///
/// The table is dropped and recreated on every run with one TEXT column per field name seen
/// in the data. Connection settings come from DATABASE_URL or PGHOST, PGPORT, PGDATABASE,
/// PGUSER and PGPASSWORD (a .env file is read first).
///
/// Example:
/// `echo '[{"name": "Jane"}]' | docloader --table documents`
pub struct CLI {
    /// The table to load into.
    #[clap(long, short, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// optional - Read the JSON from this file instead of stdin.
    #[clap(long, short)]
    pub file: Option<PathBuf>,

    /// optional - Connection string, overrides DATABASE_URL and the PG* variables.
    #[clap(long, env = "DOCLOADER_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Load into memory and print the resulting table instead of touching postgres.
    #[clap(long)]
    pub dry_run: bool,
}
