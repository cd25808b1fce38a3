pub mod init;
pub mod language;
pub mod serve;
pub mod stats;

use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use words::db::Database;

/// Open the database, bringing the schema up to date first.
pub fn open(db_path: &Path) -> anyhow::Result<Database> {
    let db = Database::open(db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    db.migrate().context("migration failed")?;
    Ok(db)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
