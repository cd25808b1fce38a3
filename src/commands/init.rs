use std::path::Path;

use colored::Colorize;

pub fn run(db_path: &Path) -> anyhow::Result<()> {
    let db = super::open(db_path)?;
    db.set_config("version", env!("CARGO_PKG_VERSION"))?;

    println!(
        "Initialized words database at {}",
        db_path.display().to_string().bold()
    );
    Ok(())
}
