use std::path::Path;

pub fn run(db_path: &Path, json: bool) -> anyhow::Result<()> {
    let db = super::open(db_path)?;
    let counts = db.counts()?;

    if json {
        return super::print_json(&counts);
    }

    println!("{:<12} {}", "users", counts.users);
    println!("{:<12} {}", "languages", counts.languages);
    println!("{:<12} {}", "catalogs", counts.catalogs);
    println!("{:<12} {}", "words", counts.words);
    Ok(())
}
