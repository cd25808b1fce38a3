use std::path::Path;

use colored::Colorize;
use tabled::{Table, Tabled, settings::Style};
use words::models::Language;

#[derive(Tabled)]
struct LanguageRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "NAME")]
    name: String,
}

pub fn add(db_path: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let name = name.trim();
    anyhow::ensure!(!name.is_empty(), "language name must not be empty");

    let mut db = super::open(db_path)?;
    let language = db.insert_language(name)?;

    if json {
        super::print_json(&language)
    } else {
        println!("Added language {}: {}", language.id, language.name.green());
        Ok(())
    }
}

pub fn list(db_path: &Path, json: bool) -> anyhow::Result<()> {
    let db = super::open(db_path)?;
    let languages = db.list_languages()?;

    if json {
        return super::print_json(&languages);
    }
    print_languages(&languages);
    Ok(())
}

fn print_languages(languages: &[Language]) {
    if languages.is_empty() {
        println!("No languages found.");
        return;
    }
    let rows = languages.iter().map(|l| LanguageRow {
        id: l.id,
        name: l.name.clone(),
    });
    println!("{}", Table::new(rows).with(Style::psql()));
}
