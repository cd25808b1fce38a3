use chrono::{Local, NaiveDate};
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};
use std::path::Path;

use crate::models::{Catalog, CatalogFilter, Counts, Language, User, Word};

mod error;
pub mod password;

pub use error::{DbError, DbResult};
use error::{still_referenced, unique_violation};

const CATALOG_COLUMNS: &str = "id, name, language_id, user_id, date";
const WORD_COLUMNS: &str = "id, catalog_id, name, pronunciation, value, date";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(Database { conn })
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Database { conn })
    }

    /// Create the schema tables if they don't exist, then run any pending version-gated migrations.
    pub fn migrate(&self) -> DbResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                name     TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS languages (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS catalogs (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                language_id INTEGER NOT NULL REFERENCES languages(id) ON DELETE RESTRICT,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name        TEXT NOT NULL UNIQUE,
                date        TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS words (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                catalog_id    INTEGER NOT NULL REFERENCES catalogs(id) ON DELETE CASCADE,
                name          TEXT NOT NULL UNIQUE,
                pronunciation TEXT,
                value         TEXT,
                date          TEXT NOT NULL
            );
            ",
        )?;

        // Fresh databases start at version 0.
        self.conn.execute(
            "INSERT OR IGNORE INTO config (key, value) VALUES ('schema_version', '0')",
            [],
        )?;

        run_migrations(&self.conn)
    }

    // -- Config --

    pub fn set_config(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO config (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> DbResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    // -- Users --

    /// Insert a user with an already hashed password. A taken name rolls the
    /// insert back.
    pub fn insert_user(&mut self, name: &str, password_hash: &str) -> DbResult<User> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO users (name, password) VALUES (?1, ?2)",
            params![name, password_hash],
        )
        .map_err(|e| unique_violation(e, format!("user name already taken: {name}")))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(User {
            id,
            name: name.to_string(),
            password_hash: password_hash.to_string(),
        })
    }

    pub fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, name, password FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        password_hash: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// Apply the given changes atomically. Either both fields change or neither does.
    pub fn update_user(
        &mut self,
        id: i64,
        name: Option<&str>,
        password_hash: Option<&str>,
    ) -> DbResult<User> {
        let tx = self.conn.transaction()?;
        let exists = tx
            .query_row("SELECT 1 FROM users WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?
            .is_some();
        if !exists {
            return Err(DbError::not_found("user", id));
        }

        if let Some(name) = name {
            tx.execute("UPDATE users SET name = ?1 WHERE id = ?2", params![name, id])
                .map_err(|e| unique_violation(e, format!("user name already taken: {name}")))?;
        }
        if let Some(hash) = password_hash {
            tx.execute(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                params![hash, id],
            )?;
        }
        tx.commit()?;

        self.get_user(id)?
            .ok_or_else(|| DbError::not_found("user", id))
    }

    /// Delete a user together with their catalogs and words.
    pub fn delete_user(&self, id: i64) -> DbResult<()> {
        let rows = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(DbError::not_found("user", id));
        }
        Ok(())
    }

    // -- Languages --

    pub fn insert_language(&mut self, name: &str) -> DbResult<Language> {
        let tx = self.conn.transaction()?;
        tx.execute("INSERT INTO languages (name) VALUES (?1)", params![name])
            .map_err(|e| unique_violation(e, format!("language already exists: {name}")))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Language {
            id,
            name: name.to_string(),
        })
    }

    pub fn get_language(&self, id: i64) -> DbResult<Option<Language>> {
        let language = self
            .conn
            .query_row(
                "SELECT id, name FROM languages WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Language {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(language)
    }

    pub fn list_languages(&self) -> DbResult<Vec<Language>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM languages ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Language {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        let mut languages = Vec::new();
        for row in rows {
            languages.push(row?);
        }
        Ok(languages)
    }

    /// Delete a language. Fails with `InUse` while any catalog still uses it.
    pub fn delete_language(&self, id: i64) -> DbResult<()> {
        let rows = self
            .conn
            .execute("DELETE FROM languages WHERE id = ?1", params![id])
            .map_err(|e| still_referenced(e, format!("language {id} is used by a catalog")))?;
        if rows == 0 {
            return Err(DbError::not_found("language", id));
        }
        Ok(())
    }

    // -- Catalogs --

    pub fn insert_catalog(&mut self, name: &str, language_id: i64, user_id: i64) -> DbResult<Catalog> {
        let date = today();
        let tx = self.conn.transaction()?;
        ensure_exists(&tx, "users", "user", user_id)?;
        ensure_exists(&tx, "languages", "language", language_id)?;
        tx.execute(
            "INSERT INTO catalogs (name, language_id, user_id, date) VALUES (?1, ?2, ?3, ?4)",
            params![name, language_id, user_id, date.to_string()],
        )
        .map_err(|e| unique_violation(e, format!("catalog already exists: {name}")))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Catalog {
            id,
            name: name.to_string(),
            language_id,
            user_id,
            date,
        })
    }

    pub fn get_catalog(&self, id: i64) -> DbResult<Option<Catalog>> {
        let catalog = self
            .conn
            .query_row(
                &format!("SELECT {CATALOG_COLUMNS} FROM catalogs WHERE id = ?1"),
                params![id],
                row_to_catalog,
            )
            .optional()?;
        Ok(catalog)
    }

    pub fn list_catalogs(&self, filter: CatalogFilter) -> DbResult<Vec<Catalog>> {
        let mut sql = format!("SELECT {CATALOG_COLUMNS} FROM catalogs WHERE 1=1");
        let mut param_values: Vec<i64> = Vec::new();

        if let Some(user_id) = filter.user_id {
            param_values.push(user_id);
            sql.push_str(&format!(" AND user_id = ?{}", param_values.len()));
        }
        if let Some(language_id) = filter.language_id {
            param_values.push(language_id);
            sql.push_str(&format!(" AND language_id = ?{}", param_values.len()));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(param_values), row_to_catalog)?;

        let mut catalogs = Vec::new();
        for row in rows {
            catalogs.push(row?);
        }
        Ok(catalogs)
    }

    pub fn update_catalog(
        &mut self,
        id: i64,
        name: Option<&str>,
        language_id: Option<i64>,
    ) -> DbResult<Catalog> {
        let tx = self.conn.transaction()?;
        let exists = tx
            .query_row("SELECT 1 FROM catalogs WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?
            .is_some();
        if !exists {
            return Err(DbError::not_found("catalog", id));
        }
        if let Some(language_id) = language_id {
            ensure_exists(&tx, "languages", "language", language_id)?;
        }

        let mut sets = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        if let Some(n) = name {
            param_values.push(Box::new(n.to_string()));
            sets.push(format!("name = ?{}", param_values.len()));
        }
        if let Some(l) = language_id {
            param_values.push(Box::new(l));
            sets.push(format!("language_id = ?{}", param_values.len()));
        }

        if !sets.is_empty() {
            param_values.push(Box::new(id));
            let sql = format!(
                "UPDATE catalogs SET {} WHERE id = ?{}",
                sets.join(", "),
                param_values.len()
            );
            let params_ref: Vec<&dyn rusqlite::types::ToSql> =
                param_values.iter().map(|p| p.as_ref()).collect();
            tx.execute(&sql, params_ref.as_slice()).map_err(|e| {
                unique_violation(e, format!("catalog already exists: {}", name.unwrap_or("")))
            })?;
        }
        tx.commit()?;

        self.get_catalog(id)?
            .ok_or_else(|| DbError::not_found("catalog", id))
    }

    /// Delete a catalog and every word in it.
    pub fn delete_catalog(&self, id: i64) -> DbResult<()> {
        let rows = self
            .conn
            .execute("DELETE FROM catalogs WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(DbError::not_found("catalog", id));
        }
        Ok(())
    }

    // -- Words --

    pub fn insert_word(
        &mut self,
        catalog_id: i64,
        name: &str,
        pronunciation: Option<&str>,
        value: Option<&str>,
    ) -> DbResult<Word> {
        let date = today();
        let tx = self.conn.transaction()?;
        let exists = tx
            .query_row(
                "SELECT 1 FROM catalogs WHERE id = ?1",
                params![catalog_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(DbError::not_found("catalog", catalog_id));
        }
        tx.execute(
            "INSERT INTO words (catalog_id, name, pronunciation, value, date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![catalog_id, name, pronunciation, value, date.to_string()],
        )
        .map_err(|e| unique_violation(e, format!("word already exists: {name}")))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Word {
            id,
            catalog_id,
            name: name.to_string(),
            pronunciation: pronunciation.map(str::to_string),
            value: value.map(str::to_string),
            date,
        })
    }

    pub fn get_word(&self, id: i64) -> DbResult<Option<Word>> {
        let word = self
            .conn
            .query_row(
                &format!("SELECT {WORD_COLUMNS} FROM words WHERE id = ?1"),
                params![id],
                row_to_word,
            )
            .optional()?;
        Ok(word)
    }

    /// Words of one catalog, alphabetically.
    pub fn list_words(&self, catalog_id: i64) -> DbResult<Vec<Word>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WORD_COLUMNS} FROM words WHERE catalog_id = ?1 ORDER BY name ASC"
        ))?;
        let rows = stmt.query_map(params![catalog_id], row_to_word)?;

        let mut words = Vec::new();
        for row in rows {
            words.push(row?);
        }
        Ok(words)
    }

    pub fn update_word(
        &mut self,
        id: i64,
        name: Option<&str>,
        pronunciation: Option<&str>,
        value: Option<&str>,
    ) -> DbResult<Word> {
        let mut sets = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        for (column, field) in [
            ("name", name),
            ("pronunciation", pronunciation),
            ("value", value),
        ] {
            if let Some(v) = field {
                param_values.push(Box::new(v.to_string()));
                sets.push(format!("{column} = ?{}", param_values.len()));
            }
        }

        let tx = self.conn.transaction()?;
        if !sets.is_empty() {
            param_values.push(Box::new(id));
            let sql = format!(
                "UPDATE words SET {} WHERE id = ?{}",
                sets.join(", "),
                param_values.len()
            );
            let params_ref: Vec<&dyn rusqlite::types::ToSql> =
                param_values.iter().map(|p| p.as_ref()).collect();
            let rows = tx.execute(&sql, params_ref.as_slice()).map_err(|e| {
                unique_violation(e, format!("word already exists: {}", name.unwrap_or("")))
            })?;
            if rows == 0 {
                return Err(DbError::not_found("word", id));
            }
        }
        tx.commit()?;

        self.get_word(id)?
            .ok_or_else(|| DbError::not_found("word", id))
    }

    pub fn delete_word(&self, id: i64) -> DbResult<()> {
        let rows = self
            .conn
            .execute("DELETE FROM words WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(DbError::not_found("word", id));
        }
        Ok(())
    }

    // -- Stats --

    pub fn counts(&self) -> DbResult<Counts> {
        let counts = self.conn.query_row(
            "SELECT (SELECT COUNT(*) FROM users),
                    (SELECT COUNT(*) FROM languages),
                    (SELECT COUNT(*) FROM catalogs),
                    (SELECT COUNT(*) FROM words)",
            [],
            |row| {
                Ok(Counts {
                    users: row.get(0)?,
                    languages: row.get(1)?,
                    catalogs: row.get(2)?,
                    words: row.get(3)?,
                })
            },
        )?;
        Ok(counts)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Fail with `InvalidReference` when `table` has no row with the given id.
fn ensure_exists(conn: &Connection, table: &str, resource: &str, id: i64) -> DbResult<()> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE id = ?1"),
            params![id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if found {
        Ok(())
    } else {
        Err(DbError::InvalidReference(format!("{resource} not found: {id}")))
    }
}

/// Read the current schema version from the config table.
fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let value = conn
        .query_row(
            "SELECT value FROM config WHERE key = 'schema_version'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
}

/// Persist the schema version to the config table.
fn set_schema_version(conn: &Connection, version: i32) -> DbResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO config (key, value) VALUES ('schema_version', ?1)",
        params![version.to_string()],
    )?;
    Ok(())
}

/// Run all pending schema migrations in order, each inside its own transaction.
fn run_migrations(conn: &Connection) -> DbResult<()> {
    let version = get_schema_version(conn)?;

    if version < 1 {
        conn.execute_batch(
            "BEGIN;
             CREATE INDEX IF NOT EXISTS idx_catalogs_user ON catalogs(user_id);
             CREATE INDEX IF NOT EXISTS idx_catalogs_language ON catalogs(language_id);
             CREATE INDEX IF NOT EXISTS idx_words_catalog ON words(catalog_id);
             COMMIT;",
        )?;
        set_schema_version(conn, 1)?;
        tracing::info!("migrated schema to version 1");
    }

    Ok(())
}

fn parse_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    raw.parse::<NaiveDate>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_catalog(row: &Row<'_>) -> rusqlite::Result<Catalog> {
    Ok(Catalog {
        id: row.get(0)?,
        name: row.get(1)?,
        language_id: row.get(2)?,
        user_id: row.get(3)?,
        date: parse_date(row, 4)?,
    })
}

fn row_to_word(row: &Row<'_>) -> rusqlite::Result<Word> {
    Ok(Word {
        id: row.get(0)?,
        catalog_id: row.get(1)?,
        name: row.get(2)?,
        pronunciation: row.get(3)?,
        value: row.get(4)?,
        date: parse_date(row, 5)?,
    })
}
