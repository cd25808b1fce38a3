mod steps;

use std::collections::HashMap;
use std::path::PathBuf;

use cucumber::World;

/// Shared state carried through each scenario.
#[derive(Debug, Default, World)]
pub struct WordsWorld {
    /// Temporary directory that owns the database file.
    pub db_dir: Option<tempfile::TempDir>,
    /// Path to the SQLite database file inside `db_dir`.
    pub db_path: Option<PathBuf>,
    /// The raw stdout of the most recent `words` invocation.
    pub last_stdout: String,
    /// The raw stderr of the most recent `words` invocation.
    pub last_stderr: String,
    /// Exit code of the most recent `words` invocation.
    pub last_exit_code: i32,
    /// Alias to row id, populated by create steps and substituted into `{alias}` tokens.
    pub ids: HashMap<String, i64>,
    /// Port of the in-process server, once started.
    pub server_port: Option<u16>,
    pub server_handle: Option<tokio::task::JoinHandle<()>>,
    pub http_client: reqwest::Client,
    pub last_response_status: Option<u16>,
    pub last_response_content_type: Option<String>,
    pub last_response_body: Option<String>,
}

impl WordsWorld {
    /// Replace every `{alias}` token with the id stored under that alias.
    pub fn resolve(&self, text: &str) -> String {
        self.ids.iter().fold(text.to_string(), |acc, (alias, id)| {
            acc.replace(&format!("{{{alias}}}"), &id.to_string())
        })
    }

    pub fn id(&self, alias: &str) -> i64 {
        *self
            .ids
            .get(alias)
            .unwrap_or_else(|| panic!("no row with alias '{alias}'"))
    }
}

#[tokio::main]
async fn main() {
    WordsWorld::run("tests/features").await;
}
