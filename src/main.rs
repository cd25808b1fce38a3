mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "words",
    version,
    about = "Vocabulary store: users, languages, catalogs and words over a REST API"
)]
struct Cli {
    /// Path to the database file (default: .words/words.db in current dir)
    #[arg(long, env = "WORDS_DB", global = true)]
    db: Option<PathBuf>,

    /// Output as JSON instead of table
    #[arg(long, global = true)]
    json: bool,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, env = "WORDS_LOG", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and run migrations
    Init,
    /// Serve the HTTP API and front end
    Serve {
        /// Address to bind
        #[arg(long, env = "WORDS_BIND", default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(short, long, env = "WORDS_PORT", default_value_t = 6543)]
        port: u16,
    },
    /// Manage languages
    Language {
        #[command(subcommand)]
        action: LanguageAction,
    },
    /// Show row counts per table
    Stats,
}

#[derive(Subcommand)]
enum LanguageAction {
    /// Add a language
    Add {
        /// Language name
        name: String,
    },
    /// List languages
    List,
}

fn main() {
    let cli = Cli::parse();
    words::logging::init(&cli.log_level);

    let db_path = cli
        .db
        .unwrap_or_else(|| PathBuf::from(".words").join("words.db"));

    let result = match cli.command {
        Commands::Init => commands::init::run(&db_path),
        Commands::Serve { bind, port } => commands::serve::run(&db_path, &bind, port),
        Commands::Language { action } => match action {
            LanguageAction::Add { name } => commands::language::add(&db_path, &name, cli.json),
            LanguageAction::List => commands::language::list(&db_path, cli.json),
        },
        Commands::Stats => commands::stats::run(&db_path, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
