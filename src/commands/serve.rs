use std::path::Path;

use anyhow::Context;

pub fn run(db_path: &Path, bind: &str, port: u16) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(words::web::serve(db_path, bind, port))
}
