mod allocation;
mod analysis;
mod config;
mod db;
mod models;
mod run;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_logging();

    let mut args: Vec<String> = std::env::args().collect();
    let config = config::Config::load(&mut args)?;
    if args.len() < 2 {
        run::print_usage();
        return Ok(());
    }

    let mut db = db::Database::open(&config.db_path)?;
    tracing::debug!(owner = %config.owner, db = %config.db_path.display(), "starting");
    run::as_cli(&args, &mut db, &config)
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("BUDGETSPLIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
