// cidtree - terminal browser for the buildtree catalog
// Browse groups/titles/tabs, search, mark items and hand their CIDs to ./play

use anyhow::Result;
use cidtree::{config::Config, session::Session, ui::App};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cidtree")]
#[command(about = "Terminal browser for a grouped media catalog")]
struct Args {
    /// Enable developer logging (debug output everywhere)
    #[arg(long)]
    dev: bool,

    /// Config file to use instead of the per-user one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog document to browse (overrides `catalog_path`)
    #[arg(long)]
    catalog: Option<PathBuf>,
}

fn init_logging(log_dir: &Path, dev: bool) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    // Daily rotating file appender; the terminal belongs to the UI
    let file_appender = tracing_appender::rolling::daily(log_dir, "cidtree.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let base_filter = if dev {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cidtree=debug"))
    };

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(base_filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    if dev {
        eprintln!("🔧 Dev mode: debug logging to {}", log_dir.join("cidtree.log").display());
    }

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load config - falls back to defaults if missing
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(catalog) = args.catalog {
        config.catalog_path = catalog;
    }

    // Keep the guard alive so buffered log lines get flushed on exit
    let _log_guard = init_logging(&config.log_dir, args.dev)?;
    info!("cidtree starting, catalog at {}", config.catalog_path.display());

    let session = Session::open(config.catalog_path.clone(), config.player.default_mode);

    let mut app = App::new(config, session)?;
    app.run().await?;

    Ok(())
}
