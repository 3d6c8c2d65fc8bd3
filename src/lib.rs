pub mod apps;
pub mod cli;
pub mod config;
pub mod db;
pub mod gallery;
pub mod host;
pub mod kv;
pub mod lifecycle;
pub mod presenter;
pub mod preview;
pub mod timer;
mod utils;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use config::ShellConfig;
use db::Database;
use host::FileAppHost;
use kv::KvStore;
use lifecycle::{Kernel, KernelHandle};
use presenter::LogPresenter;

const KV_FILE: &str = "kv.json";
const DB_FILE: &str = "lostbox.sqlite3";

/// Logs a failed boot step as a kernel panic naming the component.
fn boot_step<T>(component: &str, result: Result<T>) -> Result<T> {
    result.map_err(|err| {
        error!("Kernel panic: {component} failed to start: {err:?}");
        err.context(format!("kernel panic in {component}"))
    })
}

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    let default_level = if config::debug_enabled() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(default_level)
        .init();

    info!("LostBox starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(boot())
}

async fn boot() -> Result<()> {
    let data_dir = config::data_dir();
    let config = boot_step("config", ShellConfig::load(&data_dir))?;
    let store = boot_step("storage", KvStore::open(data_dir.join(KV_FILE)))?;
    let database = boot_step("database", Database::new(data_dir.join(DB_FILE)))?;

    match database.lock_credential().await {
        Ok(Some(credential)) => info!("Lock screen uses a {:?} credential", credential.kind),
        Ok(None) => info!("No lock credential set; first unlock will ask for one"),
        Err(err) => warn!("Could not read lock credential: {err:?}"),
    }

    match gallery::random_photo(&database).await {
        Ok(Some(photo)) => info!("Gallery widget shows {} ({})", photo.id, photo.mime),
        Ok(None) => info!("Gallery widget is empty"),
        Err(err) => warn!("Could not pick a gallery photo: {err:?}"),
    }

    let handle = Kernel::spawn(
        &config,
        store,
        Box::new(FileAppHost::new(config.web_root.clone())),
        Box::new(LogPresenter),
    );

    let result = drive(&handle, &database).await;
    if let Err(err) = handle.shutdown().await {
        warn!("Kernel did not shut down cleanly: {err:?}");
    }
    result
}

async fn drive(handle: &KernelHandle, database: &Database) -> Result<()> {
    info!("{}", cli::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let command = match cli::parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                warn!("{err}");
                continue;
            }
        };

        match cli::execute(handle, database, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => warn!("{err:#}"),
        }
    }

    Ok(())
}
