//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and handed to the embedding shell
//! through AppState.

use crate::changes::ChangeBus;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::{BackupService, DrinksService, EventsService, SettingsService};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DB_FILE_NAME: &str = "sipcontrol.db";

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub drinks: DrinksService,
    pub events: EventsService,
    pub settings: SettingsService,
    pub backup: BackupService,
    pub changes: ChangeBus,
    pub app_data_dir: PathBuf,
}

/// Application setup - called once on startup by the embedding shell.
///
/// Opens (or creates) the database under the given data directory, runs
/// migrations, and seeds the default drink and settings on first run.
pub async fn setup(app_data_dir: &Path) -> Result<AppState> {
    tracing::info!("Initializing application at {:?}", app_data_dir);

    std::fs::create_dir_all(app_data_dir)?;

    let pool = create_pool(&app_data_dir.join(DB_FILE_NAME)).await?;
    let repo = Repository::new(pool);

    // First run: one default drink plus the settings row, atomically, so
    // the store is never observed half-initialized.
    repo.seed_defaults().await?;

    let changes = ChangeBus::new();
    let state = AppState {
        drinks: DrinksService::new(repo.clone(), changes.clone()),
        events: EventsService::new(repo.clone(), changes.clone()),
        settings: SettingsService::new(repo.clone(), changes.clone()),
        backup: BackupService::new(repo.clone(), changes.clone()),
        repo,
        changes,
        app_data_dir: app_data_dir.to_path_buf(),
    };

    tracing::info!("Application initialized successfully");

    Ok(state)
}

/// Initialize logging for the embedding shell.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sipcontrol=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
