//! Wiring shared by every subcommand: manifest, data directory and stores.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use appshell_runtime::{Manifest, NotificationCenter, Services};
use appshell_store::{FileSessionStore, SqliteDatabase};

use crate::cli::{self, Cli};

/// Concrete collaborators behind the trait objects in `Services`.
pub struct Backends {
    pub data_dir: PathBuf,
    pub manifest: Manifest,
    pub session: Arc<FileSessionStore>,
    pub database: Arc<SqliteDatabase>,
    pub notifier: Arc<NotificationCenter>,
    pub startup_timeout: Duration,
}

impl Backends {
    pub fn open(cli: &Cli) -> anyhow::Result<Self> {
        let manifest = Manifest::load(cli.manifest.as_deref())?;
        let data_dir = cli.data_dir.clone().unwrap_or_else(cli::default_data_dir);
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        let session = Arc::new(FileSessionStore::in_dir(&data_dir));
        let db_path = data_dir.join("cache.db");
        let database = Arc::new(
            SqliteDatabase::open(&db_path)
                .with_context(|| format!("failed to open database {}", db_path.display()))?,
        );
        tracing::debug!(data_dir = %data_dir.display(), "backends opened");

        Ok(Self {
            data_dir,
            manifest,
            session,
            database,
            notifier: Arc::new(NotificationCenter::new()),
            startup_timeout: Duration::from_millis(cli.startup_timeout_ms),
        })
    }

    pub fn services(&self) -> anyhow::Result<Services> {
        let services = Services::new(
            self.manifest.graph()?,
            self.manifest.bottom_navigation(),
            self.session.clone(),
            self.database.clone(),
        )
        .with_start_policy(self.manifest.start.clone())
        .with_startup_timeout(self.startup_timeout)
        .with_notifier(self.notifier.clone());
        Ok(services)
    }
}
