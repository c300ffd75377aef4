//! # Database State
//!
//! Opens the checkout database from configuration.
//!
//! The `Database` from `caixa-db` wraps a `SqlitePool`, which is
//! thread-safe, so one `DbState` can back several sessions.

use tracing::info;

use crate::error::{CheckoutError, CheckoutResult};
use crate::state::ConfigState;
use caixa_db::{Database, DbConfig};

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Opens (creating if needed) the database at the configured path and
    /// runs migrations.
    pub async fn open(config: &ConfigState) -> CheckoutResult<Self> {
        let path = config.database_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CheckoutError::config(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        info!(path = %path.display(), "Opening checkout database");
        let db = Database::new(DbConfig::new(path)).await?;
        Ok(DbState { db })
    }

    pub fn inner(&self) -> &Database {
        &self.db
    }

    /// Clone of the database handle, e.g. to hand to a session.
    pub fn database(&self) -> Database {
        self.db.clone()
    }
}
