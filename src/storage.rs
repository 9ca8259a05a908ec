//! Embedded fjall database shared by the user store and the response cache.

use std::path::Path;

use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use tracing::info;

use crate::Result;

pub const USERS_KEYSPACE: &str = "users";
pub const CACHE_KEYSPACE: &str = "cache";

/// Handle to the on-disk database. Keep it alive for as long as keyspaces are in use.
pub struct Storage {
    db: Database,
}

impl Storage {
    /// Open (or create) the database in `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let db = Database::builder(path).open()?;
        info!("Opened data store at {}", path.display());
        Ok(Self { db })
    }

    /// Open (or create) a named keyspace
    pub fn keyspace(&self, name: &str) -> Result<Keyspace> {
        Ok(self.db.keyspace(name, KeyspaceCreateOptions::default)?)
    }
}
