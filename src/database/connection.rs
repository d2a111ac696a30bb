//! The host's SQLite handle.
//!
//! Every browser profile that starts the host opens the same file, so
//! connections wait on a held lock for [`BUSY_TIMEOUT`] instead of failing
//! the write outright.

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, warn};

use super::migrations;

/// How long a statement waits for another host to release the file.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Migrated connection to the snapshot store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens or creates the store file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        debug!("opening store {}", path.as_ref().display());
        Self::prepare(Connection::open(path)?)
    }

    /// Private store that lives as long as the handle. Used by tests.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migrations::run_all(&conn)?;
        let db = Self { conn };
        let version = db.schema_version();
        if version > migrations::CURRENT_SCHEMA_VERSION {
            warn!(
                "store schema is v{version}, this host knows v{}; newer tables are left alone",
                migrations::CURRENT_SCHEMA_VERSION
            );
        }
        Ok(db)
    }

    /// Highest migration recorded in the file.
    pub fn schema_version(&self) -> i32 {
        migrations::get_schema_version(&self.conn)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
