//! Database table response store.
//!
//! A two-column table (request key, response) driven by templated SQL so
//! an existing schema can be reused. Only SQLite is available.

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::backend::CacheBackend;
use crate::config::TableSettings;
use crate::error::{CacheError, CacheResult};

/// SQLite-backed store.
pub struct TableBackend {
    conn: Mutex<Connection>,
    select_sql: String,
    insert_sql: String,
}

impl TableBackend {
    /// Connects and prepares the table.
    ///
    /// With `init` the table is dropped first; the create statement always
    /// runs, so it should tolerate an existing table.
    pub fn open(settings: &TableSettings, init: bool) -> CacheResult<Self> {
        if settings.driver != "sqlite" {
            return Err(CacheError::Unsupported(format!(
                "table driver '{}' is not available, only sqlite",
                settings.driver
            )));
        }
        if settings.user.is_some() || settings.password.is_some() {
            warn!(target: "xmla::cache", driver = %settings.driver, "credentials are ignored by this driver");
        }

        let location = settings.url.strip_prefix("sqlite:").unwrap_or(&settings.url);
        let conn = if location.is_empty() || location == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(location)?
        };

        if init {
            conn.execute_batch(&settings.drop_sql)?;
            debug!(target: "xmla::cache", location, "cache table dropped");
        }
        conn.execute_batch(&settings.create_sql)?;

        Ok(Self {
            conn: Mutex::new(conn),
            select_sql: settings.select_sql.clone(),
            insert_sql: settings.insert_sql.clone(),
        })
    }
}

impl CacheBackend for TableBackend {
    /// Keys on the request alone; the table has no URL column.
    fn lookup(&self, _url: &str, key: &[u8]) -> CacheResult<Option<Vec<u8>>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&self.select_sql)?;
        let response = stmt
            .query_row(params![key], |row| row.get::<_, Vec<u8>>(0))
            .optional()?;
        Ok(response)
    }

    fn store(&self, _url: &str, key: &[u8], response: &[u8]) -> CacheResult<()> {
        let conn = self.conn.lock();
        conn.execute(&self.insert_sql, params![key, response])?;
        Ok(())
    }

    fn flush(&self) -> CacheResult<()> {
        Ok(())
    }
}
