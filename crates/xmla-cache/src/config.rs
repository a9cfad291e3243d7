//! Cache property parsing.
//!
//! Caches are configured from the flat string map a connection hands to
//! [`ResponseCache::configure`](xmla_executor::ResponseCache::configure).
//! Keys are case-insensitive; unknown keys are ignored.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CacheError, CacheResult};

/// Recognized property names.
pub mod property {
    /// Store request/response pairs in the backend.
    pub const RECORD: &str = "RECORD";
    /// Answer requests from previously stored responses.
    pub const PLAY: &str = "PLAY";
    /// Re-create the backend's storage on initialization.
    pub const INIT: &str = "INIT";
    /// `memory`, `file` or `table`.
    pub const BACKEND: &str = "BACKEND";
    /// Key entries by SHA-256 digest instead of raw request bytes.
    pub const DIGEST_KEYS: &str = "DIGEST_KEYS";
    /// Maximum entries kept by the memory backend.
    pub const MEMORY_SIZE: &str = "MEMORY_SIZE";
    /// Seconds a memory entry stays valid.
    pub const MEMORY_TTL_SECS: &str = "MEMORY_TTL_SECS";
    /// File replayed from.
    pub const FILE_INPUT: &str = "FILE_INPUT";
    /// File recorded to.
    pub const FILE_OUTPUT: &str = "FILE_OUTPUT";
    /// Database driver identity; only `sqlite` is available.
    pub const TABLE_DRIVER: &str = "TABLE_DRIVER";
    /// Database location (`:memory:`, a path, or `sqlite:<path>`).
    pub const TABLE_URL: &str = "TABLE_URL";
    /// Database user.
    pub const TABLE_USER: &str = "TABLE_USER";
    /// Database password.
    pub const TABLE_PASSWORD: &str = "TABLE_PASSWORD";
    /// Statement creating the cache table.
    pub const TABLE_CREATE_SQL: &str = "TABLE_CREATE_SQL";
    /// Statement dropping the cache table.
    pub const TABLE_DROP_SQL: &str = "TABLE_DROP_SQL";
    /// Statement selecting a response; `?1` is the request key.
    pub const TABLE_SELECT_SQL: &str = "TABLE_SELECT_SQL";
    /// Statement storing a pair; `?1` is the request key, `?2` the response.
    pub const TABLE_INSERT_SQL: &str = "TABLE_INSERT_SQL";
}

/// Default number of entries kept by the memory backend.
pub const DEFAULT_MEMORY_SIZE: usize = 1000;

/// Default time-to-live of a memory entry.
pub const DEFAULT_MEMORY_TTL: Duration = Duration::from_secs(3600);

/// Which storage backs the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Bounded in-process LRU.
    Memory,
    /// Flat encoded record file.
    File,
    /// Database table.
    Table,
}

impl BackendKind {
    /// Name used in the `BACKEND` property.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::File => "file",
            BackendKind::Table => "table",
        }
    }
}

/// Settings for the memory backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySettings {
    /// Maximum number of entries.
    pub max_entries: usize,
    /// Entry time-to-live.
    pub ttl: Duration,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MEMORY_SIZE,
            ttl: DEFAULT_MEMORY_TTL,
        }
    }
}

/// Settings for the file backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSettings {
    /// File replayed from.
    pub input: Option<PathBuf>,
    /// File recorded to; None makes the backend read-only.
    pub output: Option<PathBuf>,
}

/// Settings for the table backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSettings {
    /// Driver identity.
    pub driver: String,
    /// Database location.
    pub url: String,
    /// Database user.
    pub user: Option<String>,
    /// Database password.
    pub password: Option<String>,
    /// Create statement.
    pub create_sql: String,
    /// Drop statement.
    pub drop_sql: String,
    /// Select statement.
    pub select_sql: String,
    /// Insert statement.
    pub insert_sql: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            driver: "sqlite".to_string(),
            url: ":memory:".to_string(),
            user: None,
            password: None,
            create_sql: "CREATE TABLE IF NOT EXISTS xmla_cache (\
                         request BLOB PRIMARY KEY, response BLOB NOT NULL)"
                .to_string(),
            drop_sql: "DROP TABLE IF EXISTS xmla_cache".to_string(),
            select_sql: "SELECT response FROM xmla_cache WHERE request = ?1".to_string(),
            insert_sql: "INSERT OR REPLACE INTO xmla_cache (request, response) VALUES (?1, ?2)"
                .to_string(),
        }
    }
}

/// Parsed cache properties.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use xmla_cache::{BackendKind, CacheSettings};
///
/// let props = HashMap::from([
///     ("record".to_string(), "yes".to_string()),
///     ("FILE_OUTPUT".to_string(), "capture.txt".to_string()),
/// ]);
/// let settings = CacheSettings::from_properties(&props).unwrap();
/// assert!(settings.record);
/// assert_eq!(settings.backend, BackendKind::File);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Store pairs in the backend.
    pub record: bool,
    /// Answer from stored responses.
    pub play: bool,
    /// Re-create storage on initialization.
    pub init: bool,
    /// Key by digest instead of raw bytes.
    pub digest_keys: bool,
    /// Selected backend.
    pub backend: BackendKind,
    /// Memory backend settings.
    pub memory: MemorySettings,
    /// File backend settings.
    pub file: FileSettings,
    /// Table backend settings.
    pub table: TableSettings,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            record: false,
            play: false,
            init: false,
            digest_keys: false,
            backend: BackendKind::Memory,
            memory: MemorySettings::default(),
            file: FileSettings::default(),
            table: TableSettings::default(),
        }
    }
}

impl CacheSettings {
    /// Parses a property map.
    ///
    /// Without `BACKEND`, a file backend is chosen when a file path is set,
    /// a table backend when `TABLE_URL` is set, otherwise memory.
    pub fn from_properties(properties: &HashMap<String, String>) -> CacheResult<Self> {
        let props: HashMap<String, &str> = properties
            .iter()
            .map(|(k, v)| (k.trim().to_ascii_uppercase(), v.trim()))
            .collect();
        let text = |key: &str| props.get(key).copied().filter(|v| !v.is_empty());

        let mut settings = CacheSettings {
            record: flag(&props, property::RECORD)?,
            play: flag(&props, property::PLAY)?,
            init: flag(&props, property::INIT)?,
            digest_keys: flag(&props, property::DIGEST_KEYS)?,
            ..CacheSettings::default()
        };

        if let Some(size) = text(property::MEMORY_SIZE) {
            settings.memory.max_entries = usize::try_from(number(property::MEMORY_SIZE, size)?)
                .map_err(|_| {
                    CacheError::InvalidConfig(format!("{} is too large, got '{}'", property::MEMORY_SIZE, size))
                })?;
        }
        if let Some(ttl) = text(property::MEMORY_TTL_SECS) {
            settings.memory.ttl = Duration::from_secs(number(property::MEMORY_TTL_SECS, ttl)?);
        }

        settings.file.input = text(property::FILE_INPUT).map(PathBuf::from);
        settings.file.output = text(property::FILE_OUTPUT).map(PathBuf::from);

        let table = &mut settings.table;
        if let Some(driver) = text(property::TABLE_DRIVER) {
            table.driver = driver.to_ascii_lowercase();
        }
        if let Some(url) = text(property::TABLE_URL) {
            table.url = url.to_string();
        }
        table.user = text(property::TABLE_USER).map(str::to_string);
        table.password = text(property::TABLE_PASSWORD).map(str::to_string);
        for (key, slot) in [
            (property::TABLE_CREATE_SQL, &mut table.create_sql),
            (property::TABLE_DROP_SQL, &mut table.drop_sql),
            (property::TABLE_SELECT_SQL, &mut table.select_sql),
            (property::TABLE_INSERT_SQL, &mut table.insert_sql),
        ] {
            if let Some(sql) = text(key) {
                *slot = sql.to_string();
            }
        }

        settings.backend = match text(property::BACKEND) {
            Some(name) => match name.to_ascii_lowercase().as_str() {
                "memory" => BackendKind::Memory,
                "file" => BackendKind::File,
                "table" => BackendKind::Table,
                other => {
                    return Err(CacheError::InvalidConfig(format!(
                        "unknown backend '{}', expected memory, file or table",
                        other
                    )))
                }
            },
            None if settings.file.input.is_some() || settings.file.output.is_some() => {
                BackendKind::File
            }
            None if text(property::TABLE_URL).is_some() => BackendKind::Table,
            None => BackendKind::Memory,
        };

        Ok(settings)
    }

    /// Whether the cache does anything at all.
    pub fn is_enabled(&self) -> bool {
        self.record || self.play
    }
}

fn flag(props: &HashMap<String, &str>, key: &str) -> CacheResult<bool> {
    match props.get(key).map(|v| v.to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "" | "false" | "no" | "0" => Ok(false),
            "true" | "yes" | "1" => Ok(true),
            _ => Err(CacheError::InvalidConfig(format!(
                "{} must be a boolean, got '{}'",
                key, v
            ))),
        },
    }
}

fn number(key: &str, value: &str) -> CacheResult<u64> {
    value.parse().map_err(|_| {
        CacheError::InvalidConfig(format!("{} must be a non-negative integer, got '{}'", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // =========================================================================
    // Flags
    // =========================================================================

    #[test]
    fn test_empty_map_is_pass_through() {
        let settings = CacheSettings::from_properties(&HashMap::new()).unwrap();
        assert_eq!(settings, CacheSettings::default());
        assert!(!settings.is_enabled());
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let settings =
            CacheSettings::from_properties(&props(&[("record", "true"), ("Play", "1")])).unwrap();
        assert!(settings.record);
        assert!(settings.play);
        assert!(settings.is_enabled());
    }

    #[test]
    fn test_boolean_spellings() {
        for (text, expected) in [("yes", true), ("NO", false), ("0", false), ("True", true)] {
            let settings = CacheSettings::from_properties(&props(&[("INIT", text)])).unwrap();
            assert_eq!(settings.init, expected, "{}", text);
        }
    }

    #[test]
    fn test_invalid_boolean_is_rejected() {
        let err = CacheSettings::from_properties(&props(&[("PLAY", "sometimes")])).unwrap_err();
        assert!(matches!(err, CacheError::InvalidConfig(m) if m.contains("PLAY")));
    }

    // =========================================================================
    // Backend selection
    // =========================================================================

    #[test]
    fn test_backend_inferred_from_paths() {
        let file = CacheSettings::from_properties(&props(&[("FILE_INPUT", "in.txt")])).unwrap();
        assert_eq!(file.backend, BackendKind::File);
        assert_eq!(file.file.input, Some(PathBuf::from("in.txt")));
        assert_eq!(file.file.output, None);

        let table = CacheSettings::from_properties(&props(&[("TABLE_URL", "cache.db")])).unwrap();
        assert_eq!(table.backend, BackendKind::Table);
        assert_eq!(table.table.url, "cache.db");
    }

    #[test]
    fn test_explicit_backend_wins() {
        let settings = CacheSettings::from_properties(&props(&[
            ("BACKEND", "Memory"),
            ("FILE_OUTPUT", "out.txt"),
        ]))
        .unwrap();
        assert_eq!(settings.backend, BackendKind::Memory);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let err = CacheSettings::from_properties(&props(&[("BACKEND", "redis")])).unwrap_err();
        assert!(err.to_string().contains("redis"));
    }

    // =========================================================================
    // Backend parameters
    // =========================================================================

    #[test]
    fn test_memory_parameters() {
        let settings = CacheSettings::from_properties(&props(&[
            ("MEMORY_SIZE", "5"),
            ("MEMORY_TTL_SECS", "60"),
        ]))
        .unwrap();
        assert_eq!(settings.memory.max_entries, 5);
        assert_eq!(settings.memory.ttl, Duration::from_secs(60));

        assert!(CacheSettings::from_properties(&props(&[("MEMORY_SIZE", "-1")])).is_err());
    }

    #[test]
    fn test_memory_size_never_truncates() {
        let huge = u64::MAX.to_string();
        match CacheSettings::from_properties(&props(&[("MEMORY_SIZE", huge.as_str())])) {
            Ok(settings) => assert_eq!(settings.memory.max_entries as u64, u64::MAX),
            Err(err) => assert!(matches!(err, CacheError::InvalidConfig(_)), "{}", err),
        }

        let overflow = CacheSettings::from_properties(&props(&[("MEMORY_SIZE", "18446744073709551616")]))
            .unwrap_err();
        assert!(matches!(overflow, CacheError::InvalidConfig(_)));
    }

    #[test]
    fn test_table_templates_override_defaults() {
        let settings = CacheSettings::from_properties(&props(&[
            ("TABLE_DRIVER", "SQLite"),
            ("TABLE_SELECT_SQL", "SELECT r FROM t WHERE k = ?1"),
            ("TABLE_USER", "olap"),
        ]))
        .unwrap();
        assert_eq!(settings.table.driver, "sqlite");
        assert_eq!(settings.table.select_sql, "SELECT r FROM t WHERE k = ?1");
        assert_eq!(settings.table.user.as_deref(), Some("olap"));
        assert_eq!(settings.table.insert_sql, TableSettings::default().insert_sql);
    }
}
