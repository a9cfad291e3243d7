//! Storage backend contract and construction.

use std::sync::Arc;

use tracing::info;

use crate::config::{BackendKind, CacheSettings};
use crate::error::{CacheError, CacheResult};

/// Byte-oriented store behind a [`RecordingCache`](crate::RecordingCache).
///
/// `key` is either the raw request or its digest, depending on
/// configuration. Implementations serialize their own writes; lookups of
/// different keys may run concurrently.
pub trait CacheBackend: Send + Sync {
    /// Stored response for `key` at `url`, if any.
    fn lookup(&self, url: &str, key: &[u8]) -> CacheResult<Option<Vec<u8>>>;

    /// Stores `response` for `key` at `url`, replacing any previous entry.
    fn store(&self, url: &str, key: &[u8], response: &[u8]) -> CacheResult<()>;

    /// Persists buffered writes.
    fn flush(&self) -> CacheResult<()>;
}

/// Builds the backend selected by `settings`.
pub fn open_backend(settings: &CacheSettings) -> CacheResult<Arc<dyn CacheBackend>> {
    let backend: Arc<dyn CacheBackend> = match settings.backend {
        #[cfg(feature = "memory")]
        BackendKind::Memory => Arc::new(crate::memory::MemoryBackend::new(&settings.memory)),
        #[cfg(feature = "file")]
        BackendKind::File => Arc::new(crate::file::FileBackend::open(&settings.file, settings.init)?),
        #[cfg(feature = "table")]
        BackendKind::Table => Arc::new(crate::table::TableBackend::open(&settings.table, settings.init)?),
        #[allow(unreachable_patterns)]
        other => {
            return Err(CacheError::Unsupported(format!(
                "backend '{}' is not compiled in",
                other.as_str()
            )))
        }
    };
    info!(
        target: "xmla::cache",
        backend = settings.backend.as_str(),
        init = settings.init,
        "cache backend initialized"
    );
    Ok(backend)
}
