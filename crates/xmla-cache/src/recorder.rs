//! The record/play [`ResponseCache`] implementation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};
use xmla_executor::{ResponseCache, XmlaResult};

use crate::backend::{open_backend, CacheBackend};
use crate::config::CacheSettings;
use crate::digest::{request_digest, session_id};
use crate::error::{CacheError, CacheResult};

/// State created by the first `configure` call.
struct Session {
    settings: CacheSettings,
    /// Absent in pass-through mode.
    backend: Option<Arc<dyn CacheBackend>>,
    ids: HashSet<String>,
}

/// Response cache that records request/response pairs to a backend and
/// replays them.
///
/// The backend is opened once, by the first `configure` call; later calls
/// only issue session ids. When neither `RECORD` nor `PLAY` is set the
/// cache is a pure pass-through and never touches storage.
///
/// In play mode without recording, responses `put` during this instance's
/// lifetime are also replayed, so a repeated request hits even though
/// nothing reaches the backend.
///
/// # Example
///
/// ```ignore
/// use std::collections::HashMap;
/// use std::sync::Arc;
/// use xmla_cache::RecordingCache;
/// use xmla_executor::Connection;
///
/// let cache = Arc::new(RecordingCache::new());
/// let props = HashMap::from([
///     ("RECORD".to_string(), "true".to_string()),
///     ("FILE_OUTPUT".to_string(), "capture.txt".to_string()),
/// ]);
/// let connection = Connection::with_cache(config, transport, cache, &props)?;
/// ```
#[derive(Default)]
pub struct RecordingCache {
    session: Mutex<Option<Session>>,
    replayed: RwLock<HashMap<(String, Vec<u8>), Vec<u8>>>,
}

impl RecordingCache {
    /// Creates an unconfigured cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings in effect, once configured.
    pub fn settings(&self) -> Option<CacheSettings> {
        self.session.lock().as_ref().map(|s| s.settings.clone())
    }

    fn init(&self, connection: &HashMap<String, String>, cache: &HashMap<String, String>) -> CacheResult<String> {
        let id = session_id(connection, cache);
        let mut guard = self.session.lock();

        if let Some(session) = guard.as_mut() {
            let requested = CacheSettings::from_properties(cache)?;
            if requested != session.settings {
                warn!(target: "xmla::cache", session_id = %id, "cache already initialized, ignoring differing properties");
            } else {
                debug!(target: "xmla::cache", session_id = %id, "cache already initialized");
            }
            session.ids.insert(id.clone());
            return Ok(id);
        }

        let settings = CacheSettings::from_properties(cache)?;
        let backend = if settings.is_enabled() {
            Some(open_backend(&settings)?)
        } else {
            None
        };
        info!(
            target: "xmla::cache",
            session_id = %id,
            record = settings.record,
            play = settings.play,
            backend = settings.backend.as_str(),
            "response cache configured"
        );
        *guard = Some(Session {
            settings,
            backend,
            ids: HashSet::from([id.clone()]),
        });
        Ok(id)
    }

    /// Settings and backend for a known session, or None when inactive.
    fn active(&self, id: &str) -> CacheResult<Option<(CacheSettings, Arc<dyn CacheBackend>)>> {
        let guard = self.session.lock();
        let session = match guard.as_ref() {
            Some(session) => session,
            None => return Ok(None),
        };
        let backend = match &session.backend {
            Some(backend) => Arc::clone(backend),
            None => return Ok(None),
        };
        if !session.ids.contains(id) {
            return Err(CacheError::UnknownSession(id.to_string()));
        }
        Ok(Some((session.settings.clone(), backend)))
    }

    fn lookup(&self, id: &str, url: &str, request: &[u8]) -> CacheResult<Option<Vec<u8>>> {
        let (settings, backend) = match self.active(id)? {
            Some(active) if active.0.play => active,
            _ => return Ok(None),
        };
        let key = key_for(&settings, request);
        let slot = (url.to_string(), key);

        if let Some(response) = self.replayed.read().get(&slot) {
            debug!(target: "xmla::cache", url, "replayed response from this run");
            return Ok(Some(response.clone()));
        }
        let found = backend.lookup(url, &slot.1)?;
        debug!(target: "xmla::cache", url, hit = found.is_some(), "backend lookup");
        Ok(found)
    }

    fn record(&self, id: &str, url: &str, request: &[u8], response: &[u8]) -> CacheResult<()> {
        let (settings, backend) = match self.active(id)? {
            Some(active) => active,
            None => return Ok(()),
        };
        let key = key_for(&settings, request);
        if settings.record {
            backend.store(url, &key, response)?;
            debug!(target: "xmla::cache", url, response_bytes = response.len(), "response recorded");
        }
        // A recording backend replays on its own terms (TTL, capacity).
        if settings.play && !settings.record {
            self.replayed
                .write()
                .insert((url.to_string(), key), response.to_vec());
        }
        Ok(())
    }
}

impl std::fmt::Debug for RecordingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingCache")
            .field("settings", &self.settings())
            .field("replayed", &self.replayed.read().len())
            .finish()
    }
}

impl ResponseCache for RecordingCache {
    fn configure(
        &self,
        connection: &HashMap<String, String>,
        cache: &HashMap<String, String>,
    ) -> XmlaResult<String> {
        Ok(self.init(connection, cache)?)
    }

    fn get(&self, id: &str, url: &str, request: &[u8]) -> XmlaResult<Option<Vec<u8>>> {
        Ok(self.lookup(id, url, request)?)
    }

    fn put(&self, id: &str, url: &str, request: &[u8], response: &[u8]) -> XmlaResult<()> {
        Ok(self.record(id, url, request, response)?)
    }

    fn flush(&self) -> XmlaResult<()> {
        let backend = self
            .session
            .lock()
            .as_ref()
            .and_then(|s| s.backend.clone());
        if let Some(backend) = backend {
            backend.flush()?;
        }
        Ok(())
    }
}

fn key_for(settings: &CacheSettings, request: &[u8]) -> Vec<u8> {
    if settings.digest_keys {
        request_digest(request).into_bytes()
    } else {
        request.to_vec()
    }
}
