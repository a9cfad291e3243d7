//! Connections: configuration, transport and response cache shared by
//! statements.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::error::XmlaResult;
use crate::statement::Statement;
use crate::traits::ResponseCache;
use crate::transport::Transport;

pub(crate) struct AttachedCache {
    pub cache: Arc<dyn ResponseCache>,
    pub session_id: String,
}

pub(crate) struct ConnectionInner {
    pub config: RwLock<ConnectionConfig>,
    pub transport: Arc<dyn Transport>,
    pub cache: Option<AttachedCache>,
}

/// A logical connection to one XMLA endpoint.
///
/// Cloning is cheap; clones share configuration, transport and cache.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use xmla_executor::{Connection, ConnectionConfig, ThreadTransport};
///
/// let config = ConnectionConfig::builder()
///     .with_url("http://localhost:8080/xmla")
///     .with_catalog("FoodMart")
///     .build();
/// let transport = Arc::new(ThreadTransport::new(http_post));
/// let connection = Connection::new(config, transport);
///
/// let statement = connection.create_statement();
/// let cell_set = statement.execute_olap_query("SELECT FROM [Sales]")?;
/// ```
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("config", &*self.inner.config.read())
            .field("session_id", &self.session_id())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Creates a connection without a response cache.
    pub fn new(config: ConnectionConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                config: RwLock::new(config),
                transport,
                cache: None,
            }),
        }
    }

    /// Creates a connection that consults `cache` before every submission.
    ///
    /// The cache is configured once here with the connection properties and
    /// `cache_properties`; the returned session id is used for every lookup.
    pub fn with_cache(
        config: ConnectionConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn ResponseCache>,
        cache_properties: &HashMap<String, String>,
    ) -> XmlaResult<Self> {
        let session_id = cache.configure(&config.properties(), cache_properties)?;
        info!(target: "xmla::cache", url = %config.url, session_id = %session_id, "response cache attached");
        Ok(Self {
            inner: Arc::new(ConnectionInner {
                config: RwLock::new(config),
                transport,
                cache: Some(AttachedCache { cache, session_id }),
            }),
        })
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> ConnectionConfig {
        self.inner.config.read().clone()
    }

    /// Changes the catalog used by subsequent executions.
    pub fn set_catalog(&self, catalog: impl Into<String>) {
        let catalog = catalog.into();
        debug!(target: "xmla::statement", catalog = %catalog, "catalog changed");
        self.inner.config.write().catalog = Some(catalog);
    }

    /// Changes the role used by subsequent executions (None clears it).
    pub fn set_role(&self, role: Option<String>) {
        self.inner.config.write().role = role;
    }

    /// Changes the locale used by subsequent executions.
    pub fn set_locale(&self, lcid: Option<u32>) {
        self.inner.config.write().locale = lcid;
    }

    /// Session id returned by the response cache, if one is attached.
    pub fn session_id(&self) -> Option<&str> {
        self.inner.cache.as_ref().map(|c| c.session_id.as_str())
    }

    /// Creates a statement bound to this connection.
    pub fn create_statement(&self) -> Statement {
        Statement::new(Arc::clone(&self.inner))
    }

    /// Flushes the response cache, if one is attached.
    pub fn flush_cache(&self) -> XmlaResult<()> {
        match &self.inner.cache {
            Some(attached) => attached.cache.flush(),
            None => Ok(()),
        }
    }
}
