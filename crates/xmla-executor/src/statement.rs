//! Statement execution.
//!
//! A [`Statement`] runs one request at a time through
//! `envelope -> cache -> transport -> wait -> parse`. Its mutable state sits
//! behind a short-lived lock; the blocking wait happens with the lock
//! released so [`Statement::cancel`] is never stuck behind a slow server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cellset::CellSet;
use crate::config::ConnectionConfig;
use crate::connection::ConnectionInner;
use crate::error::{XmlaError, XmlaResult};
use crate::mddataset::parse_cell_set;
use crate::query::MdxQuery;
use crate::request::{discover_envelope, execute_envelope, ResponseFormat};
use crate::response::parse_envelope;
use crate::result::ExecutionStats;
use crate::rowset::{parse_rowset, RowSet};
use crate::transport::PendingResponse;
use crate::xml::Element;

/// Where a statement is in its execution lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatementPhase {
    /// Nothing executed yet.
    #[default]
    Idle,
    /// A request is being prepared, submitted or awaited.
    Submitted,
    /// The last execution produced a result.
    Completed,
    /// The last execution was cancelled.
    Cancelled,
    /// The last execution ran out of time.
    TimedOut,
    /// The last execution failed.
    Failed,
}

#[derive(Default)]
struct StatementState {
    phase: StatementPhase,
    pending: Option<Arc<dyn PendingResponse>>,
    /// Set by `cancel()`; consumed by the current execution if one is
    /// running, otherwise by the next one.
    cancel_requested: bool,
    open_cell_set: Option<Arc<AtomicBool>>,
    timeout: Option<Duration>,
    closed: bool,
}

impl StatementState {
    fn close_open_cell_set(&mut self) {
        if let Some(flag) = self.open_cell_set.take() {
            flag.store(true, Ordering::Release);
        }
    }
}

/// Raw response bytes plus what it took to get them.
struct Exchange {
    bytes: Vec<u8>,
    cache_hit: bool,
    started: Instant,
}

/// Executes queries against the connection it was created from.
///
/// # Example
///
/// ```ignore
/// let statement = connection.create_statement();
/// statement.set_timeout(30)?;
///
/// let rows = statement.execute_query("SELECT ... FROM $system.discover_sessions")?;
/// let cells = statement.execute_olap_query("SELECT FROM [Sales]")?;
///
/// // From another thread:
/// statement.cancel();
/// ```
pub struct Statement {
    connection: Arc<ConnectionInner>,
    state: Mutex<StatementState>,
}

impl std::fmt::Debug for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Statement")
            .field("phase", &state.phase)
            .field("timeout", &state.timeout)
            .field("closed", &state.closed)
            .finish_non_exhaustive()
    }
}

impl Statement {
    pub(crate) fn new(connection: Arc<ConnectionInner>) -> Self {
        let timeout = connection.config.read().timeout;
        Self {
            connection,
            state: Mutex::new(StatementState {
                timeout,
                ..StatementState::default()
            }),
        }
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Executes `query` and returns a tabular rowset.
    pub fn execute_query<Q: MdxQuery + ?Sized>(&self, query: &Q) -> XmlaResult<RowSet> {
        let mdx = query.to_mdx();
        let exchange = self.run(false, |config| {
            execute_envelope(&mdx, config, ResponseFormat::Tabular)
        })?;
        let (rowset, stats) = self.finish(exchange, parse_rowset)?;
        Ok(rowset.with_stats(stats))
    }

    /// Executes `query` and returns a multidimensional cell set.
    ///
    /// Any cell set still open on this statement is closed first.
    pub fn execute_olap_query<Q: MdxQuery + ?Sized>(&self, query: &Q) -> XmlaResult<CellSet> {
        let mdx = query.to_mdx();
        let exchange = self.run(true, |config| {
            execute_envelope(&mdx, config, ResponseFormat::Multidimensional)
        })?;
        let (cell_set, stats) = self.finish(exchange, parse_cell_set)?;
        let cell_set = cell_set.with_stats(stats);

        let mut state = self.state.lock();
        if state.closed {
            cell_set.close();
            return Err(XmlaError::Closed("statement"));
        }
        state.close_open_cell_set();
        state.open_cell_set = Some(cell_set.close_handle());
        Ok(cell_set)
    }

    /// Issues a `Discover` request and returns its rowset.
    pub fn discover(&self, request_type: &str, restrictions: &[(&str, &str)]) -> XmlaResult<RowSet> {
        let restrictions: Vec<(String, String)> = restrictions
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let exchange = self.run(false, |config| {
            discover_envelope(request_type, &restrictions, config)
        })?;
        let (rowset, stats) = self.finish(exchange, parse_rowset)?;
        Ok(rowset.with_stats(stats))
    }

    /// Builds the request, then gets response bytes from the cache or the
    /// transport.
    fn run<F>(&self, olap: bool, build: F) -> XmlaResult<Exchange>
    where
        F: FnOnce(&ConnectionConfig) -> XmlaResult<Vec<u8>>,
    {
        let started = Instant::now();
        let timeout = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(XmlaError::Closed("statement"));
            }
            if state.phase == StatementPhase::Submitted {
                return Err(XmlaError::InvalidRequest(
                    "statement is already executing".to_string(),
                ));
            }
            if olap {
                state.close_open_cell_set();
            }
            if state.cancel_requested {
                state.cancel_requested = false;
                state.phase = StatementPhase::Cancelled;
                info!(target: "xmla::statement", "cancelled before submission");
                return Err(XmlaError::Cancelled);
            }
            state.phase = StatementPhase::Submitted;
            state.timeout
        };

        let config = self.connection.config.read().clone();
        let result = build(&config).and_then(|request| self.exchange(&config.url, request, timeout, olap));
        match result {
            Ok((bytes, cache_hit)) => Ok(Exchange {
                bytes,
                cache_hit,
                started,
            }),
            Err(e) => {
                let phase = match &e {
                    XmlaError::Cancelled => StatementPhase::Cancelled,
                    XmlaError::Timeout(_) => StatementPhase::TimedOut,
                    _ => StatementPhase::Failed,
                };
                let mut state = self.state.lock();
                state.phase = phase;
                state.cancel_requested = false;
                Err(e)
            }
        }
    }

    fn exchange(
        &self,
        url: &str,
        request: Vec<u8>,
        timeout: Option<Duration>,
        olap: bool,
    ) -> XmlaResult<(Vec<u8>, bool)> {
        let format = if olap { "multidimensional" } else { "tabular" };

        if let Some(attached) = &self.connection.cache {
            if let Some(response) = attached.cache.get(&attached.session_id, url, &request)? {
                debug!(target: "xmla::statement", url, response_bytes = response.len(), "response cache hit");
                let mut state = self.state.lock();
                if state.cancel_requested {
                    state.cancel_requested = false;
                    return Err(XmlaError::Cancelled);
                }
                return Ok((response, true));
            }
            debug!(target: "xmla::statement", url, "response cache miss");
        }

        // cancel() may have landed while the envelope was built or the cache consulted.
        if std::mem::take(&mut self.state.lock().cancel_requested) {
            info!(target: "xmla::statement", url, "cancelled before submission");
            return Err(XmlaError::Cancelled);
        }

        info!(target: "xmla::statement", url, request_bytes = request.len(), format, "submitting request");
        let pending = self.connection.transport.submit(url, request.clone())?;

        {
            let mut state = self.state.lock();
            state.pending = Some(Arc::clone(&pending));
            // cancel() ran between the early check and now.
            if state.cancel_requested && !pending.cancel() {
                state.cancel_requested = false;
            }
        }

        let waited = pending.wait(timeout);

        let outcome = {
            let mut state = self.state.lock();
            state.pending = None;
            let cancelled = std::mem::take(&mut state.cancel_requested);
            match waited {
                _ if cancelled => Err(XmlaError::Cancelled),
                Err(XmlaError::Timeout(limit)) => {
                    pending.cancel();
                    Err(XmlaError::Timeout(limit))
                }
                other => other,
            }
        };

        match &outcome {
            Ok(bytes) => {
                debug!(target: "xmla::statement", url, response_bytes = bytes.len(), "response received");
            }
            Err(XmlaError::Cancelled) => info!(target: "xmla::statement", url, "execution cancelled"),
            Err(XmlaError::Timeout(limit)) => {
                warn!(target: "xmla::statement", url, timeout_ms = limit.as_millis() as u64, "execution timed out")
            }
            Err(e) => warn!(target: "xmla::statement", url, error = %e, "transport failed"),
        }
        let response = outcome?;

        if let Some(attached) = &self.connection.cache {
            attached
                .cache
                .put(&attached.session_id, url, &request, &response)?;
        }
        Ok((response, false))
    }

    /// Decodes the envelope and builds the result, recording the outcome.
    fn finish<T, P>(&self, exchange: Exchange, parse: P) -> XmlaResult<(T, ExecutionStats)>
    where
        P: FnOnce(&Element) -> XmlaResult<T>,
    {
        let parsed = parse_envelope(&exchange.bytes).and_then(|root| parse(&root));
        let phase = match &parsed {
            Ok(_) => StatementPhase::Completed,
            Err(e) => {
                if let XmlaError::ProtocolFault { code, message, .. } = e {
                    warn!(target: "xmla::statement", code = ?code, message = %message, "server fault");
                }
                StatementPhase::Failed
            }
        };
        self.state.lock().phase = phase;
        let value = parsed?;
        let stats = ExecutionStats::new(exchange.started.elapsed(), exchange.cache_hit, exchange.bytes.len());
        debug!(
            target: "xmla::statement",
            elapsed_ms = stats.duration.as_millis() as u64,
            cache_hit = stats.cache_hit,
            response_bytes = stats.response_bytes,
            "execution completed"
        );
        Ok((value, stats))
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Cancels the running execution, or the next one if none is running.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        match &state.pending {
            Some(pending) => {
                if pending.cancel() {
                    state.cancel_requested = true;
                    debug!(target: "xmla::statement", "in-flight request cancelled");
                } else {
                    debug!(target: "xmla::statement", "cancel lost the race with completion");
                }
            }
            None => {
                state.cancel_requested = true;
                debug!(target: "xmla::statement", phase = ?state.phase, "cancel recorded");
            }
        }
    }

    /// Bounds how long executions wait for a response, in seconds.
    ///
    /// 0 waits indefinitely; negative values are rejected.
    pub fn set_timeout(&self, seconds: i64) -> XmlaResult<()> {
        if seconds < 0 {
            return Err(XmlaError::InvalidArgument(format!(
                "timeout must not be negative, got {}",
                seconds
            )));
        }
        self.state.lock().timeout = match seconds {
            0 => None,
            s => Some(Duration::from_secs(s.unsigned_abs())),
        };
        Ok(())
    }

    /// Current timeout; None waits indefinitely.
    pub fn timeout(&self) -> Option<Duration> {
        self.state.lock().timeout
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> StatementPhase {
        self.state.lock().phase
    }

    /// Closes the statement and any open cell set. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        state.close_open_cell_set();
        if let Some(pending) = &state.pending {
            if pending.cancel() {
                state.cancel_requested = true;
            }
        }
        debug!(target: "xmla::statement", "statement closed");
    }

    /// Returns true once closed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        self.close();
    }
}
