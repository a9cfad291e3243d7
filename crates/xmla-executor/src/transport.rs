//! Transport contract and a thread-backed implementation.
//!
//! The executor never talks to the network itself. A [`Transport`] accepts
//! request bytes for a destination and hands back a [`PendingResponse`]
//! that can be awaited with a timeout or cancelled from another thread.
//!
//! # Example: plugging in an HTTP client
//!
//! ```ignore
//! use xmla_executor::ThreadTransport;
//!
//! let transport = ThreadTransport::new(|url, body| {
//!     let response = ureq::post(url)
//!         .set("Content-Type", "text/xml")
//!         .send_bytes(body)?;
//!     let mut bytes = Vec::new();
//!     response.into_reader().read_to_end(&mut bytes)?;
//!     Ok(bytes)
//! });
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::error::{BoxError, XmlaError, XmlaResult};

/// Submits request bytes to a destination.
pub trait Transport: Send + Sync {
    /// Starts an exchange. Must not block on the response.
    fn submit(&self, destination: &str, request: Vec<u8>)
        -> XmlaResult<Arc<dyn PendingResponse>>;
}

/// Handle to an in-flight exchange.
pub trait PendingResponse: Send + Sync {
    /// Blocks until the response arrives, the call is cancelled, or
    /// `timeout` elapses (`None` waits indefinitely).
    ///
    /// A response can be taken only once.
    fn wait(&self, timeout: Option<Duration>) -> XmlaResult<Vec<u8>>;

    /// Best-effort cancellation. Returns true if the call was still
    /// unresolved and is now cancelled.
    fn cancel(&self) -> bool;
}

// =============================================================================
// PendingCall
// =============================================================================

#[derive(Debug)]
enum CallState {
    Waiting,
    Done(XmlaResult<Vec<u8>>),
    Cancelled,
    Taken,
}

/// Completion slot shared between a waiter and whoever produces the result.
///
/// The first of [`complete`](PendingCall::complete) and
/// [`cancel`](PendingResponse::cancel) wins; the loser is discarded.
#[derive(Debug)]
pub struct PendingCall {
    state: Mutex<CallState>,
    resolved: Condvar,
}

impl Default for PendingCall {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingCall {
    /// Creates an unresolved call.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CallState::Waiting),
            resolved: Condvar::new(),
        }
    }

    /// Resolves the call. Returns false if it was already resolved or
    /// cancelled, in which case `result` is dropped.
    pub fn complete(&self, result: XmlaResult<Vec<u8>>) -> bool {
        let mut state = self.state.lock();
        if !matches!(*state, CallState::Waiting) {
            return false;
        }
        *state = CallState::Done(result);
        self.resolved.notify_all();
        true
    }

    /// Returns true once the call has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(*self.state.lock(), CallState::Cancelled)
    }

    /// Returns true once the call has been completed or cancelled.
    pub fn is_resolved(&self) -> bool {
        !matches!(*self.state.lock(), CallState::Waiting)
    }
}

impl PendingResponse for PendingCall {
    fn wait(&self, timeout: Option<Duration>) -> XmlaResult<Vec<u8>> {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut state = self.state.lock();
        loop {
            match std::mem::replace(&mut *state, CallState::Taken) {
                CallState::Done(result) => return result,
                CallState::Cancelled => {
                    *state = CallState::Cancelled;
                    return Err(XmlaError::Cancelled);
                }
                CallState::Taken => {
                    return Err(XmlaError::transport("response already consumed"));
                }
                CallState::Waiting => {
                    *state = CallState::Waiting;
                    match (deadline, timeout) {
                        (Some(deadline), Some(limit)) => {
                            let result = self.resolved.wait_until(&mut state, deadline);
                            if result.timed_out() && matches!(*state, CallState::Waiting) {
                                return Err(XmlaError::Timeout(limit));
                            }
                        }
                        _ => self.resolved.wait(&mut state),
                    }
                }
            }
        }
    }

    fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        if !matches!(*state, CallState::Waiting) {
            return false;
        }
        *state = CallState::Cancelled;
        self.resolved.notify_all();
        true
    }
}

// =============================================================================
// ThreadTransport
// =============================================================================

type ExchangeFn = dyn Fn(&str, &[u8]) -> Result<Vec<u8>, BoxError> + Send + Sync;

/// Runs a caller-supplied blocking exchange on a worker thread per request.
///
/// The exchange is skipped entirely when the call is cancelled before the
/// worker gets to it. A response that arrives after cancellation or timeout
/// is discarded.
pub struct ThreadTransport {
    exchange: Arc<ExchangeFn>,
    next_id: AtomicU64,
}

impl ThreadTransport {
    /// Wraps a blocking `(url, request) -> response` function.
    pub fn new<F>(exchange: F) -> Self
    where
        F: Fn(&str, &[u8]) -> Result<Vec<u8>, BoxError> + Send + Sync + 'static,
    {
        Self {
            exchange: Arc::new(exchange),
            next_id: AtomicU64::new(0),
        }
    }
}

impl std::fmt::Debug for ThreadTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadTransport")
            .field("submitted", &self.next_id.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Transport for ThreadTransport {
    fn submit(
        &self,
        destination: &str,
        request: Vec<u8>,
    ) -> XmlaResult<Arc<dyn PendingResponse>> {
        let call = Arc::new(PendingCall::new());
        let worker_call = Arc::clone(&call);
        let exchange = Arc::clone(&self.exchange);
        let destination = destination.to_string();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        std::thread::Builder::new()
            .name(format!("xmla-transport-{}", id))
            .spawn(move || {
                if worker_call.is_cancelled() {
                    debug!(target: "xmla::transport", id, "cancelled before exchange, skipping");
                    return;
                }
                let result = exchange(&destination, &request)
                    .map_err(|e| XmlaError::transport_with(format!("exchange with {} failed", destination), e));
                if !worker_call.complete(result) {
                    debug!(target: "xmla::transport", id, "response discarded, call already resolved");
                }
            })
            .map_err(|e| XmlaError::transport_with("failed to spawn transport worker", e))?;

        Ok(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    // =========================================================================
    // PendingCall
    // =========================================================================

    #[test]
    fn test_complete_then_wait() {
        let call = PendingCall::new();
        assert!(call.complete(Ok(b"done".to_vec())));
        assert_eq!(call.wait(None).unwrap(), b"done");
    }

    #[test]
    fn test_wait_times_out() {
        let call = PendingCall::new();
        let err = call.wait(Some(Duration::from_millis(20))).unwrap_err();
        assert!(matches!(err, XmlaError::Timeout(d) if d == Duration::from_millis(20)));
        assert!(!call.is_resolved());
    }

    #[test]
    fn test_cancel_wins_over_later_completion() {
        let call = PendingCall::new();
        assert!(call.cancel());
        assert!(!call.complete(Ok(b"late".to_vec())));
        assert!(call.wait(None).unwrap_err().is_cancelled());
    }

    #[test]
    fn test_completion_wins_over_later_cancel() {
        let call = PendingCall::new();
        assert!(call.complete(Ok(b"first".to_vec())));
        assert!(!call.cancel());
        assert_eq!(call.wait(None).unwrap(), b"first");
    }

    #[test]
    fn test_response_taken_once() {
        let call = PendingCall::new();
        call.complete(Ok(Vec::new()));
        assert!(call.wait(None).is_ok());
        let err = call.wait(None).unwrap_err();
        assert!(matches!(err, XmlaError::Transport { .. }));
    }

    #[test]
    fn test_cancel_wakes_waiter() {
        let call = Arc::new(PendingCall::new());
        let waiter = {
            let call = Arc::clone(&call);
            std::thread::spawn(move || call.wait(None))
        };
        std::thread::sleep(Duration::from_millis(20));
        assert!(call.cancel());
        let result = waiter.join().unwrap();
        assert!(result.unwrap_err().is_cancelled());
    }

    // =========================================================================
    // ThreadTransport
    // =========================================================================

    #[test]
    fn test_thread_transport_round_trip() {
        let transport = ThreadTransport::new(|url, body| {
            let mut out = url.as_bytes().to_vec();
            out.extend_from_slice(body);
            Ok(out)
        });
        let pending = transport.submit("u:", b"abc".to_vec()).unwrap();
        let response = pending.wait(Some(Duration::from_secs(5))).unwrap();
        assert_eq!(response, b"u:abc");
    }

    #[test]
    fn test_thread_transport_error_keeps_cause() {
        let transport = ThreadTransport::new(|_, _| {
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused").into())
        });
        let pending = transport.submit("http://down", Vec::new()).unwrap();
        let err = pending.wait(Some(Duration::from_secs(5))).unwrap_err();
        match err {
            XmlaError::Transport { message, source } => {
                assert!(message.contains("http://down"));
                assert_eq!(source.unwrap().to_string(), "refused");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_thread_transport_cancel_in_flight() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let transport = ThreadTransport::new(move |_, _| {
            let _ = release_rx.lock().recv();
            Ok(b"too late".to_vec())
        });
        let pending = transport.submit("x", Vec::new()).unwrap();
        assert!(pending.cancel());
        release_tx.send(()).unwrap();
        assert!(pending.wait(None).unwrap_err().is_cancelled());
    }
}
