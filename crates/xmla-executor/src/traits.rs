//! Traits for plugging a response cache into statement execution.
//!
//! This module defines the [`ResponseCache`] trait consulted by
//! [`Statement`](crate::Statement) before a request reaches the transport.
//!
//! # Architecture Note
//!
//! This crate intentionally does NOT depend on `xmla-cache`. The trait is
//! defined here and the record/play implementation lives in the cache
//! crate, so either side can be replaced independently.
//!
//! # Example: a cache that never hits
//!
//! ```rust
//! use std::collections::HashMap;
//! use xmla_executor::{ResponseCache, XmlaResult};
//!
//! struct NoCache;
//!
//! impl ResponseCache for NoCache {
//!     fn configure(
//!         &self,
//!         _connection: &HashMap<String, String>,
//!         _cache: &HashMap<String, String>,
//!     ) -> XmlaResult<String> {
//!         Ok("none".to_string())
//!     }
//!
//!     fn get(&self, _id: &str, _url: &str, _request: &[u8]) -> XmlaResult<Option<Vec<u8>>> {
//!         Ok(None)
//!     }
//!
//!     fn put(&self, _id: &str, _url: &str, _request: &[u8], _response: &[u8]) -> XmlaResult<()> {
//!         Ok(())
//!     }
//!
//!     fn flush(&self) -> XmlaResult<()> {
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::HashMap;

use crate::error::XmlaResult;

/// Record/replay layer keyed by request content.
///
/// Implementations are shared across statements and connections and must
/// serialize their own writes.
pub trait ResponseCache: Send + Sync {
    /// Initializes the cache for one connection and returns an opaque
    /// session id. Calling it again with the same properties is harmless.
    fn configure(
        &self,
        connection: &HashMap<String, String>,
        cache: &HashMap<String, String>,
    ) -> XmlaResult<String>;

    /// Previously captured response for `request`, if replay is enabled.
    fn get(&self, id: &str, url: &str, request: &[u8]) -> XmlaResult<Option<Vec<u8>>>;

    /// Captures a request/response pair, if recording is enabled.
    fn put(&self, id: &str, url: &str, request: &[u8], response: &[u8]) -> XmlaResult<()>;

    /// Persists anything buffered.
    fn flush(&self) -> XmlaResult<()>;
}
