//! # xmla-cache
//!
//! Record/replay response cache for `xmla-executor`.
//!
//! [`RecordingCache`] implements [`xmla_executor::ResponseCache`]. In
//! record mode it stores every request/response pair in a backend; in
//! play mode it answers a request from a stored response instead of the
//! network. With neither enabled it is a pure pass-through.
//!
//! ## Features
//!
//! Each backend is independently feature-gated:
//!
//! - **`memory`**: Bounded LRU with time-to-live, lost when the process exits
//! - **`file`**: Flat record file, one base64-encoded pair per line
//! - **`table`**: SQLite table driven by templated statements
//! - **`full`** (default): Enable every backend
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use xmla_cache::RecordingCache;
//! use xmla_executor::Connection;
//!
//! // First run: capture everything the server says.
//! let props = HashMap::from([
//!     ("RECORD".to_string(), "true".to_string()),
//!     ("FILE_OUTPUT".to_string(), "sales.replay".to_string()),
//! ]);
//! let connection = Connection::with_cache(config, transport, Arc::new(RecordingCache::new()), &props)?;
//!
//! // Later runs: answer from the capture.
//! let props = HashMap::from([
//!     ("PLAY".to_string(), "true".to_string()),
//!     ("FILE_INPUT".to_string(), "sales.replay".to_string()),
//! ]);
//! ```
//!
//! ## Properties
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `RECORD` / `PLAY` / `INIT` | Mode switches (`true/false/yes/no/1/0`) |
//! | `BACKEND` | `memory`, `file` or `table` (inferred from paths when absent) |
//! | `DIGEST_KEYS` | Key by SHA-256 of the request instead of its bytes |
//! | `MEMORY_SIZE`, `MEMORY_TTL_SECS` | Memory backend bounds |
//! | `FILE_INPUT`, `FILE_OUTPUT` | File backend paths |
//! | `TABLE_DRIVER`, `TABLE_URL`, `TABLE_*_SQL` | Table backend connection and templates |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backend;
pub mod config;
pub mod digest;
pub mod error;
mod recorder;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "file")]
pub mod file;

#[cfg(feature = "table")]
pub mod table;

// Public re-exports
pub use backend::{open_backend, CacheBackend};
pub use config::{
    property, BackendKind, CacheSettings, FileSettings, MemorySettings, TableSettings,
};
pub use digest::{request_digest, session_id};
pub use error::{CacheError, CacheResult};
pub use recorder::RecordingCache;

#[cfg(feature = "file")]
pub use file::{FileBackend, Record};
#[cfg(feature = "memory")]
pub use memory::MemoryBackend;
#[cfg(feature = "table")]
pub use table::TableBackend;
