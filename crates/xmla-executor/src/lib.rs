//! # xmla-executor
//!
//! Statement execution for XML for Analysis (XMLA) servers: builds SOAP
//! requests, runs them through a pluggable transport with timeout and
//! cancellation, and turns responses into rowsets or navigable cell sets.
//!
//! ## Key Features
//!
//! - **Transport agnostic** - bring any blocking HTTP client via [`ThreadTransport`]
//! - **Cancellable** - [`Statement::cancel`] never waits behind a slow query
//! - **Record/replay** - plug a [`ResponseCache`] in front of the transport
//! - **Typed results** - axes, positions, members with parsed unique names, typed cells
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use xmla_executor::{Connection, ConnectionConfig, ThreadTransport};
//!
//! let config = ConnectionConfig::builder()
//!     .with_url("http://localhost:8080/xmla")
//!     .with_catalog("FoodMart")
//!     .build();
//! let connection = Connection::new(config, Arc::new(ThreadTransport::new(http_post)));
//!
//! let statement = connection.create_statement();
//! statement.set_timeout(30)?;
//! let cell_set = statement.execute_olap_query(
//!     "SELECT {[Measures].[Unit Sales]} ON COLUMNS, [Store].Children ON ROWS FROM [Sales]",
//! )?;
//!
//! for cell in cell_set.cells()? {
//!     println!("{:?} = {:?}", cell.coordinates, cell.formatted_value);
//! }
//! ```
//!
//! ## Error Kinds
//!
//! | Error | Raised when |
//! |-------|-------------|
//! | `Parse` | A member unique name or identifier text is malformed |
//! | `ProtocolFault` | The server answered with a SOAP fault or XMLA error |
//! | `Timeout` | No response within the statement timeout |
//! | `Cancelled` | `cancel()` was called before or during execution |
//! | `Transport` | The transport failed for any other reason |
//! | `InvalidCoordinate` | A cell ordinal or coordinate is out of range |
//! | `UnsupportedOperation` | The driver deliberately lacks the capability |
//!
//! ## Architecture
//!
//! ```text
//! Statement::execute_olap_query(query)
//!   ├── close the cell set still open on this statement
//!   ├── build Execute envelope (request.rs)
//!   ├── ResponseCache::get ── hit ──────────────┐
//!   ├── Transport::submit → PendingResponse     │
//!   ├── wait(timeout)  (statement lock released) │
//!   ├── ResponseCache::put                      │
//!   └── parse envelope → CellSet  ◄─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cellset;
mod config;
mod connection;
mod coordinates;
mod error;
mod mddataset;
mod query;
mod request;
mod response;
mod result;
mod rowset;
mod statement;
mod traits;
mod transport;
mod xml;

// Public re-exports
pub use cellset::{Axis, AxisOrdinal, Cell, CellSet, CellValue, Member, Position};
pub use config::{property, ConnectionConfig, ConnectionConfigBuilder};
pub use connection::Connection;
pub use coordinates::{
    cell_count, coordinates_to_ordinal, enumerate, ordinal_to_coordinates, CoordinateSpace,
    Coordinates, Endianness,
};
pub use error::{BoxError, XmlaError, XmlaResult};
pub use query::{AxisSet, MdxQuery, QueryAxis, SelectQuery};
pub use request::{discover_envelope, execute_envelope, ResponseFormat};
pub use result::ExecutionStats;
pub use rowset::{Column, RowSet};
pub use statement::{Statement, StatementPhase};
pub use traits::ResponseCache;
pub use transport::{PendingCall, PendingResponse, ThreadTransport, Transport};
