//! Mocknest HTTP Mock Server
//!
//! Serves canned responses for requests that match declarative stub
//! definitions ("mappings") loaded from JSON/YAML files.
//!
//! # Features
//!
//! - **Request Matching**: method, URL pattern (contains/exact/prefix/regex),
//!   required query parameters, required JSON body fields (dot-paths)
//! - **Best-Match Selection**: priority, then specificity score, then load
//!   order - deterministic even with overlapping mappings
//! - **Tiered Index**: mappings compiled into a method -> URL -> query ->
//!   body tree, deduplicated by canonical shape, rebuilt wholesale on reload
//! - **Latency Simulation**: per-mapping fixed delay
//! - **Introspection**: admin endpoints for loaded mappings and call history
//!
//! # Example Mapping
//!
//! ```json
//! {
//!   "id": "user-orders",
//!   "request": {
//!     "method": "POST",
//!     "urlPattern": "/users_orders",
//!     "queryParams": { "userId": "123" },
//!     "body": { "orderType": "ALL" }
//!   },
//!   "response": {
//!     "status": 201,
//!     "body": { "created": true },
//!     "fixedDelayMs": 100
//!   }
//! }
//! ```

pub mod dispatcher;
pub mod error;
pub mod fields;
pub mod history;
pub mod index;
pub mod loader;
pub mod mapping;
pub mod registry;
pub mod server;

pub use dispatcher::Dispatcher;
pub use error::MockError;
pub use history::{CallHistory, CallRecord};
pub use index::RuntimeIndex;
pub use mapping::{IncomingRequest, Mapping};
pub use registry::MappingRegistry;
pub use server::MockServer;
