//! Server core for the document Q&A backend.
//!
//! The crate is split into three layers:
//! - `domains` - business logic and persistence models (documents, events, auth)
//! - `kernel` - infrastructure adapters (blob store, scheduled tasks)
//! - `server` - HTTP surface (routes, middleware, app wiring)

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::Config;
