//! Vector store implementations.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryVectorStore;

#[cfg(feature = "postgres")]
pub use postgres::PgVectorStore;
