pub mod ingest;
pub mod models;

pub use ingest::IngestService;
pub use models::document::{Document, DocumentStatusStore, PgDocumentStore};
