pub mod chat;
pub mod documents;
pub mod events;
pub mod health;

pub use chat::{chat_handler, chat_stream_handler};
pub use documents::{get_document, ingest_text, upload_document};
pub use events::list_events;
pub use health::health_handler;
