pub mod models;

pub use models::event::DetectedEvent;
