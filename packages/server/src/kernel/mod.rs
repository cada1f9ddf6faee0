pub mod blob;
pub mod scheduled_tasks;

pub use blob::HttpBlobStore;
