//! Trait abstractions for the pipeline's external collaborators.

pub mod ai;
pub mod blob;
pub mod store;
