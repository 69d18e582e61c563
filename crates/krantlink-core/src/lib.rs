//! Entity-linking engine for historical newspaper articles.
//!
//! Given an article URL the engine fetches OCR text and NER spans, groups
//! the recognised mentions into clusters, retrieves candidate descriptions
//! from the knowledge-base index, scores them with a trained model and
//! emits one link result per unique mention. See [`linker::EntityLinker`]
//! for the entry point.

use thiserror::Error;

pub mod cluster;
pub mod config;
pub mod context;
pub mod features;
pub mod linker;
pub mod mention;
pub mod remote;
pub mod result;
pub mod retrieval;
pub mod text;

pub use config::LinkerSettings;
pub use linker::{EntityLinker, LinkerOptions};
pub use remote::Remotes;
pub use result::LinkResponse;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("service error: {0}")]
    Service(#[from] krantlink_services::ServiceError),
    #[error("index error: {0}")]
    Index(#[from] krantlink_kb::KbError),
    #[error("model error: {0}")]
    Model(#[from] krantlink_model::ModelError),
}
