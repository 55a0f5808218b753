//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] crate::persistence::PersistenceError),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("No document loaded")]
    NotLoaded,

    #[error("Session was not seeded from a template")]
    NoTemplate,

    #[error("Session is not bound to a project")]
    NoProject,

    #[error("Clipboard is empty")]
    EmptyClipboard,

    #[error("Unknown section kind: {0}")]
    UnknownSection(String),
}
