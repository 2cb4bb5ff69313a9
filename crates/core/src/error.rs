//! Error type for the collaborator boundaries
//!
//! The pipeline itself never fails on text input. Only reply generation
//! and session persistence can return errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Reply generation failed: {0}")]
    Reply(String),

    #[error("Reply generation timed out after {0}ms")]
    ReplyTimeout(u64),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session already closed: {0}")]
    SessionClosed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
