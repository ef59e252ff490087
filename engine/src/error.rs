use std::time::Duration;

use thiserror::Error;

/// Errors produced by the generation pipeline.
///
/// Only `Auth` on the initial submission is recovered locally (one refresh,
/// one resubmission); every other variant propagates to the caller unchanged.
#[derive(Debug, Error)]
pub enum ArtError {
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Request failed: {message}")]
    Request { message: String },

    /// The service finished the operation and reported an error payload
    #[error("Generation failed: {message}")]
    Generation { message: String },

    #[error("Generation timed out after {}s", deadline.as_secs())]
    Timeout { deadline: Duration },

    #[error("Couldn't store image: {message}")]
    Storage { message: String },
}
