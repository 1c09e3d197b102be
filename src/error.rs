use std::io;
use std::path::PathBuf;

use crate::codec::CodecError;

/// Terminal failure of a single launch attempt.
///
/// Every variant is a distinct, inspectable reason; none are retried. Parse
/// and decode failures are raised before any process is created.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// A required flag appeared only with an unusable value.
    #[error("value of {flag} is not a valid unsigned integer")]
    MalformedArgument { flag: &'static str },

    /// A required flag never appeared in the argument list.
    #[error("required option {flag} is missing")]
    IncompleteSpec { flag: &'static str },

    /// The declared chunk count disagrees with the number of chunk flags.
    #[error("expected {declared} chunks but collected {collected}")]
    ChunkCountMismatch { declared: usize, collected: usize },

    /// A declared chunk index is duplicated, missing, or out of range.
    #[error("chunk indices are not contiguous: expected {expected}, found {found}")]
    ChunkOrdering { expected: usize, found: usize },

    #[error("cannot decode job payload")]
    Codec(#[from] CodecError),

    /// The decoded payload is not a JSON document.
    #[error("job payload is not a valid document")]
    Document(#[from] serde_json::Error),

    /// A document field is missing or has an unexpected type.
    #[error("job field {field:?} is missing or has an unexpected type")]
    Schema { field: &'static str },

    /// The requested working directory cannot be entered; nothing was
    /// spawned. Restore failures after a spawn are only reported.
    #[error("cannot change working directory to {path}")]
    Workdir { path: PathBuf, source: io::Error },

    /// The executable cannot be found or executed.
    #[error("cannot launch {executable}")]
    Spawn { executable: String, source: io::Error },
}
