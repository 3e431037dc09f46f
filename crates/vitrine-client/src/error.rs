use thiserror::Error;

use vitrine_store::BackendError;

use crate::draft::Step;

/// Failures of the fetch / write path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The tenant has no active document. Resolution treats this as "use
    /// defaults"; it is only surfaced where a document is required.
    #[error("No active token document")]
    NotFound,

    /// Network or backend failure. Retrying may succeed; local state is
    /// untouched.
    #[error("Temporary backend failure: {0}")]
    Transient(String),

    /// A record was fetched but could not be decoded.
    #[error("Malformed record: {0}")]
    Malformed(String),

    /// The active document was written by someone else after this session
    /// last wrote or read it.
    #[error("Document changed elsewhere (expected version {expected:?}, found {found})")]
    Conflict { expected: Option<u64>, found: u64 },

    /// The backend refused the write.
    #[error("Write rejected: {0}")]
    Rejected(String),
}

impl SyncError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<BackendError> for SyncError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable(msg) => Self::Transient(msg),
            BackendError::Rejected(msg) => Self::Rejected(msg),
            BackendError::Corrupt(msg) => Self::Malformed(msg),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Step {step} is missing required fields: {missing:?}")]
    Incomplete {
        step: Step,
        missing: Vec<String>,
    },

    #[error("Already on the first step")]
    AtFirstStep,

    #[error("The final step publishes; use publish()")]
    AtFinalStep,

    #[error("Publishing is only available from the final step")]
    NotOnFinalStep,

    #[error("Builder session is closed")]
    Closed,

    #[error(transparent)]
    Sync(#[from] SyncError),
}
