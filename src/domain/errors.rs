use thiserror::Error;

/// Outcome of a provider send, categorized so the dispatcher can tell the
/// job queue whether redelivery makes sense.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("provider request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider rejected send ({code}): {message}")]
    Rejected {
        code: String,
        message: String,
        permanent: bool,
    },
}

impl SendError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, SendError::Rejected { permanent: true, .. })
    }

    pub fn code(&self) -> &str {
        match self {
            SendError::Timeout => "timeout",
            SendError::Transport(_) => "transport",
            SendError::Rejected { code, .. } => code,
        }
    }
}

/// Failure classification the dispatcher reports back to the job queue.
/// Replaces a raise-to-retry convention: the queue only ever sees an
/// explicit retryable/permanent verdict.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("rate limit exceeded for {recipient}")]
    RateLimited { recipient: String },
    #[error("transient send failure: {0}")]
    Transient(String),
    #[error("permanent send failure ({code}): {message}")]
    Permanent { code: String, message: String },
    /// Record store or broker trouble. A health signal, not a send outcome:
    /// the worker holds the job instead of counting it against the schedule.
    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl DispatchError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, DispatchError::Permanent { .. })
    }
}
