use thiserror::Error;

/// Per-task failures raised while a handler executes a task.
///
/// The scheduler catches every variant and records it as a `failed`
/// result; none of them terminate a run on their own.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("{0}")]
    Handler(String),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl DispatchError {
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }

    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
