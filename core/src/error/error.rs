use thiserror::Error;

use super::ExecutorError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("executor failed: {0}")]
    Executor(#[from] ExecutorError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("invalid plan: {0}")]
    Plan(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}
