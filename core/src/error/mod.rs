#[allow(clippy::module_inception)]
pub mod error;
pub mod dispatch;
pub mod executor;

pub use dispatch::DispatchError;
pub use error::CliError;
pub use executor::ExecutorError;
