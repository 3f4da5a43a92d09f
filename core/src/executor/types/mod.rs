pub mod config;
pub mod outcome;
pub mod plan;
pub mod result;
pub mod task;

pub use config::*;
pub use outcome::*;
pub use plan::*;
pub use result::*;
pub use task::*;
