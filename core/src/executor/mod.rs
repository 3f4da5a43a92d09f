//! Plan execution engine
//!
//! Runs an ordered task list with declared dependencies to completion:
//! - Dependency eligibility checks (`resolver`)
//! - Run-scoped workspace allocation and guaranteed teardown (`context`)
//! - Kind-to-handler routing with a generic fallback (`dispatch`)
//! - Sequential and bounded-parallel round scheduling, plus dry-run simulation (`scheduler`)
//! - Reduction of task results into a plan status (`aggregate`)
//!
//! # Architecture
//!
//! ```text
//! Plan { tasks }
//!   ↓
//! TaskGraph::from_tasks()   → duplicate ids rejected, diagnostics logged
//!   ↓
//! ContextManager::open()    → ExecutionContext (scratch workspace)
//!   ↓
//! Scheduler::run_sequential() | Scheduler::run_parallel()
//!   ↓                             ↳ DispatchTable::dispatch() per task
//! aggregate::summarize()    → ExecutionSummary
//!   ↓
//! ContextManager::close()   → workspace removed
//!   ↓
//! ExecutionResponse
//! ```

pub mod aggregate;
pub mod context;
pub mod dispatch;
mod engine;
pub mod graph;
mod observer;
mod progress;
pub mod resolver;
pub mod scheduler;
pub mod traits;
pub mod types;

pub use context::{ContextManager, ExecutionContext};
pub use dispatch::{DispatchTable, GenericTaskHandler};
pub use engine::{ExecutionEngine, ExecutionEngineBuilder};
pub use graph::{GraphDiagnostics, StagePlan, TaskGraph};
pub use observer::RunObserver;
pub use progress::ProgressMonitor;
pub use resolver::can_execute;
pub use scheduler::{simulate, Scheduler, DEPENDENCIES_NOT_MET};
pub use traits::{OutputRendererPlugin, RenderEvent, RetryStrategyPlugin, RunMode, ToolHandler};
pub use types::{
    Dependency, ExecutionOpts, ExecutionResponse, ExecutionResult, ExecutionSummary, Plan,
    PlanStatus, Task, TaskKind, TaskStatus, ToolOutcome,
};
