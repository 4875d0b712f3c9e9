//! Dependency-aware execution of one aggregate batch.
//!
//! # Architecture
//!
//! ```text
//! AggregateRequest
//!   ↓
//! AggregateRequest::validate() → duplicate / empty ids
//!   ↓
//! TaskGraph::plan() → predicted rounds (logging, `ccproxy plan`)
//!   ↓
//! TaskGraphScheduler::run()
//!   loop: ready set → skip failed-dependency tasks
//!                   → TaskExecutor::execute() per ready task (concurrent)
//!                   → join → merge into ExecutionContext / errors
//!   ↓
//! AggregateReport { response, rounds }
//! ```
//!
//! Each executor sees a read-only snapshot of the context taken at the start of
//! its round. Only the scheduler writes, and only between rounds.
//!
//! # Strict mode
//!
//! With `allow_partial = false` a failing round is still awaited in full before
//! the call fails. In-flight siblings are not cancelled and their side effects
//! are not rolled back; the error names the first failure in batch order.

mod graph;
pub mod headers;
pub mod placeholder;
pub mod projection;
mod scheduler;
mod task_executor;
pub mod types;

pub use graph::{RoundPlan, TaskGraph};
pub use scheduler::{TaskGraphScheduler, DEFAULT_MAX_CONCURRENCY};
pub use task_executor::{build_request, TaskExecutor, DEFAULT_SUCCESS_CODE};
pub use types::{
    AggregateReport, AggregateRequest, AggregateResponse, ExecutionContext, ExecutionResult,
    Headers, HttpMethod, ProjectionMode, ProjectionSpec, RoundTrace, TaskDescriptor, TaskLike,
};
