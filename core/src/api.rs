//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `ccproxy_core::api` instead of reaching into internal modules.

pub use crate::config::{
    apply_env_overrides, get_ccproxy_data_dir, load_default, load_from_path, AggregateConfig,
    AppConfig, HttpServerConfig, LoggingConfig, TransportConfig,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::error::{AggregateError, CliError, ErrorCode, SetupError};
pub use crate::executor::headers::{forwarded_headers, DEFAULT_FORWARD_HEADERS};
pub use crate::executor::{
    AggregateReport, AggregateRequest, AggregateResponse, ExecutionContext, ExecutionResult,
    Headers, HttpMethod, ProjectionMode, ProjectionSpec, RoundPlan, RoundTrace, TaskDescriptor,
    TaskExecutor, TaskGraph, TaskGraphScheduler, DEFAULT_MAX_CONCURRENCY, DEFAULT_SUCCESS_CODE,
};
pub use crate::transport::{
    HttpTransport, TransportError, TransportErrorKind, TransportRequest, TransportResponse,
};
