use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use serde_json::Map;
use tokio::sync::Semaphore;

use crate::config::AggregateConfig;
use crate::error::AggregateError;
use crate::transport::HttpTransport;

use super::graph::TaskGraph;
use super::headers::{self, DEFAULT_FORWARD_HEADERS};
use super::task_executor::TaskExecutor;
use super::types::{
    AggregateReport, AggregateRequest, AggregateResponse, ExecutionContext, ExecutionResult,
    Headers, RoundTrace, TaskDescriptor,
};

/// Default per-round in-flight cap.
pub const DEFAULT_MAX_CONCURRENCY: usize = 64;

/// Round-based executor for one aggregate batch.
///
/// Each round dispatches every ready task concurrently and joins them all
/// before merging; the merge is the only writer of the context and the error
/// map.
#[derive(Clone)]
pub struct TaskGraphScheduler {
    executor: TaskExecutor,
    forward_headers: Vec<String>,
    max_concurrency: usize,
}

impl TaskGraphScheduler {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            executor: TaskExecutor::new(transport),
            forward_headers: DEFAULT_FORWARD_HEADERS.iter().map(|h| h.to_string()).collect(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn from_config(transport: Arc<dyn HttpTransport>, cfg: &AggregateConfig) -> Self {
        Self {
            executor: TaskExecutor::new(transport).with_success_code(cfg.success_code),
            forward_headers: cfg.forward_headers.clone(),
            max_concurrency: cfg.max_concurrency,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Allow-listed client headers overlaid with the batch's common headers.
    pub fn base_headers(&self, client_headers: &Headers, common_headers: &Headers) -> Headers {
        let mut base = headers::forwarded_headers(
            client_headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            &self.forward_headers,
        );
        headers::overlay(&mut base, common_headers);
        base
    }

    pub async fn aggregate(
        &self,
        request: &AggregateRequest,
        client_headers: &Headers,
    ) -> Result<AggregateResponse, AggregateError> {
        self.run(request, client_headers)
            .await
            .map(|report| report.response)
    }

    /// Execute the batch and keep the per-round trace.
    ///
    /// Strict mode (`allow_partial = false`) never cancels in-flight calls: the
    /// failing round is awaited in full, then the call fails with the first
    /// failure in batch order. Side effects of its siblings are not rolled back.
    pub async fn run(
        &self,
        request: &AggregateRequest,
        client_headers: &Headers,
    ) -> Result<AggregateReport, AggregateError> {
        request.validate()?;

        let run_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        let allow_partial = request.allow_partial;

        tracing::info!(
            target: "ccproxy.aggregate",
            run_id = %run_id,
            tasks = request.items.len(),
            allow_partial,
            "aggregate start"
        );

        if tracing::enabled!(target: "ccproxy.aggregate", tracing::Level::DEBUG) {
            let plan = TaskGraph::from_tasks(&request.items)?.plan();
            tracing::debug!(
                target: "ccproxy.aggregate",
                run_id = %run_id,
                rounds = ?plan.rounds,
                unresolved = ?plan.unresolved,
                "predicted round plan"
            );
        }

        let base_headers = self.base_headers(client_headers, &request.common_headers);

        let mut pending: Vec<&TaskDescriptor> = request.items.iter().collect();
        let mut completed: HashSet<String> = HashSet::new();
        let mut context = ExecutionContext::new();
        let mut errors = Map::new();
        let mut rounds = Vec::new();

        let max_rounds = pending.len() + 1;
        let mut round = 0;

        while !pending.is_empty() {
            round += 1;
            if round > max_rounds {
                return Err(deadlock(&run_id, round, &pending));
            }

            let (ready, waiting): (Vec<&TaskDescriptor>, Vec<&TaskDescriptor>) =
                pending.into_iter().partition(|task| {
                    task.depends_on.iter().all(|dep| {
                        completed.contains(dep) || (allow_partial && errors.contains_key(dep))
                    })
                });

            if ready.is_empty() {
                return Err(deadlock(&run_id, round, &waiting));
            }

            tracing::debug!(
                target: "ccproxy.aggregate",
                run_id = %run_id,
                round,
                ready = ready.len(),
                waiting = waiting.len(),
                "round start"
            );

            let (outcomes, trace) = self
                .execute_round(round, &ready, &base_headers, &context, &errors)
                .await;

            let mut first_failure = None;
            for outcome in outcomes {
                if outcome.success {
                    context.insert(outcome.id.clone(), outcome.data.unwrap_or_default());
                    completed.insert(outcome.id);
                } else {
                    let detail = outcome.error.unwrap_or_default();
                    if first_failure.is_none() {
                        first_failure = Some((outcome.id.clone(), detail.clone()));
                    }
                    errors.insert(outcome.id, detail);
                }
            }

            tracing::debug!(
                target: "ccproxy.aggregate",
                run_id = %run_id,
                round,
                executed = trace.executed.len(),
                skipped = trace.skipped.len(),
                failed = errors.len(),
                "round end"
            );
            rounds.push(trace);

            if !allow_partial {
                if let Some((id, detail)) = first_failure {
                    tracing::error!(
                        target: "ccproxy.aggregate",
                        run_id = %run_id,
                        round,
                        task_id = %id,
                        "aggregate aborted"
                    );
                    return Err(AggregateError::TaskFailed { id, detail });
                }
            }

            pending = waiting;
        }

        let response = AggregateResponse::from_parts(context, errors);
        let duration_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            target: "ccproxy.aggregate",
            run_id = %run_id,
            success = response.success,
            rounds = rounds.len(),
            duration_ms,
            "aggregate end"
        );

        Ok(AggregateReport {
            run_id,
            response,
            rounds,
            duration_ms,
        })
    }

    /// One fork/join round. Outcomes come back in `ready` order regardless of
    /// completion order.
    async fn execute_round(
        &self,
        round: usize,
        ready: &[&TaskDescriptor],
        base_headers: &Headers,
        context: &ExecutionContext,
        errors: &Map<String, serde_json::Value>,
    ) -> (Vec<ExecutionResult>, RoundTrace) {
        let semaphore = Semaphore::new(self.max_concurrency.max(1));
        let mut slots: Vec<Option<ExecutionResult>> = vec![None; ready.len()];
        let mut trace = RoundTrace {
            round,
            ..RoundTrace::default()
        };
        let mut futs = FuturesUnordered::new();

        for (index, task) in ready.iter().copied().enumerate() {
            if let Some(dep) = task.depends_on.iter().find(|dep| errors.contains_key(*dep)) {
                tracing::warn!(
                    target: "ccproxy.aggregate",
                    round,
                    task_id = %task.id,
                    dependency = %dep,
                    "skipping task: dependency failed"
                );
                trace.skipped.push(task.id.clone());
                slots[index] = Some(ExecutionResult::skipped(&task.id));
                continue;
            }

            trace.executed.push(task.id.clone());
            let semaphore = &semaphore;
            let executor = &self.executor;
            futs.push(async move {
                let _permit = semaphore.acquire().await;
                (index, executor.execute(task, base_headers, context).await)
            });
        }

        while let Some((index, outcome)) = futs.next().await {
            slots[index] = Some(outcome);
        }

        (slots.into_iter().flatten().collect(), trace)
    }
}

fn deadlock(run_id: &str, round: usize, pending: &[&TaskDescriptor]) -> AggregateError {
    let pending: Vec<String> = pending.iter().map(|task| task.id.clone()).collect();
    tracing::error!(
        target: "ccproxy.aggregate",
        run_id = %run_id,
        round,
        pending = ?pending,
        "dependency cycle or deadlock"
    );
    AggregateError::CycleOrDeadlock { round, pending }
}
