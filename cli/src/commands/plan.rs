use ccproxy_core::api::{CliError, TaskGraph};

use super::cli::PlanArgs;
use super::read_request;

/// Exit code when some task can never become ready.
pub const EXIT_UNSATISFIABLE: i32 = 30;

pub fn handle_plan(args: PlanArgs) -> Result<i32, CliError> {
    let request = read_request(&args.file)?;
    request.validate()?;

    let plan = TaskGraph::from_tasks(&request.items)?.plan();
    let out = serde_json::to_string_pretty(&plan)
        .map_err(|e| CliError::Command(format!("failed to encode plan: {e}")))?;
    println!("{out}");

    if plan.is_satisfiable() {
        Ok(0)
    } else {
        tracing::warn!(
            target: "ccproxy.aggregate",
            unresolved = ?plan.unresolved,
            cycle = ?plan.cycle,
            "request can never complete"
        );
        Ok(EXIT_UNSATISFIABLE)
    }
}
