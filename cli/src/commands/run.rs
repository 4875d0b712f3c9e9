use ccproxy_core::api::{AppContext, CliError, Headers};

use super::cli::RunArgs;
use super::read_request;

/// Exit code when the aggregate completed with per-task errors.
pub const EXIT_PARTIAL_FAILURE: i32 = 30;

pub async fn handle_run(args: RunArgs, ctx: &AppContext) -> Result<i32, CliError> {
    let request = read_request(&args.file)?;

    let ctx = match args.base_url {
        Some(base_url) => {
            let mut cfg = ctx.cfg().clone();
            cfg.transport.base_url = Some(base_url);
            ctx.with_config(cfg)
        }
        None => ctx.clone(),
    };

    let scheduler = ctx.build_scheduler().await?;
    let client_headers: Headers = args.headers.into_iter().collect();

    let report = scheduler.run(&request, &client_headers).await?;

    if args.trace {
        for round in &report.rounds {
            eprintln!(
                "round {}: executed [{}] skipped [{}]",
                round.round,
                round.executed.join(", "),
                round.skipped.join(", ")
            );
        }
        eprintln!("run {} finished in {}ms", report.run_id, report.duration_ms);
    }

    let out = serde_json::to_string_pretty(&report.response)
        .map_err(|e| CliError::Command(format!("failed to encode response: {e}")))?;
    println!("{out}");

    Ok(if report.response.success {
        0
    } else {
        EXIT_PARTIAL_FAILURE
    })
}
