use planrun_core::config::AppConfig;
use planrun_core::executor::{
    ExecutionEngine, ExecutionOpts, ExecutionResponse, Plan, PlanStatus, RetryStrategyPlugin,
};
use planrun_core::CliError;
use planrun_plugins::factory::{build_engine, build_renderer, build_retry};

use super::cli::RunArgs;

/// Process exit code for a finished run.
pub fn exit_code_for_status(status: PlanStatus) -> i32 {
    match status {
        PlanStatus::Completed | PlanStatus::Simulated => 0,
        PlanStatus::Partial => 2,
        _ => 1,
    }
}

pub async fn run(args: RunArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let mut plan = crate::plan_file::load_plan(&args.plan_file)?;
    let opts = args.execution_opts(&cfg.executor);

    let format = args
        .format
        .clone()
        .unwrap_or_else(|| cfg.output.format.clone());
    let renderer = (format != "none").then(|| build_renderer(&format, cfg.output.pretty_print));
    let engine = build_engine(cfg, renderer);

    let response = if args.retry && !opts.dry_run {
        let strategy = build_retry(cfg);
        run_with_retry(&engine, &mut plan, &opts, strategy.as_ref()).await
    } else {
        engine.execute_plan(&mut plan, &opts).await
    };

    let pretty = args.pretty || cfg.output.pretty_print;
    let body = if pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    }
    .map_err(|e| CliError::Command(format!("serialize response: {e}")))?;
    println!("{body}");

    Ok(exit_code_for_status(response.status))
}

/// Re-invoke the engine while the plan comes back `failed`.
///
/// Every attempt is an independent run of the same plan; the strategy decides
/// how many there are and how long to wait in between.
pub async fn run_with_retry(
    engine: &ExecutionEngine,
    plan: &mut Plan,
    opts: &ExecutionOpts,
    strategy: &dyn RetryStrategyPlugin,
) -> ExecutionResponse {
    let mut attempt = 0u32;
    loop {
        let response = engine.execute_plan(plan, opts).await;
        if response.status != PlanStatus::Failed {
            return response;
        }

        let reason = response.error.clone().unwrap_or_else(|| {
            let failed = response.summary.as_ref().map_or(0, |s| s.failed_tasks);
            format!("{failed} task(s) failed")
        });
        if !strategy.should_retry(attempt, &reason) {
            tracing::warn!(plan_id = %plan.id, attempt, reason = %reason, "giving up on plan");
            return response;
        }
        let Some(delay) = strategy.next_delay(attempt, &reason) else {
            return response;
        };

        tracing::warn!(
            plan_id = %plan.id,
            attempt = attempt + 1,
            delay_secs = delay.as_secs(),
            strategy = strategy.name(),
            reason = %reason,
            "plan failed; retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
