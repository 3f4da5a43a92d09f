use std::sync::Arc;

use planrun_core::config::AppConfig;
use planrun_core::executor::{
    ContextManager, DispatchTable, ExecutionEngine, OutputRendererPlugin, RetryStrategyPlugin,
    TaskKind,
};

use crate::executor::{ExponentialBackoffPlugin, JsonlRendererPlugin, TextRendererPlugin};
use crate::tools::{
    CoreImplementationTool, DocumentationTool, FinalReviewTool, ProjectSetupTool,
    RequirementsAnalysisTool, TestRunnerTool,
};

/// Dispatch table with every built-in tool adapter registered. Kinds outside
/// the built-in set fall through to the generic handler.
pub fn build_dispatch_table(cfg: &AppConfig) -> DispatchTable {
    DispatchTable::new()
        .with_handler(TaskKind::ProjectSetup, Arc::new(ProjectSetupTool))
        .with_handler(TaskKind::RequirementsAnalysis, Arc::new(RequirementsAnalysisTool))
        .with_handler(TaskKind::CoreImplementation, Arc::new(CoreImplementationTool))
        .with_handler(
            TaskKind::Testing,
            Arc::new(TestRunnerTool::from_config(&cfg.tools)),
        )
        .with_handler(TaskKind::Documentation, Arc::new(DocumentationTool))
        .with_handler(TaskKind::FinalReview, Arc::new(FinalReviewTool))
}

pub fn build_renderer(format: &str, pretty_print: bool) -> Arc<dyn OutputRendererPlugin> {
    match format {
        "jsonl" => Arc::new(JsonlRendererPlugin::new(pretty_print)),
        // Anything other than jsonl renders as text.
        _ => Arc::new(TextRendererPlugin),
    }
}

pub fn build_retry(cfg: &AppConfig) -> Box<dyn RetryStrategyPlugin> {
    Box::new(ExponentialBackoffPlugin::new(cfg.retry.clone()))
}

/// Engine wired from configuration, optionally reporting to `renderer`.
pub fn build_engine(
    cfg: &AppConfig,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
) -> ExecutionEngine {
    let builder = ExecutionEngine::builder()
        .dispatch_table(build_dispatch_table(cfg))
        .context_manager(ContextManager::from_config(&cfg.executor));
    match renderer {
        Some(renderer) => builder.renderer(renderer).build(),
        None => builder.build(),
    }
}
