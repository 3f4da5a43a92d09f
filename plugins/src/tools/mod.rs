//! Tool adapters for the built-in task kinds.
//!
//! Every adapter writes into the run workspace only, under file names no
//! other adapter uses, so tasks in the same round never race on a path.

pub mod documentation;
pub mod final_review;
pub mod implementation;
pub mod language;
pub mod project_setup;
pub mod requirements;
pub mod test_runner;

use std::path::Path;

use planrun_core::error::DispatchError;

pub use documentation::DocumentationTool;
pub use final_review::FinalReviewTool;
pub use implementation::CoreImplementationTool;
pub use language::Language;
pub use project_setup::ProjectSetupTool;
pub use requirements::RequirementsAnalysisTool;
pub use test_runner::TestRunnerTool;

/// Write `contents` to `rel` under `root`, creating parent directories.
///
/// Returns `rel` so callers can collect it into `files_created`.
pub(crate) async fn write_file(
    root: &Path,
    rel: &str,
    contents: &str,
) -> Result<String, DispatchError> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, contents).await?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(rel.to_string())
}

/// Like [`write_file`] but leaves an existing file untouched.
pub(crate) async fn write_if_absent(
    root: &Path,
    rel: &str,
    contents: &str,
) -> Result<Option<String>, DispatchError> {
    if tokio::fs::try_exists(root.join(rel)).await? {
        return Ok(None);
    }
    write_file(root, rel, contents).await.map(Some)
}
