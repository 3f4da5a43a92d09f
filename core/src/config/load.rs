use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default planrun data directory: ~/.planrun
pub fn get_planrun_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".planrun"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    let cfg = toml::from_str::<AppConfig>(&s)?;
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.planrun/config.toml
    let user_config = get_planrun_data_dir()?.join("config.toml");

    // Priority 2: ./planrun.toml (current directory)
    let local_config = Path::new("planrun.toml");

    let mut cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

// Environment variable overrides (Priority 0: highest)
fn apply_env_overrides(cfg: &mut AppConfig) -> anyhow::Result<()> {
    if let Ok(v) = std::env::var("PLANRUN_MAX_PARALLEL_TASKS") {
        if !v.trim().is_empty() {
            cfg.executor.max_parallel_tasks = v
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("PLANRUN_MAX_PARALLEL_TASKS: {e}"))?;
        }
    }
    if let Ok(v) = std::env::var("PLANRUN_WORKSPACE_ROOT") {
        if !v.trim().is_empty() {
            cfg.executor.workspace_root = Some(PathBuf::from(v));
        }
    }
    if let Ok(v) = std::env::var("PLANRUN_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.logging.level = v;
        }
    }
    Ok(())
}
