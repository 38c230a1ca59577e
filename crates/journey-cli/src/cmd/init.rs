//! `journey init`: create the project directory and default config.

use anyhow::{Context as _, Result};
use clap::Args;
use journey_core::config::{PROJECT_DIR, ProjectConfig, default_config_toml, project_config_path};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::output::{CliError, OutputMode, fail, pretty_kv, render_mode};

#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// Rewrite the config file even if the project already exists.
    /// Saved progress is left alone.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct InitOutput {
    ok: bool,
    config: String,
    data_dir: String,
    reinitialized: bool,
}

/// Creates:
///
/// ```text
/// .journey/
///   config.toml   (default project config)
///   data/         (progress and questionnaire files)
/// ```
///
/// # Errors
///
/// Fails if `.journey/` exists and `--force` is not set, or on any
/// filesystem error.
pub fn run_init(
    args: &InitArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> Result<()> {
    let journey_dir = project_root.join(PROJECT_DIR);
    let existed = journey_dir.exists();
    if existed && !args.force {
        return fail(
            output,
            &CliError::new(format!("{PROJECT_DIR}/ already exists"))
                .with_suggestion("Use `journey init --force` to rewrite the config."),
        );
    }

    std::fs::create_dir_all(&journey_dir)
        .with_context(|| format!("Failed to create {}", journey_dir.display()))?;

    let config_path = project_config_path(project_root);
    std::fs::write(&config_path, default_config_toml())
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let data_dir = config.data_dir(project_root);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

    tracing::info!(root = %project_root.display(), reinitialized = existed, "project initialized");

    let payload = InitOutput {
        ok: true,
        config: config_path.display().to_string(),
        data_dir: data_dir.display().to_string(),
        reinitialized: existed,
    };
    render_mode(
        output,
        &payload,
        |p, w| {
            writeln!(w, "config={}", p.config)?;
            writeln!(w, "data_dir={}", p.data_dir)
        },
        |p, w| {
            writeln!(w, "✓ Initialized {PROJECT_DIR}/")?;
            writeln!(w)?;
            pretty_kv(w, "Config", &p.config)?;
            pretty_kv(w, "Data", &p.data_dir)?;
            writeln!(w)?;
            writeln!(w, "Next steps:")?;
            writeln!(w, "  journey grant     # the entry puzzle was solved")?;
            writeln!(w, "  journey status    # see where the journey stands")
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fresh_init_creates_structure() {
        let root = TempDir::new().unwrap();
        run_init(&InitArgs::default(), OutputMode::Json, root.path(), &ProjectConfig::default())
            .unwrap();

        assert!(root.path().join(".journey/config.toml").is_file());
        assert!(root.path().join(".journey/data").is_dir());
    }

    #[test]
    fn reinit_without_force_fails() {
        let root = TempDir::new().unwrap();
        let config = ProjectConfig::default();
        run_init(&InitArgs::default(), OutputMode::Json, root.path(), &config).unwrap();
        assert!(run_init(&InitArgs::default(), OutputMode::Json, root.path(), &config).is_err());
    }

    #[test]
    fn reinit_with_force_keeps_progress() {
        let root = TempDir::new().unwrap();
        let config = ProjectConfig::default();
        run_init(&InitArgs::default(), OutputMode::Json, root.path(), &config).unwrap();
        let progress = root.path().join(".journey/data/journey.progress.json");
        std::fs::write(&progress, "{}").unwrap();

        run_init(&InitArgs { force: true }, OutputMode::Json, root.path(), &config).unwrap();
        assert!(progress.exists());
    }
}
