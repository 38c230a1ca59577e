//! Locating the project and opening its stores.

use std::env;
use std::path::Path;

use chrono::{DateTime, Utc};
use journey_core::clock::FixedClock;
use journey_core::codec::LoadOutcome;
use journey_core::config::{PROJECT_DIR, ProjectConfig};
use journey_core::error::ErrorCode;
use journey_core::questionnaire::QuestionnaireStore;
use journey_core::storage::{FileStorage, StorageError};
use journey_core::{Change, ProgressStore};

use crate::output::{CliError, OutputMode, fail, failure, render_error};

/// Env var that pins the clock, as RFC 3339. Used for scripted runs.
pub const NOW_ENV: &str = "JOURNEY_NOW";

/// Fail with `E1001` unless `journey init` has run in `project_root`.
pub fn require_initialized(project_root: &Path, output: OutputMode) -> anyhow::Result<()> {
    if project_root.join(PROJECT_DIR).is_dir() {
        Ok(())
    } else {
        fail(
            output,
            &CliError::from_code(
                ErrorCode::NotInitialized,
                format!("no {PROJECT_DIR}/ directory in {}", project_root.display()),
            ),
        )
    }
}

fn pinned_now() -> anyhow::Result<Option<DateTime<Utc>>> {
    let Ok(raw) = env::var(NOW_ENV) else {
        return Ok(None);
    };
    let parsed = DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|err| anyhow::anyhow!("{NOW_ENV}={raw:?} is not an RFC 3339 timestamp: {err}"))?;
    Ok(Some(parsed.with_timezone(&Utc)))
}

/// Open the progress store configured for `project_root`.
///
/// A damaged or unreadable progress file does not stop the command; it is
/// reported on stderr and the session starts from defaults.
pub fn open_progress(
    project_root: &Path,
    config: &ProjectConfig,
    output: OutputMode,
) -> anyhow::Result<ProgressStore<FileStorage>> {
    require_initialized(project_root, output)?;

    let mut store = ProgressStore::open(config.file_storage(project_root))
        .with_time_lock(config.timelock.to_time_lock()?);
    if let Some(now) = pinned_now()? {
        tracing::debug!(%now, "clock pinned");
        store = store.with_clock(FixedClock::new(now));
    }

    match store.load_outcome() {
        LoadOutcome::Recovered {
            error,
            quarantined_as,
        } => {
            if output.is_json() {
                // stdout stays a single document; the warning goes to the log.
                tracing::warn!(%error, ?quarantined_as, "saved progress was unreadable");
            } else {
                let mut warning = CliError::from_code(
                    error.code(),
                    format!("saved progress was unreadable ({error}); starting over"),
                );
                if let Some(key) = quarantined_as {
                    warning =
                        warning.with_suggestion(format!("the damaged copy was kept as {key}"));
                }
                render_error(output, &warning)?;
            }
        }
        LoadOutcome::Unavailable(err) => {
            return Err(storage_failure(output, err));
        }
        LoadOutcome::Fresh | LoadOutcome::Restored => {}
    }

    Ok(store)
}

/// Open the questionnaire store configured for `project_root`.
pub fn open_notes(
    project_root: &Path,
    config: &ProjectConfig,
    output: OutputMode,
) -> anyhow::Result<QuestionnaireStore<FileStorage>> {
    require_initialized(project_root, output)?;
    Ok(QuestionnaireStore::open(config.file_storage(project_root)))
}

fn storage_failure(output: OutputMode, err: &StorageError) -> anyhow::Error {
    failure(output, &CliError::from_code(err.code(), err.to_string()))
}

/// Turn a write failure recorded by the store into a command failure.
///
/// The store keeps going after a failed write; a one-shot command has no
/// later chance to save, so it reports the failure and exits non-zero.
pub fn ensure_saved(output: OutputMode, last_error: Option<&StorageError>) -> anyhow::Result<()> {
    match last_error {
        None => Ok(()),
        Some(err) => Err(storage_failure(output, err)),
    }
}

/// Stable label for a [`Change`] in machine output.
pub const fn change_label(change: Change) -> &'static str {
    match change {
        Change::Applied => "applied",
        Change::Unchanged => "unchanged",
        Change::Rejected(_) => "rejected",
    }
}

/// Parse a 1-based chapter number into a 0-based index.
pub fn chapter_index(number: usize) -> Option<usize> {
    number
        .checked_sub(1)
        .filter(|&index| journey_core::model::chapter::is_valid_index(index))
}
