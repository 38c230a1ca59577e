//! `journey open`: ask whether a page may be shown.
//!
//! A redirect is a normal answer, not an error: the command succeeds and
//! reports where the visitor would be sent.

use std::io::Write;
use std::path::Path;

use clap::Args;
use journey_core::config::ProjectConfig;
use journey_core::gating::{Access, Route};
use serde::Serialize;

use crate::output::{CliError, OutputMode, failure, render_mode};
use crate::project::open_progress;

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// `entry`, `hub`, `chapter:N`, `final` or `response`.
    pub route: String,
}

#[derive(Debug, Serialize)]
struct OpenOutput {
    route: String,
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<String>,
}

pub fn run_open(
    args: &OpenArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let route: Route = args
        .route
        .parse()
        .map_err(|err| failure(output, &CliError::new(format!("{err}"))))?;

    let store = open_progress(project_root, config, output)?;
    let access = store.guard(route);
    tracing::debug!(%route, ?access, "route checked");

    let payload = OpenOutput {
        route: route.to_string(),
        allowed: access.is_allowed(),
        redirect: match access {
            Access::Allow => None,
            Access::Redirect(to) => Some(to.to_string()),
        },
    };
    render_mode(
        output,
        &payload,
        |p, w| match &p.redirect {
            None => writeln!(w, "allow {}", p.route),
            Some(to) => writeln!(w, "redirect {} -> {to}", p.route),
        },
        |p, w| match &p.redirect {
            None => writeln!(w, "✓ {} is open.", p.route),
            Some(to) => writeln!(w, "{} is not available yet; showing {to} instead.", p.route),
        },
    )
}
