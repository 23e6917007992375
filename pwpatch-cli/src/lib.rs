//! Shared driver for the `add-playwright-service` and `update-circleci` binaries.
//!
//! Both binaries take exactly one positional path, patch that file in place and report what
//! happened as plain status lines on stdout. Diagnostics go to stderr through `tracing`.

pub mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches, Parser};
use config::{ConfigMerger, MergedConfig};
use fs_err as fs;
use pwpatch_domain::fragments::DEFAULT_STEP_ANCHOR;
use pwpatch_domain::steps::{STEP_INSERT_SERVICE, STEP_INSERT_STEP};
use pwpatch_domain::{CircleCiStepPatch, ComposeServicePatch, Patch};
use pwpatch_edit::{ApplyOptions, EditError, FileOutcome, apply_to_file};
use pwpatch_types::outcome::{PatchOutcome, PatchStatus};
use pwpatch_types::report::{PatchReport, ToolInfo};
use std::ffi::OsString;
use std::process::ExitCode;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Which file a binary patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Compose,
    CircleCi,
}

impl Target {
    pub fn bin_name(self) -> &'static str {
        match self {
            Target::Compose => "add-playwright-service",
            Target::CircleCi => "update-circleci",
        }
    }

    /// How the file is named in `Error updating ...` lines.
    pub fn kind(self) -> &'static str {
        match self {
            Target::Compose => "docker-compose.yml",
            Target::CircleCi => "CircleCI config",
        }
    }

    pub fn usage(self) -> String {
        match self {
            Target::Compose => format!("Usage: {} <path/to/docker-compose.yml>", self.bin_name()),
            Target::CircleCi => {
                format!("Usage: {} <path/to/.circleci/config.yml>", self.bin_name())
            }
        }
    }

    fn about(self) -> &'static str {
        match self {
            Target::Compose => "Add the Playwright service to a docker-compose.yml file.",
            Target::CircleCi => "Add the Playwright test step to a CircleCI configuration.",
        }
    }

    pub fn patch(self, merged: &MergedConfig) -> Box<dyn Patch> {
        match self {
            Target::Compose => {
                Box::new(ComposeServicePatch::with_anchor(merged.anchor_service.as_str()))
            }
            Target::CircleCi => Box::new(CircleCiStepPatch::new(
                merged.anchor_step.as_str(),
                merged.artifact_step.as_str(),
            )),
        }
    }
}

#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    /// File to patch in place.
    pub path: Utf8PathBuf,

    /// Print the unified diff instead of writing the file.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Explicit config file (default: ./pwpatch.toml when present).
    #[arg(long, env = "PWPATCH_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    /// Write a JSON report of the run to this file.
    #[arg(long)]
    pub report: Option<Utf8PathBuf>,

    /// Override the anchor (service name, or step label text).
    #[arg(long)]
    pub anchor: Option<String>,

    /// Copy the original file aside before overwriting it.
    #[arg(long, default_value_t = false)]
    pub backup: bool,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("Error: {0} does not exist")]
    NotFound(Utf8PathBuf),

    #[error("Error updating {kind}: {source}")]
    Edit {
        kind: &'static str,
        source: EditError,
    },

    #[error("Error: {0:#}")]
    Other(anyhow::Error),
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Other(err)
    }
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Edit { source, .. } => source.exit_code(),
            _ => 1,
        }
    }
}

/// Outcome of the outcome-to-stdout translation, ready to print.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub lines: Vec<String>,
    /// Unified diff, only in dry-run mode.
    pub diff: Option<String>,
}

/// Parse arguments for `target`. Anything clap rejects becomes a usage error, except help and
/// version output which clap renders itself.
pub fn parse_args<I, T>(target: Target, argv: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cmd = Args::command()
        .name(target.bin_name())
        .bin_name(target.bin_name())
        .about(target.about());
    let matches = cmd.try_get_matches_from(argv)?;
    Args::from_arg_matches(&matches)
}

/// Entry point shared by both binaries.
pub fn main_for(target: Target) -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(target, std::env::args_os()) {
        Ok(args) => args,
        Err(e) if is_informational(&e) => {
            if let Err(io) = e.print() {
                debug!("writing {:?} output failed: {}", e.kind(), io);
                return ExitCode::FAILURE;
            }
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            debug!("argument error: {}", e);
            let err = CliError::Usage(target.usage());
            println!("{err}");
            return ExitCode::from(err.exit_code());
        }
    };

    match run(target, &args) {
        Ok(output) => {
            for line in &output.lines {
                println!("{line}");
            }
            if let Some(diff) = &output.diff {
                print!("{diff}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            debug!("{:?}", err);
            println!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

/// Help and version requests, which clap reports as errors.
fn is_informational(err: &clap::Error) -> bool {
    let kind = err.kind();
    kind == ErrorKind::DisplayHelp || kind == ErrorKind::DisplayVersion
}

/// Patch `args.path` and describe the result. Nothing is written when this returns an error.
pub fn run(target: Target, args: &Args) -> Result<RunOutput, CliError> {
    let path = args.path.as_path();
    if !path.exists() {
        return Err(CliError::NotFound(path.to_path_buf()));
    }

    let file_config = config::load_or_default(args.config.as_deref(), Utf8Path::new("."))
        .context("load pwpatch.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_args(args.anchor.as_deref(), args.backup);
    debug!("merged config: {:?}", merged);

    let patch = target.patch(&merged);
    let opts = ApplyOptions {
        dry_run: args.dry_run,
        backup_suffix: merged.backup_suffix.clone(),
    };

    let kind = target.kind();
    let file = apply_to_file(path, &opts, |doc| patch.apply(doc))
        .map_err(|source| CliError::Edit { kind, source })?;

    if let Some(report_path) = &args.report {
        let report = build_report(target, &file, args.dry_run);
        write_json(report_path, &report)?;
        debug!("wrote report to {}", report_path);
    }

    let status = RunStatus {
        path,
        anchor_step: &merged.anchor_step,
        changed: file.changed,
        dry_run: args.dry_run,
    };
    let mut output = RunOutput {
        lines: status_lines(target, &file.value, &status),
        diff: None,
    };
    if args.dry_run && file.changed {
        output.diff = Some(file.patch());
    }
    Ok(output)
}

/// What `status_lines` needs to know about a run besides the patch outcome.
#[derive(Debug, Clone, Copy)]
pub struct RunStatus<'a> {
    pub path: &'a Utf8Path,
    /// Step label the Playwright step was anchored on.
    pub anchor_step: &'a str,
    pub changed: bool,
    pub dry_run: bool,
}

/// The status lines for one run.
pub fn status_lines(target: Target, outcome: &PatchOutcome, status: &RunStatus<'_>) -> Vec<String> {
    let RunStatus {
        path,
        anchor_step,
        changed,
        dry_run,
    } = *status;
    let mut lines = Vec::new();
    match target {
        Target::Compose => {
            if outcome.status_of(STEP_INSERT_SERVICE) == Some(PatchStatus::AlreadyPresent) {
                lines.push("Playwright service already exists in docker-compose.yml".to_string());
            } else if dry_run {
                lines.push(format!("Dry run: would add Playwright service to {path}"));
            } else {
                lines.push(format!("Successfully added Playwright service to {path}"));
            }
        }
        Target::CircleCi => {
            match outcome.status_of(STEP_INSERT_STEP) {
                Some(PatchStatus::AlreadyPresent) => {
                    lines.push("Playwright test step already exists".to_string());
                }
                Some(PatchStatus::AppliedFallback) => lines.push(fallback_warning(anchor_step)),
                _ => {}
            }
            if changed {
                if dry_run {
                    lines.push(format!("Dry run: would update CircleCI configuration: {path}"));
                } else {
                    lines.push(format!("Successfully updated CircleCI configuration: {path}"));
                }
            }
        }
    }
    lines
}

fn fallback_warning(anchor_step: &str) -> String {
    let missing = if anchor_step == DEFAULT_STEP_ANCHOR {
        "Behat test step".to_string()
    } else {
        format!("'{anchor_step}' step")
    };
    format!("Warning: Could not find {missing}. Adding Playwright test at the end.")
}

fn build_report(target: Target, file: &FileOutcome<PatchOutcome>, dry_run: bool) -> PatchReport {
    let tool = ToolInfo {
        name: target.bin_name().to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };
    let mut report = PatchReport::new(tool, file.path.as_str(), file.value.clone());
    report.dry_run = dry_run;
    report.changed = file.changed;
    report.sha256_before = Some(file.sha256_before());
    report.sha256_after = Some(file.sha256_after());
    report.backup_path = file.backup_path.as_ref().map(|p| p.to_string());
    report
}

fn write_json<T: serde::Serialize>(path: &Utf8Path, v: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(v).context("serialize json")?;
    fs::write(path, s).with_context(|| format!("write {}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn outcome(step: &str, status: PatchStatus) -> PatchOutcome {
        let mut o = PatchOutcome::new("test");
        o.record(step, status, None);
        o
    }

    fn run_status(path: &str, changed: bool) -> RunStatus<'_> {
        RunStatus {
            path: Utf8Path::new(path),
            anchor_step: DEFAULT_STEP_ANCHOR,
            changed,
            dry_run: false,
        }
    }

    #[test]
    fn wrong_argument_count_is_a_parse_error() {
        assert!(parse_args(Target::Compose, ["add-playwright-service"]).is_err());
        let two = ["add-playwright-service", "a.yml", "b.yml"];
        assert!(parse_args(Target::Compose, two).is_err());
        let args = parse_args(Target::Compose, ["add-playwright-service", "a.yml"]).unwrap();
        assert_eq!(args.path, Utf8PathBuf::from("a.yml"));
        assert!(!args.dry_run);
    }

    #[test]
    fn help_is_informational() {
        let err = parse_args(Target::Compose, ["add-playwright-service", "--help"]).unwrap_err();
        assert!(is_informational(&err));
        let err = parse_args(Target::Compose, ["add-playwright-service"]).unwrap_err();
        assert!(!is_informational(&err));
    }

    #[test]
    fn usage_names_the_binary() {
        assert_eq!(
            Target::CircleCi.usage(),
            "Usage: update-circleci <path/to/.circleci/config.yml>"
        );
    }

    #[test]
    fn compose_lines() {
        let present = outcome(STEP_INSERT_SERVICE, PatchStatus::AlreadyPresent);
        let unchanged = run_status("docker-compose.yml", false);
        assert_eq!(
            status_lines(Target::Compose, &present, &unchanged),
            ["Playwright service already exists in docker-compose.yml"]
        );
        let fallback = outcome(STEP_INSERT_SERVICE, PatchStatus::AppliedFallback);
        let changed = run_status("docker-compose.yml", true);
        assert_eq!(
            status_lines(Target::Compose, &fallback, &changed),
            ["Successfully added Playwright service to docker-compose.yml"]
        );
    }

    #[test]
    fn circleci_fallback_warns_then_succeeds() {
        let fallback = outcome(STEP_INSERT_STEP, PatchStatus::AppliedFallback);
        let status = run_status(".circleci/config.yml", true);
        assert_eq!(
            status_lines(Target::CircleCi, &fallback, &status),
            [
                "Warning: Could not find Behat test step. Adding Playwright test at the end.",
                "Successfully updated CircleCI configuration: .circleci/config.yml",
            ]
        );
    }

    #[test]
    fn circleci_fallback_names_a_configured_anchor() {
        let fallback = outcome(STEP_INSERT_STEP, PatchStatus::AppliedFallback);
        let status = RunStatus {
            anchor_step: "Test with Cypress",
            ..run_status("config.yml", true)
        };
        assert_eq!(
            status_lines(Target::CircleCi, &fallback, &status)[0],
            "Warning: Could not find 'Test with Cypress' step. Adding Playwright test at the end."
        );
    }

    #[test]
    fn circleci_no_change_only_reports_presence() {
        let present = outcome(STEP_INSERT_STEP, PatchStatus::AlreadyPresent);
        let status = run_status("config.yml", false);
        assert_eq!(
            status_lines(Target::CircleCi, &present, &status),
            ["Playwright test step already exists"]
        );
    }

    #[test]
    fn edit_errors_name_the_file_kind() {
        let err = CliError::Edit {
            kind: Target::CircleCi.kind(),
            source: EditError::structure(
                &pwpatch_types::path::DocPath::parse("jobs.build"),
                "Could not find 'build' job in CircleCI config",
            ),
        };
        assert_eq!(
            err.to_string(),
            "Error updating CircleCI config: Could not find 'build' job in CircleCI config"
        );
        assert_eq!(err.exit_code(), 1);
    }
}
