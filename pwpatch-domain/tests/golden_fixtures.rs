//! Golden fixture tests for the Playwright patches.
//!
//! Each fixture under `tests/fixtures/<name>/` contains:
//!
//! - `input.yml` - the document before patching
//! - `expected.yml` - the document after patching
//!
//! The fixture name prefix (`compose_` or `circleci_`) selects the patch. Expected files are
//! compared after a parse and re-emit, so ordering and content must match. The raw output is
//! checked separately for block style: no flow collections and multi-line commands as literal
//! block scalars.

use camino::Utf8PathBuf;
use fs_err as fs;
use pretty_assertions::assert_eq;
use pwpatch_domain::steps::{STEP_APPEND_ARTIFACTS, STEP_INSERT_SERVICE, STEP_INSERT_STEP};
use pwpatch_domain::{CircleCiStepPatch, ComposeServicePatch, Patch};
use pwpatch_edit::{ApplyOptions, Document, apply_to_file};
use pwpatch_types::outcome::{PatchOutcome, PatchStatus};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture_dir(name: &str) -> PathBuf {
    // Fixtures are at workspace root: ../tests/fixtures relative to pwpatch-domain
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir.parent().expect("workspace root");
    workspace_root.join("tests").join("fixtures").join(name)
}

fn patch_for(fixture_name: &str) -> Box<dyn Patch> {
    if fixture_name.starts_with("compose_") {
        Box::new(ComposeServicePatch::default())
    } else if fixture_name.starts_with("circleci_") {
        Box::new(CircleCiStepPatch::default())
    } else {
        panic!("no patch for fixture '{fixture_name}'");
    }
}

fn canonical(yaml: &str) -> String {
    Document::parse(yaml)
        .expect("parse fixture")
        .to_yaml_string()
        .expect("emit fixture")
}

/// Fails if any value in `text` opens a non-empty flow collection (`{a: 1}`, `[a, b]`).
fn assert_block_style(fixture_name: &str, text: &str) {
    assert!(
        !text.trim_start().starts_with(['{', '[']),
        "fixture '{}' was written as a flow document",
        fixture_name
    );
    for line in text.lines() {
        let item = line.trim_start().trim_start_matches("- ");
        let value = item.split_once(": ").map_or(item, |(_, v)| v);
        let opens_flow =
            (value.starts_with('{') && value != "{}") || (value.starts_with('[') && value != "[]");
        assert!(
            !opens_flow,
            "fixture '{}' has a flow-style line: {}",
            fixture_name, line
        );
    }
}

/// Multi-line step commands must come out as `|-` blocks with one shell line per YAML line.
fn assert_literal_commands(fixture_name: &str, text: &str) {
    assert!(
        text.contains("    command: |-\n"),
        "fixture '{}' has no literal block command",
        fixture_name
    );
    assert!(
        text.lines()
            .any(|l| l.trim() == "# Collect Playwright artifacts"),
        "fixture '{}' folded the artifact fragment",
        fixture_name
    );
    assert!(
        !text.contains("\\n"),
        "fixture '{}' has an escaped newline",
        fixture_name
    );
}

/// Applies the fixture's patch to a copy of `input.yml`, compares with `expected.yml` and checks
/// that a second run leaves the file alone. Returns the first run's outcome.
fn run_fixture_test(fixture_name: &str) -> PatchOutcome {
    let fixture_path = fixture_dir(fixture_name);
    assert!(
        fixture_path.exists(),
        "Fixture directory does not exist: {}",
        fixture_path.display()
    );

    let temp_dir = TempDir::new().expect("create temp dir");
    let target = Utf8PathBuf::from_path_buf(temp_dir.path().join("target.yml")).expect("utf8 path");
    fs::copy(fixture_path.join("input.yml"), &target).expect("copy input");

    let patch = patch_for(fixture_name);
    let opts = ApplyOptions::default();
    let first = apply_to_file(&target, &opts, |doc| patch.apply(doc)).expect("first apply");

    let actual = fs::read_to_string(&target).expect("read patched file");
    let expected_path = fixture_path.join("expected.yml");
    let bless = std::env::var_os("PWPATCH_BLESS").is_some();

    if expected_path.exists() && !bless {
        let expected = fs::read_to_string(&expected_path).expect("read expected");
        assert_eq!(
            canonical(&actual),
            canonical(&expected),
            "Output mismatch for fixture '{}'",
            fixture_name
        );
    } else {
        // Bootstrap or bless mode: record what the patch produced
        fs::write(&expected_path, &actual).expect("write expected");
        println!(
            "Wrote expected output for '{}' at {}",
            fixture_name,
            expected_path.display()
        );
    }

    assert_block_style(fixture_name, &actual);
    if first.changed && fixture_name.starts_with("circleci_") {
        assert_literal_commands(fixture_name, &actual);
    }
    assert_eq!(first.changed, first.value.changed());

    let second = apply_to_file(&target, &opts, |doc| patch.apply(doc)).expect("second apply");
    assert!(
        !second.changed,
        "second run changed fixture '{}'",
        fixture_name
    );
    assert!(!second.written);
    assert_eq!(fs::read_to_string(&target).expect("reread"), actual);

    first.value
}

#[test]
fn golden_compose_after_chrome() {
    let outcome = run_fixture_test("compose_after_chrome");
    assert_eq!(
        outcome.status_of(STEP_INSERT_SERVICE),
        Some(PatchStatus::Applied)
    );
}

#[test]
fn golden_compose_without_chrome() {
    let outcome = run_fixture_test("compose_without_chrome");
    assert_eq!(
        outcome.status_of(STEP_INSERT_SERVICE),
        Some(PatchStatus::AppliedFallback)
    );
}

#[test]
fn golden_compose_already_present() {
    let outcome = run_fixture_test("compose_already_present");
    assert!(!outcome.changed());
}

#[test]
fn golden_circleci_after_behat() {
    let outcome = run_fixture_test("circleci_after_behat");
    assert_eq!(
        outcome.status_of(STEP_INSERT_STEP),
        Some(PatchStatus::Applied)
    );
    assert_eq!(
        outcome.status_of(STEP_APPEND_ARTIFACTS),
        Some(PatchStatus::Applied)
    );
}

#[test]
fn golden_circleci_without_behat() {
    let outcome = run_fixture_test("circleci_without_behat");
    assert_eq!(
        outcome.status_of(STEP_INSERT_STEP),
        Some(PatchStatus::AppliedFallback)
    );
    assert_eq!(
        outcome.status_of(STEP_APPEND_ARTIFACTS),
        Some(PatchStatus::Applied)
    );
}

#[test]
fn golden_circleci_step_present() {
    let outcome = run_fixture_test("circleci_step_present");
    assert_eq!(
        outcome.status_of(STEP_INSERT_STEP),
        Some(PatchStatus::AlreadyPresent)
    );
    assert_eq!(
        outcome.status_of(STEP_APPEND_ARTIFACTS),
        Some(PatchStatus::Applied)
    );
}

#[test]
fn golden_circleci_merged_steps() {
    let outcome = run_fixture_test("circleci_merged_steps");
    assert_eq!(
        outcome.status_of(STEP_INSERT_STEP),
        Some(PatchStatus::Applied)
    );
    assert_eq!(
        outcome.status_of(STEP_APPEND_ARTIFACTS),
        Some(PatchStatus::Applied)
    );
}

#[test]
fn block_style_check_rejects_flow_output() {
    let flow = "{jobs: {build: {steps: [{run: {name: A, command: \"a\\nb\"}}]}}}\n";
    let block = std::panic::catch_unwind(|| assert_block_style("flow", flow));
    assert!(block.is_err());

    let nested = "jobs:\n  build:\n    steps: [checkout, {run: {name: A}}]\n";
    assert!(std::panic::catch_unwind(|| assert_block_style("nested", nested)).is_err());

    let literal = std::panic::catch_unwind(|| {
        assert_literal_commands(
            "quoted",
            "    command: \"a\\n# Collect Playwright artifacts\"\n",
        )
    });
    assert!(literal.is_err());
}
