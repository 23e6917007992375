use super::Patch;
use crate::fragments;
use pwpatch_edit::{
    AppendOutcome, Document, EditError, EditResult, NewEntry, Placement, label_contains,
    label_equals,
};
use pwpatch_types::outcome::{PatchOutcome, PatchStatus};
use pwpatch_types::path::DocPath;
use tracing::{info, warn};

pub(crate) const PATCH_ID: &str = "circleci.playwright_step";
pub(crate) const TITLE: &str = "Add the Playwright test step to the CircleCI build job";

pub const STEP_INSERT_STEP: &str = "insert_step";
pub const STEP_APPEND_ARTIFACTS: &str = "append_artifacts";

const BUILD_JOB: &str = "jobs.build";
const STEPS: &str = "jobs.build.steps";
const LABEL: &str = "run.name";
const COMMAND: &str = "run.command";

/// Adds the "Test with Playwright" step to `jobs.build.steps` and teaches the artifact step to
/// collect Playwright output.
///
/// The step goes right after the step whose label contains the anchor text (default
/// "Test with Behat"). Without one it goes before the last step, which in these pipelines is
/// the closing artifact/upload step.
#[derive(Debug, Clone)]
pub struct CircleCiStepPatch {
    anchor_step: String,
    artifact_step: String,
}

impl Default for CircleCiStepPatch {
    fn default() -> Self {
        Self {
            anchor_step: fragments::DEFAULT_STEP_ANCHOR.to_string(),
            artifact_step: fragments::DEFAULT_ARTIFACT_STEP.to_string(),
        }
    }
}

impl CircleCiStepPatch {
    pub fn new(anchor_step: impl Into<String>, artifact_step: impl Into<String>) -> Self {
        Self {
            anchor_step: anchor_step.into(),
            artifact_step: artifact_step.into(),
        }
    }

    fn insert_step(&self, doc: &mut Document, outcome: &mut PatchOutcome) -> EditResult<()> {
        let steps = DocPath::parse(STEPS);

        if doc.has_named_entry(&steps, &label_equals(LABEL, fragments::STEP_NAME))? {
            outcome.record(STEP_INSERT_STEP, PatchStatus::AlreadyPresent, None);
            return Ok(());
        }

        let placement = doc.insert_after_anchor(
            &steps,
            &label_contains(LABEL, self.anchor_step.as_str()),
            NewEntry::Element(fragments::playwright_step()),
        )?;

        match placement {
            Placement::AfterAnchor { index } => {
                info!("inserted '{}' at step {}", fragments::STEP_NAME, index);
                outcome.record(STEP_INSERT_STEP, PatchStatus::Applied, None);
            }
            Placement::Fallback { index } => {
                warn!(
                    "no step label contains '{}'; inserted '{}' at step {}",
                    self.anchor_step, fragments::STEP_NAME, index
                );
                outcome.record(
                    STEP_INSERT_STEP,
                    PatchStatus::AppliedFallback,
                    Some(format!(
                        "no step label contains '{}'; inserted before the last step",
                        self.anchor_step
                    )),
                );
            }
            Placement::AlreadyPresent => {
                outcome.record(STEP_INSERT_STEP, PatchStatus::AlreadyPresent, None);
            }
        }
        Ok(())
    }

    fn append_artifacts(&self, doc: &mut Document, outcome: &mut PatchOutcome) -> EditResult<()> {
        let appended = doc.append_text_if_absent(
            &DocPath::parse(STEPS),
            &label_contains(LABEL, self.artifact_step.as_str()),
            &DocPath::parse(COMMAND),
            fragments::ARTIFACT_MARKER,
            fragments::ARTIFACT_COLLECTION,
        )?;

        match appended {
            AppendOutcome::Appended { index } => {
                info!("added Playwright artifact collection to step {}", index);
                outcome.record(STEP_APPEND_ARTIFACTS, PatchStatus::Applied, None);
            }
            AppendOutcome::AlreadyPresent { .. } => {
                outcome.record(STEP_APPEND_ARTIFACTS, PatchStatus::AlreadyPresent, None);
            }
            AppendOutcome::TargetMissing => {
                outcome.record(
                    STEP_APPEND_ARTIFACTS,
                    PatchStatus::Skipped,
                    Some(format!("no step label contains '{}'", self.artifact_step)),
                );
            }
        }
        Ok(())
    }
}

impl Patch for CircleCiStepPatch {
    fn id(&self) -> &'static str {
        PATCH_ID
    }

    fn title(&self) -> &'static str {
        TITLE
    }

    fn apply(&self, doc: &mut Document) -> EditResult<PatchOutcome> {
        let build = DocPath::parse(BUILD_JOB);
        if doc.get(&build).is_none() {
            return Err(EditError::structure(
                &build,
                "Could not find 'build' job in CircleCI config",
            ));
        }
        let steps = DocPath::parse(STEPS);
        if doc.get(&steps).is_none() {
            return Err(EditError::structure(&steps, "No steps found in build job"));
        }

        let mut outcome = PatchOutcome::new(PATCH_ID);
        self.insert_step(doc, &mut outcome)?;
        self.append_artifacts(doc, &mut outcome)?;
        Ok(outcome)
    }
}
