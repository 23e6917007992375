use serde::{Deserialize, Serialize};

/// Result of one sub-operation of a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStatus {
    /// The change was made at the anchored position.
    Applied,
    /// The change was made, but the anchor was missing and the fallback position was used.
    AppliedFallback,
    /// The change was already present; nothing was touched.
    AlreadyPresent,
    /// The change could not be attempted (e.g. its target element does not exist).
    Skipped,
}

impl PatchStatus {
    pub fn is_change(self) -> bool {
        matches!(self, PatchStatus::Applied | PatchStatus::AppliedFallback)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// Stable identifier of the sub-operation, e.g. `insert_step`.
    pub step: String,
    pub status: PatchStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Everything a patch did to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOutcome {
    pub patch_id: String,

    #[serde(default)]
    pub steps: Vec<StepResult>,
}

impl PatchOutcome {
    pub fn new(patch_id: impl Into<String>) -> Self {
        Self {
            patch_id: patch_id.into(),
            steps: vec![],
        }
    }

    pub fn record(&mut self, step: &str, status: PatchStatus, message: Option<String>) {
        self.steps.push(StepResult {
            step: step.to_string(),
            status,
            message,
        });
    }

    /// True when at least one sub-operation changed the document.
    pub fn changed(&self) -> bool {
        self.steps.iter().any(|s| s.status.is_change())
    }

    pub fn status_of(&self, step: &str) -> Option<PatchStatus> {
        self.steps.iter().find(|s| s.step == step).map(|s| s.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_tracks_applied_steps_only() {
        let mut outcome = PatchOutcome::new("compose.playwright_service");
        outcome.record("insert_service", PatchStatus::AlreadyPresent, None);
        assert!(!outcome.changed());

        outcome.record("append_artifacts", PatchStatus::AppliedFallback, None);
        assert!(outcome.changed());
    }

    #[test]
    fn status_of_finds_first_matching_step() {
        let mut outcome = PatchOutcome::new("x");
        outcome.record("a", PatchStatus::Skipped, Some("no target".into()));
        assert_eq!(outcome.status_of("a"), Some(PatchStatus::Skipped));
        assert_eq!(outcome.status_of("b"), None);
    }
}
