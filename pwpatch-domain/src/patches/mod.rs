use pwpatch_edit::{Document, EditResult};
use pwpatch_types::outcome::PatchOutcome;

mod circleci_step;
mod compose_service;

pub use circleci_step::{CircleCiStepPatch, STEP_APPEND_ARTIFACTS, STEP_INSERT_STEP};
pub use compose_service::{ComposeServicePatch, STEP_INSERT_SERVICE};

/// One idempotent change to one kind of document.
pub trait Patch {
    /// Stable identifier, e.g. `compose.playwright_service`.
    fn id(&self) -> &'static str;

    fn title(&self) -> &'static str;

    /// Apply the change in memory. Must be a no-op on a document it has already been applied to.
    fn apply(&self, doc: &mut Document) -> EditResult<PatchOutcome>;
}

/// Static description of a built-in patch, used for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchMeta {
    pub id: &'static str,
    pub title: &'static str,
    /// The binary that applies it.
    pub command: &'static str,
    /// The file it expects, relative to a project root.
    pub target: &'static str,
}

pub fn builtin_patches() -> Vec<Box<dyn Patch>> {
    vec![
        Box::new(ComposeServicePatch::default()),
        Box::new(CircleCiStepPatch::default()),
    ]
}

pub fn builtin_patch_metas() -> Vec<PatchMeta> {
    vec![
        PatchMeta {
            id: compose_service::PATCH_ID,
            title: compose_service::TITLE,
            command: "add-playwright-service",
            target: "docker-compose.yml",
        },
        PatchMeta {
            id: circleci_step::PATCH_ID,
            title: circleci_step::TITLE,
            command: "update-circleci",
            target: ".circleci/config.yml",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metas_match_registered_patches() {
        let ids: Vec<&str> = builtin_patches().iter().map(|p| p.id()).collect();
        let meta_ids: Vec<&str> = builtin_patch_metas().iter().map(|m| m.id).collect();
        assert_eq!(ids, meta_ids);
    }
}
