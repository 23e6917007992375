//! Domain logic: the Playwright patches for docker compose and CircleCI documents.
//!
//! This crate owns *what* gets inserted and where. It does not own *how* documents are edited or
//! written; that's the `pwpatch-edit` crate.

pub mod fragments;
mod patches;

pub use patches::{
    CircleCiStepPatch, ComposeServicePatch, Patch, PatchMeta, builtin_patch_metas,
    builtin_patches,
};

/// Sub-operation identifiers recorded in [`pwpatch_types::outcome::PatchOutcome`].
pub mod steps {
    pub use crate::patches::{STEP_APPEND_ARTIFACTS, STEP_INSERT_SERVICE, STEP_INSERT_STEP};
}
