use super::Patch;
use crate::fragments;
use pwpatch_edit::{Document, EditResult, NewEntry, Placement, key_equals};
use pwpatch_types::outcome::{PatchOutcome, PatchStatus};
use pwpatch_types::path::DocPath;
use tracing::info;

pub(crate) const PATCH_ID: &str = "compose.playwright_service";
pub(crate) const TITLE: &str = "Add the playwright service to docker-compose.yml";

pub const STEP_INSERT_SERVICE: &str = "insert_service";

/// Adds the `playwright` service to `services`, right after the anchor service (default
/// `chrome`) or last when there is no such service.
#[derive(Debug, Clone)]
pub struct ComposeServicePatch {
    anchor_service: String,
}

impl Default for ComposeServicePatch {
    fn default() -> Self {
        Self {
            anchor_service: fragments::DEFAULT_SERVICE_ANCHOR.to_string(),
        }
    }
}

impl ComposeServicePatch {
    pub fn with_anchor(anchor_service: impl Into<String>) -> Self {
        Self {
            anchor_service: anchor_service.into(),
        }
    }
}

impl Patch for ComposeServicePatch {
    fn id(&self) -> &'static str {
        PATCH_ID
    }

    fn title(&self) -> &'static str {
        TITLE
    }

    fn apply(&self, doc: &mut Document) -> EditResult<PatchOutcome> {
        let mut outcome = PatchOutcome::new(PATCH_ID);
        let services = DocPath::parse("services");

        doc.ensure_mapping(&services)?;
        if doc.has_named_entry(&services, &key_equals(fragments::SERVICE_NAME))? {
            outcome.record(STEP_INSERT_SERVICE, PatchStatus::AlreadyPresent, None);
            return Ok(outcome);
        }

        let placement = doc.insert_after_anchor(
            &services,
            &key_equals(self.anchor_service.as_str()),
            NewEntry::Keyed {
                key: fragments::SERVICE_NAME.to_string(),
                value: fragments::playwright_service(),
            },
        )?;

        match placement {
            Placement::AfterAnchor { index } => {
                info!(
                    "added {} service at position {}",
                    fragments::SERVICE_NAME, index
                );
                outcome.record(STEP_INSERT_SERVICE, PatchStatus::Applied, None);
            }
            Placement::Fallback { index } => {
                info!(
                    "no {} service; added {} last (position {})",
                    self.anchor_service, fragments::SERVICE_NAME, index
                );
                outcome.record(
                    STEP_INSERT_SERVICE,
                    PatchStatus::AppliedFallback,
                    Some(format!(
                        "service '{}' not found; appended at the end",
                        self.anchor_service
                    )),
                );
            }
            Placement::AlreadyPresent => {
                outcome.record(STEP_INSERT_SERVICE, PatchStatus::AlreadyPresent, None);
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_yaml::Value;

    fn service_keys(doc: &Document) -> Vec<String> {
        doc.get(&DocPath::parse("services"))
            .and_then(Value::as_mapping)
            .map(|m| {
                m.keys()
                    .filter_map(|k| k.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn inserts_after_chrome() {
        let mut doc = Document::parse("services:\n  a: {}\n  chrome: {}\n  b: {}\n").unwrap();
        let outcome = ComposeServicePatch::default().apply(&mut doc).unwrap();
        assert_eq!(
            outcome.status_of(STEP_INSERT_SERVICE),
            Some(PatchStatus::Applied)
        );
        assert_eq!(service_keys(&doc), ["a", "chrome", "playwright", "b"]);
    }

    #[test]
    fn appends_without_chrome() {
        let mut doc = Document::parse("services:\n  a: {}\n  b: {}\n").unwrap();
        let outcome = ComposeServicePatch::default().apply(&mut doc).unwrap();
        assert_eq!(
            outcome.status_of(STEP_INSERT_SERVICE),
            Some(PatchStatus::AppliedFallback)
        );
        assert_eq!(service_keys(&doc), ["a", "b", "playwright"]);
    }

    #[test]
    fn creates_services_when_missing() {
        let mut doc = Document::parse("version: '3'\n").unwrap();
        ComposeServicePatch::default().apply(&mut doc).unwrap();
        assert_eq!(service_keys(&doc), ["playwright"]);
    }

    #[test]
    fn existing_service_is_left_alone() {
        let mut doc = Document::parse("services:\n  playwright:\n    image: custom\n").unwrap();
        let before = doc.clone();
        let outcome = ComposeServicePatch::default().apply(&mut doc).unwrap();
        assert!(!outcome.changed());
        assert_eq!(doc, before);
    }

    #[test]
    fn custom_anchor_is_honoured() {
        let mut doc = Document::parse("services:\n  a: {}\n  selenium: {}\n  b: {}\n").unwrap();
        ComposeServicePatch::with_anchor("selenium")
            .apply(&mut doc)
            .unwrap();
        assert_eq!(service_keys(&doc), ["a", "selenium", "playwright", "b"]);
    }
}
