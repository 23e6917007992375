use crate::outcome::PatchOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Machine-readable record of one invocation, written by `--report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchReport {
    pub schema: String,
    pub tool: ToolInfo,
    pub path: String,
    pub generated_at: DateTime<Utc>,
    pub dry_run: bool,

    /// Whether the serialized document differs from the file contents.
    pub changed: bool,

    pub outcome: PatchOutcome,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_before: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_after: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<String>,
}

impl PatchReport {
    pub fn new(tool: ToolInfo, path: impl Into<String>, outcome: PatchOutcome) -> Self {
        Self {
            schema: crate::schema::PWPATCH_REPORT_V1.to_string(),
            tool,
            path: path.into(),
            generated_at: Utc::now(),
            dry_run: false,
            changed: false,
            outcome,
            sha256_before: None,
            sha256_after: None,
            backup_path: None,
        }
    }
}
