//! Edit engine for pwpatch.
//!
//! Responsibilities:
//! - Load a YAML file into an order-preserving [`Document`].
//! - Provide the idempotent patch primitives (presence checks, anchored insertion,
//!   marker-guarded text append).
//! - Run a load → transform → save cycle that only writes when the document changed, with an
//!   optional backup and a unified diff preview.

mod document;
mod error;
pub mod matcher;

pub use document::{AppendOutcome, Document, NewEntry, Placement};
pub use error::{EditError, EditResult};
pub use matcher::{Entry, EntryMatcher, key_equals, label_contains, label_equals};

use camino::{Utf8Path, Utf8PathBuf};
use diffy::PatchFormatter;
use fs_err as fs;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Compute the result and the diff, but never touch the file.
    pub dry_run: bool,
    /// When set, copy the original file to `<path><suffix>` before overwriting it.
    pub backup_suffix: Option<String>,
}

/// What `apply_to_file` did.
#[derive(Debug, Clone)]
pub struct FileOutcome<T> {
    pub path: Utf8PathBuf,
    /// Whatever the transform returned.
    pub value: T,
    /// The patched document differs from the unpatched one.
    pub changed: bool,
    /// The file on disk was overwritten.
    pub written: bool,
    pub before: String,
    pub after: String,
    pub backup_path: Option<Utf8PathBuf>,
}

impl<T> FileOutcome<T> {
    pub fn sha256_before(&self) -> String {
        sha256_hex(self.before.as_bytes())
    }

    pub fn sha256_after(&self) -> String {
        sha256_hex(self.after.as_bytes())
    }

    /// Unified diff of the file contents before and after, empty when unchanged.
    pub fn patch(&self) -> String {
        render_patch(&self.path, &self.before, &self.after)
    }
}

/// Load `path`, run `transform` on it and write the result back.
///
/// Change detection compares the re-serialized document before and after the transform, so a
/// transform that decides nothing needs doing leaves the file byte-for-byte untouched even if
/// re-emitting it would reformat it. Nothing is written if the transform fails.
pub fn apply_to_file<T, F>(
    path: &Utf8Path,
    opts: &ApplyOptions,
    transform: F,
) -> EditResult<FileOutcome<T>>
where
    F: FnOnce(&mut Document) -> EditResult<T>,
{
    let before = fs::read_to_string(path)?;
    let mut doc = Document::parse(&before)?;
    let baseline = doc.to_yaml_string()?;

    let value = transform(&mut doc)?;

    let emitted = doc.to_yaml_string()?;
    let changed = emitted != baseline;
    let after = if changed { emitted } else { before.clone() };

    let mut outcome = FileOutcome {
        path: path.to_path_buf(),
        value,
        changed,
        written: false,
        before,
        after,
        backup_path: None,
    };

    if !changed {
        debug!("{} unchanged; not writing", path);
        return Ok(outcome);
    }
    if opts.dry_run {
        info!("dry-run: not writing {}", path);
        return Ok(outcome);
    }

    if let Some(suffix) = &opts.backup_suffix {
        let backup = Utf8PathBuf::from(format!("{path}{suffix}"));
        fs::write(&backup, &outcome.before)?;
        debug!("backed up {} to {}", path, backup);
        outcome.backup_path = Some(backup);
    }

    fs::write(path, &outcome.after)?;
    outcome.written = true;
    info!("wrote {}", path);
    Ok(outcome)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn render_patch(path: &Utf8Path, old: &str, new: &str) -> String {
    if old == new {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));

    let patch = diffy::create_patch(old, new);
    let formatter = PatchFormatter::new();
    let body = formatter.fmt_patch(&patch).to_string();
    // diffy emits its own ---/+++ header; keep only the hunks.
    let hunks = body
        .find("\n@@")
        .map(|i| &body[i + 1..])
        .unwrap_or(body.as_str());
    out.push_str(hunks);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
