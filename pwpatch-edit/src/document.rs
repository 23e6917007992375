//! In-memory YAML document with order-preserving patch primitives.
//!
//! Mappings are `serde_yaml::Mapping`, which keeps insertion order, so keys come back out in
//! the order they were read unless a patch deliberately places a new one.

use crate::error::{EditError, EditResult};
use crate::matcher::{Entry, EntryMatcher, field_mut};
use camino::Utf8Path;
use fs_err as fs;
use pwpatch_types::path::DocPath;
use serde_yaml::{Mapping, Sequence, Value};
use tracing::debug;

/// Something to insert into a container.
#[derive(Debug, Clone, PartialEq)]
pub enum NewEntry {
    /// A named entry for a mapping container.
    Keyed { key: String, value: Value },
    /// A bare element for a sequence container.
    Element(Value),
}

/// Where `insert_after_anchor` put the new entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Directly after the first entry the anchor matched.
    AfterAnchor { index: usize },
    /// No anchor matched. Mappings append at the end; sequences insert before the last element.
    Fallback { index: usize },
    /// A mapping already held the key; nothing changed.
    AlreadyPresent,
}

/// Result of `append_text_if_absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended { index: usize },
    AlreadyPresent { index: usize },
    TargetMissing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

impl Document {
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Parse YAML text. Blank input yields an empty (null) document.
    ///
    /// Merge keys (`<<: *defaults`) are resolved on load: inherited keys take the place of the
    /// `<<` entry and explicit keys keep their own position and win on conflict.
    pub fn parse(contents: &str) -> EditResult<Self> {
        if contents.trim().is_empty() {
            return Ok(Self { root: Value::Null });
        }
        let mut root = serde_yaml::from_str(contents).map_err(EditError::Parse)?;
        resolve_merge_keys(&mut root).map_err(EditError::Parse)?;
        Ok(Self { root })
    }

    pub fn load(path: &Utf8Path) -> EditResult<Self> {
        let contents = fs::read_to_string(path)?;
        debug!("loaded {} ({} bytes)", path, contents.len());
        Self::parse(&contents)
    }

    /// Emit block-style YAML with keys in their in-memory order.
    pub fn to_yaml_string(&self) -> EditResult<String> {
        serde_yaml::to_string(&self.root).map_err(EditError::Serialize)
    }

    pub fn save(&self, path: &Utf8Path) -> EditResult<()> {
        let text = self.to_yaml_string()?;
        fs::write(path, &text)?;
        debug!("wrote {} ({} bytes)", path, text.len());
        Ok(())
    }

    /// Resolve `path` from the root, or `None` if any hop is missing.
    pub fn get(&self, path: &DocPath) -> Option<&Value> {
        crate::matcher::field(&self.root, path)
    }

    /// Make sure a mapping exists at `path`, creating it (and any missing parents) when absent
    /// or null.
    pub fn ensure_mapping(&mut self, path: &DocPath) -> EditResult<&mut Mapping> {
        if self.root.is_null() {
            self.root = Value::Mapping(Mapping::new());
        }

        let mut current = &mut self.root;
        for (depth, seg) in path.segments().iter().enumerate() {
            let map = match current {
                Value::Mapping(map) => map,
                other => {
                    let at = DocPath::from_segments(path.segments()[..depth].iter().cloned());
                    return Err(EditError::structure(
                        &at,
                        format!("`{at}` is {}, expected a mapping", kind(other)),
                    ));
                }
            };
            let slot = map.entry(Value::String(seg.clone())).or_insert(Value::Null);
            if slot.is_null() {
                debug!("creating empty mapping at {}", seg);
                *slot = Value::Mapping(Mapping::new());
            }
            current = slot;
        }

        match current {
            Value::Mapping(map) => Ok(map),
            other => Err(EditError::structure(
                path,
                format!("`{path}` is {}, expected a mapping", kind(other)),
            )),
        }
    }

    /// Does the container at `path` hold an entry the matcher accepts?
    pub fn has_named_entry(&self, path: &DocPath, matcher: &dyn EntryMatcher) -> EditResult<bool> {
        let found = match self.container(path)? {
            Container::Mapping(map) => map
                .iter()
                .any(|(key, value)| matcher.matches(Entry::Keyed { key, value })),
            Container::Sequence(seq) => seq
                .iter()
                .enumerate()
                .any(|(index, value)| matcher.matches(Entry::Indexed { index, value })),
        };
        debug!(
            "{} has entry matching {}: {}",
            path, matcher.describe(), found
        );
        Ok(found)
    }

    /// Insert `entry` right after the first entry `anchor` accepts.
    ///
    /// Mappings are rebuilt key by key so the new key lands in position; without an anchor the
    /// key goes last. Sequences without an anchor get the element at `len - 1`, keeping the
    /// final element last.
    pub fn insert_after_anchor(
        &mut self,
        path: &DocPath,
        anchor: &dyn EntryMatcher,
        entry: NewEntry,
    ) -> EditResult<Placement> {
        let anchor_desc = anchor.describe();
        let placement = match (self.container_mut(path)?, entry) {
            (ContainerMut::Mapping(map), NewEntry::Keyed { key, value }) => {
                if map.contains_key(key.as_str()) {
                    return Ok(Placement::AlreadyPresent);
                }
                insert_into_mapping(map, anchor, key, value)
            }
            (ContainerMut::Sequence(seq), NewEntry::Element(value)) => {
                let hit = seq
                    .iter()
                    .enumerate()
                    .position(|(index, value)| anchor.matches(Entry::Indexed { index, value }));
                match hit {
                    Some(i) => {
                        seq.insert(i + 1, value);
                        Placement::AfterAnchor { index: i + 1 }
                    }
                    None => {
                        let index = seq.len().saturating_sub(1);
                        seq.insert(index, value);
                        Placement::Fallback { index }
                    }
                }
            }
            (ContainerMut::Mapping(_), NewEntry::Element(_)) => {
                return Err(EditError::structure(
                    path,
                    format!("`{path}` is a mapping; a keyed entry is required"),
                ));
            }
            (ContainerMut::Sequence(_), NewEntry::Keyed { key, .. }) => {
                return Err(EditError::structure(
                    path,
                    format!("`{path}` is a sequence; cannot insert keyed entry `{key}`"),
                ));
            }
        };
        debug!("inserted into {} ({}): {:?}", path, anchor_desc, placement);
        Ok(placement)
    }

    /// Append `text` to the string at `field` of the first element `target` accepts, unless that
    /// string already contains `marker`.
    pub fn append_text_if_absent(
        &mut self,
        path: &DocPath,
        target: &dyn EntryMatcher,
        field: &DocPath,
        marker: &str,
        text: &str,
    ) -> EditResult<AppendOutcome> {
        let found = match self.container_mut(path)? {
            ContainerMut::Sequence(seq) => {
                let hit = seq
                    .iter()
                    .enumerate()
                    .position(|(index, value)| target.matches(Entry::Indexed { index, value }));
                hit.map(|index| (index, &mut seq[index]))
            }
            ContainerMut::Mapping(map) => map
                .iter_mut()
                .enumerate()
                .find(|(_, (key, value))| target.matches(Entry::Keyed { key, value }))
                .map(|(index, (_, value))| (index, value)),
        };

        let Some((index, element)) = found else {
            debug!("no entry in {} matches {}", path, target.describe());
            return Ok(AppendOutcome::TargetMissing);
        };

        let slot = field_mut(element, field).ok_or_else(|| {
            EditError::structure(
                path,
                format!("entry {index} of `{path}` has no `{field}` field"),
            )
        })?;
        let Value::String(current) = slot else {
            return Err(EditError::structure(
                path,
                format!(
                    "`{field}` of entry {index} in `{path}` is {}, expected text",
                    kind(slot)
                ),
            ));
        };

        if current.contains(marker) {
            return Ok(AppendOutcome::AlreadyPresent { index });
        }
        current.push_str(text);
        debug!("appended {} bytes to {} entry {}", text.len(), path, index);
        Ok(AppendOutcome::Appended { index })
    }

    fn container(&self, path: &DocPath) -> EditResult<Container<'_>> {
        let value = self
            .get(path)
            .ok_or_else(|| EditError::structure(path, format!("`{path}` not found")))?;
        match value {
            Value::Mapping(map) => Ok(Container::Mapping(map)),
            Value::Sequence(seq) => Ok(Container::Sequence(seq)),
            other => Err(not_a_container(path, other)),
        }
    }

    fn container_mut(&mut self, path: &DocPath) -> EditResult<ContainerMut<'_>> {
        let value = field_mut(&mut self.root, path)
            .ok_or_else(|| EditError::structure(path, format!("`{path}` not found")))?;
        match value {
            Value::Mapping(map) => Ok(ContainerMut::Mapping(map)),
            Value::Sequence(seq) => Ok(ContainerMut::Sequence(seq)),
            other => Err(not_a_container(path, other)),
        }
    }
}

enum Container<'a> {
    Mapping(&'a Mapping),
    Sequence(&'a Sequence),
}

enum ContainerMut<'a> {
    Mapping(&'a mut Mapping),
    Sequence(&'a mut Sequence),
}

fn not_a_container(path: &DocPath, value: &Value) -> EditError {
    EditError::structure(
        path,
        format!(
            "`{path}` is {}, expected a mapping or sequence",
            kind(value)
        ),
    )
}

fn insert_into_mapping(
    map: &mut Mapping,
    anchor: &dyn EntryMatcher,
    key: String,
    value: Value,
) -> Placement {
    let old = std::mem::take(map);
    let mut rebuilt = Mapping::with_capacity(old.len() + 1);
    let mut pending = Some(value);
    let mut anchored_at = 0;

    for (k, v) in old {
        let hit = pending.is_some() && anchor.matches(Entry::Keyed { key: &k, value: &v });
        rebuilt.insert(k, v);
        if hit && let Some(new_value) = pending.take() {
            anchored_at = rebuilt.len();
            rebuilt.insert(Value::String(key.clone()), new_value);
        }
    }

    let placement = match pending {
        None => Placement::AfterAnchor { index: anchored_at },
        Some(new_value) => {
            let index = rebuilt.len();
            rebuilt.insert(Value::String(key), new_value);
            Placement::Fallback { index }
        }
    };
    *map = rebuilt;
    placement
}

const MERGE_KEY: &str = "<<";

/// Resolve `<<` merge keys in place, innermost first.
///
/// `Value::apply_merge` validates the merge sources but reorders the mapping it runs on, so it
/// only sees a scratch mapping holding the `<<` entry. Inherited keys land where `<<` was and
/// explicit keys override their values.
fn resolve_merge_keys(value: &mut Value) -> Result<(), serde_yaml::Error> {
    match value {
        Value::Mapping(map) => {
            if map.contains_key(MERGE_KEY) {
                let old = std::mem::take(map);
                let mut rebuilt = Mapping::with_capacity(old.len());
                for (k, v) in old {
                    if k.as_str() == Some(MERGE_KEY) {
                        for (ik, iv) in inherited_entries(v)? {
                            rebuilt.entry(ik).or_insert(iv);
                        }
                    } else {
                        rebuilt.insert(k, v);
                    }
                }
                *map = rebuilt;
            }
            for child in map.values_mut() {
                resolve_merge_keys(child)?;
            }
        }
        Value::Sequence(seq) => {
            for child in seq.iter_mut() {
                resolve_merge_keys(child)?;
            }
        }
        Value::Tagged(tagged) => resolve_merge_keys(&mut tagged.value)?,
        _ => {}
    }
    Ok(())
}

fn inherited_entries(mut sources: Value) -> Result<Mapping, serde_yaml::Error> {
    resolve_merge_keys(&mut sources)?;
    let mut scratch = Mapping::new();
    scratch.insert(Value::String(MERGE_KEY.to_string()), sources);
    let mut scratch = Value::Mapping(scratch);
    scratch.apply_merge()?;
    debug!("resolved merge key");
    match scratch {
        Value::Mapping(inherited) => Ok(inherited),
        _ => Ok(Mapping::new()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
