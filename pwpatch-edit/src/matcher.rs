//! Pluggable predicates used to find anchors and existing entries inside a container.

use pwpatch_types::path::DocPath;
use serde_yaml::Value;

/// One element of a container, as seen by a matcher.
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a> {
    /// A key/value pair of a mapping container.
    Keyed { key: &'a Value, value: &'a Value },
    /// An element of a sequence container.
    Indexed { index: usize, value: &'a Value },
}

impl<'a> Entry<'a> {
    pub fn value(&self) -> &'a Value {
        match self {
            Entry::Keyed { value, .. } | Entry::Indexed { value, .. } => value,
        }
    }

    pub fn key_str(&self) -> Option<&'a str> {
        match self {
            Entry::Keyed { key, .. } => key.as_str(),
            Entry::Indexed { .. } => None,
        }
    }
}

pub trait EntryMatcher {
    fn matches(&self, entry: Entry<'_>) -> bool;

    /// Human-readable form for log lines.
    fn describe(&self) -> String {
        "custom matcher".to_string()
    }
}

impl<F> EntryMatcher for F
where
    F: Fn(Entry<'_>) -> bool,
{
    fn matches(&self, entry: Entry<'_>) -> bool {
        self(entry)
    }
}

/// Matches the mapping entry whose key is exactly `name`.
#[derive(Debug, Clone)]
pub struct KeyEquals(pub String);

impl EntryMatcher for KeyEquals {
    fn matches(&self, entry: Entry<'_>) -> bool {
        entry.key_str() == Some(self.0.as_str())
    }

    fn describe(&self) -> String {
        format!("key == {:?}", self.0)
    }
}

/// Matches elements whose text field at `field` satisfies a comparison.
#[derive(Debug, Clone)]
pub struct LabelMatch {
    pub field: DocPath,
    pub text: String,
    pub mode: LabelMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    Equals,
    Contains,
}

impl EntryMatcher for LabelMatch {
    fn matches(&self, entry: Entry<'_>) -> bool {
        let Some(label) = field(entry.value(), &self.field).and_then(Value::as_str) else {
            return false;
        };
        match self.mode {
            LabelMode::Equals => label == self.text,
            LabelMode::Contains => label.contains(self.text.as_str()),
        }
    }

    fn describe(&self) -> String {
        let op = match self.mode {
            LabelMode::Equals => "==",
            LabelMode::Contains => "contains",
        };
        format!("{} {} {:?}", self.field, op, self.text)
    }
}

pub fn key_equals(name: impl Into<String>) -> KeyEquals {
    KeyEquals(name.into())
}

pub fn label_equals(field: impl Into<DocPath>, text: impl Into<String>) -> LabelMatch {
    LabelMatch {
        field: field.into(),
        text: text.into(),
        mode: LabelMode::Equals,
    }
}

pub fn label_contains(field: impl Into<DocPath>, needle: impl Into<String>) -> LabelMatch {
    LabelMatch {
        field: field.into(),
        text: needle.into(),
        mode: LabelMode::Contains,
    }
}

/// Resolve a field path relative to `value`. Every hop must be a mapping.
pub fn field<'a>(value: &'a Value, path: &DocPath) -> Option<&'a Value> {
    let mut current = value;
    for seg in path.segments() {
        current = current.as_mapping()?.get(seg.as_str())?;
    }
    Some(current)
}

pub fn field_mut<'a>(value: &'a mut Value, path: &DocPath) -> Option<&'a mut Value> {
    let mut current = value;
    for seg in path.segments() {
        current = current.as_mapping_mut()?.get_mut(seg.as_str())?;
    }
    Some(current)
}
