use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A dotted path of mapping keys inside a YAML document.
///
/// Used both for container paths (`jobs.build.steps`) measured from the document root and for
/// field paths (`run.command`) measured from a single container element. Segments never contain
/// `.`; build one with [`DocPath::from_segments`] when a key does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocPath(Vec<String>);

impl DocPath {
    /// Parse a dotted path. Empty segments are dropped, so `""` is the root.
    pub fn parse(dotted: &str) -> Self {
        Self(
            dotted
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.0.join("."))
    }
}

impl FromStr for DocPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for DocPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}
