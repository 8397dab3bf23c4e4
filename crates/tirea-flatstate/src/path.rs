//! Key paths for addressing values inside a state tree.
//!
//! A path is an ordered sequence of segments. Each segment is either a
//! mapping key or a sequence index. Indexes are signed: a negative index
//! counts back from the end of the sequence it addresses.

use crate::{FlatError, FlatResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single segment in a path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seg {
    /// Mapping key access: `{"key": value}`
    Key(String),
    /// Sequence index access: `[index]`, negative counts from the end.
    Index(i64),
}

impl Seg {
    /// Create a key segment.
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        Seg::Key(k.into())
    }

    /// Returns true if this is an index segment.
    #[inline]
    pub fn is_index(&self) -> bool {
        matches!(self, Seg::Index(_))
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) => write!(f, ".{}", k),
            Seg::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl From<String> for Seg {
    fn from(s: String) -> Self {
        Seg::Key(s)
    }
}

impl From<&str> for Seg {
    fn from(s: &str) -> Self {
        Seg::Key(s.to_owned())
    }
}

impl From<&String> for Seg {
    fn from(s: &String) -> Self {
        Seg::Key(s.clone())
    }
}

impl From<i64> for Seg {
    fn from(i: i64) -> Self {
        Seg::Index(i)
    }
}

impl From<i32> for Seg {
    fn from(i: i32) -> Self {
        Seg::Index(i64::from(i))
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

/// A complete path into a state tree.
///
/// # Examples
///
/// ```
/// use tirea_flatstate::Path;
///
/// let path = Path::root().key("users").index(-1).key("name");
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.to_string(), "$.users[-1].name");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Path(Vec<Seg>);

impl Path {
    /// Create an empty path (root).
    #[inline]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Create an empty path (alias for `new`).
    #[inline]
    pub fn root() -> Self {
        Self::new()
    }

    /// Parse a dotted path such as `items.-1.name`.
    ///
    /// Segments that parse as a signed integer become indexes, everything
    /// else becomes a key. The empty string is the root path.
    ///
    /// ```
    /// use tirea_flatstate::{path, Path};
    ///
    /// assert_eq!(Path::parse("form.items.0.title").unwrap(), path!("form", "items", 0, "title"));
    /// assert!(Path::parse("a..b").is_err());
    /// ```
    pub fn parse(input: &str) -> FlatResult<Self> {
        if input.is_empty() {
            return Ok(Path::root());
        }

        input
            .split('.')
            .map(|part| {
                if part.is_empty() {
                    return Err(FlatError::invalid_path(format!(
                        "empty segment in path '{input}'"
                    )));
                }
                Ok(match part.parse::<i64>() {
                    Ok(i) => Seg::Index(i),
                    Err(_) => Seg::Key(part.to_owned()),
                })
            })
            .collect()
    }

    /// Append a key segment and return self (builder pattern).
    #[inline]
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Seg::Key(k.into()));
        self
    }

    /// Append an index segment and return self (builder pattern).
    #[inline]
    pub fn index(mut self, i: i64) -> Self {
        self.0.push(Seg::Index(i));
        self
    }

    /// Push a segment onto the path (mutating).
    #[inline]
    pub fn push(&mut self, seg: Seg) {
        self.0.push(seg);
    }

    /// Get the segments of this path.
    #[inline]
    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    /// Check if this path is empty (root).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of segments in this path.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Join this path with another path.
    #[inline]
    pub fn join(&self, other: &Path) -> Path {
        let mut result = self.clone();
        result.0.extend(other.0.iter().cloned());
        result
    }

    /// Append a segment and return a new path (non-mutating builder).
    #[inline]
    pub fn with_segment(&self, seg: impl Into<Seg>) -> Path {
        let mut result = self.clone();
        result.0.push(seg.into());
        result
    }

    /// Get a slice of segments from start to end.
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> Path {
        Path(self.0[start..end].to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for seg in &self.0 {
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = FlatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl FromIterator<Seg> for Path {
    fn from_iter<I: IntoIterator<Item = Seg>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Seg;
    type IntoIter = std::slice::Iter<'a, Seg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for Path {
    type Output = Seg;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Construct a `Path` from a sequence of segments.
///
/// # Examples
///
/// ```
/// use tirea_flatstate::path;
///
/// // String literals become Key segments
/// let p = path!("users", "alice", "email");
///
/// // Integers become Index segments, negatives count from the end
/// let p = path!("items", -1, "name");
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($seg:expr),+ $(,)?) => {{
        let mut p = $crate::Path::root();
        $(
            p.push($crate::path!(@seg $seg));
        )+
        p
    }};
    (@seg $seg:expr) => {
        $crate::Seg::from($seg)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_construction() {
        let path = Path::root().key("users").index(0).key("name");
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], Seg::Key("users".into()));
        assert_eq!(path[1], Seg::Index(0));
        assert_eq!(path[2], Seg::Key("name".into()));
    }

    #[test]
    fn test_path_display() {
        let path = Path::root().key("users").index(-2).key("name");
        assert_eq!(format!("{}", path), "$.users[-2].name");
        assert_eq!(Path::root().to_string(), "$");
    }

    #[test]
    fn test_path_macro() {
        let p = path!("users", 0, "name", -1);
        assert_eq!(p.len(), 4);
        assert_eq!(p[0], Seg::Key("users".into()));
        assert_eq!(p[1], Seg::Index(0));
        assert_eq!(p[2], Seg::Key("name".into()));
        assert_eq!(p[3], Seg::Index(-1));
        assert!(path!().is_empty());
    }

    #[test]
    fn test_parse_dotted() {
        let p = Path::parse("todos.-1.done").unwrap();
        assert_eq!(p, path!("todos", -1, "done"));

        let p: Path = "a.b".parse().unwrap();
        assert_eq!(p, path!("a", "b"));

        assert!(Path::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        for input in ["a..b", ".a", "a."] {
            let err = Path::parse(input).unwrap_err();
            assert!(matches!(err, FlatError::InvalidPath { .. }), "{input}");
        }
    }

    #[test]
    fn test_path_join_and_with_segment() {
        let base = Path::root().key("data");
        let sub = Path::root().key("items").index(0);
        let joined = base.join(&sub);
        assert_eq!(joined, path!("data", "items", 0));
        assert_eq!(joined.slice(0, 2), path!("data", "items"));
        assert_eq!(base.with_segment(3), path!("data", 3));
    }

    #[test]
    fn test_path_serde() {
        let path = path!("users", -1, "name");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#"["users",-1,"name"]"#);
        let parsed: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(path, parsed);
    }
}
