//! Hierarchical document keys.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::fs::TEMP_MARKER;

pub(crate) const DOCUMENT_EXTENSION: &str = ".json";

/// Ordered, non-empty sequence of path segments addressing one document.
///
/// Segments are plain path components, so distinct keys always map to
/// distinct files under the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    segments: Vec<String>,
}

impl StorageKey {
    /// Build a key, validating every segment.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidKey` for an empty key or a segment that is
    /// empty, `.`/`..`, or contains a path separator or NUL.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(StoreError::InvalidKey("key has no segments".to_string()));
        }
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment; the document id for repository keys.
    pub fn last(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// A key one segment longer.
    pub fn child(&self, segment: impl Into<String>) -> Result<Self> {
        let segment = segment.into();
        validate_segment(&segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    /// Document file for this key under `root`.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        if let Some((last, parents)) = self.segments.split_last() {
            path.extend(parents);
            path.push(format!("{}{}", last, DOCUMENT_EXTENSION));
        }
        path
    }

    /// Directory holding the documents under this key used as a prefix.
    pub fn to_dir(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.segments);
        path
    }

    pub(crate) fn from_trusted(segments: Vec<String>) -> Self {
        Self { segments }
    }
}

fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(StoreError::InvalidKey("empty segment".to_string()));
    }
    if segment == "." || segment == ".." {
        return Err(StoreError::InvalidKey(format!(
            "relative segment not allowed: {}",
            segment
        )));
    }
    if segment.contains(|c: char| matches!(c, '/' | '\\' | '\0')) {
        return Err(StoreError::InvalidKey(format!(
            "segment contains a path separator: {}",
            segment
        )));
    }
    // Temp files are skipped by `list`, and a `.json` segment would share
    // its directory path with a sibling document file.
    if segment.contains(TEMP_MARKER) || segment.ends_with(DOCUMENT_EXTENSION) {
        return Err(StoreError::InvalidKey(format!(
            "reserved segment name: {}",
            segment
        )));
    }
    Ok(())
}

impl Ord for StorageKey {
    /// Segment-by-segment lexicographic order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments.cmp(&other.segments)
    }
}

impl PartialOrd for StorageKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl<const N: usize> TryFrom<[&str; N]> for StorageKey {
    type Error = StoreError;

    fn try_from(segments: [&str; N]) -> Result<Self> {
        StorageKey::new(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_mapping() {
        let key = StorageKey::new(["message", "conv_1", "msg_1"]).unwrap();
        let path = key.to_path(Path::new("/root"));
        assert_eq!(path, PathBuf::from("/root/message/conv_1/msg_1.json"));
        assert_eq!(key.to_dir(Path::new("/root")), PathBuf::from("/root/message/conv_1/msg_1"));
        assert_eq!(key.to_string(), "message/conv_1/msg_1");
        assert_eq!(key.last(), "msg_1");
    }

    #[test]
    fn test_rejects_ambiguous_segments() {
        assert!(StorageKey::new(Vec::<String>::new()).is_err());
        assert!(StorageKey::new(["project", ""]).is_err());
        assert!(StorageKey::new(["project", ".."]).is_err());
        assert!(StorageKey::new(["project", "a/b"]).is_err());
        assert!(StorageKey::new(["project", "a\\b"]).is_err());
    }

    #[test]
    fn test_rejects_reserved_names() {
        assert!(StorageKey::new(["project", "x.tmp-1"]).is_err());
        assert!(StorageKey::new(["a", "b.json", "c"]).is_err());
        assert!(StorageKey::new(["a", "b"]).unwrap().child("c.json").is_err());
        assert!(StorageKey::new(["project", "notes.json.bak"]).is_ok());
    }

    #[test]
    fn test_ordering_is_segment_wise() {
        let mut keys = vec![
            StorageKey::new(["a", "y"]).unwrap(),
            StorageKey::new(["a", "x", "z"]).unwrap(),
            StorageKey::new(["a", "x"]).unwrap(),
        ];
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["a/x", "a/x/z", "a/y"]);
    }

    #[test]
    fn test_child() {
        let prefix = StorageKey::new(["message"]).unwrap();
        let key = prefix.child("conv_1").unwrap();
        assert_eq!(key.segments(), ["message", "conv_1"]);
        assert!(prefix.child("..").is_err());
    }
}
