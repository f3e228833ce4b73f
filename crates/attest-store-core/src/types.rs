//! Strong type definitions for the attestation store.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::Path;

/// Caller-supplied identifier of a loaded envelope.
///
/// Usually a file path or a content hash. The store treats it as opaque; it
/// only has to be unique per loaded record.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(String);

impl Reference {
    /// Create a reference from any string-like value.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Use a filesystem path as the reference.
    ///
    /// Non-UTF-8 bytes are replaced with U+FFFD, so two paths that differ
    /// only in invalid bytes map to the same reference and the later load
    /// overwrites the earlier one. Use [`Reference::new`] with a unique name
    /// when loading such paths.
    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    /// Get the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the reference, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference({})", self.0)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Reference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Reference {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Reference {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Reference {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn test_reference_display() {
        let r = Reference::new("testData/dsseEnvelope1.json");
        assert_eq!(r.to_string(), "testData/dsseEnvelope1.json");
        assert_eq!(format!("{:?}", r), "Reference(testData/dsseEnvelope1.json)");
    }

    #[test]
    fn test_reference_from_path() {
        let path = PathBuf::from("a").join("b.json");
        let r = Reference::from_path(&path);
        assert_eq!(r.as_str(), path.to_string_lossy());
    }

    #[cfg(unix)]
    #[test]
    fn test_reference_from_non_utf8_paths_collide() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let a = Path::new(OsStr::from_bytes(b"dir/\xffa.json"));
        let b = Path::new(OsStr::from_bytes(b"dir/\xfea.json"));
        assert_ne!(a, b);
        assert_eq!(Reference::from_path(a), Reference::from_path(b));
        assert_eq!(Reference::from_path(a).as_str(), "dir/\u{fffd}a.json");
    }

    #[test]
    fn test_reference_borrow_lookup() {
        let mut map = HashMap::new();
        map.insert(Reference::from("ref1"), 1);
        assert_eq!(map.get("ref1"), Some(&1));
    }
}
