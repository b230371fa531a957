//! Regression data - the dependency records persisted per test unit
//!
//! A test unit (class or method) depends on a set of resources. Each
//! resource is captured as a [`RegData`]: its URL external form plus the
//! content fingerprint observed when the unit last ran.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Set of dependencies recorded for one test unit.
pub type RegDataSet = HashSet<RegData>;

/// One dependency of a test unit: resource URL and content fingerprint.
///
/// Equality and hashing cover both fields, so capturing the same resource
/// twice with an unchanged fingerprint collapses into a single set entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegData {
    url: String,
    hash: String,
}

impl RegData {
    pub fn new(url: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            hash: hash.into(),
        }
    }

    /// URL external form, e.g. `file:/work/target/classes/Foo.class`
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Content fingerprint at capture time
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Whether the resource lives on the local filesystem.
    ///
    /// External stores only persist these; jar-internal and remote
    /// resources are dropped on that path.
    pub fn is_file_resource(&self) -> bool {
        self.url.starts_with("file")
    }
}

impl fmt::Display for RegData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.url, self.hash)
    }
}

/// Records of a set in a stable order (by url, then hash).
pub fn sorted(records: &RegDataSet) -> Vec<&RegData> {
    let mut sorted: Vec<&RegData> = records.iter().collect();
    sorted.sort();
    sorted
}

/// Identity of a test unit: a class, or a method within a class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitKey {
    class_name: String,
    method_name: Option<String>,
}

impl UnitKey {
    /// A key given as one combined name (e.g. a class name).
    pub fn full(name: impl Into<String>) -> Self {
        Self {
            class_name: name.into(),
            method_name: None,
        }
    }

    /// A key for a test method.
    pub fn method(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: Some(method_name.into()),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn method_name(&self) -> Option<&str> {
        self.method_name.as_deref()
    }

    /// Persistence identity: `Class` or `Class.method`
    pub fn full_name(&self) -> String {
        match &self.method_name {
            Some(method) => format!("{}.{}", self.class_name, method),
            None => self.class_name.clone(),
        }
    }

    /// Parse a CLI key. `Class#method` selects a method key, anything else
    /// is taken as a combined name.
    pub fn parse(text: &str) -> Self {
        match text.split_once('#') {
            Some((class, method)) if !class.is_empty() && !method.is_empty() => {
                Self::method(class, method)
            }
            _ => Self::full(text),
        }
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_deduplicates_structurally() {
        let mut set = RegDataSet::new();
        set.insert(RegData::new("file:/a/b.class", "123"));
        set.insert(RegData::new("file:/a/b.class", "123"));
        set.insert(RegData::new("file:/a/b.class", "124"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_file_resource_filter() {
        assert!(RegData::new("file:/a/b.class", "1").is_file_resource());
        assert!(!RegData::new("jar:file:/lib/x.jar!/A.class", "1").is_file_resource());
        assert!(!RegData::new("http://example.com/A.class", "1").is_file_resource());
    }

    #[test]
    fn test_unit_key_full_name() {
        assert_eq!(UnitKey::full("com.example.Foo").full_name(), "com.example.Foo");
        assert_eq!(
            UnitKey::method("com.example.Foo", "testBar").full_name(),
            "com.example.Foo.testBar"
        );
    }

    #[test]
    fn test_unit_key_parse() {
        let key = UnitKey::parse("com.example.Foo#testBar");
        assert_eq!(key.class_name(), "com.example.Foo");
        assert_eq!(key.method_name(), Some("testBar"));

        let key = UnitKey::parse("com.example.Foo");
        assert_eq!(key.method_name(), None);

        let key = UnitKey::parse("#oops");
        assert_eq!(key.full_name(), "#oops");
    }

    #[test]
    fn test_sorted_is_stable() {
        let set: RegDataSet = [
            RegData::new("file:/b", "2"),
            RegData::new("file:/a", "1"),
        ]
        .into_iter()
        .collect();
        let urls: Vec<&str> = sorted(&set).iter().map(|r| r.url()).collect();
        assert_eq!(urls, vec!["file:/a", "file:/b"]);
    }
}
