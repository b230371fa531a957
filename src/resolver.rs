//! Name resolver - maps a test unit key to a file it can be stored in
//!
//! The natural file name is the unit's full name. Method names generated by
//! parameterized test frameworks can exceed the filesystem's name limit, in
//! which case the name is folded into fingerprints, at most twice:
//!
//! 1. `Class.method`            (natural name)
//! 2. `Class.<hash(method)>`    (method folded)
//! 3. `<hash(Class.<hash(method)>)>` (everything folded)
//!
//! A combined key skips step 2. A component is folded once and never
//! hashed again, so the chain is finite and the same key always ends at
//! the same file.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use crate::hash::hash_string;
use crate::regdata::UnitKey;

/// `ERROR_FILENAME_EXCED_RANGE`
#[cfg(windows)]
const WINDOWS_NAME_TOO_LONG: i32 = 206;

/// Direction a file is opened in; only affects how failures are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    fn as_str(&self) -> &'static str {
        match self {
            Access::Read => "reading",
            Access::Write => "writing",
        }
    }
}

/// One step of the fallback chain: the name to try plus the components
/// that may still be folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub file_name: String,
    first: Option<String>,
    second: Option<String>,
}

impl Candidate {
    pub fn for_key(key: &UnitKey) -> Self {
        match key.method_name() {
            Some(method) => Self {
                file_name: key.full_name(),
                first: Some(key.class_name().to_string()),
                second: Some(method.to_string()),
            },
            None => Self {
                file_name: key.full_name(),
                first: Some(key.full_name()),
                second: None,
            },
        }
    }

    /// Next name to try after this one was rejected as too long.
    pub fn fallback(&self) -> Option<Candidate> {
        match (&self.first, &self.second) {
            (Some(first), Some(second)) => {
                let name = format!("{}.{}", first, hash_string(second));
                Some(Candidate {
                    file_name: name.clone(),
                    first: Some(name),
                    second: None,
                })
            }
            (Some(first), None) => Some(Candidate {
                file_name: hash_string(first).to_string(),
                first: None,
                second: None,
            }),
            _ => None,
        }
    }
}

/// Result of a resolution attempt.
#[derive(Debug)]
pub enum Resolution<T> {
    /// `handle` is open on `path`
    Resolved { handle: T, path: PathBuf },
    /// Gave up; the reason has been logged
    Unavailable,
}

impl<T> Resolution<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Resolution::Resolved { path, .. } => Some(path),
            Resolution::Unavailable => None,
        }
    }
}

#[cfg(unix)]
fn is_os_name_too_long(code: i32) -> bool {
    code == libc::ENAMETOOLONG
}

#[cfg(windows)]
fn is_os_name_too_long(code: i32) -> bool {
    code == WINDOWS_NAME_TOO_LONG
}

#[cfg(not(any(unix, windows)))]
fn is_os_name_too_long(_code: i32) -> bool {
    false
}

/// Whether an open failed because the file name exceeds the filesystem limit.
pub fn is_name_too_long(err: &io::Error) -> bool {
    if let Some(code) = err.raw_os_error() {
        return is_os_name_too_long(code);
    }
    err.to_string().to_lowercase().contains("name too long")
}

/// Walk the fallback chain for `key` under `dir`, calling `open` on each
/// candidate path until one succeeds or the chain is exhausted.
///
/// Never returns an error: every failure is logged and reported as
/// [`Resolution::Unavailable`].
pub fn resolve<T, F>(dir: &Path, key: &UnitKey, access: Access, mut open: F) -> Resolution<T>
where
    F: FnMut(&Path) -> io::Result<T>,
{
    let mut candidate = Candidate::for_key(key);
    loop {
        let path = dir.join(&candidate.file_name);
        match open(&path) {
            Ok(handle) => return Resolution::Resolved { handle, path },
            Err(e) if is_name_too_long(&e) => match candidate.fallback() {
                Some(next) => {
                    tracing::debug!(
                        "File name too long for {}, retrying as {}",
                        candidate.file_name,
                        next.file_name
                    );
                    candidate = next;
                }
                None => {
                    tracing::warn!(
                        "Could not open file for {} (name too long) {}",
                        access.as_str(),
                        candidate.file_name
                    );
                    return Resolution::Unavailable;
                }
            },
            Err(e) if access == Access::Read && e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No stored dependencies at {}", path.display());
                return Resolution::Unavailable;
            }
            Err(e) => {
                tracing::warn!(
                    "Could not open file for {} {}: {}",
                    access.as_str(),
                    path.display(),
                    e
                );
                return Resolution::Unavailable;
            }
        }
    }
}

/// Open the stored file for `key` for reading.
pub fn open_read(dir: &Path, key: &UnitKey) -> Resolution<BufReader<File>> {
    resolve(dir, key, Access::Read, |path| File::open(path).map(BufReader::new))
}

/// Create (or truncate) the file for `key`.
pub fn open_write(dir: &Path, key: &UnitKey) -> Resolution<File> {
    resolve(dir, key, Access::Write, |path| File::create(path))
}

/// Every name the chain for `key` may try, in order.
pub fn fallback_names(key: &UnitKey) -> Vec<String> {
    let mut names = Vec::new();
    let mut candidate = Some(Candidate::for_key(key));
    while let Some(current) = candidate {
        candidate = current.fallback();
        names.push(current.file_name);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn too_long() -> io::Error {
        io::Error::new(io::ErrorKind::Other, "File name too long")
    }

    fn long_name(len: usize) -> String {
        "x".repeat(len)
    }

    #[test]
    fn test_chain_for_method_key() {
        let key = UnitKey::method("com.example.Foo", "testBar");
        let folded = format!("com.example.Foo.{}", hash_string("testBar"));
        assert_eq!(
            fallback_names(&key),
            vec![
                "com.example.Foo.testBar".to_string(),
                folded.clone(),
                hash_string(&folded).to_string(),
            ]
        );
    }

    #[test]
    fn test_chain_for_full_key() {
        let key = UnitKey::full("com.example.Foo");
        assert_eq!(
            fallback_names(&key),
            vec![
                "com.example.Foo".to_string(),
                hash_string("com.example.Foo").to_string(),
            ]
        );
    }

    #[test]
    fn test_exhausted_chain_is_unavailable() {
        let dir = tempdir().unwrap();
        let mut attempts = Vec::new();
        let key = UnitKey::method("Foo", "bar");
        let res: Resolution<()> = resolve(dir.path(), &key, Access::Write, |path| {
            attempts.push(path.file_name().unwrap().to_string_lossy().to_string());
            Err(too_long())
        });
        assert!(!res.is_resolved());
        assert_eq!(attempts, fallback_names(&key));
        assert_eq!(attempts.len(), 3);
    }

    #[test]
    fn test_other_errors_do_not_fall_back() {
        let dir = tempdir().unwrap();
        let mut attempts = 0;
        let res: Resolution<()> = resolve(dir.path(), &UnitKey::full("Foo"), Access::Write, |_| {
            attempts += 1;
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        });
        assert!(!res.is_resolved());
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_missing_file_for_read() {
        let dir = tempdir().unwrap();
        let res = open_read(dir.path(), &UnitKey::full("com.example.Missing"));
        assert!(!res.is_resolved());
    }

    #[test]
    fn test_method_folded_before_class() {
        let dir = tempdir().unwrap();
        let method = long_name(300);
        let key = UnitKey::method("com.example.Foo", method.as_str());

        let res = open_write(dir.path(), &key);
        let expected = format!("com.example.Foo.{}", hash_string(&method));
        assert_eq!(res.path(), Some(dir.path().join(&expected).as_path()));
        assert!(dir.path().join(expected).exists());
    }

    #[test]
    fn test_long_class_is_fully_hashed() {
        let dir = tempdir().unwrap();
        let class = long_name(300);
        let key = UnitKey::method(class.as_str(), "testBar");

        let res = open_write(dir.path(), &key);
        let folded = format!("{}.{}", class, hash_string("testBar"));
        let expected = hash_string(&folded).to_string();
        assert_eq!(res.path(), Some(dir.path().join(expected).as_path()));
    }

    #[test]
    fn test_long_full_key_is_hashed() {
        let dir = tempdir().unwrap();
        let name = long_name(300);
        let res = open_write(dir.path(), &UnitKey::full(name.as_str()));
        let expected = hash_string(&name).to_string();
        assert_eq!(res.path(), Some(dir.path().join(expected).as_path()));
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        let key = UnitKey::method("com.example.Foo", long_name(400).as_str());

        let a = open_write(first.path(), &key);
        let b = open_write(second.path(), &key);
        assert_eq!(
            a.path().and_then(Path::file_name),
            b.path().and_then(Path::file_name)
        );

        // A reader follows the same chain to the same file.
        let read = open_read(first.path(), &key);
        assert_eq!(read.path(), a.path());
    }
}
