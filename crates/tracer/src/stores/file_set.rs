#![forbid(unsafe_code)]

use rustc_hash::FxHashSet;
use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// A path paired with its position in a [`FileSet::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedPath {
    pub index: usize,
    pub path: PathBuf,
}

/// Deduplicated, append-only set of file paths seen during a session.
///
/// Members are keyed by their exact bytes: `/a` and `/a/` are two entries
/// even though they name the same `Path`.
#[derive(Debug, Default, Clone)]
pub struct FileSet {
    paths: FxHashSet<OsString>,
}

impl FileSet {
    /// Add paths to the set. Paths already present are ignored.
    pub fn merge<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let before = self.paths.len();
        self.paths
            .extend(paths.into_iter().map(|path| path.into().into_os_string()));
        self.paths.len() - before
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.paths.contains(path.as_ref().as_os_str())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Current members in ascending bytewise order, each with its 0-based
    /// index. Ordering compares whole path strings, not `Path` components,
    /// so `/a-b` sorts before `/a/b`.
    pub fn snapshot(&self) -> Vec<IndexedPath> {
        let mut sorted: Vec<&OsString> = self.paths.iter().collect();
        sorted.sort_unstable_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
        sorted
            .into_iter()
            .enumerate()
            .map(|(index, path)| IndexedPath {
                index,
                path: PathBuf::from(path),
            })
            .collect()
    }
}
