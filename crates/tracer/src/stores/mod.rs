#![forbid(unsafe_code)]

mod file_set;

pub use file_set::{FileSet, IndexedPath};
