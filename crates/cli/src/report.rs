#![forbid(unsafe_code)]

//! The `index<TAB>path` listing printed once the traced tree has exited.

use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use tracer::IndexedPath;

/// Write one `index\tpath` line per entry. Paths are written as raw bytes,
/// so names that are not valid UTF-8 survive unchanged.
pub fn write(mut out: impl Write, entries: &[IndexedPath]) -> io::Result<()> {
    for entry in entries {
        write!(out, "{}\t", entry.index)?;
        out.write_all(entry.path.as_os_str().as_bytes())?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracer::FileSet;

    #[test]
    fn lines_are_tab_separated_and_sorted() {
        let mut files = FileSet::default();
        files.merge(["/usr/lib/libc.so.6", "/usr/bin/true", "/etc/ld.so.cache"]);

        let mut out = Vec::new();
        write(&mut out, &files.snapshot()).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0\t/etc/ld.so.cache\n1\t/usr/bin/true\n2\t/usr/lib/libc.so.6\n"
        );
    }

    #[test]
    fn empty_set_writes_nothing() {
        let mut out = Vec::new();
        write(&mut out, &[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn non_utf8_paths_are_written_verbatim() {
        use std::ffi::OsStr;
        use std::path::PathBuf;

        let name = OsStr::from_bytes(b"/tmp/caf\xe9");
        let mut files = FileSet::default();
        files.merge([PathBuf::from(name)]);

        let mut out = Vec::new();
        write(&mut out, &files.snapshot()).unwrap();
        assert_eq!(out, b"0\t/tmp/caf\xe9\n");
    }
}
