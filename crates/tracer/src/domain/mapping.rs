#![forbid(unsafe_code)]

use crate::error::Error;
use bitflags::bitflags;
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

bitflags! {
    /// The `rwxp` column of a mapping table line.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const EXEC = 1 << 2;
        /// `s` in the last position; `p` (private, copy-on-write) otherwise.
        const SHARED = 1 << 3;
    }
}

impl Permissions {
    fn parse(field: &[u8]) -> Option<Self> {
        let &[r, w, x, s] = field else {
            return None;
        };
        let mut perms = Permissions::empty();
        for (byte, set, flag) in [
            (r, b'r', Permissions::READ),
            (w, b'w', Permissions::WRITE),
            (x, b'x', Permissions::EXEC),
        ] {
            match byte {
                b'-' => {}
                b if b == set => perms |= flag,
                _ => return None,
            }
        }
        match s {
            b's' => perms |= Permissions::SHARED,
            b'p' => {}
            _ => return None,
        }
        Some(perms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    pub major: u32,
    pub minor: u32,
}

/// One line of `/proc/<pid>/maps`.
///
/// ```text
/// address           perms offset  dev   inode       pathname
/// 00400000-00452000 r-xp 00000000 08:02 173521      /usr/bin/dbus-daemon
/// 00e03000-00e24000 rw-p 00000000 00:00 0           [heap]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryMapping {
    pub start: u64,
    pub end: u64,
    pub perms: Permissions,
    pub offset: u64,
    pub device: DeviceId,
    /// 0 for anonymous regions (heap, stack, anonymous mmap).
    pub inode: u64,
    pub pathname: Option<PathBuf>,
}

impl MemoryMapping {
    /// Parse a single line, without its trailing newline.
    ///
    /// The address range, permissions, offset, device and inode columns are
    /// mandatory. Everything after the inode column, minus the padding, is
    /// the pathname, so names containing spaces and the kernel's
    /// ` (deleted)` suffix survive unchanged.
    pub fn parse_line(line: &[u8]) -> Result<Self, Error> {
        let malformed = |reason| Error::MappingParse {
            line: String::from_utf8_lossy(line).into_owned(),
            reason,
        };

        let mut rest = line;
        let range = next_field(&mut rest).ok_or_else(|| malformed("missing address range"))?;
        let dash = range
            .iter()
            .position(|&b| b == b'-')
            .ok_or_else(|| malformed("address range has no '-'"))?;
        let start = parse_hex(&range[..dash]).ok_or_else(|| malformed("invalid start address"))?;
        let end = parse_hex(&range[dash + 1..]).ok_or_else(|| malformed("invalid end address"))?;

        let perms = next_field(&mut rest)
            .and_then(Permissions::parse)
            .ok_or_else(|| malformed("invalid permissions"))?;

        let offset = next_field(&mut rest)
            .and_then(parse_hex)
            .ok_or_else(|| malformed("invalid offset"))?;

        let device = next_field(&mut rest)
            .and_then(parse_device)
            .ok_or_else(|| malformed("invalid device"))?;

        let inode = next_field(&mut rest)
            .and_then(parse_inode)
            .ok_or_else(|| malformed("invalid inode"))?;

        let pathname = match rest.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(pos) => Some(PathBuf::from(OsStr::from_bytes(&rest[pos..]))),
            None => None,
        };

        Ok(Self {
            start,
            end,
            perms,
            offset,
            device,
            inode,
            pathname,
        })
    }

    /// Path of the file backing this region. Only regions with a non-zero
    /// inode have a file identity; pseudo paths such as `[heap]` or
    /// `[vdso]` are anonymous and yield `None`.
    pub fn file_path(&self) -> Option<&Path> {
        if self.inode == 0 {
            return None;
        }
        self.pathname.as_deref()
    }

    /// Size of the region in bytes.
    pub fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

fn next_field<'a>(rest: &mut &'a [u8]) -> Option<&'a [u8]> {
    let start = rest.iter().position(|b| !b.is_ascii_whitespace())?;
    let tail = &rest[start..];
    let end = tail
        .iter()
        .position(u8::is_ascii_whitespace)
        .unwrap_or(tail.len());
    let (field, tail) = tail.split_at(end);
    *rest = tail;
    Some(field)
}

fn parse_radix(field: &[u8], radix: u32) -> Option<u64> {
    if field.is_empty() || !field.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    u64::from_str_radix(std::str::from_utf8(field).ok()?, radix).ok()
}

fn parse_hex(field: &[u8]) -> Option<u64> {
    parse_radix(field, 16)
}

fn parse_device(field: &[u8]) -> Option<DeviceId> {
    let colon = field.iter().position(|&b| b == b':')?;
    let major = u32::try_from(parse_hex(&field[..colon])?).ok()?;
    let minor = u32::try_from(parse_hex(&field[colon + 1..])?).ok()?;
    Some(DeviceId { major, minor })
}

fn parse_inode(field: &[u8]) -> Option<u64> {
    parse_radix(field, 10).or_else(|| parse_hex(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_file_backed_line() {
        let line = b"00400000-00452000 r-xp 00000000 08:02 173521      /usr/bin/dbus-daemon";
        let mapping = MemoryMapping::parse_line(line).unwrap();

        assert_eq!(mapping.start, 0x0040_0000);
        assert_eq!(mapping.end, 0x0045_2000);
        assert_eq!(mapping.perms, Permissions::READ | Permissions::EXEC);
        assert_eq!(mapping.offset, 0);
        assert_eq!(mapping.device, DeviceId { major: 8, minor: 2 });
        assert_eq!(mapping.inode, 173521);
        assert_eq!(mapping.size(), 0x52000);
        assert_eq!(
            mapping.file_path(),
            Some(Path::new("/usr/bin/dbus-daemon"))
        );
    }

    #[test]
    fn anonymous_regions_have_no_file_path() {
        let heap = MemoryMapping::parse_line(b"00e03000-00e24000 rw-p 00000000 00:00 0   [heap]")
            .unwrap();
        assert_eq!(heap.pathname.as_deref(), Some(Path::new("[heap]")));
        assert_eq!(heap.file_path(), None);

        let anon = MemoryMapping::parse_line(b"7f0000000000-7f0000001000 rw-s 00000000 00:00 0")
            .unwrap();
        assert!(anon.perms.contains(Permissions::SHARED));
        assert_eq!(anon.pathname, None);
        assert_eq!(anon.file_path(), None);
    }

    #[test]
    fn pathname_keeps_spaces_and_deleted_suffix() {
        let line = b"7f1c2a000000-7f1c2a001000 r--p 00001000 fd:01 42 /tmp/my file.txt (deleted)";
        let mapping = MemoryMapping::parse_line(line).unwrap();
        assert_eq!(mapping.offset, 0x1000);
        assert_eq!(mapping.device, DeviceId { major: 0xfd, minor: 1 });
        assert_eq!(
            mapping.file_path(),
            Some(Path::new("/tmp/my file.txt (deleted)"))
        );
    }

    #[test]
    fn inode_with_pathname_missing_contributes_nothing() {
        let mapping =
            MemoryMapping::parse_line(b"00400000-00401000 r--p 00000000 08:02 99").unwrap();
        assert_eq!(mapping.inode, 99);
        assert_eq!(mapping.file_path(), None);
    }

    #[test]
    fn hex_inode_is_accepted() {
        let mapping =
            MemoryMapping::parse_line(b"00400000-00401000 r--p 00000000 08:02 1f /lib/x.so")
                .unwrap();
        assert_eq!(mapping.inode, 0x1f);
    }

    #[test]
    fn short_lines_are_rejected() {
        for line in [
            &b""[..],
            b"00400000-00452000",
            b"00400000-00452000 r-xp",
            b"00400000-00452000 r-xp 00000000",
            b"00400000-00452000 r-xp 00000000 08:02",
            b"00400000 r-xp 00000000 08:02 173521 /usr/bin/x",
        ] {
            let err = MemoryMapping::parse_line(line).unwrap_err();
            assert!(matches!(err, Error::MappingParse { .. }), "{err:?}");
        }
    }

    #[test]
    fn garbage_columns_are_rejected() {
        for line in [
            &b"zz400000-00452000 r-xp 00000000 08:02 1 /x"[..],
            b"00400000-00452000 rwxq 00000000 08:02 1 /x",
            b"00400000-00452000 r-x 00000000 08:02 1 /x",
            b"00400000-00452000 r-xp 0000g000 08:02 1 /x",
            b"00400000-00452000 r-xp 00000000 0802 1 /x",
            b"00400000-00452000 r-xp 00000000 08:02 -1 /x",
        ] {
            let err = MemoryMapping::parse_line(line).unwrap_err();
            assert!(matches!(err, Error::MappingParse { .. }), "{err:?}");
        }
    }

    fn perms_strategy() -> impl Strategy<Value = String> {
        (
            prop_oneof!["r", "-"],
            prop_oneof!["w", "-"],
            prop_oneof!["x", "-"],
            prop_oneof!["p", "s"],
        )
            .prop_map(|(r, w, x, s)| format!("{r}{w}{x}{s}"))
    }

    proptest! {
        #[test]
        fn zero_inode_never_yields_a_path(
            start in 0u64..u64::MAX / 2,
            len in 0u64..0x1_0000_0000,
            perms in perms_strategy(),
            name in prop::option::of("/[a-z]{1,8}(/[a-z0-9._ -]{1,12}){0,3}"),
        ) {
            let line = format!(
                "{start:08x}-{:08x} {perms} 00000000 00:00 0 {}",
                start + len,
                name.clone().unwrap_or_default(),
            );
            let mapping = MemoryMapping::parse_line(line.as_bytes()).unwrap();
            prop_assert_eq!(mapping.file_path(), None);
            prop_assert_eq!(mapping.size(), len);
        }

        #[test]
        fn nonzero_inode_yields_the_trailing_path(
            inode in 1u64..u64::MAX,
            major in 0u32..0x1000,
            minor in 0u32..0x10_0000,
            perms in perms_strategy(),
            name in "/[a-z]{1,8}(/[a-z0-9._ -]{0,12}[a-z0-9]){0,3}",
        ) {
            let line = format!("00400000-00401000 {perms} 00000000 {major:02x}:{minor:02x} {inode}      {name}");
            let mapping = MemoryMapping::parse_line(line.as_bytes()).unwrap();
            prop_assert_eq!(mapping.device, DeviceId { major, minor });
            prop_assert_eq!(mapping.inode, inode);
            prop_assert_eq!(mapping.file_path(), Some(Path::new(&name)));
        }
    }
}
