//! Traces this test binary re-executed in helper mode, where it maps an
//! extra file before opening another one.

#[cfg(target_os = "linux")]
mod linux {
    use nix::sys::mman::{MapFlags, ProtFlags, mmap, munmap};
    use std::fs::{self, File};
    use std::num::NonZeroUsize;
    use tracer::{Invocation, TraceSession};

    const HELPER_ENV: &str = "TRACER_TEST_MAP_FILE";

    #[test]
    fn map_file_helper() {
        let Some(path) = std::env::var_os(HELPER_ENV) else {
            return;
        };
        let file = File::open(path).unwrap();
        let len = NonZeroUsize::new(file.metadata().unwrap().len() as usize).unwrap();

        let region =
            unsafe { mmap(None, len, ProtFlags::PROT_READ, MapFlags::MAP_PRIVATE, &file, 0) }
                .unwrap();
        // The open below triggers a snapshot while the region is live.
        File::open("/dev/null").unwrap();
        unsafe { munmap(region, len.get()) }.unwrap();
    }

    #[test]
    fn mapped_file_is_reported_in_sorted_position() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("settings.conf");
        fs::write(&data, "answer = 42\n").unwrap();
        let data = fs::canonicalize(&data).unwrap();

        let exe = std::env::current_exe().unwrap();
        let mut assignment = std::ffi::OsString::from(format!("{HELPER_ENV}="));
        assignment.push(data.as_os_str());

        // `env` sets the variable for the re-executed binary only.
        let files = TraceSession::default()
            .run(Invocation::new(
                "env",
                [
                    assignment,
                    exe.clone().into_os_string(),
                    "--exact".into(),
                    "linux::map_file_helper".into(),
                    "--test-threads=1".into(),
                    "--quiet".into(),
                ],
            ))
            .unwrap();

        assert!(files.contains(&data), "{files:?}");
        assert!(files.contains(&exe), "{files:?}");

        let snapshot = files.snapshot();
        let position = snapshot.iter().position(|entry| entry.path == data).unwrap();
        assert_eq!(snapshot[position].index, position);
        if let Some(previous) = position.checked_sub(1) {
            assert!(snapshot[previous].path.as_os_str() < data.as_os_str());
        }
        if let Some(next) = snapshot.get(position + 1) {
            assert!(data.as_os_str() < next.path.as_os_str());
        }
    }
}
