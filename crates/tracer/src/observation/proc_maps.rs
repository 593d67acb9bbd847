#![forbid(unsafe_code)]

use crate::domain::MemoryMapping;
use crate::error::Error;
use crate::observation::MappingsSource;
use nix::unistd::Pid;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::trace;

/// Reads mapping tables from procfs.
#[derive(Debug, Clone)]
pub struct ProcMaps {
    root: PathBuf,
}

impl ProcMaps {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn maps_path(&self, pid: Pid) -> PathBuf {
        self.root.join(pid.as_raw().to_string()).join("maps")
    }
}

impl Default for ProcMaps {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl MappingsSource for ProcMaps {
    fn read(&self, pid: Pid) -> Result<Vec<MemoryMapping>, Error> {
        let path = self.maps_path(pid);
        let unavailable = |source| Error::MappingsUnavailable {
            path: path.clone(),
            source,
        };

        // The handle lives only for this scope and is closed on every return.
        let reader = BufReader::new(File::open(&path).map_err(unavailable)?);
        let mut mappings = Vec::new();
        for line in reader.split(b'\n') {
            let line = line.map_err(unavailable)?;
            mappings.push(MemoryMapping::parse_line(&line)?);
        }

        let mapped: u64 = mappings.iter().map(MemoryMapping::size).sum();
        trace!(pid = pid.as_raw(), count = mappings.len(), mapped, "mapping table read");
        Ok(mappings)
    }
}
