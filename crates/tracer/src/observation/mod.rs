#![forbid(unsafe_code)]

mod proc_maps;

pub use proc_maps::ProcMaps;

use crate::domain::MemoryMapping;
use crate::error::Error;
use nix::unistd::Pid;
use std::path::PathBuf;

pub trait MappingsSource {
    /// Read the full mapping table of `pid`, in table order.
    fn read(&self, pid: Pid) -> Result<Vec<MemoryMapping>, Error>;

    /// Paths of the file-backed regions of `pid`. Anonymous regions are
    /// dropped; a file mapped several times appears several times.
    fn file_paths(&self, pid: Pid) -> Result<Vec<PathBuf>, Error> {
        Ok(self
            .read(pid)?
            .into_iter()
            .filter_map(|mapping| mapping.file_path().map(PathBuf::from))
            .collect())
    }
}
