use crate::sample_trigger::SampleTrigger;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Trace {
    /// Syscalls whose exit stop triggers a snapshot of the tracee's mapping
    /// table. Files that are opened and closed without ever being mapped
    /// are only caught if a later snapshot of the same process still sees
    /// them, so narrowing this list trades completeness for speed.
    pub sample_on: Vec<SampleTrigger>,

    /// Mount point of procfs. Mapping tables are read from
    /// `<proc_root>/<pid>/maps`.
    pub proc_root: PathBuf,
}

impl Default for Trace {
    fn default() -> Self {
        Self {
            sample_on: SampleTrigger::ALL.to_vec(),
            proc_root: PathBuf::from("/proc"),
        }
    }
}
