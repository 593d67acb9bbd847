#![deny(unsafe_code)]

//! Collect the set of files a command and all of its descendants use.
//!
//! The command runs under ptrace. Whenever a tracee returns from a syscall
//! that loads a program or opens a file, its `/proc/<pid>/maps` table is
//! read and every file-backed region is added to a [`FileSet`].

pub mod controller;
pub mod domain;
pub mod error;
pub mod launch;
pub mod observation;
pub mod ptrace;
pub mod session;
pub mod stores;

pub use controller::TraceController;
pub use domain::{DeviceId, MemoryMapping, Permissions, StopPhase, SyscallClass};
pub use error::Error;
pub use launch::Invocation;
pub use observation::{MappingsSource, ProcMaps};
pub use ptrace::{NixPtrace, Ptrace};
pub use session::TraceSession;
pub use stores::{FileSet, IndexedPath};
