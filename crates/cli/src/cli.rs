use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracer::Invocation;

/// trace-files: list every file a command and its children use
///
/// The command runs under ptrace with the caller's standard streams. Each
/// time a process in its tree loads a program or opens a file, its memory
/// mappings are sampled. Once the whole tree has exited, the collected
/// files are printed as `index<TAB>path` lines in path order.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    ///
    /// Without it the built-in defaults are used; no file is searched for.
    #[arg(short, long, value_parser = validate_file)]
    pub config: Option<PathBuf>,

    /// Write the report to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Program to trace, followed by its arguments.
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<OsString>,
}

impl Cli {
    pub fn invocation(&self) -> Option<Invocation> {
        let (program, args) = self.command.split_first()?;
        Some(Invocation::new(program.clone(), args.iter().cloned()))
    }
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.is_file() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}
