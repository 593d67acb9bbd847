use anyhow::Context;
use clap::Parser;
use config::Config;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use trace_files::{cli::Cli, report};
use tracer::TraceSession;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // NOTE: The verbosity flag takes precedence over the environment variable
    // for log control. `TRACE_FILES_LOG` can still narrow individual crates,
    // e.g. `TRACE_FILES_LOG=tracer=trace trace-files -v make` logs every
    // sampled mapping table while other crates stay at info.
    let env_filter = EnvFilter::builder()
        .with_env_var("TRACE_FILES_LOG")
        .from_env()?
        .add_directive(cli.verbosity.log_level_filter().as_str().parse()?);

    // stdout belongs to the traced command and the report.
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .init();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    debug!(?config, ?cli);

    let invocation = cli.invocation().context("no command given")?;
    let files = match TraceSession::new(&config).run(invocation) {
        Ok(files) => files,
        Err(err) => {
            // No partial report: a failed session prints nothing to stdout.
            // The diagnostic bypasses the log filter so `-qq` keeps it.
            debug!(?err, "session failed");
            writeln!(io::stderr().lock(), "trace-files: {}: {err}", err.kind())?;
            return Ok(ExitCode::FAILURE);
        }
    };
    info!(files = files.len(), "trace complete");

    let snapshot = files.snapshot();
    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            report::write(BufWriter::new(file), &snapshot)?;
        }
        None => report::write(io::stdout().lock(), &snapshot)?,
    }
    Ok(ExitCode::SUCCESS)
}
