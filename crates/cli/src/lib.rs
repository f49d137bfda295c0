#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the command-line front-end of `metarestore`. It reads a JSON
//! Lines manifest of recorded file metadata and restores each record through
//! [`metadata::RestoreSession`], or with `--capture` prints the current
//! metadata of local paths in the same manifest format.
//!
//! # Design
//!
//! [`run`] accepts the argument list together with handles for standard
//! output and error so the binary and the tests drive the same code. A
//! `clap` builder command parses the arguments; help and version flags are
//! handled by hand so their output and exit status stay under our control.
//! Settings are merged from flags, the environment, and an optional JSON
//! configuration file before the session is built.
//!
//! # Invariants
//!
//! - `run` never panics; failures surface as exit statuses.
//! - An invalid manifest line counts as a failed record, not a fatal error.
//!
//! # Errors
//!
//! See [`ExitStatus`] for the codes returned by [`run`].
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let status = cli::run(["metarestore", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(status, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("metarestore "));
//! ```

mod arguments;
mod config;
mod exit;
mod manifest;

pub use arguments::PROGRAM_NAME;
pub use config::{ACL_GRANT_ENV, ConfigError, FileConfig};
pub use exit::ExitStatus;
pub use manifest::{Manifest, ManifestError, write_record};

use arguments::{ParsedArgs, clap_command, parse_args};
use config::Settings;
use metadata::{BatchReport, RestoreSession};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

/// Largest value representable as a process exit code.
const MAX_EXIT_CODE: i32 = 255;

/// Runs the command line and returns the process exit code.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    match parse_args(arguments) {
        Ok(parsed) => execute(parsed, stdout, stderr).as_i32(),
        Err(error) => {
            let _ = write!(stderr, "{error}");
            ExitStatus::Usage.as_i32()
        }
    }
}

/// Converts a status returned by [`run`] into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, MAX_EXIT_CODE);
    std::process::ExitCode::from(clamped as u8)
}

fn usage_error<Err: Write>(stderr: &mut Err, message: impl std::fmt::Display) -> ExitStatus {
    let _ = writeln!(stderr, "{PROGRAM_NAME}: {message}");
    ExitStatus::Usage
}

fn execute<Out, Err>(parsed: ParsedArgs, stdout: &mut Out, stderr: &mut Err) -> ExitStatus
where
    Out: Write,
    Err: Write,
{
    if parsed.show_help {
        let _ = writeln!(stdout, "{}", clap_command().render_help());
        return ExitStatus::Success;
    }
    if parsed.show_version {
        let _ = writeln!(stdout, "{PROGRAM_NAME} {}", env!("CARGO_PKG_VERSION"));
        return ExitStatus::Success;
    }

    let file = match parsed.config.as_deref().map(FileConfig::load).transpose() {
        Ok(file) => file.unwrap_or_default(),
        Err(error) => return usage_error(stderr, error),
    };
    let settings = match Settings::resolve(&parsed, &file, |name| std::env::var(name).ok()) {
        Ok(settings) => settings,
        Err(error) => return usage_error(stderr, error),
    };
    logging::init_tracing(&settings.verbosity);

    let summary = settings.verbosity.levels.batch >= 2;
    let session = RestoreSession::native(settings.restore);
    if parsed.capture {
        capture(&session, &parsed.operands, stdout, stderr)
    } else {
        restore(&session, &parsed.operands, summary, stdout, stderr)
    }
}

fn capture<Out, Err>(
    session: &RestoreSession,
    paths: &[OsString],
    stdout: &mut Out,
    stderr: &mut Err,
) -> ExitStatus
where
    Out: Write,
    Err: Write,
{
    if paths.is_empty() {
        return usage_error(stderr, "--capture requires at least one PATH");
    }

    let mut status = ExitStatus::Success;
    for path in paths {
        let result = session
            .capture(Path::new(path))
            .map_err(|error| error.to_string())
            .and_then(|record| write_record(stdout, &record).map_err(|error| error.to_string()));
        if let Err(message) = result {
            let _ = writeln!(stderr, "{PROGRAM_NAME}: {message}");
            status = ExitStatus::Partial;
        }
    }
    status
}

fn restore<Out, Err>(
    session: &RestoreSession,
    operands: &[OsString],
    summary: bool,
    stdout: &mut Out,
    stderr: &mut Err,
) -> ExitStatus
where
    Out: Write,
    Err: Write,
{
    let [operand] = operands else {
        return usage_error(stderr, "expected exactly one MANIFEST (use '-' for stdin)");
    };

    let read = if operand == "-" {
        Manifest::read(io::stdin().lock())
    } else {
        File::open(operand).and_then(|file| Manifest::read(BufReader::new(file)))
    };
    let manifest = match read {
        Ok(manifest) => manifest,
        Err(error) => {
            let path = Path::new(operand).display();
            return usage_error(stderr, format_args!("failed to read manifest '{path}': {error}"));
        }
    };

    logging::trace_batch!(
        records = manifest.records.len(),
        rejected = manifest.rejected.len(),
        "manifest loaded"
    );
    for error in &manifest.rejected {
        let _ = writeln!(stderr, "{PROGRAM_NAME}: {error}");
    }

    let report = restore_records(session, &manifest);
    for (_, error) in &report.failures {
        let _ = writeln!(stderr, "{PROGRAM_NAME}: {error}");
    }

    let failed = report.failures.len() + manifest.rejected.len();
    if summary {
        let _ = writeln!(
            stdout,
            "restored {} of {} records ({} timestamp writes, {} ownership changes, {} already handled)",
            report.restored,
            report.restored + failed,
            report.times_written,
            report.ownership.applied,
            report.ownership.skipped,
        );
    }

    if failed == 0 {
        ExitStatus::Success
    } else {
        ExitStatus::Partial
    }
}

#[cfg(feature = "parallel")]
fn restore_records(session: &RestoreSession, manifest: &Manifest) -> BatchReport {
    session.restore_batch_parallel(&manifest.records)
}

#[cfg(not(feature = "parallel"))]
fn restore_records(session: &RestoreSession, manifest: &Manifest) -> BatchReport {
    session.restore_batch(&manifest.records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_clamped() {
        let render = |code: std::process::ExitCode| format!("{code:?}");
        assert_eq!(render(exit_code_from(23)), render(std::process::ExitCode::from(23)));
        assert_eq!(render(exit_code_from(-4)), render(std::process::ExitCode::from(0)));
        assert_eq!(render(exit_code_from(4096)), render(std::process::ExitCode::from(255)));
    }

    #[test]
    fn restore_requires_a_single_manifest() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let status = run(["metarestore", "a.jsonl", "b.jsonl"], &mut stdout, &mut stderr);

        assert_eq!(status, ExitStatus::Usage.as_i32());
        assert!(String::from_utf8_lossy(&stderr).contains("exactly one MANIFEST"));
    }

    #[test]
    fn capture_requires_a_path() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let status = run(["metarestore", "--capture"], &mut stdout, &mut stderr);

        assert_eq!(status, ExitStatus::Usage.as_i32());
        assert!(stdout.is_empty());
    }
}
