//! Terminal output for the installer CLI.
//!
//! Everything user-facing goes to stderr. [`TerminalObserver`] renders a
//! pipeline run as status lines and coarse progress, and asks before
//! deleting obsolete files.

use crate::pipeline::{PipelineObserver, PipelineState, Progress};
use std::io::{BufRead, Write};
use std::time::Duration;

/// Write one line, ignoring failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Format a byte count with a binary unit.
///
/// # Examples
///
/// ```
/// use kfx_installer::output::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(3 * 1024 * 1024 / 2), "1.5 MiB");
/// ```
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = "KiB";
    for next in UNITS.into_iter().skip(1) {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

/// Format an elapsed time such as `1m 4.250s`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let millis = duration.subsec_millis();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;

    if minutes > 0 {
        return format!("{minutes}m {seconds}.{millis:03}s");
    }
    format!("{seconds}.{millis:03}s")
}

/// Render a progress report as one line.
///
/// # Examples
///
/// ```
/// use kfx_installer::output::progress_line;
/// use kfx_installer::pipeline::Progress;
///
/// let line = progress_line(&Progress::Download { received: 1024, total: Some(4096) });
/// assert_eq!(line, "Downloading: 25% (1.0 KiB of 4.0 KiB)");
/// ```
#[must_use]
pub fn progress_line(progress: &Progress) -> String {
    match (*progress, progress.percent()) {
        (Progress::Download { received, total: Some(total) }, Some(percent)) => format!(
            "Downloading: {percent}% ({} of {})",
            format_size(received),
            format_size(total)
        ),
        (Progress::Download { received, .. }, _) => {
            format!("Downloading: {}", format_size(received))
        }
        (Progress::Extract { processed, .. }, Some(percent)) => {
            format!("Extracting: {percent}% ({})", format_size(processed))
        }
        (Progress::Extract { processed, .. }, None) => {
            format!("Extracting: {}", format_size(processed))
        }
    }
}

/// Coarse bucket a report falls into; a line is printed when it changes.
fn progress_bucket(progress: &Progress) -> (bool, u64) {
    const MIB: u64 = 1024 * 1024;
    match (*progress, progress.percent()) {
        (Progress::Download { .. }, Some(percent)) => (true, u64::from(percent / 10)),
        (Progress::Download { received, .. }, None) => (true, received / (10 * MIB)),
        (Progress::Extract { .. }, Some(percent)) => (false, u64::from(percent / 10)),
        (Progress::Extract { processed, .. }, None) => (false, processed / (10 * MIB)),
    }
}

/// A [`PipelineObserver`] writing to a terminal.
///
/// `quiet` suppresses status and progress lines; removal prompts are still
/// shown unless `assume_yes` answers them.
pub struct TerminalObserver<W, R> {
    output: W,
    input: R,
    quiet: bool,
    assume_yes: bool,
    last_bucket: Option<(bool, u64)>,
}

impl<W: Write, R: BufRead> TerminalObserver<W, R> {
    /// Create an observer writing to `output` and reading answers from
    /// `input`.
    pub fn new(output: W, input: R) -> Self {
        Self {
            output,
            input,
            quiet: false,
            assume_yes: false,
            last_bucket: None,
        }
    }

    /// Suppress status and progress lines.
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Answer removal prompts with yes without asking.
    #[must_use]
    pub fn assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    /// Consume the observer, returning its output.
    pub fn into_output(self) -> W {
        self.output
    }

    fn line(&mut self, message: impl std::fmt::Display) {
        write_stderr_line(&mut self.output, message);
    }
}

impl<W: Write, R: BufRead> PipelineObserver for TerminalObserver<W, R> {
    fn on_state(&mut self, state: &PipelineState) {
        self.last_bucket = None;
        log::debug!("pipeline state: {state}");
    }

    fn on_progress(&mut self, progress: &Progress) {
        let bucket = progress_bucket(progress);
        if self.quiet || self.last_bucket == Some(bucket) {
            return;
        }
        self.last_bucket = Some(bucket);
        self.line(progress_line(progress));
    }

    fn on_message(&mut self, message: &str) {
        if !self.quiet {
            self.line(message);
        }
    }

    fn confirm_removal(&mut self, files: &[String]) -> bool {
        self.line(format!("{} obsolete file(s) from older releases:", files.len()));
        for file in files {
            self.line(format!("  - {file}"));
        }
        if self.assume_yes {
            return true;
        }
        if write!(self.output, "Remove them? [y/N] ").is_err() || self.output.flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}
