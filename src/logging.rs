use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

use crate::eval::ValidationDecision;

/// Log target reserved for decision records.
pub const DECISION_TARGET: &str = "termguard::decision";

/// Default decision log location: ~/.local/share/termguard/decisions.log.
pub fn default_decision_log() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(Path::new(&home).join(".local/share/termguard/decisions.log"))
}

/// Install the global logger.
///
/// Diagnostics go to stderr (`Warn`, or `Debug` when verbose). Decision
/// records go only to `decision_log`, when given. Best-effort: a logger
/// that cannot be set up is skipped, since logging must never block the gate.
pub fn init(verbose: bool, decision_log: Option<&Path>) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let term_config = ConfigBuilder::new()
        .add_filter_ignore_str(DECISION_TARGET)
        .build();
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        term_config,
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = decision_log {
        let file_config = ConfigBuilder::new()
            .add_filter_allow_str(DECISION_TARGET)
            .set_time_format_rfc3339()
            .set_thread_level(LevelFilter::Off)
            .set_target_level(LevelFilter::Off)
            .build();
        loggers.push(WriteLogger::new(
            LevelFilter::Info,
            file_config,
            DecisionFile::new(path),
        ));
    }

    let _ = CombinedLogger::init(loggers);
}

/// Append-only decision log that opens (and creates) its file on the first
/// write, so nothing touches the disk unless a record is actually logged.
/// Failures are swallowed after the first attempt.
pub struct DecisionFile {
    path: PathBuf,
    file: Option<File>,
    failed: bool,
}

impl DecisionFile {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            file: None,
            failed: false,
        }
    }

    fn open(&mut self) -> Option<&mut File> {
        if self.file.is_none() && !self.failed {
            if let Some(dir) = self.path.parent() {
                let _ = std::fs::create_dir_all(dir);
            }
            match OpenOptions::new().create(true).append(true).open(&self.path) {
                Ok(file) => self.file = Some(file),
                Err(_) => self.failed = true,
            }
        }
        self.file.as_mut()
    }
}

impl Write for DecisionFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.open() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// One tab-separated decision record: verdict, risk level, command, reason.
pub fn decision_record(command: &str, decision: &ValidationDecision) -> String {
    // Keep records single-line and bounded
    let cmd: String = command
        .chars()
        .take(200)
        .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
        .collect();
    let reason = decision
        .blocked_reason
        .as_deref()
        .unwrap_or(&decision.risk.reason);
    format!(
        "{verdict}\t{level}\t{cmd}\t{reason}",
        verdict = decision.verdict().as_str(),
        level = decision.risk.level.as_str(),
    )
}

/// Emit a decision record on [`DECISION_TARGET`].
pub fn log_decision(command: &str, decision: &ValidationDecision) {
    log::info!(target: DECISION_TARGET, "{}", decision_record(command, decision));
}
