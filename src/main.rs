//! termguard: command safety gate for agent shells.
//!
//! Judges a shell command before an agent runs it and reports whether it
//! may run, needs confirmation, or is blocked. Never executes the command.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use termguard::advisor::AdvisoryResult;
use termguard::config::PolicyConfig;
use termguard::eval::{PolicyEngine, ValidationDecision, Verdict};
use termguard::logging;

const EXIT_ERROR: u8 = 1;
const EXIT_BLOCKED: u8 = 2;
const EXIT_CONFIRM: u8 = 3;

// ─── CLI ─────────────────────────────────────────────

/// Command safety gate for agent shells.
#[derive(Parser, Debug)]
#[command(name = "termguard", version, about, long_about = None)]
#[command(after_help = "Exit codes (check): 0 allow, 2 block, 3 confirmation required, 1 error.")]
struct Cli {
    /// Policy file (TOML, or JSON for .json files) [env: TERMGUARD_CONFIG]
    #[arg(long, global = true, value_parser = expand_path)]
    config: Option<PathBuf>,

    /// Overlay merged onto the policy [env: TERMGUARD_OVERLAY]
    #[arg(long, global = true, value_parser = expand_path)]
    overlay: Option<PathBuf>,

    /// Print debug diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read {"command", "working_dir", "safe_mode"} JSON on stdin, write the verdict as JSON
    Hook {
        #[command(flatten)]
        mode: ModeArgs,
    },

    /// Classify and validate a command
    Check {
        #[command(flatten)]
        mode: ModeArgs,

        /// Directory the command would run in
        #[arg(short = 'w', long)]
        working_dir: Option<String>,

        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,

        /// The command to judge; everything from its first word on belongs to it
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },

    /// Report whether a path is protected
    Path { path: String },

    /// Print the effective policy or write the starter one
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigAction {
    /// Print the effective policy as TOML
    Show,
    /// Write the starter policy to the config path
    Reset,
}

/// Overrides the policy's default mode.
#[derive(Args, Debug, Clone, Copy)]
struct ModeArgs {
    /// Block critical commands
    #[arg(long, conflicts_with = "unsafe_mode")]
    safe: bool,

    /// Never block, only ask for confirmation
    #[arg(long = "unsafe")]
    unsafe_mode: bool,
}

impl ModeArgs {
    fn safe_mode(self) -> Option<bool> {
        match (self.safe, self.unsafe_mode) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct HookRequest {
    command: Option<String>,
    working_dir: Option<String>,
    safe_mode: Option<bool>,
}

#[derive(Serialize)]
struct Report<'a> {
    verdict: Verdict,
    decision: &'a ValidationDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    advisory: Option<AdvisoryResult>,
}

fn expand_path(raw: &str) -> Result<PathBuf, std::convert::Infallible> {
    Ok(PathBuf::from(shellexpand::tilde(raw).into_owned()))
}

fn env_path(var: &str) -> Option<PathBuf> {
    let raw = std::env::var(var).ok()?;
    expand_path(&raw).ok()
}

fn config_path(cli: &Cli) -> Option<PathBuf> {
    if let Some(p) = &cli.config {
        return Some(p.clone());
    }
    if let Some(p) = env_path("TERMGUARD_CONFIG") {
        return Some(p);
    }
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".config/termguard/config.toml"))
}

fn overlay_path(cli: &Cli) -> Option<PathBuf> {
    cli.overlay
        .clone()
        .or_else(|| env_path("TERMGUARD_OVERLAY"))
}

fn load_config(cli: &Cli) -> PolicyConfig {
    match config_path(cli) {
        Some(path) => PolicyConfig::load_with_overlay(&path, overlay_path(cli).as_deref()),
        None => {
            let mut config = PolicyConfig::fallback();
            if let Some(overlay) = overlay_path(cli) {
                config.load_overlay(&overlay);
            }
            config
        }
    }
}

// ─── Commands ────────────────────────────────────────

fn build_report<'a>(
    engine: &PolicyEngine,
    command: &str,
    decision: &'a ValidationDecision,
) -> Report<'a> {
    let verdict = decision.verdict();
    let advisory = (verdict != Verdict::Allow).then(|| engine.advise(command));
    Report {
        verdict,
        decision,
        advisory,
    }
}

fn record(engine: &PolicyEngine, command: &str, decision: &ValidationDecision) {
    if engine.config().safety_settings.log_decisions {
        logging::log_decision(command, decision);
    }
}

fn run_hook(engine: &PolicyEngine, mode: ModeArgs) -> ExitCode {
    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        eprintln!("termguard: failed to read stdin: {e}");
        return ExitCode::from(EXIT_ERROR);
    }

    let request: HookRequest = match serde_json::from_str(&input) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("termguard: JSON parse error: {e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let command = request.command.unwrap_or_default();
    let safe_mode = mode
        .safe_mode()
        .or(request.safe_mode)
        .unwrap_or(engine.config().safety_settings.default_mode.is_safe());
    let decision = engine.validate(&command, request.working_dir.as_deref(), safe_mode);
    record(engine, &command, &decision);

    match serde_json::to_string(&build_report(engine, &command, &decision)) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("termguard: cannot encode verdict: {e}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn join_command(words: &[String]) -> String {
    match words {
        [single] => single.clone(),
        _ => shlex::try_join(words.iter().map(String::as_str))
            .unwrap_or_else(|_| words.join(" ")),
    }
}

fn run_check(
    engine: &PolicyEngine,
    mode: ModeArgs,
    working_dir: Option<&str>,
    json: bool,
    words: &[String],
) -> ExitCode {
    let command = join_command(words);
    let safe_mode = mode
        .safe_mode()
        .unwrap_or(engine.config().safety_settings.default_mode.is_safe());
    if !safe_mode {
        eprintln!("termguard: safe mode disabled; critical commands will not be blocked");
    }

    let decision = engine.validate(&command, working_dir, safe_mode);
    record(engine, &command, &decision);
    let report = build_report(engine, &command, &decision);

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("termguard: cannot encode verdict: {e}");
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        print_human(&report);
    }

    match report.verdict {
        Verdict::Allow => ExitCode::SUCCESS,
        Verdict::Confirm => ExitCode::from(EXIT_CONFIRM),
        Verdict::Block => ExitCode::from(EXIT_BLOCKED),
    }
}

fn print_human(report: &Report) {
    let risk = &report.decision.risk;
    println!("risk: {} - {}", risk.level.label(), risk.reason);
    for warning in &risk.warnings {
        println!("warning: {warning}");
    }
    println!("verdict: {}", report.verdict.label());

    let Some(advisory) = &report.advisory else {
        return;
    };
    match report.verdict {
        Verdict::Block => {
            if let Some(reason) = &report.decision.blocked_reason {
                println!("blocked: {reason}");
            }
            println!("suggested alternatives:");
            for alt in &advisory.alternatives {
                println!("  - {alt}");
            }
        }
        Verdict::Confirm => {
            if let Some(hint) = &advisory.backup_hint {
                println!("backup: {hint}");
            }
        }
        Verdict::Allow => {}
    }
}

fn run_path(engine: &PolicyEngine, path: &str) -> ExitCode {
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    println!("protected directory: {}", yes_no(engine.is_protected(path)));
    println!(
        "protected extension: {}",
        yes_no(engine.has_protected_extension(path))
    );
    ExitCode::SUCCESS
}

fn run_config(engine: &PolicyEngine, cli: &Cli, action: ConfigAction) -> ExitCode {
    match action {
        ConfigAction::Show => match engine.config().to_toml_string() {
            Ok(text) => {
                if let Some(path) = config_path(cli) {
                    println!("# source: {}", path.display());
                }
                print!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("termguard: cannot render config: {e}");
                ExitCode::from(EXIT_ERROR)
            }
        },
        ConfigAction::Reset => {
            let Some(path) = config_path(cli) else {
                eprintln!("termguard: no config path (set --config or HOME)");
                return ExitCode::from(EXIT_ERROR);
            };
            if let Some(dir) = path.parent()
                && let Err(e) = std::fs::create_dir_all(dir)
            {
                eprintln!("termguard: cannot create {}: {e}", dir.display());
                return ExitCode::from(EXIT_ERROR);
            }
            match std::fs::write(&path, PolicyConfig::recommended_source()) {
                Ok(()) => {
                    println!("wrote starter policy to {}", path.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("termguard: cannot write {}: {e}", path.display());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
    }
}

// ─── Entry point ─────────────────────────────────────

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Exit code 2 means "blocked", so usage errors report 1
            return if e.use_stderr() {
                ExitCode::from(EXIT_ERROR)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // The decision file is only created once a record is written, and
    // records are only written when the policy enables them.
    let gates = matches!(cli.command, Command::Hook { .. } | Command::Check { .. });
    let decision_log = if gates {
        logging::default_decision_log()
    } else {
        None
    };
    logging::init(cli.verbose, decision_log.as_deref());

    let engine = PolicyEngine::new(load_config(&cli));

    match &cli.command {
        Command::Hook { mode } => run_hook(&engine, *mode),
        Command::Check {
            mode,
            working_dir,
            json,
            words,
        } => run_check(&engine, *mode, working_dir.as_deref(), *json, words),
        Command::Path { path } => run_path(&engine, path),
        Command::Config { action } => {
            run_config(&engine, &cli, action.unwrap_or(ConfigAction::Show))
        }
    }
}

// ─── Tests ───────────────────────────────────────────
