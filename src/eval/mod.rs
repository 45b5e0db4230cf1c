pub mod context;
pub mod decision;
pub mod risk;

pub use context::CommandContext;
pub use decision::{ValidationDecision, Verdict};
pub use risk::{RiskAssessment, RiskLevel};

use crate::advisor::{Advisor, AdvisoryResult};
use crate::config::PolicyConfig;
use crate::guard::{self, PathGuard};
use crate::platform::PlatformFamily;
use crate::rules::RiskClassifier;

pub const CRITICAL_BLOCK_REASON: &str = "command blocked due to critical risk level";

/// A compiled policy: classifier, path guard and advisor over one config.
///
/// Built once and shared read-only. Every method is a pure function of its
/// arguments and the config, apart from reading the process working
/// directory to resolve relative paths.
pub struct PolicyEngine {
    config: PolicyConfig,
    platform: PlatformFamily,
    protected_dirs: Vec<String>,
    classifier: RiskClassifier,
    guard: PathGuard,
    advisor: Advisor,
}

impl PolicyEngine {
    /// Build an engine for the platform this binary runs on.
    pub fn new(config: PolicyConfig) -> Self {
        Self::with_platform(config, PlatformFamily::current())
    }

    /// Build an engine for an explicit platform family.
    pub fn with_platform(config: PolicyConfig, platform: PlatformFamily) -> Self {
        let protected_dirs = guard::protected_directories(&config, platform);
        let classifier = RiskClassifier::from_config(&config, &protected_dirs);
        let guard = PathGuard::new(&protected_dirs, &config.protected_extensions, platform);
        let advisor = Advisor::new(platform);
        log::debug!(
            "policy engine ready: platform={} protected_dirs={} safe_commands={}",
            platform.as_str(),
            protected_dirs.len(),
            config.safe_commands.len()
        );
        Self {
            config,
            platform,
            protected_dirs,
            classifier,
            guard,
            advisor,
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn platform(&self) -> PlatformFamily {
        self.platform
    }

    /// Protected directories in effect, after expansion.
    pub fn protected_dirs(&self) -> &[String] {
        &self.protected_dirs
    }

    /// Classify a command's risk.
    pub fn assess(&self, command: &str) -> RiskAssessment {
        self.classifier.assess(command)
    }

    /// Decide whether a command may run.
    ///
    /// In safe mode a critical command is blocked outright. Medium and high
    /// commands are allowed but need confirmation. A protected working
    /// directory adds a warning and, in safe mode, forces confirmation; it
    /// never blocks on its own.
    pub fn validate(
        &self,
        command: &str,
        working_dir: Option<&str>,
        safe_mode: bool,
    ) -> ValidationDecision {
        self.validate_with(command, working_dir, safe_mode, |dir| {
            self.guard.is_protected(dir)
        })
    }

    /// [`PolicyEngine::validate`], resolving a relative working directory
    /// against `base` instead of the process working directory.
    pub fn validate_from(
        &self,
        command: &str,
        working_dir: Option<&str>,
        base: &str,
        safe_mode: bool,
    ) -> ValidationDecision {
        self.validate_with(command, working_dir, safe_mode, |dir| {
            self.guard.is_protected_from(dir, base)
        })
    }

    fn validate_with(
        &self,
        command: &str,
        working_dir: Option<&str>,
        safe_mode: bool,
        is_protected: impl Fn(&str) -> bool,
    ) -> ValidationDecision {
        let risk = self.assess(command);

        if safe_mode && risk.level == RiskLevel::Critical {
            return ValidationDecision::block(risk, CRITICAL_BLOCK_REASON);
        }

        let mut decision = if risk.level.needs_confirmation() {
            ValidationDecision::confirm(risk)
        } else {
            ValidationDecision::allow(risk)
        };

        if let Some(dir) = working_dir.filter(|d| !d.trim().is_empty())
            && is_protected(dir)
        {
            decision
                .risk
                .warnings
                .push(format!("working directory is in protected system path: {dir}"));
            if safe_mode {
                decision.requires_confirmation = true;
            }
        }

        decision
    }

    /// Whether a path lies in a protected directory.
    pub fn is_protected(&self, path: &str) -> bool {
        self.guard.is_protected(path)
    }

    /// Whether a file name carries a protected extension.
    pub fn has_protected_extension(&self, path: &str) -> bool {
        self.guard.has_protected_extension(path)
    }

    pub fn alternatives(&self, command: &str) -> Vec<String> {
        self.advisor.alternatives(command)
    }

    pub fn backup_hint(&self, command: &str) -> Option<String> {
        self.advisor.backup_hint(command)
    }

    pub fn advise(&self, command: &str) -> AdvisoryResult {
        self.advisor.advise(command)
    }
}
