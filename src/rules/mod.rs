//! Risk rules: ordered predicates that classify a command.
//!
//! Each rule either claims a command (returning a [`RiskAssessment`]) or
//! passes. [`RiskClassifier`] runs them in fixed priority order and the first
//! claim wins, so a critical signature always beats a dangerous-command or
//! path hit on the same command.

/// Substring signatures that mark a command as system-destroying.
pub mod critical;
/// First-word command families from the high/medium tiers, escalated by destructive flags.
pub mod dangerous;
/// Literal references to protected system directories.
pub mod protected_path;
/// Read-only allowlist.
pub mod safe;
/// Structural shell patterns: null redirection, stderr merge, chained deletion.
pub mod suspicious;

use crate::config::PolicyConfig;
use crate::eval::{CommandContext, RiskAssessment, RiskLevel};

/// A single classification rule.
pub trait RiskRule: Send + Sync {
    /// Short identifier used in diagnostics.
    fn name(&self) -> &'static str;

    /// Claim the command with an assessment, or return `None` to pass.
    fn assess(&self, ctx: &CommandContext) -> Option<RiskAssessment>;
}

/// Runs the risk rules in priority order.
pub struct RiskClassifier {
    rules: Vec<Box<dyn RiskRule>>,
}

impl RiskClassifier {
    /// Build the standard rule chain.
    ///
    /// `protected_paths` is the already-resolved directory list for the
    /// active platform family.
    pub fn from_config(config: &PolicyConfig, protected_paths: &[String]) -> Self {
        use critical::CriticalRule;
        use dangerous::DangerousCommandRule;
        use protected_path::ProtectedPathRule;
        use safe::SafeCommandRule;
        use suspicious::SuspiciousPatternRule;

        Self::with_rules(vec![
            Box::new(CriticalRule::from_config(&config.dangerous_commands)),
            Box::new(DangerousCommandRule::from_config(config)),
            Box::new(ProtectedPathRule::new(protected_paths)),
            Box::new(SuspiciousPatternRule::new()),
            Box::new(SafeCommandRule::new(&config.safe_commands)),
        ])
    }

    /// Build a classifier from an explicit rule chain.
    pub fn with_rules(rules: Vec<Box<dyn RiskRule>>) -> Self {
        Self { rules }
    }

    /// Rule names in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Classify a command. Total: every input gets an assessment.
    pub fn assess(&self, command: &str) -> RiskAssessment {
        let ctx = CommandContext::from_command(command);
        for rule in &self.rules {
            if let Some(assessment) = rule.assess(&ctx) {
                log::trace!("rule {} matched: {}", rule.name(), assessment.level.as_str());
                return assessment;
            }
        }
        RiskAssessment::new(RiskLevel::Low, "standard command")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Always(RiskLevel);

    impl RiskRule for Always {
        fn name(&self) -> &'static str {
            "always"
        }

        fn assess(&self, _ctx: &CommandContext) -> Option<RiskAssessment> {
            Some(RiskAssessment::new(self.0, "always"))
        }
    }

    struct Never;

    impl RiskRule for Never {
        fn name(&self) -> &'static str {
            "never"
        }

        fn assess(&self, _ctx: &CommandContext) -> Option<RiskAssessment> {
            None
        }
    }

    #[test]
    fn first_claim_wins() {
        let classifier = RiskClassifier::with_rules(vec![
            Box::new(Never),
            Box::new(Always(RiskLevel::Medium)),
            Box::new(Always(RiskLevel::Critical)),
        ]);
        assert_eq!(classifier.assess("anything").level, RiskLevel::Medium);
    }

    #[test]
    fn no_claim_is_low() {
        let classifier = RiskClassifier::with_rules(vec![Box::new(Never)]);
        let a = classifier.assess("anything");
        assert_eq!(a.level, RiskLevel::Low);
        assert_eq!(a.reason, "standard command");
        assert!(a.warnings.is_empty());
    }

    #[test]
    fn standard_chain_order() {
        let classifier = RiskClassifier::from_config(&PolicyConfig::fallback(), &[]);
        assert_eq!(
            classifier.rule_names(),
            vec!["critical", "dangerous-command", "protected-path", "suspicious-pattern", "safe-command"]
        );
    }
}
