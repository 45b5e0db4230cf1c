use crate::config::{DangerousCommands, Tier};
use crate::eval::{CommandContext, RiskAssessment, RiskLevel};
use crate::rules::RiskRule;

/// Matches critical-tier signatures anywhere in the command.
///
/// Matching is by substring, not by word, so multi-word signatures such as
/// `format c:` hit regardless of what surrounds them.
pub struct CriticalRule {
    signatures: Vec<String>,
}

impl CriticalRule {
    pub fn from_config(config: &DangerousCommands) -> Self {
        Self {
            signatures: config
                .tier(Tier::Critical)
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
        }
    }
}

impl RiskRule for CriticalRule {
    fn name(&self) -> &'static str {
        "critical"
    }

    fn assess(&self, ctx: &CommandContext) -> Option<RiskAssessment> {
        let signature = ctx.find_any(&self.signatures)?;
        log::debug!("critical signature {signature:?} in {:?}", ctx.raw);
        Some(
            RiskAssessment::new(RiskLevel::Critical, "destructive system operation detected")
                .with_warning("SYSTEM DESTRUCTION RISK"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> CriticalRule {
        CriticalRule::from_config(&DangerousCommands {
            critical: vec!["FORMAT C:".into(), "mkfs".into()],
            ..Default::default()
        })
    }

    fn assess(cmd: &str) -> Option<RiskAssessment> {
        rule().assess(&CommandContext::from_command(cmd))
    }

    #[test]
    fn substring_hit_is_critical() {
        let a = assess("echo y | format c: /q").unwrap();
        assert_eq!(a.level, RiskLevel::Critical);
        assert_eq!(a.reason, "destructive system operation detected");
        assert_eq!(a.warnings, vec!["SYSTEM DESTRUCTION RISK"]);
    }

    #[test]
    fn matching_ignores_case() {
        assert!(assess("Format C:").is_some());
        assert!(assess("MKFS.ext4 /dev/sdb1").is_some());
    }

    #[test]
    fn no_signature_passes() {
        assert!(assess("format d:").is_none());
        assert!(assess("").is_none());
    }
}
