use std::collections::HashSet;

use crate::eval::{CommandContext, RiskAssessment, RiskLevel};
use crate::rules::RiskRule;

/// Marks allowlisted read-only commands as safe.
pub struct SafeCommandRule {
    names: HashSet<String>,
}

impl SafeCommandRule {
    pub fn new(names: &[String]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_lowercase()).collect(),
        }
    }
}

impl RiskRule for SafeCommandRule {
    fn name(&self) -> &'static str {
        "safe-command"
    }

    fn assess(&self, ctx: &CommandContext) -> Option<RiskAssessment> {
        let first = ctx.first_token.as_deref()?;
        self.names
            .contains(first)
            .then(|| RiskAssessment::new(RiskLevel::Safe, "read-only operation"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> SafeCommandRule {
        SafeCommandRule::new(&["ls".to_string(), "Dir".to_string()])
    }

    #[test]
    fn allowlisted_first_word() {
        let a = rule().assess(&CommandContext::from_command("LS -la")).unwrap();
        assert_eq!(a.level, RiskLevel::Safe);
        assert!(a.warnings.is_empty());
        assert!(rule().assess(&CommandContext::from_command("dir /w")).is_some());
    }

    #[test]
    fn other_commands_pass() {
        assert!(rule().assess(&CommandContext::from_command("lsblk")).is_none());
        assert!(rule().assess(&CommandContext::from_command("")).is_none());
    }
}
