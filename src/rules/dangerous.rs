use std::collections::HashMap;

use crate::config::{PolicyConfig, Tier};
use crate::eval::{CommandContext, RiskAssessment, RiskLevel};
use crate::rules::RiskRule;

/// Recognises dangerous command families by their first word.
///
/// Only the first word of each high/medium tier entry names a family, so an
/// entry like `net stop` flags every `net` invocation. A destructive flag
/// anywhere in the command escalates the result from medium to high.
///
/// A name listed in both tiers is reported as high, whatever order the tiers
/// appear in the document.
pub struct DangerousCommandRule {
    families: HashMap<String, Tier>,
    destructive_flags: Vec<String>,
}

impl DangerousCommandRule {
    pub fn from_config(config: &PolicyConfig) -> Self {
        let mut families: HashMap<String, Tier> = HashMap::new();
        for tier in [Tier::Medium, Tier::High] {
            for entry in config.dangerous_commands.tier(tier) {
                let Some(name) = entry.split_whitespace().next() else {
                    continue;
                };
                families
                    .entry(name.to_lowercase())
                    .and_modify(|t| *t = (*t).max(tier))
                    .or_insert(tier);
            }
        }
        Self {
            families,
            destructive_flags: config
                .destructive_flags
                .iter()
                .map(|f| f.to_lowercase())
                .collect(),
        }
    }

    /// Tier a command name belongs to, if any.
    pub fn tier_of(&self, name: &str) -> Option<Tier> {
        self.families.get(name).copied()
    }
}

impl RiskRule for DangerousCommandRule {
    fn name(&self) -> &'static str {
        "dangerous-command"
    }

    fn assess(&self, ctx: &CommandContext) -> Option<RiskAssessment> {
        let tier = self.tier_of(ctx.first_token.as_deref()?)?;
        let desc = format!("{} risk command", tier.as_str());
        let assessment =
            RiskAssessment::new(RiskLevel::Medium, format!("potentially dangerous: {desc}"))
                .with_warning(format!("dangerous command: {desc}"));

        if let Some(flag) = ctx.find_any(&self.destructive_flags) {
            log::debug!("destructive flag {flag:?} on {}", ctx.first());
            return Some(RiskAssessment {
                level: RiskLevel::High,
                reason: format!("high-risk {desc} with destructive flags"),
                ..assessment.with_warning("recursive/forced operation detected")
            });
        }
        Some(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DangerousCommands;

    fn rule() -> DangerousCommandRule {
        let config = PolicyConfig {
            destructive_flags: vec!["-rf".into(), "/S /Q".into()],
            dangerous_commands: DangerousCommands {
                critical: vec!["format c:".into()],
                high_risk: vec!["rm".into(), "del".into()],
                medium_risk: vec!["reg add".into(), "rm".into()],
            },
            ..PolicyConfig::fallback()
        };
        DangerousCommandRule::from_config(&config)
    }

    fn assess(cmd: &str) -> Option<RiskAssessment> {
        rule().assess(&CommandContext::from_command(cmd))
    }

    #[test]
    fn family_without_flags_is_medium() {
        let a = assess("del notes.txt").unwrap();
        assert_eq!(a.level, RiskLevel::Medium);
        assert_eq!(a.warnings, vec!["dangerous command: high risk command"]);
    }

    #[test]
    fn destructive_flag_escalates_to_high() {
        let a = assess("rm -rf build").unwrap();
        assert_eq!(a.level, RiskLevel::High);
        assert_eq!(
            a.warnings,
            vec![
                "dangerous command: high risk command",
                "recursive/forced operation detected"
            ]
        );
    }

    #[test]
    fn windows_flags_match_case_insensitively() {
        assert_eq!(assess("DEL /s /q temp").unwrap().level, RiskLevel::High);
    }

    #[test]
    fn multi_word_entry_uses_first_word() {
        let a = assess("reg delete HKCU\\Software\\Foo").unwrap();
        assert_eq!(a.level, RiskLevel::Medium);
        assert_eq!(a.warnings, vec!["dangerous command: medium risk command"]);
    }

    #[test]
    fn higher_tier_wins_for_shared_name() {
        assert_eq!(rule().tier_of("rm"), Some(Tier::High));
    }

    #[test]
    fn critical_tier_is_not_a_family() {
        assert!(rule().tier_of("format").is_none());
        assert!(assess("format d:").is_none());
    }

    #[test]
    fn only_first_word_counts() {
        assert!(assess("echo rm -rf").is_none());
        assert!(assess("").is_none());
    }
}
