use crate::eval::{CommandContext, RiskAssessment, RiskLevel};
use crate::rules::RiskRule;

/// Flags commands whose text mentions a protected directory.
pub struct ProtectedPathRule {
    /// (lower-cased needle, path as configured)
    paths: Vec<(String, String)>,
}

impl ProtectedPathRule {
    pub fn new(paths: &[String]) -> Self {
        Self {
            paths: paths.iter().map(|p| (p.to_lowercase(), p.clone())).collect(),
        }
    }
}

impl RiskRule for ProtectedPathRule {
    fn name(&self) -> &'static str {
        "protected-path"
    }

    fn assess(&self, ctx: &CommandContext) -> Option<RiskAssessment> {
        let (_, path) = self
            .paths
            .iter()
            .find(|(needle, _)| ctx.contains(needle))?;
        Some(
            RiskAssessment::new(RiskLevel::High, "system directory access detected")
                .with_warning(format!("operation on protected system path: {path}")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assess(cmd: &str) -> Option<RiskAssessment> {
        let rule = ProtectedPathRule::new(&[r"C:\Windows".to_string(), "/etc".to_string()]);
        rule.assess(&CommandContext::from_command(cmd))
    }

    #[test]
    fn windows_path_any_case() {
        let a = assess(r"type c:\WINDOWS\win.ini").unwrap();
        assert_eq!(a.level, RiskLevel::High);
        assert_eq!(a.reason, "system directory access detected");
        assert_eq!(a.warnings, vec![r"operation on protected system path: C:\Windows"]);
    }

    #[test]
    fn unix_path() {
        assert!(assess("cat /etc/passwd").is_some());
    }

    #[test]
    fn unrelated_path_passes() {
        assert!(assess("cat ~/notes.txt").is_none());
    }
}
