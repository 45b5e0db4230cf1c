use std::sync::LazyLock;

use regex::Regex;

use crate::eval::{CommandContext, RiskAssessment, RiskLevel};
use crate::rules::RiskRule;

struct SuspiciousPattern {
    description: &'static str,
    source: &'static str,
    regex: Regex,
}

/// Structural patterns, checked against the lower-cased command.
///
/// Chained deletion only looks for a literal `del` after the operator;
/// other destructive verbs are not covered here.
const PATTERNS: &[(&str, &str)] = &[
    ("output redirected to null device", r">\s*nul"),
    ("output redirected to null device", r">\s*/dev/null"),
    ("stderr merged into stdout", r"2>&1"),
    ("piped deletion", r"\|\s*del"),
    ("chained deletion", r"&\s*del"),
    ("conditional deletion", r"&&\s*del"),
];

static COMPILED: LazyLock<Vec<SuspiciousPattern>> = LazyLock::new(|| {
    PATTERNS
        .iter()
        .map(|&(description, source)| SuspiciousPattern {
            description,
            source,
            regex: Regex::new(source).expect("suspicious pattern must compile"),
        })
        .collect()
});

/// Flags shell constructs that hide output or chain deletions.
pub struct SuspiciousPatternRule {
    patterns: &'static [SuspiciousPattern],
}

impl SuspiciousPatternRule {
    pub fn new() -> Self {
        Self {
            patterns: COMPILED.as_slice(),
        }
    }
}

impl Default for SuspiciousPatternRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for SuspiciousPatternRule {
    fn name(&self) -> &'static str {
        "suspicious-pattern"
    }

    fn assess(&self, ctx: &CommandContext) -> Option<RiskAssessment> {
        let pattern = self.patterns.iter().find(|p| p.regex.is_match(&ctx.lowered))?;
        Some(
            RiskAssessment::new(RiskLevel::Medium, "suspicious command pattern").with_warning(
                format!(
                    "suspicious pattern detected: {} ({})",
                    pattern.description, pattern.source
                ),
            ),
        )
    }
}
