use serde::Serialize;

use super::risk::RiskAssessment;

/// Three-way summary of a [`ValidationDecision`], ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Confirm,
    Block,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Allow => "allow",
            Verdict::Confirm => "confirm",
            Verdict::Block => "block",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::Allow => "ALLOW",
            Verdict::Confirm => "CONFIRM",
            Verdict::Block => "BLOCK",
        }
    }
}

/// Outcome of validating one command.
///
/// A blocked decision never asks for confirmation, and a decision that asks
/// for confirmation is always allowed. Use [`ValidationDecision::allow`],
/// [`ValidationDecision::confirm`] and [`ValidationDecision::block`] to keep
/// those invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDecision {
    pub allowed: bool,
    pub risk: RiskAssessment,
    pub requires_confirmation: bool,
    pub blocked_reason: Option<String>,
}

impl ValidationDecision {
    pub fn allow(risk: RiskAssessment) -> Self {
        Self {
            allowed: true,
            risk,
            requires_confirmation: false,
            blocked_reason: None,
        }
    }

    pub fn confirm(risk: RiskAssessment) -> Self {
        Self {
            requires_confirmation: true,
            ..Self::allow(risk)
        }
    }

    pub fn block(risk: RiskAssessment, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            risk,
            requires_confirmation: false,
            blocked_reason: Some(reason.into()),
        }
    }

    pub fn verdict(&self) -> Verdict {
        if !self.allowed {
            Verdict::Block
        } else if self.requires_confirmation {
            Verdict::Confirm
        } else {
            Verdict::Allow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::RiskLevel;

    fn risk() -> RiskAssessment {
        RiskAssessment::new(RiskLevel::Low, "standard command")
    }

    #[test]
    fn constructors_keep_invariants() {
        let allow = ValidationDecision::allow(risk());
        assert!(allow.allowed && !allow.requires_confirmation && allow.blocked_reason.is_none());

        let confirm = ValidationDecision::confirm(risk());
        assert!(confirm.allowed && confirm.requires_confirmation);
        assert!(confirm.blocked_reason.is_none());

        let block = ValidationDecision::block(risk(), "nope");
        assert!(!block.allowed && !block.requires_confirmation);
        assert_eq!(block.blocked_reason.as_deref(), Some("nope"));
    }

    #[test]
    fn verdict_mapping() {
        assert_eq!(ValidationDecision::allow(risk()).verdict(), Verdict::Allow);
        assert_eq!(ValidationDecision::confirm(risk()).verdict(), Verdict::Confirm);
        assert_eq!(ValidationDecision::block(risk(), "x").verdict(), Verdict::Block);
        assert!(Verdict::Allow < Verdict::Confirm && Verdict::Confirm < Verdict::Block);
    }
}
