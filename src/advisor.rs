//! Remediation advice: safer alternatives and backup hints.
//!
//! Advice depends only on the command text and the platform family, never on
//! the risk assessment, so hosts may show it for allowed commands too.

use serde::Serialize;

use crate::platform::PlatformFamily;

/// Alternatives keyed by the command's first word.
const ALTERNATIVES: &[(&str, &[&str])] = &[
    ("del", &["dir (to list files first)", "move to recycle bin instead"]),
    ("rm", &["ls -la (to list files first)", "mv to backup location"]),
    ("format", &["chkdsk (to check disk)", "backup data first"]),
    ("shutdown", &["use gui shutdown", "schedule shutdown with delay"]),
    ("reg", &["export registry backup first", "use registry editor gui"]),
    (
        "chmod",
        &["ls -la (to check current permissions)", "use specific permission values"],
    ),
    ("sudo", &["use specific sudo command", "check if really needed"]),
];

const GENERIC_ALTERNATIVES: &[&str] = &["review command carefully", "consider read-only alternatives"];

/// Substrings that mark a command as destroying data.
const DESTRUCTIVE_VERBS: &[&str] = &["del", "rm", "format", "rmdir", "rd"];

const WINDOWS_BACKUP_HINT: &str = "consider creating a system restore point: 'rstrui.exe'";
const UNIX_BACKUP_HINT: &str = "consider creating a backup: 'rsync -av /source/ /backup/'";

/// Guidance for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvisoryResult {
    pub alternatives: Vec<String>,
    pub backup_hint: Option<String>,
}

pub struct Advisor {
    family: PlatformFamily,
}

impl Advisor {
    pub fn new(family: PlatformFamily) -> Self {
        Self { family }
    }

    /// Safer ways to reach the same goal, most useful first.
    pub fn alternatives(&self, command: &str) -> Vec<String> {
        let lowered = command.trim().to_lowercase();
        let first = lowered.split_whitespace().next().unwrap_or("");
        ALTERNATIVES
            .iter()
            .find(|(name, _)| *name == first)
            .map(|(_, alts)| *alts)
            .unwrap_or(GENERIC_ALTERNATIVES)
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// A backup suggestion when the command looks destructive.
    ///
    /// Matching is by substring, so `rd` also fires inside longer words.
    pub fn backup_hint(&self, command: &str) -> Option<String> {
        let lowered = command.to_lowercase();
        if !DESTRUCTIVE_VERBS.iter().any(|verb| lowered.contains(verb)) {
            return None;
        }
        let hint = match self.family {
            PlatformFamily::Windows => WINDOWS_BACKUP_HINT,
            PlatformFamily::Unix => UNIX_BACKUP_HINT,
        };
        Some(hint.to_string())
    }

    pub fn advise(&self, command: &str) -> AdvisoryResult {
        AdvisoryResult {
            alternatives: self.alternatives(command),
            backup_hint: self.backup_hint(command),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_command_alternatives() {
        let advisor = Advisor::new(PlatformFamily::Unix);
        assert_eq!(
            advisor.alternatives("rm -rf data"),
            vec!["ls -la (to list files first)", "mv to backup location"]
        );
        assert_eq!(advisor.alternatives("DEL x.txt")[0], "dir (to list files first)");
    }

    #[test]
    fn unknown_command_gets_generic_pair() {
        let advisor = Advisor::new(PlatformFamily::Unix);
        assert_eq!(
            advisor.alternatives("curl example.com"),
            vec!["review command carefully", "consider read-only alternatives"]
        );
        assert_eq!(advisor.alternatives("").len(), 2);
    }

    #[test]
    fn backup_hint_by_family() {
        let unix = Advisor::new(PlatformFamily::Unix);
        let windows = Advisor::new(PlatformFamily::Windows);
        assert!(unix.backup_hint("rm -rf data").unwrap().contains("rsync"));
        assert!(windows.backup_hint("del /s /q data").unwrap().contains("rstrui.exe"));
    }

    #[test]
    fn no_hint_for_read_only() {
        let advisor = Advisor::new(PlatformFamily::Unix);
        assert_eq!(advisor.backup_hint("ls -la"), None);
        assert_eq!(advisor.backup_hint(""), None);
    }

    #[test]
    fn substring_match_is_loose() {
        let advisor = Advisor::new(PlatformFamily::Unix);
        assert!(advisor.backup_hint("echo password").is_some());
    }

    #[test]
    fn advise_bundles_both() {
        let advisor = Advisor::new(PlatformFamily::Windows);
        let advice = advisor.advise("format d:");
        assert_eq!(advice.alternatives[0], "chkdsk (to check disk)");
        assert!(advice.backup_hint.is_some());
    }
}
