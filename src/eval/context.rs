/// Normalized view of a command handed to each risk rule.
#[derive(Debug)]
pub struct CommandContext<'a> {
    /// The command as the caller supplied it.
    pub raw: &'a str,
    /// Trimmed, lower-cased command text. All matching runs against this.
    pub lowered: String,
    /// First whitespace-delimited word of `lowered`, if any.
    pub first_token: Option<String>,
}

impl<'a> CommandContext<'a> {
    pub fn from_command(raw: &'a str) -> Self {
        let lowered = raw.trim().to_lowercase();
        let first_token = lowered.split_whitespace().next().map(str::to_string);
        Self {
            raw,
            lowered,
            first_token,
        }
    }

    /// First word, or `""` for an empty command.
    pub fn first(&self) -> &str {
        self.first_token.as_deref().unwrap_or("")
    }

    /// Whether the command text contains `needle` (already lower-cased).
    pub fn contains(&self, needle: &str) -> bool {
        self.lowered.contains(needle)
    }

    /// First of `needles` found in the command text.
    pub fn find_any<'n>(&self, needles: &'n [String]) -> Option<&'n str> {
        needles
            .iter()
            .map(String::as_str)
            .find(|n| self.lowered.contains(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowers_and_trims() {
        let ctx = CommandContext::from_command("  LS -LA  ");
        assert_eq!(ctx.lowered, "ls -la");
        assert_eq!(ctx.first(), "ls");
    }

    #[test]
    fn empty_command_has_no_token() {
        assert!(CommandContext::from_command("").first_token.is_none());
        assert!(CommandContext::from_command(" \t\n").first_token.is_none());
        assert_eq!(CommandContext::from_command("   ").first(), "");
    }

    #[test]
    fn find_any_returns_first_hit() {
        let ctx = CommandContext::from_command("rm -rf /s /q");
        let flags = vec!["--force".to_string(), "/s /q".to_string(), "-rf".to_string()];
        assert_eq!(ctx.find_any(&flags), Some("/s /q"));
    }
}
