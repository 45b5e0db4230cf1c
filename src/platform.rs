//! Platform family selection.
//!
//! Protected paths and backup advice differ between Windows-style and
//! Unix-style systems. The engine picks one family at construction time;
//! tests pin it explicitly so results do not depend on the host.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    Windows,
    Unix,
}

impl PlatformFamily {
    /// The family of the platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(windows) {
            PlatformFamily::Windows
        } else {
            PlatformFamily::Unix
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlatformFamily::Windows => "windows",
            PlatformFamily::Unix => "unix",
        }
    }

    /// Whether path comparison on this family ignores case.
    pub fn case_insensitive_paths(self) -> bool {
        matches!(self, PlatformFamily::Windows)
    }

    /// Directories the OS itself reports as system locations.
    ///
    /// Only the Windows family has any; each falls back to the stock
    /// location when the variable is unset.
    pub fn environment_paths(self) -> Vec<String> {
        match self {
            PlatformFamily::Windows => [
                ("SYSTEMROOT", r"C:\Windows"),
                ("PROGRAMFILES", r"C:\Program Files"),
                ("PROGRAMFILES(X86)", r"C:\Program Files (x86)"),
            ]
            .iter()
            .map(|&(var, fallback)| std::env::var(var).unwrap_or_else(|_| fallback.to_string()))
            .collect(),
            PlatformFamily::Unix => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_has_no_environment_paths() {
        assert!(PlatformFamily::Unix.environment_paths().is_empty());
    }

    #[test]
    fn windows_environment_paths_always_three() {
        let paths = PlatformFamily::Windows.environment_paths();
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| !p.is_empty()));
    }

    #[test]
    fn case_sensitivity_by_family() {
        assert!(PlatformFamily::Windows.case_insensitive_paths());
        assert!(!PlatformFamily::Unix.case_insensitive_paths());
    }
}
