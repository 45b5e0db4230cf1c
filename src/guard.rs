//! Protected-directory and protected-extension checks.
//!
//! Paths are resolved lexically: `~` is expanded, relative paths are joined
//! to a base directory, and `.`/`..` are folded without touching the
//! filesystem. Windows-family paths accept both separators and compare
//! without case, so the same policy can be evaluated on any host.

use crate::config::PolicyConfig;
use crate::platform::PlatformFamily;

/// Why a path could not be resolved. Never surfaced to callers; a path
/// that cannot be resolved is reported as not protected.
#[derive(Debug, thiserror::Error)]
pub enum PathResolutionError {
    #[error("empty path")]
    Empty,
    #[error("path contains a NUL byte")]
    Nul,
    #[error("cannot determine working directory: {0}")]
    WorkingDir(#[source] std::io::Error),
    #[error("working directory is not valid UTF-8")]
    NonUtf8WorkingDir,
}

/// An absolute path split into a root and folded components.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedPath {
    /// `/` or a lower-cased drive such as `c:`.
    root: String,
    parts: Vec<String>,
}

impl ResolvedPath {
    fn push_all(&mut self, rest: &str) {
        for part in rest.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    self.parts.pop();
                }
                p => self.parts.push(p.to_string()),
            }
        }
    }

    /// Equal to, or nested under, `dir`.
    fn is_within(&self, dir: &ResolvedPath) -> bool {
        self.root == dir.root && self.parts.starts_with(&dir.parts)
    }
}

fn current_dir() -> Result<String, PathResolutionError> {
    let dir = std::env::current_dir().map_err(PathResolutionError::WorkingDir)?;
    dir.into_os_string()
        .into_string()
        .map_err(|_| PathResolutionError::NonUtf8WorkingDir)
}

/// Lower-cased drive (`c:`) of a raw Windows-family path, if it has one.
fn drive_of(path: &str) -> Option<String> {
    let path = path.trim();
    let bytes = path.as_bytes();
    (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
        .then(|| path[..2].to_lowercase())
}

/// Split off the root of an already-normalized path, if it is absolute.
fn split_root(text: &str, family: PlatformFamily) -> Option<(String, &str)> {
    let bytes = text.as_bytes();
    if family == PlatformFamily::Windows
        && bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
    {
        return Some((text[..2].to_string(), &text[2..]));
    }
    text.strip_prefix('/').map(|rest| ("/".to_string(), rest))
}

fn resolve(
    path: &str,
    family: PlatformFamily,
    base: Option<&str>,
) -> Result<ResolvedPath, PathResolutionError> {
    if path.contains('\0') {
        return Err(PathResolutionError::Nul);
    }
    let expanded = shellexpand::tilde(path.trim());
    if expanded.is_empty() {
        return Err(PathResolutionError::Empty);
    }
    let text = match family {
        PlatformFamily::Windows => expanded.replace('\\', "/").to_lowercase(),
        PlatformFamily::Unix => expanded.into_owned(),
    };

    let mut resolved = match split_root(&text, family) {
        Some((root, rest)) => {
            // `\Windows` is rooted on the drive of the base directory
            let root = if family == PlatformFamily::Windows && root == "/" {
                let drive = match base {
                    Some(b) => drive_of(b),
                    None => current_dir().ok().and_then(|d| drive_of(&d)),
                };
                drive.unwrap_or(root)
            } else {
                root
            };
            let mut r = ResolvedPath {
                root,
                parts: Vec::new(),
            };
            r.push_all(rest);
            return Ok(r);
        }
        None => {
            let base = match base {
                Some(b) => b.to_string(),
                None => current_dir()?,
            };
            // A relative base is anchored at the root so this terminates.
            resolve(&base, family, Some("/"))?
        }
    };
    resolved.push_all(&text);
    Ok(resolved)
}

/// Directories protected for `family`: configured entries (with `~` and
/// `$VAR` expanded) plus the locations the OS reports for itself.
pub fn protected_directories(config: &PolicyConfig, family: PlatformFamily) -> Vec<String> {
    let configured = match family {
        PlatformFamily::Windows => &config.protected_paths.windows,
        PlatformFamily::Unix => &config.protected_paths.unix,
    };

    let mut dirs: Vec<String> = Vec::new();
    for entry in configured.iter().cloned().chain(family.environment_paths()) {
        let expanded = match shellexpand::full(&entry).map(|s| s.into_owned()) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("cannot expand protected path {entry:?}: {e}; using it verbatim");
                entry
            }
        };
        let duplicate = dirs.iter().any(|d| {
            if family.case_insensitive_paths() {
                d.eq_ignore_ascii_case(&expanded)
            } else {
                *d == expanded
            }
        });
        if !duplicate {
            dirs.push(expanded);
        }
    }
    dirs
}

/// Answers whether a path lies inside a protected directory.
pub struct PathGuard {
    family: PlatformFamily,
    protected: Vec<ResolvedPath>,
    /// Lower-cased, without the leading dot.
    extensions: Vec<String>,
}

impl PathGuard {
    pub fn new(protected_dirs: &[String], extensions: &[String], family: PlatformFamily) -> Self {
        let protected = protected_dirs
            .iter()
            .filter_map(|dir| match resolve(dir, family, None) {
                Ok(r) => Some(r),
                Err(e) => {
                    log::debug!("skipping protected path {dir:?}: {e}");
                    None
                }
            })
            .collect();
        let extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            family,
            protected,
            extensions,
        }
    }

    /// Whether `path`, resolved against the process working directory, is
    /// a protected directory or lies under one.
    pub fn is_protected(&self, path: &str) -> bool {
        self.check(path, None)
    }

    /// Like [`PathGuard::is_protected`], resolving relative paths against `base`.
    pub fn is_protected_from(&self, path: &str, base: &str) -> bool {
        self.check(path, Some(base))
    }

    fn check(&self, path: &str, base: Option<&str>) -> bool {
        match resolve(path, self.family, base) {
            Ok(resolved) => self.protected.iter().any(|dir| resolved.is_within(dir)),
            Err(e) => {
                log::debug!("treating {path:?} as unprotected: {e}");
                false
            }
        }
    }

    /// Whether the file name in `path` ends in a protected extension.
    pub fn has_protected_extension(&self, path: &str) -> bool {
        let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
                let ext = ext.to_lowercase();
                self.extensions.contains(&ext)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unix_guard() -> PathGuard {
        PathGuard::new(
            &["/etc".to_string(), "/usr/bin".to_string()],
            &[".exe".to_string(), "DLL".to_string()],
            PlatformFamily::Unix,
        )
    }

    fn windows_guard() -> PathGuard {
        PathGuard::new(
            &[r"C:\Windows".to_string(), r"C:\Program Files".to_string()],
            &[],
            PlatformFamily::Windows,
        )
    }

    #[test]
    fn exact_and_nested_paths() {
        let guard = unix_guard();
        assert!(guard.is_protected("/etc"));
        assert!(guard.is_protected("/etc/"));
        assert!(guard.is_protected("/etc/ssh/sshd_config"));
        assert!(guard.is_protected("/usr/bin/env"));
    }

    #[test]
    fn sibling_prefix_is_not_nested() {
        let guard = unix_guard();
        assert!(!guard.is_protected("/etcetera"));
        assert!(!guard.is_protected("/usr"));
        assert!(!guard.is_protected("/usr/binaries"));
    }

    #[test]
    fn dot_segments_are_folded() {
        let guard = unix_guard();
        assert!(guard.is_protected("/usr/../etc/hosts"));
        assert!(guard.is_protected("/./etc/./hosts"));
        assert!(!guard.is_protected("/etc/../tmp"));
        // `..` above the root stays at the root
        assert!(guard.is_protected("/../../etc"));
    }

    #[test]
    fn relative_paths_use_base() {
        let guard = unix_guard();
        assert!(guard.is_protected_from("passwd", "/etc"));
        assert!(guard.is_protected_from("../etc/hosts", "/home"));
        assert!(!guard.is_protected_from("notes", "/home/user"));
    }

    #[test]
    fn unresolvable_paths_are_unprotected() {
        let guard = unix_guard();
        assert!(!guard.is_protected(""));
        assert!(!guard.is_protected("   "));
        assert!(!guard.is_protected("/etc\0/passwd"));
    }

    #[test]
    fn windows_paths_ignore_case_and_separator() {
        let guard = windows_guard();
        assert!(guard.is_protected(r"C:\Windows"));
        assert!(guard.is_protected(r"c:\WINDOWS\System32"));
        assert!(guard.is_protected("c:/windows/system32/drivers"));
        assert!(guard.is_protected(r"C:\Program Files\App\app.exe"));
        assert!(!guard.is_protected(r"D:\Windows"));
        assert!(!guard.is_protected(r"C:\WindowsApps"));
    }

    #[test]
    fn windows_relative_paths_use_base() {
        let guard = windows_guard();
        assert!(guard.is_protected_from("system32", r"C:\Windows"));
        assert!(!guard.is_protected_from("system32", r"C:\Users\me"));
    }

    #[test]
    fn windows_driveless_root_takes_drive_from_base() {
        let guard = windows_guard();
        assert!(guard.is_protected_from(r"\Windows\System32", r"C:\Users\me"));
        assert!(guard.is_protected_from("/windows", r"c:\"));
        assert!(!guard.is_protected_from(r"\Windows\System32", r"D:\work"));
    }

    #[test]
    fn extension_checks() {
        let guard = unix_guard();
        assert!(guard.has_protected_extension("/tmp/setup.EXE"));
        assert!(guard.has_protected_extension(r"C:\Windows\system32\kernel32.dll"));
        assert!(!guard.has_protected_extension("/tmp/readme.txt"));
        assert!(!guard.has_protected_extension("/tmp/.exe"));
        assert!(!guard.has_protected_extension("/tmp/noext"));
        assert!(!guard.has_protected_extension(""));
    }

    #[test]
    fn protected_directories_for_unix() {
        let mut config = PolicyConfig::fallback();
        config.protected_paths.unix = vec!["/etc".into(), "/etc".into(), "/boot".into()];
        config.protected_paths.windows = vec![r"C:\Windows".into()];
        let dirs = protected_directories(&config, PlatformFamily::Unix);
        assert_eq!(dirs, vec!["/etc", "/boot"]);
    }

    #[test]
    fn protected_directories_for_windows_include_environment() {
        let mut config = PolicyConfig::fallback();
        config.protected_paths.windows = vec![r"D:\Data".into()];
        let dirs = protected_directories(&config, PlatformFamily::Windows);
        assert_eq!(dirs[0], r"D:\Data");
        assert!(dirs.len() >= 3);
    }

    #[test]
    fn unknown_variable_is_kept_verbatim() {
        let mut config = PolicyConfig::fallback();
        config.protected_paths.unix = vec!["$TERMGUARD_SURELY_UNSET_VAR/secrets".into()];
        let dirs = protected_directories(&config, PlatformFamily::Unix);
        assert_eq!(dirs, vec!["$TERMGUARD_SURELY_UNSET_VAR/secrets"]);
    }
}
