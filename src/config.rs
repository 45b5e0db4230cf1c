use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Embedded starter policy, written by `termguard config reset`.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Errors raised while reading or decoding a policy document.
///
/// These never escape [`PolicyConfig::load`] or [`PolicyConfig::parse`];
/// they are logged and replaced by the built-in fallback.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk encoding of a policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// `.json` files are JSON, everything else is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

// ── Final config types ──

/// Whether callers should block critical commands when they do not say otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Safe,
    Unsafe,
}

impl Mode {
    pub fn is_safe(self) -> bool {
        self == Mode::Safe
    }
}

/// Named dangerous-command bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Medium,
    High,
    Critical,
}

impl Tier {
    /// Short name used in warnings ("high risk command").
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Critical => "critical",
            Tier::High => "high",
            Tier::Medium => "medium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub safe_commands: Vec<String>,
    #[serde(default)]
    pub destructive_flags: Vec<String>,
    #[serde(default = "default_protected_extensions")]
    pub protected_extensions: Vec<String>,
    #[serde(default)]
    pub safety_settings: SafetySettings,
    #[serde(default)]
    pub protected_paths: ProtectedPaths,
    #[serde(default)]
    pub dangerous_commands: DangerousCommands,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SafetySettings {
    #[serde(default)]
    pub default_mode: Mode,
    /// Append every decision to the decision log.
    #[serde(default = "default_true")]
    pub log_decisions: bool,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            default_mode: Mode::Safe,
            log_decisions: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ProtectedPaths {
    #[serde(default)]
    pub windows: Vec<String>,
    #[serde(default)]
    pub unix: Vec<String>,
}

/// Dangerous command signatures by tier. Unknown tier keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct DangerousCommands {
    #[serde(default)]
    pub critical: Vec<String>,
    #[serde(default)]
    pub high_risk: Vec<String>,
    #[serde(default)]
    pub medium_risk: Vec<String>,
}

impl DangerousCommands {
    pub fn tier(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Critical => &self.critical,
            Tier::High => &self.high_risk,
            Tier::Medium => &self.medium_risk,
        }
    }
}

fn default_protected_extensions() -> Vec<String> {
    vec![".exe".into(), ".dll".into(), ".sys".into()]
}

fn default_true() -> bool {
    true
}

// ── Overlay types (second document merged onto a loaded config) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    /// Replace the top-level lists instead of extending them.
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    safe_commands: Vec<String>,
    #[serde(default)]
    remove_safe_commands: Vec<String>,
    #[serde(default)]
    destructive_flags: Vec<String>,
    #[serde(default)]
    remove_destructive_flags: Vec<String>,
    #[serde(default)]
    protected_extensions: Vec<String>,
    #[serde(default)]
    remove_protected_extensions: Vec<String>,
    #[serde(default)]
    safety_settings: SettingsOverlay,
    #[serde(default)]
    protected_paths: ProtectedPathsOverlay,
    #[serde(default)]
    dangerous_commands: DangerousCommandsOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    default_mode: Option<Mode>,
    log_decisions: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct ProtectedPathsOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    windows: Vec<String>,
    #[serde(default)]
    unix: Vec<String>,
    #[serde(default)]
    remove_windows: Vec<String>,
    #[serde(default)]
    remove_unix: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct DangerousCommandsOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    critical: Vec<String>,
    #[serde(default)]
    high_risk: Vec<String>,
    #[serde(default)]
    medium_risk: Vec<String>,
    #[serde(default)]
    remove_critical: Vec<String>,
    #[serde(default)]
    remove_high_risk: Vec<String>,
    #[serde(default)]
    remove_medium_risk: Vec<String>,
}

/// Merge an overlay list into a base list.
/// Replace mode swaps the list wholesale; otherwise removals apply first,
/// then additions are appended without duplicates.
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
        return;
    }
    base.retain(|item| !remove.contains(item));
    for item in add {
        if !base.contains(&item) {
            base.push(item);
        }
    }
}

/// Trim entries and drop the ones left empty.
fn clean_list(name: &str, list: &mut Vec<String>) {
    let before = list.len();
    for item in list.iter_mut() {
        let trimmed = item.trim();
        if trimmed.len() != item.len() {
            *item = trimmed.to_string();
        }
    }
    list.retain(|item| !item.is_empty());
    if list.len() != before {
        log::debug!("dropped {} empty entries from {name}", before - list.len());
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    bytes: &[u8],
    format: ConfigFormat,
) -> Result<T, ConfigError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(match format {
        ConfigFormat::Toml => toml::from_str(text)?,
        ConfigFormat::Json => serde_json::from_str(text)?,
    })
}

impl PolicyConfig {
    /// Built-in configuration used whenever no usable document is available.
    pub fn fallback() -> Self {
        Self {
            safe_commands: vec!["dir".into(), "ls".into(), "pwd".into()],
            destructive_flags: vec!["-rf".into(), "/s /q".into()],
            protected_extensions: vec![".exe".into(), ".dll".into()],
            safety_settings: SafetySettings::default(),
            protected_paths: ProtectedPaths::default(),
            dangerous_commands: DangerousCommands::default(),
        }
    }

    /// The embedded starter policy.
    pub fn recommended() -> Self {
        let mut config: Self =
            toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse");
        config.normalize();
        config
    }

    /// Raw text of the embedded starter policy.
    pub fn recommended_source() -> &'static str {
        DEFAULT_CONFIG
    }

    /// Decode a policy document, reporting why it could not be used.
    pub fn try_parse(bytes: &[u8], format: ConfigFormat) -> Result<Self, ConfigError> {
        let mut config: Self = decode(bytes, format)?;
        config.normalize();
        Ok(config)
    }

    /// Decode a policy document, falling back to [`PolicyConfig::fallback`]
    /// when it is malformed. Never fails.
    pub fn parse(bytes: &[u8], format: ConfigFormat) -> Self {
        match Self::try_parse(bytes, format) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("malformed policy config ({e}); using built-in defaults");
                Self::fallback()
            }
        }
    }

    /// Load a policy from `path`. Never fails.
    ///
    /// A missing file quietly yields the fallback; an unreadable or
    /// malformed one yields the fallback with a warning, so operators can
    /// tell "no config" from "broken config".
    pub fn load(path: &Path) -> Self {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no policy config at {}; using built-in defaults", path.display());
                return Self::fallback();
            }
            Err(source) => {
                let err = ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                };
                log::warn!("{err}; using built-in defaults");
                return Self::fallback();
            }
        };
        match Self::try_parse(&bytes, ConfigFormat::from_path(path)) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "malformed policy config {} ({e}); using built-in defaults",
                    path.display()
                );
                Self::fallback()
            }
        }
    }

    /// Load `base` and merge the overlay at `overlay` on top of it.
    pub fn load_with_overlay(base: &Path, overlay: Option<&Path>) -> Self {
        let mut config = Self::load(base);
        if let Some(path) = overlay {
            config.load_overlay(path);
        }
        config
    }

    /// Merge an overlay file. A missing or malformed overlay is ignored.
    pub fn load_overlay(&mut self, path: &Path) {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no policy overlay at {}", path.display());
                return;
            }
            Err(e) => {
                log::warn!("cannot read policy overlay {}: {e}", path.display());
                return;
            }
        };
        if let Err(e) = self.apply_overlay_bytes(&bytes, ConfigFormat::from_path(path)) {
            log::warn!("ignoring malformed policy overlay {} ({e})", path.display());
        }
    }

    /// Merge an overlay document given as TOML text.
    pub fn apply_overlay_str(&mut self, text: &str) -> Result<(), ConfigError> {
        self.apply_overlay_bytes(text.as_bytes(), ConfigFormat::Toml)
    }

    /// Merge an overlay document. On error the config is left untouched.
    pub fn apply_overlay_bytes(
        &mut self,
        bytes: &[u8],
        format: ConfigFormat,
    ) -> Result<(), ConfigError> {
        let overlay: ConfigOverlay = decode(bytes, format)?;
        self.apply_overlay(overlay);
        self.normalize();
        Ok(())
    }

    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Settings: scalar overrides
        let s = overlay.safety_settings;
        if let Some(mode) = s.default_mode {
            self.safety_settings.default_mode = mode;
        }
        if let Some(v) = s.log_decisions {
            self.safety_settings.log_decisions = v;
        }

        // Top-level lists
        merge_list(
            &mut self.safe_commands,
            overlay.safe_commands,
            &overlay.remove_safe_commands,
            overlay.replace,
        );
        merge_list(
            &mut self.destructive_flags,
            overlay.destructive_flags,
            &overlay.remove_destructive_flags,
            overlay.replace,
        );
        merge_list(
            &mut self.protected_extensions,
            overlay.protected_extensions,
            &overlay.remove_protected_extensions,
            overlay.replace,
        );

        // Protected paths
        let p = overlay.protected_paths;
        merge_list(
            &mut self.protected_paths.windows,
            p.windows,
            &p.remove_windows,
            p.replace,
        );
        merge_list(
            &mut self.protected_paths.unix,
            p.unix,
            &p.remove_unix,
            p.replace,
        );

        // Dangerous command tiers
        let d = overlay.dangerous_commands;
        merge_list(
            &mut self.dangerous_commands.critical,
            d.critical,
            &d.remove_critical,
            d.replace,
        );
        merge_list(
            &mut self.dangerous_commands.high_risk,
            d.high_risk,
            &d.remove_high_risk,
            d.replace,
        );
        merge_list(
            &mut self.dangerous_commands.medium_risk,
            d.medium_risk,
            &d.remove_medium_risk,
            d.replace,
        );
    }

    /// Enforce the list invariants: entries are trimmed and non-empty.
    fn normalize(&mut self) {
        clean_list("safe_commands", &mut self.safe_commands);
        clean_list("destructive_flags", &mut self.destructive_flags);
        clean_list("protected_extensions", &mut self.protected_extensions);
        clean_list("protected_paths.windows", &mut self.protected_paths.windows);
        clean_list("protected_paths.unix", &mut self.protected_paths.unix);
        clean_list("dangerous_commands.critical", &mut self.dangerous_commands.critical);
        clean_list("dangerous_commands.high_risk", &mut self.dangerous_commands.high_risk);
        clean_list(
            "dangerous_commands.medium_risk",
            &mut self.dangerous_commands.medium_risk,
        );
    }

    /// Render the effective config as TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
