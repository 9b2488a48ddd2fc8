use crate::EntitledError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
pub struct EntitledConfig {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub title: TitleConfig,
}

#[derive(Debug, Deserialize)]
pub struct HostConfig {
    /// User-level settings.json. Defaults to the platform Code/User location.
    pub user_settings: Option<PathBuf>,
    /// Directory under the workspace root holding settings.json.
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            user_settings: None,
            workspace_dir: default_workspace_dir(),
        }
    }
}

fn default_workspace_dir() -> PathBuf {
    PathBuf::from(".vscode")
}

#[derive(Debug, Deserialize, Default)]
pub struct TitleConfig {
    #[serde(default)]
    pub timestamp: TimestampStyle,
    /// Added to UTC for the `clock` style, e.g. 120 for UTC+2.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimestampStyle {
    /// `HH:MM` wall clock: UTC shifted by `utc_offset_minutes`.
    #[default]
    Clock,
    /// Age of the active file, e.g. `5m ago`.
    Relative,
    None,
}

/// Load config from ENTITLED_CONFIG env var, ~/.entitled/config.toml, or defaults.
pub fn load_config() -> Result<EntitledConfig, EntitledError> {
    match config_path() {
        Some(p) if p.exists() => load_config_from(&p),
        _ => Ok(EntitledConfig::default()),
    }
}

pub fn load_config_from(path: &Path) -> Result<EntitledConfig, EntitledError> {
    let content = std::fs::read_to_string(path)?;
    let config: EntitledConfig = toml::from_str(&content)
        .map_err(|e| EntitledError::Config(format!("{}: {e}", path.display())))?;
    validate_config(&config)?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("ENTITLED_CONFIG") {
        return Some(PathBuf::from(p));
    }
    let home = std::env::var("HOME").ok()?;
    Some(Path::new(&home).join(".entitled").join("config.toml"))
}

fn validate_config(config: &EntitledConfig) -> Result<(), EntitledError> {
    if config.title.utc_offset_minutes.abs() > 14 * 60 {
        return Err(EntitledError::Config(format!(
            "title.utc_offset_minutes out of range: {}",
            config.title.utc_offset_minutes
        )));
    }
    if config.host.workspace_dir.is_absolute() {
        return Err(EntitledError::Config(format!(
            "host.workspace_dir must be relative, got {}",
            config.host.workspace_dir.display()
        )));
    }
    Ok(())
}

/// Resolve the user-level settings.json: CLI/env override, then config, then
/// `$XDG_CONFIG_HOME/Code/User/settings.json` or `~/.config/...`.
pub fn resolve_user_settings(config: &EntitledConfig, cli_override: Option<PathBuf>) -> PathBuf {
    if let Some(p) = cli_override {
        return p;
    }
    if let Some(p) = &config.host.user_settings {
        return p.clone();
    }
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
            PathBuf::from(home).join(".config")
        });
    base.join("Code").join("User").join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_when_no_file() {
        let config = EntitledConfig::default();
        assert_eq!(config.host.user_settings, None);
        assert_eq!(config.host.workspace_dir, PathBuf::from(".vscode"));
        assert_eq!(config.title.timestamp, TimestampStyle::Clock);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[host]
user_settings = "/home/user/.config/Code - OSS/User/settings.json"
workspace_dir = ".code"

[title]
timestamp = "relative"
"#;
        let config: EntitledConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.host.user_settings,
            Some(PathBuf::from("/home/user/.config/Code - OSS/User/settings.json"))
        );
        assert_eq!(config.host.workspace_dir, PathBuf::from(".code"));
        assert_eq!(config.title.timestamp, TimestampStyle::Relative);
    }

    #[test]
    fn parse_timestamp_none() {
        let config: EntitledConfig = toml::from_str("[title]\ntimestamp = \"none\"\n").unwrap();
        assert_eq!(config.title.timestamp, TimestampStyle::None);
    }

    #[test]
    fn unknown_timestamp_style_rejected() {
        let parsed: Result<EntitledConfig, _> = toml::from_str("[title]\ntimestamp = \"iso\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn parse_utc_offset() {
        let config: EntitledConfig =
            toml::from_str("[title]\nutc_offset_minutes = -330\n").unwrap();
        assert_eq!(config.title.utc_offset_minutes, -330);
        assert!(validate_config(&config).is_ok());
        assert_eq!(EntitledConfig::default().title.utc_offset_minutes, 0);
    }

    #[test]
    fn utc_offset_out_of_range_rejected() {
        let config: EntitledConfig =
            toml::from_str("[title]\nutc_offset_minutes = 1000\n").unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn absolute_workspace_dir_rejected() {
        let config: EntitledConfig =
            toml::from_str("[host]\nworkspace_dir = \"/etc\"\n").unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[title]\ntimestamp = \"none\"\n").unwrap();
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.title.timestamp, TimestampStyle::None);
    }

    #[test]
    fn load_malformed_file_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[title\n").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, EntitledError::Config(_)));
    }

    #[test]
    fn user_settings_override_wins() {
        let config: EntitledConfig =
            toml::from_str("[host]\nuser_settings = \"/a/settings.json\"\n").unwrap();
        assert_eq!(
            resolve_user_settings(&config, Some(PathBuf::from("/b/settings.json"))),
            PathBuf::from("/b/settings.json")
        );
        assert_eq!(
            resolve_user_settings(&config, None),
            PathBuf::from("/a/settings.json")
        );
    }

    #[test]
    fn user_settings_default_location() {
        let path = resolve_user_settings(&EntitledConfig::default(), None);
        assert!(path.ends_with("Code/User/settings.json"));
    }
}
