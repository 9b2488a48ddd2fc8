//! Host configuration: reading `entitled.*` options and writing
//! `window.title` into VS Code style `settings.json` files.

use crate::EntitledError;
use crate::compose::HOST_DEFAULT_TITLE;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const TITLE_KEY: &str = "window.title";
pub const ENABLE_KEY: &str = "entitled.enableCustomTitle";
pub const PATTERN_KEY: &str = "entitled.titlePattern";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Workspace,
    Global,
}

impl Scope {
    /// Workspace scope only applies while a workspace is open.
    pub fn for_workspace(workspace: Option<&Path>) -> Self {
        if workspace.is_some() {
            Scope::Workspace
        } else {
            Scope::Global
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Workspace => write!(f, "workspace"),
            Scope::Global => write!(f, "global"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleSettings {
    pub enable_custom_title: bool,
    pub title_pattern: Option<String>,
}

impl Default for TitleSettings {
    fn default() -> Self {
        Self {
            enable_custom_title: true,
            title_pattern: None,
        }
    }
}

impl TitleSettings {
    /// Overlay values present in `settings`. Values of the wrong type are ignored.
    fn apply(&mut self, settings: &Map<String, Value>) {
        if let Some(enabled) = settings.get(ENABLE_KEY).and_then(Value::as_bool) {
            self.enable_custom_title = enabled;
        }
        if let Some(pattern) = settings.get(PATTERN_KEY).and_then(Value::as_str) {
            self.title_pattern = Some(pattern.to_string());
        }
    }
}

/// One `settings.json` on disk.
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file reads as an empty object. Accepts the JSONC dialect the
    /// editor writes (comments, trailing commas).
    pub fn load(&self) -> Result<Map<String, Value>, EntitledError> {
        Ok(self.read()?.0)
    }

    /// Parsed object plus whether the text needed the JSONC parser.
    fn read(&self) -> Result<(Map<String, Value>, bool), EntitledError> {
        if !self.path.exists() {
            return Ok((Map::new(), false));
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok((Map::new(), false));
        }
        let (value, relaxed) = match serde_json::from_str::<Value>(&content) {
            Ok(v) => (v, false),
            Err(_) => {
                let v = json5::from_str::<Value>(&content).map_err(|e| {
                    EntitledError::Settings(format!("{}: {e}", self.path.display()))
                })?;
                (v, true)
            }
        };
        match value {
            Value::Object(map) => Ok((map, relaxed)),
            _ => Err(EntitledError::Settings(format!(
                "{} is not a JSON object",
                self.path.display()
            ))),
        }
    }

    /// Like [`load`](Self::load) but never fails; unreadable files are logged.
    pub fn load_lenient(&self) -> Map<String, Value> {
        self.load().unwrap_or_else(|e| {
            log::warn!("ignoring {}: {e}", self.path.display());
            Map::new()
        })
    }

    /// Set (`Some`) or remove (`None`) one key, preserving everything else.
    pub fn set(&self, key: &str, value: Option<Value>) -> Result<(), EntitledError> {
        let (mut map, relaxed) = self.read()?;
        match value {
            Some(v) => {
                map.insert(key.to_string(), v);
            }
            None => {
                if map.remove(key).is_none() && !self.path.exists() {
                    return Ok(());
                }
            }
        }
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        if relaxed {
            log::warn!("comments in {} are not preserved", self.path.display());
        }
        let mut out = serde_json::to_string_pretty(&Value::Object(map))?;
        out.push('\n');
        std::fs::write(&self.path, out)?;
        Ok(())
    }
}

/// Where a composed title ends up.
pub trait TitleStore {
    /// Persist `title`; an empty title means "use the host default".
    fn write_title(&mut self, title: &str, scope: Scope) -> Result<(), EntitledError>;

    /// Restore the host's stock title template.
    fn reset_title(&mut self, scope: Scope) -> Result<(), EntitledError> {
        self.write_title(HOST_DEFAULT_TITLE, scope)
    }

    /// Effective `entitled.*` options.
    fn title_settings(&self) -> TitleSettings;

    /// Follow the host to another workspace root (or none).
    fn set_workspace(&mut self, _workspace: Option<&Path>) {}
}

/// User settings plus, when a workspace is open, its own settings file.
pub struct HostSettings {
    user: SettingsFile,
    workspace_dir: PathBuf,
    workspace: Option<SettingsFile>,
}

impl HostSettings {
    /// `workspace_dir` is relative to each workspace root, usually `.vscode`.
    pub fn new(user_settings: impl Into<PathBuf>, workspace_dir: impl Into<PathBuf>) -> Self {
        Self {
            user: SettingsFile::new(user_settings),
            workspace_dir: workspace_dir.into(),
            workspace: None,
        }
    }

    pub fn with_workspace(mut self, workspace: Option<&Path>) -> Self {
        self.set_workspace(workspace);
        self
    }

    fn file(&self, scope: Scope) -> Result<&SettingsFile, EntitledError> {
        match scope {
            Scope::Global => Ok(&self.user),
            Scope::Workspace => self
                .workspace
                .as_ref()
                .ok_or_else(|| EntitledError::Settings("no workspace is open".into())),
        }
    }
}

impl TitleStore for HostSettings {
    fn write_title(&mut self, title: &str, scope: Scope) -> Result<(), EntitledError> {
        let file = self.file(scope)?;
        let value = (!title.is_empty()).then(|| Value::String(title.to_string()));
        file.set(TITLE_KEY, value)?;
        log::debug!("wrote {TITLE_KEY} to {} ({scope})", file.path().display());
        Ok(())
    }

    fn set_workspace(&mut self, workspace: Option<&Path>) {
        self.workspace = workspace
            .map(|w| SettingsFile::new(w.join(&self.workspace_dir).join("settings.json")));
    }

    fn title_settings(&self) -> TitleSettings {
        let mut settings = TitleSettings::default();
        settings.apply(&self.user.load_lenient());
        if let Some(ws) = &self.workspace {
            settings.apply(&ws.load_lenient());
        }
        settings
    }
}

/// Write `title` at `scope`, retrying once at global scope if a workspace
/// write fails.
pub fn persist_title(
    store: &mut dyn TitleStore,
    title: &str,
    scope: Scope,
) -> Result<Scope, EntitledError> {
    match store.write_title(title, scope) {
        Ok(()) => Ok(scope),
        Err(e) if scope == Scope::Workspace => {
            log::warn!("failed to update {TITLE_KEY} in workspace settings ({e}), trying global");
            store.write_title(title, Scope::Global)?;
            Ok(Scope::Global)
        }
        Err(e) => Err(e),
    }
}
