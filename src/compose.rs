use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Pattern the host ships with. Treated as "no custom pattern configured".
pub const DEFAULT_PATTERN: &str = "{workspace} {branch} {filename} - VSCode";

/// Window title template the host uses when no extension has touched it.
pub const HOST_DEFAULT_TITLE: &str =
    "${dirty}${activeEditorShort}${separator}${rootName}${separator}${appName}";

const APP_NAME: &str = "VSCode";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").unwrap());

/// Contextual values available to a title pattern. Any field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TitleFields {
    pub workspace: String,
    pub repo: String,
    pub branch: String,
    pub filename: String,
    pub timestamp: String,
}

impl TitleFields {
    /// Look up a field by its placeholder name. Unknown names yield "".
    pub fn get(&self, name: &str) -> &str {
        match name {
            "workspace" => &self.workspace,
            "repo" => &self.repo,
            "branch" => &self.branch,
            "filename" => &self.filename,
            "timestamp" => &self.timestamp,
            _ => "",
        }
    }
}

/// `workspace [branch] filename - VSCode`, skipping empty parts.
pub fn compose_default(fields: &TitleFields) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(3);
    if !fields.workspace.is_empty() {
        parts.push(fields.workspace.clone());
    }
    if !fields.branch.is_empty() {
        parts.push(format!("[{}]", fields.branch));
    }
    if !fields.filename.is_empty() {
        parts.push(fields.filename.clone());
    }

    if parts.is_empty() {
        APP_NAME.into()
    } else {
        format!("{} - {APP_NAME}", parts.join(" "))
    }
}

/// Substitute every `{a || b || c}` placeholder with the first candidate whose
/// value is non-blank. Text outside placeholders passes through untouched.
pub fn compose_custom(pattern: &str, fields: &TitleFields) -> String {
    PLACEHOLDER
        .replace_all(pattern, |caps: &regex::Captures| {
            resolve_chain(&caps[1], fields).to_string()
        })
        .into_owned()
}

fn resolve_chain<'a>(expr: &str, fields: &'a TitleFields) -> &'a str {
    expr.split("||")
        .map(|name| fields.get(name.trim()))
        .find(|value| !value.trim().is_empty())
        .unwrap_or("")
}

/// Top-level title composition.
///
/// Returns "" when customization is disabled, meaning the host default should
/// apply. A configured pattern overrides the built-in layout unless it is
/// blank or equal to [`DEFAULT_PATTERN`].
pub fn compose(fields: &TitleFields, configured_pattern: Option<&str>, enabled: bool) -> String {
    if !enabled {
        return String::new();
    }
    match configured_pattern {
        Some(p) if !p.trim().is_empty() && p != DEFAULT_PATTERN => compose_custom(p, fields),
        _ => compose_default(fields),
    }
}
