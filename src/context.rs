//! Best-effort extraction of the values a title is composed from.
//!
//! Every function here returns an empty string rather than an error: a
//! missing repository or unreadable file just drops that part of the title.

use crate::compose::TitleFields;
use crate::config::TimestampStyle;
use git2::Repository;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// What the host currently knows about the window.
#[derive(Debug, Clone, Default)]
pub struct GatherRequest {
    pub workspace: Option<PathBuf>,
    /// Display name the host gave the workspace folder, if any.
    pub workspace_name: Option<String>,
    pub active_file: Option<PathBuf>,
    pub timestamp: TimestampStyle,
    /// Minutes added to UTC for clock timestamps.
    pub utc_offset_minutes: i32,
}

pub fn now_ts() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Resolve all title fields for the current window state.
pub fn gather(request: &GatherRequest, now: i64) -> TitleFields {
    let workspace = request.workspace.as_deref();
    let (repo, branch) = match workspace {
        Some(dir) => (repo_name(dir), branch_name(dir)),
        None => (String::new(), String::new()),
    };
    TitleFields {
        workspace: workspace_name(workspace, request.workspace_name.as_deref()),
        repo,
        branch,
        filename: file_name(request.active_file.as_deref()),
        timestamp: timestamp(
            request.timestamp,
            request.active_file.as_deref(),
            now,
            request.utc_offset_minutes,
        ),
    }
}

/// Explicit non-blank name wins, otherwise the folder's base name.
pub fn workspace_name(folder: Option<&Path>, explicit: Option<&str>) -> String {
    if let Some(name) = explicit
        && !name.trim().is_empty()
    {
        return name.into();
    }
    folder.map(base_name).unwrap_or_default()
}

pub fn file_name(path: Option<&Path>) -> String {
    path.map(base_name).unwrap_or_default()
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Current branch of the repository containing `workspace`. Detached HEAD
/// yields "".
pub fn branch_name(workspace: &Path) -> String {
    match branch_from_repo(workspace) {
        Ok(branch) => return branch.unwrap_or_default(),
        Err(e) => log::debug!("git2 branch lookup in {}: {}", workspace.display(), e.message()),
    }
    match branch_from_head_file(workspace) {
        Ok(branch) => branch.unwrap_or_default(),
        Err(e) => {
            log::warn!("failed to read git HEAD in {}: {e}", workspace.display());
            String::new()
        }
    }
}

fn branch_from_repo(workspace: &Path) -> Result<Option<String>, git2::Error> {
    let repo = Repository::discover(workspace)?;
    let head = repo.head()?;
    if !head.is_branch() {
        return Ok(None);
    }
    Ok(head.shorthand().map(String::from))
}

/// Reads `.git/HEAD` directly. Covers unborn branches (fresh `git init`),
/// which libgit2 reports as an error.
fn branch_from_head_file(workspace: &Path) -> std::io::Result<Option<String>> {
    let Some(git_dir) = git_dir(workspace)? else {
        return Ok(None);
    };
    let head = std::fs::read_to_string(git_dir.join("HEAD"))?;
    Ok(head
        .trim()
        .strip_prefix("ref: refs/heads/")
        .map(String::from))
}

/// Locate the git directory for `workspace`, following `gitdir:` files
/// used by worktrees and submodules.
fn git_dir(workspace: &Path) -> std::io::Result<Option<PathBuf>> {
    let dot_git = workspace.join(".git");
    if dot_git.is_dir() {
        return Ok(Some(dot_git));
    }
    if !dot_git.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&dot_git)?;
    Ok(content
        .trim()
        .strip_prefix("gitdir:")
        .map(|p| workspace.join(p.trim())))
}

/// Repository name from the `origin` remote, falling back to the work-tree
/// directory name.
pub fn repo_name(workspace: &Path) -> String {
    match repo_from_git(workspace) {
        Ok(name) => return name,
        Err(e) => log::debug!("git2 repo lookup in {}: {}", workspace.display(), e.message()),
    }
    match origin_from_config_file(workspace) {
        Ok(url) => url.and_then(|u| name_from_remote_url(&u)).unwrap_or_default(),
        Err(e) => {
            log::warn!("failed to read git config in {}: {e}", workspace.display());
            String::new()
        }
    }
}

fn repo_from_git(workspace: &Path) -> Result<String, git2::Error> {
    let repo = Repository::discover(workspace)?;
    if let Ok(remote) = repo.find_remote("origin")
        && let Some(name) = remote.url().and_then(name_from_remote_url)
    {
        return Ok(name);
    }
    Ok(repo.workdir().map(base_name).unwrap_or_default())
}

/// `url` of `[remote "origin"]` read straight from `.git/config`.
fn origin_from_config_file(workspace: &Path) -> std::io::Result<Option<String>> {
    let Some(git_dir) = git_dir(workspace)? else {
        return Ok(None);
    };
    let config = git_dir.join("config");
    if !config.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(config)?;

    let mut in_origin = false;
    for line in content.lines().map(str::trim) {
        if line.starts_with('[') {
            in_origin = line == r#"[remote "origin"]"#;
            continue;
        }
        if in_origin
            && let Some((key, value)) = line.split_once('=')
            && key.trim() == "url"
        {
            return Ok(Some(value.trim().to_string()));
        }
    }
    Ok(None)
}

/// Last path segment of a remote URL without `.git`.
/// Handles `https://host/owner/repo.git`, `git@host:owner/repo` and local paths.
pub fn name_from_remote_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    trimmed
        .rsplit(['/', ':', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .map(String::from)
}

pub fn timestamp(
    style: TimestampStyle,
    active_file: Option<&Path>,
    now: i64,
    utc_offset_minutes: i32,
) -> String {
    match style {
        TimestampStyle::Clock => clock_time(now + i64::from(utc_offset_minutes) * 60),
        TimestampStyle::Relative => active_file
            .and_then(|p| match modified_ts(p) {
                Ok(ts) => Some(relative_age(now - ts)),
                Err(e) => {
                    log::warn!("failed to stat {}: {e}", p.display());
                    None
                }
            })
            .unwrap_or_default(),
        TimestampStyle::None => String::new(),
    }
}

fn modified_ts(path: &Path) -> std::io::Result<i64> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64)
}

/// `HH:MM` for a unix timestamp already shifted to the wanted zone.
pub fn clock_time(ts: i64) -> String {
    let secs = ts.rem_euclid(86400);
    format!("{:02}:{:02}", secs / 3600, (secs % 3600) / 60)
}

pub fn relative_age(secs: i64) -> String {
    match secs {
        s if s < 60 => "just now".into(),
        s if s < 3600 => format!("{}m ago", s / 60),
        s if s < 86400 => format!("{}h ago", s / 3600),
        s => format!("{}d ago", s / 86400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_repo(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        let sig = git2::Signature::now("Test", "test@example.com").unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        {
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
                .unwrap();
        }
        repo
    }

    #[test]
    fn workspace_name_prefers_explicit() {
        let folder = Path::new("/path/to/project-folder");
        assert_eq!(workspace_name(Some(folder), Some("my-project")), "my-project");
        assert_eq!(workspace_name(Some(folder), Some("  ")), "project-folder");
        assert_eq!(workspace_name(Some(folder), None), "project-folder");
        assert_eq!(workspace_name(None, None), "");
    }

    #[test]
    fn file_name_is_base_name() {
        assert_eq!(file_name(Some(Path::new("/path/to/file.ts"))), "file.ts");
        assert_eq!(file_name(None), "");
    }

    #[test]
    fn remote_url_forms() {
        assert_eq!(
            name_from_remote_url("https://github.com/owner/entitled.git").as_deref(),
            Some("entitled")
        );
        assert_eq!(
            name_from_remote_url("git@github.com:owner/entitled").as_deref(),
            Some("entitled")
        );
        assert_eq!(name_from_remote_url("git@host:solo.git").as_deref(), Some("solo"));
        assert_eq!(
            name_from_remote_url("/srv/git/mirror.git/").as_deref(),
            Some("mirror")
        );
        assert_eq!(name_from_remote_url(""), None);
    }

    #[test]
    fn branch_from_committed_repo() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(dir.path());
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.branch("feature/new-feature", &head, false).unwrap();
        repo.set_head("refs/heads/feature/new-feature").unwrap();
        assert_eq!(branch_name(dir.path()), "feature/new-feature");
    }

    #[test]
    fn branch_from_unborn_head() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        repo.set_head("refs/heads/trunk").unwrap();
        assert_eq!(branch_name(dir.path()), "trunk");
    }

    #[test]
    fn detached_head_has_no_branch() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(dir.path());
        let oid = repo.head().unwrap().target().unwrap();
        repo.set_head_detached(oid).unwrap();
        assert_eq!(branch_name(dir.path()), "");
    }

    #[test]
    fn no_repo_means_empty() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert_eq!(branch_name(&missing), "");
        assert_eq!(repo_name(&missing), "");
    }

    #[test]
    fn head_file_fallback() {
        let dir = TempDir::new().unwrap();
        let git = dir.path().join(".git");
        std::fs::create_dir(&git).unwrap();
        std::fs::write(git.join("HEAD"), "ref: refs/heads/release\n").unwrap();
        assert_eq!(branch_from_head_file(dir.path()).unwrap().as_deref(), Some("release"));
    }

    #[test]
    fn config_file_fallback() {
        let dir = TempDir::new().unwrap();
        let git = dir.path().join(".git");
        std::fs::create_dir(&git).unwrap();
        std::fs::write(
            git.join("config"),
            "[core]\n\tbare = false\n[remote \"upstream\"]\n\turl = https://x/other.git\n[remote \"origin\"]\n\turl = git@github.com:me/mine.git\n",
        )
        .unwrap();
        assert_eq!(
            origin_from_config_file(dir.path()).unwrap().as_deref(),
            Some("git@github.com:me/mine.git")
        );
    }

    #[test]
    fn repo_name_from_origin() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(dir.path());
        repo.remote("origin", "https://github.com/acme/widget.git").unwrap();
        assert_eq!(repo_name(dir.path()), "widget");
    }

    #[test]
    fn repo_name_from_workdir_without_remote() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("local-only");
        std::fs::create_dir(&root).unwrap();
        init_repo(&root);
        assert_eq!(repo_name(&root), "local-only");
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(clock_time(0), "00:00");
        assert_eq!(clock_time(9 * 3600 + 41 * 60 + 59), "09:41");
        assert_eq!(clock_time(86400 + 23 * 3600 + 5 * 60), "23:05");
    }

    #[test]
    fn clock_honors_utc_offset() {
        let noon = 12 * 3600;
        assert_eq!(timestamp(TimestampStyle::Clock, None, noon, 0), "12:00");
        assert_eq!(timestamp(TimestampStyle::Clock, None, noon, 120), "14:00");
        assert_eq!(timestamp(TimestampStyle::Clock, None, noon, -330), "06:30");
        assert_eq!(timestamp(TimestampStyle::Clock, None, 30 * 60, -60), "23:30");
    }

    #[test]
    fn relative_formatting() {
        assert_eq!(relative_age(0), "just now");
        assert_eq!(relative_age(-5), "just now");
        assert_eq!(relative_age(300), "5m ago");
        assert_eq!(relative_age(3 * 3600 + 10), "3h ago");
        assert_eq!(relative_age(2 * 86400), "2d ago");
    }

    #[test]
    fn relative_timestamp_needs_a_file() {
        assert_eq!(timestamp(TimestampStyle::Relative, None, 1000, 0), "");
        assert_eq!(
            timestamp(TimestampStyle::Relative, Some(Path::new("/no/such/file")), 1000, 0),
            ""
        );
        assert_eq!(timestamp(TimestampStyle::None, None, 1000, 0), "");
    }

    #[test]
    fn relative_timestamp_from_mtime() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("main.rs");
        std::fs::write(&file, "fn main() {}").unwrap();
        let mtime = modified_ts(&file).unwrap();
        assert_eq!(
            timestamp(TimestampStyle::Relative, Some(&file), mtime + 120, 60),
            "2m ago"
        );
    }

    #[test]
    fn gather_all_fields() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("my-project");
        std::fs::create_dir(&root).unwrap();
        let repo = init_repo(&root);
        repo.remote("origin", "git@github.com:acme/upstream-name.git").unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.branch("dev", &head, false).unwrap();
        repo.set_head("refs/heads/dev").unwrap();

        let request = GatherRequest {
            workspace: Some(root.clone()),
            workspace_name: None,
            active_file: Some(root.join("src").join("index.ts")),
            timestamp: TimestampStyle::Clock,
            utc_offset_minutes: 0,
        };
        let fields = gather(&request, 12 * 3600);
        assert_eq!(
            fields,
            TitleFields {
                workspace: "my-project".into(),
                repo: "upstream-name".into(),
                branch: "dev".into(),
                filename: "index.ts".into(),
                timestamp: "12:00".into(),
            }
        );
    }

    #[test]
    fn gather_without_workspace() {
        let fields = gather(&GatherRequest::default(), 0);
        assert_eq!(fields.workspace, "");
        assert_eq!(fields.repo, "");
        assert_eq!(fields.branch, "");
        assert_eq!(fields.filename, "");
        assert_eq!(fields.timestamp, "00:00");
    }
}
