use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "entitled",
    version,
    about = "Contextual window titles for your editor",
    after_help = "Clock timestamps are UTC unless `title.utc_offset_minutes` is set in ~/.entitled/config.toml."
)]
pub struct Cli {
    /// User-level settings.json
    #[arg(long, env = "ENTITLED_USER_SETTINGS", global = true)]
    pub user_settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compose a title from explicit field values
    Compose(ComposeArgs),
    /// Show the fields gathered for a workspace and file as JSON
    Fields(WindowArgs),
    /// Compose the title for a workspace and write it to settings
    Update(UpdateArgs),
    /// Restore the editor's default window title
    Reset(ResetArgs),
    /// Read host events (one JSON object per line) from stdin and keep the title in sync
    Watch(WindowArgs),
}

#[derive(Parser)]
pub struct ComposeArgs {
    #[arg(long, default_value = "")]
    pub workspace: String,

    #[arg(long, default_value = "")]
    pub repo: String,

    #[arg(long, default_value = "")]
    pub branch: String,

    #[arg(long, default_value = "")]
    pub filename: String,

    #[arg(long, default_value = "")]
    pub timestamp: String,

    /// Title pattern, e.g. "{workspace || repo} [{branch}] {filename}"
    #[arg(long)]
    pub pattern: Option<String>,

    /// Behave as if customization is turned off (prints an empty line)
    #[arg(long)]
    pub disabled: bool,
}

#[derive(Parser)]
pub struct WindowArgs {
    /// Workspace folder (omit when no folder is open)
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Display name for the workspace; defaults to the folder name
    #[arg(long)]
    pub name: Option<String>,

    /// Active file
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Parser)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    /// Print the title without touching settings
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct ResetArgs {
    /// Workspace folder whose settings should be reset (global when omitted)
    #[arg(long)]
    pub workspace: Option<PathBuf>,
}
