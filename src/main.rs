use clap::Parser;
use entitled::EntitledError;
use entitled::cli::{Cli, Command, ComposeArgs, ResetArgs, UpdateArgs, WindowArgs};
use entitled::compose::{TitleFields, compose};
use entitled::config::{EntitledConfig, load_config, resolve_user_settings};
use entitled::context::{GatherRequest, gather, now_ts};
use entitled::service::{HostEvent, TitleService};
use entitled::settings::{HostSettings, Scope, TitleStore};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("ENTITLED_LOG", "warn"))
        .format_timestamp(None)
        .init();
}

fn gather_request(config: &EntitledConfig, window: WindowArgs) -> GatherRequest {
    GatherRequest {
        workspace: window.workspace,
        workspace_name: window.name,
        active_file: window.file,
        timestamp: config.title.timestamp,
        utc_offset_minutes: config.title.utc_offset_minutes,
    }
}

fn host_settings(config: &EntitledConfig, cli_override: Option<PathBuf>) -> HostSettings {
    HostSettings::new(
        resolve_user_settings(config, cli_override),
        &config.host.workspace_dir,
    )
}

fn handle_compose(args: ComposeArgs) -> Result<(), EntitledError> {
    let fields = TitleFields {
        workspace: args.workspace,
        repo: args.repo,
        branch: args.branch,
        filename: args.filename,
        timestamp: args.timestamp,
    };
    println!("{}", compose(&fields, args.pattern.as_deref(), !args.disabled));
    Ok(())
}

fn handle_fields(config: &EntitledConfig, window: WindowArgs) -> Result<(), EntitledError> {
    let fields = gather(&gather_request(config, window), now_ts());
    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}

fn handle_update(
    config: &EntitledConfig,
    host: HostSettings,
    args: UpdateArgs,
) -> Result<(), EntitledError> {
    let mut service = TitleService::new(host, gather_request(config, args.window));
    let title = service.preview_title();
    if !args.dry_run {
        let scope = service.persist(&title)?;
        log::info!("window title written ({scope})");
    }
    println!("{title}");
    Ok(())
}

fn handle_reset(host: HostSettings, args: ResetArgs) -> Result<(), EntitledError> {
    let mut host = host.with_workspace(args.workspace.as_deref());
    let scope = Scope::for_workspace(args.workspace.as_deref());
    host.reset_title(scope)?;
    log::info!("window title reset ({scope})");
    Ok(())
}

fn print_title(out: &mut impl Write, title: &str) -> std::io::Result<()> {
    writeln!(out, "{title}")?;
    out.flush()
}

fn handle_watch(
    config: &EntitledConfig,
    host: HostSettings,
    window: WindowArgs,
) -> Result<(), EntitledError> {
    let mut service = TitleService::new(host, gather_request(config, window));
    let stdout = std::io::stdout();
    service.on_title_update(move |title: &str| {
        if let Err(e) = print_title(&mut stdout.lock(), title) {
            log::debug!("failed to print title: {e}");
        }
    });
    service.update_title();

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<HostEvent>(&line) {
            Ok(event) => {
                service.handle_event(event);
            }
            Err(e) => log::warn!("skipping malformed event: {e}"),
        }
    }

    service.dispose();
    Ok(())
}

fn run() -> Result<(), EntitledError> {
    let cli = Cli::parse();
    let config = load_config()?;

    let host = host_settings(&config, cli.user_settings);

    match cli.command {
        Command::Compose(args) => handle_compose(args),
        Command::Fields(window) => handle_fields(&config, window),
        Command::Update(args) => handle_update(&config, host, args),
        Command::Reset(args) => handle_reset(host, args),
        Command::Watch(window) => handle_watch(&config, host, window),
    }
}

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("entitled: {e}");
            ExitCode::from(1)
        }
    }
}
