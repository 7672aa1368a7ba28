//! CLI surface for dpm: argument model, output contract and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::control;
use serde_json::{Value, json};
use thiserror::Error;

use dashboard_path_manager::cli::output::render_document;
use dashboard_path_manager::cli::transfer::{self, EditOutcome, Transferred};
use dashboard_path_manager::cli::{confirmer, template_path};
use dashboard_path_manager::core::config::Config;
use dashboard_path_manager::core::errors::DpmError;
use dashboard_path_manager::core::paths::{self, ROOT_PATH};
use dashboard_path_manager::core::prompt::Confirm;
use dashboard_path_manager::logger::{EventType, JsonlConfig, JsonlWriter, LogEntry};
use dashboard_path_manager::resources::{Resources, SaveOutcome};

/// Dashboard Path Manager: browse and edit dashboards like files.
#[derive(Debug, Parser)]
#[command(
    name = "dpm",
    author,
    version,
    about = "Dashboard Path Manager - navigate, copy and template dashboards by path",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Current path that relative paths are resolved against.
    #[arg(long, global = true, value_name = "PATH", default_value = ROOT_PATH)]
    cwd: String,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Overwrite without asking.
    #[arg(short, long, global = true)]
    force: bool,
    /// Report every transferred document on stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// List resources under a path.
    Ls(PathArgs),
    /// Display a document's content.
    Cat(RequiredPathArgs),
    /// Copy documents; the last path is the destination.
    Cp(TransferArgs),
    /// Move documents; the last path is the destination.
    Mv(TransferArgs),
    /// Remove a document.
    Rm(RequiredPathArgs),
    /// Save a document as a template.
    Template(RequiredPathArgs),
    /// Set the position of a row in a dashboard or a panel in a row.
    Pos(PosArgs),
    /// Export every document under a path into a directory.
    Backup(BackupArgs),
    /// Import every file of a backup directory under a path.
    Restore(RestoreArgs),
    /// Export a document (or `/remote/<host>/<pattern>`) to files.
    Export(ExportArgs),
    /// Import a document (or `<dir>/<pattern>`) from files.
    Import(ImportArgs),
    /// Edit a document in $EDITOR.
    Edit(RequiredPathArgs),
    /// Inspect configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct PathArgs {
    /// Resource path (defaults to the current path).
    path: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct RequiredPathArgs {
    /// Resource path.
    path: String,
}

#[derive(Debug, Clone, Args)]
struct TransferArgs {
    /// Replace the destination child with the same slug instead of appending.
    #[arg(short = 'm', long)]
    match_slug: bool,
    /// Source paths followed by the destination path.
    #[arg(required = true, num_args = 2.., value_name = "PATH")]
    paths: Vec<String>,
}

#[derive(Debug, Clone, Args)]
struct PosArgs {
    /// Path of the row or panel.
    path: String,
    /// Absolute position (`1`) or relative offset (`+1`, `-2`).
    #[arg(allow_hyphen_values = true)]
    position: String,
}

#[derive(Debug, Clone, Args)]
struct BackupArgs {
    /// Resource path whose documents are saved.
    path: String,
    /// Directory receiving one `<name>.json` per document.
    dir: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct RestoreArgs {
    /// Directory produced by `backup`.
    dir: PathBuf,
    /// Resource path to restore under.
    path: String,
}

#[derive(Debug, Clone, Args)]
struct ExportArgs {
    /// Resource path, or `/remote/<host>/<pattern>` for a bulk export.
    path: String,
    /// Target file (target directory for a bulk export).
    file: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ImportArgs {
    /// Replace the destination child with the same slug instead of appending.
    #[arg(short = 'm', long)]
    match_slug: bool,
    /// Source file, or `<dir>/<pattern>` for a bulk import.
    file: String,
    /// Resource path to save to.
    path: String,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failure reported by the library.
    #[error("{0}")]
    Dpm(#[from] DpmError),
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Dpm(DpmError::CommandCancelled) => 0,
            Self::Dpm(e) if e.is_user_error() => 1,
            Self::User(_) => 1,
            Self::Dpm(_) | Self::Json(_) | Self::Io(_) => 2,
        }
    }

    /// Declined confirmations end the command without a message.
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::Dpm(DpmError::CommandCancelled))
    }
}

/// Everything a resource command needs, built once per invocation.
struct Session {
    config: Config,
    resources: Resources,
    confirm: Box<dyn Confirm>,
    log: JsonlWriter,
    cwd: String,
    mode: OutputMode,
    colorize: bool,
    verbose: bool,
    quiet: bool,
}

impl Session {
    fn open(cli: &Cli, mutating: bool) -> Result<Self, CliError> {
        let config = Config::load(cli.config.as_deref())?;
        let colorize = config.prompt.colorize && !cli.no_color && io::stdout().is_terminal();
        control::set_override(colorize);
        let resources = Resources::new(&config)?;
        let log_config = JsonlConfig::from_config(&config);
        let log = if mutating {
            JsonlWriter::open(log_config)
        } else {
            JsonlWriter::disabled(log_config)
        };
        Ok(Self {
            confirm: confirmer(&config, cli.force),
            resources,
            log,
            cwd: paths::normalize(ROOT_PATH, &cli.cwd, None),
            mode: output_mode(cli),
            colorize,
            verbose: cli.verbose,
            quiet: cli.quiet,
            config,
        })
    }

    fn resolve(&self, path: &str) -> String {
        paths::normalize(&self.cwd, path, None)
    }

    fn progress(&self, line: &str) {
        if self.verbose {
            eprintln!("{line}");
        }
    }

    fn record(&mut self, entry: &LogEntry) {
        self.log.write_entry(entry);
    }

    /// Report a finished mutation on stdout.
    fn report(&self, payload: &Value) -> Result<(), CliError> {
        if self.mode == OutputMode::Json {
            write_json_line(payload)?;
        }
        Ok(())
    }

    fn cancelled(&self, path: &str) {
        if !self.quiet && self.mode == OutputMode::Human {
            eprintln!("Cancelled: {path}");
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
        Command::Ls(args) => run_ls(&Session::open(cli, false)?, args),
        Command::Cat(args) => run_cat(&Session::open(cli, false)?, args),
        command => {
            let mut session = Session::open(cli, true)?;
            let result = run_mutation(&mut session, command);
            if let Err(CliError::Dpm(e)) = &result
                && !matches!(e, DpmError::CommandCancelled)
            {
                session.record(&LogEntry::failure(e).details(command_label(command)));
            }
            result
        }
    }
}

fn run_mutation(session: &mut Session, command: &Command) -> Result<(), CliError> {
    match command {
        Command::Cp(args) => run_copy(session, args, false),
        Command::Mv(args) => run_copy(session, args, true),
        Command::Rm(args) => run_rm(session, args),
        Command::Template(args) => run_template(session, args),
        Command::Pos(args) => run_pos(session, args),
        Command::Backup(args) => run_backup(session, args),
        Command::Restore(args) => run_restore(session, args),
        Command::Export(args) => run_export(session, args),
        Command::Import(args) => run_import(session, args),
        Command::Edit(args) => run_edit(session, args),
        Command::Ls(_) | Command::Cat(_) | Command::Config(_) | Command::Completions(_) => Err(
            CliError::User(format!("{} does not modify documents", command_label(command))),
        ),
    }
}

fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Ls(_) => "ls",
        Command::Cat(_) => "cat",
        Command::Cp(_) => "cp",
        Command::Mv(_) => "mv",
        Command::Rm(_) => "rm",
        Command::Template(_) => "template",
        Command::Pos(_) => "pos",
        Command::Backup(_) => "backup",
        Command::Restore(_) => "restore",
        Command::Export(_) => "export",
        Command::Import(_) => "import",
        Command::Edit(_) => "edit",
        Command::Config(_) => "config",
        Command::Completions(_) => "completions",
    }
}

fn outcome_label(outcome: SaveOutcome) -> &'static str {
    match outcome {
        SaveOutcome::Saved => "saved",
        SaveOutcome::Cancelled => "cancelled",
    }
}

fn run_ls(session: &Session, args: &PathArgs) -> Result<(), CliError> {
    let path = session.resolve(args.path.as_deref().unwrap_or_default());
    let entries = session.resources.list(&path)?;
    match session.mode {
        OutputMode::Human => {
            let mut stdout = io::stdout().lock();
            for entry in &entries {
                writeln!(stdout, "{entry}")?;
            }
        }
        OutputMode::Json => write_json_line(&json!({
            "command": "ls",
            "path": path,
            "entries": entries,
        }))?,
    }
    Ok(())
}

fn run_cat(session: &Session, args: &RequiredPathArgs) -> Result<(), CliError> {
    let path = session.resolve(&args.path);
    let document = session.resources.get(&path)?;
    match session.mode {
        OutputMode::Human => {
            println!("{}", render_document(&document.source(), session.colorize));
        }
        OutputMode::Json => write_json_line(&json!({
            "command": "cat",
            "path": path,
            "kind": document.kind().as_str(),
            "document": document.source(),
        }))?,
    }
    Ok(())
}

fn run_copy(session: &mut Session, args: &TransferArgs, remove_source: bool) -> Result<(), CliError> {
    let (destination, sources) = args
        .paths
        .split_last()
        .ok_or_else(|| CliError::User("no destination provided".to_string()))?;
    let destination = session.resolve(destination);
    let (label, event) = if remove_source {
        ("mv", EventType::Move)
    } else {
        ("cp", EventType::Copy)
    };

    let mut fetched = Vec::with_capacity(sources.len());
    for source in sources {
        let source = session.resolve(source);
        let document = session.resources.get(&source)?;
        fetched.push((source, document));
    }

    let mut outcomes = Vec::with_capacity(fetched.len());
    for (source, document) in fetched {
        let started = Instant::now();
        let target = if args.match_slug {
            transfer::match_slug(&session.resources, &document, &destination)?
        } else {
            destination.clone()
        };
        let outcome = session
            .resources
            .save(&target, document, session.confirm.as_ref())?;
        if outcome == SaveOutcome::Cancelled {
            session.cancelled(&target);
        }
        outcomes.push((source, target, outcome, started));
    }

    if remove_source {
        let moved = outcomes
            .iter()
            .filter(|(_, _, outcome, _)| *outcome != SaveOutcome::Cancelled)
            .map(|(source, ..)| source.clone())
            .collect();
        for source in transfer::removal_order(moved) {
            session.resources.remove(&source)?;
        }
    }

    for (source, target, outcome, started) in outcomes {
        if outcome != SaveOutcome::Cancelled {
            session.progress(&format!("{label}: {source} -> {target}"));
            session.record(
                &LogEntry::done(event, started)
                    .source(source.as_str())
                    .destination(target.as_str()),
            );
        }
        session.report(&json!({
            "command": label,
            "source": source,
            "destination": target,
            "outcome": outcome_label(outcome),
        }))?;
    }
    Ok(())
}

fn run_rm(session: &mut Session, args: &RequiredPathArgs) -> Result<(), CliError> {
    let started = Instant::now();
    let path = session.resolve(&args.path);
    session.resources.remove(&path)?;
    session.progress(&format!("rm: {path}"));
    session.record(&LogEntry::done(EventType::Remove, started).source(path.as_str()));
    session.report(&json!({"command": "rm", "path": path}))
}

fn run_template(session: &mut Session, args: &RequiredPathArgs) -> Result<(), CliError> {
    let started = Instant::now();
    let path = session.resolve(&args.path);
    let document = session.resources.get(&path)?;
    let destination = template_path(document.kind());
    let outcome = session
        .resources
        .save(&destination, document, session.confirm.as_ref())?;
    if outcome == SaveOutcome::Cancelled {
        session.cancelled(&destination);
    } else {
        session.progress(&format!("template: {path} -> {destination}"));
        session.record(
            &LogEntry::done(EventType::Template, started)
                .source(path.as_str())
                .destination(destination.as_str()),
        );
    }
    session.report(&json!({
        "command": "template",
        "source": path,
        "destination": destination,
        "outcome": outcome_label(outcome),
    }))
}

fn run_pos(session: &mut Session, args: &PosArgs) -> Result<(), CliError> {
    let started = Instant::now();
    let path = session.resolve(&args.path);
    session.resources.move_child(&path, &args.position)?;
    session.progress(&format!("pos: {path} -> {}", args.position));
    session.record(
        &LogEntry::done(EventType::Position, started)
            .source(path.as_str())
            .position(args.position.as_str()),
    );
    session.report(&json!({"command": "pos", "path": path, "position": args.position}))
}

fn report_transfers(
    session: &mut Session,
    label: &str,
    event: EventType,
    started: Instant,
    items: &[Transferred],
) -> Result<(), CliError> {
    let mut saved = 0;
    for item in items {
        if item.outcome == SaveOutcome::Cancelled {
            session.cancelled(&item.path);
        } else {
            saved += 1;
            session.progress(&format!("{label}: {} <-> {}", item.path, item.file.display()));
        }
    }
    session.record(&LogEntry::done(event, started).count(saved));
    let listed: Vec<Value> = items
        .iter()
        .map(|item| {
            json!({
                "path": item.path,
                "file": item.file.to_string_lossy(),
                "outcome": outcome_label(item.outcome),
            })
        })
        .collect();
    session.report(&json!({"command": label, "items": listed}))
}

fn run_backup(session: &mut Session, args: &BackupArgs) -> Result<(), CliError> {
    let started = Instant::now();
    let path = session.resolve(&args.path);
    let items = transfer::backup(&session.resources, &path, &args.dir)?;
    report_transfers(session, "backup", EventType::Backup, started, &items)
}

fn run_restore(session: &mut Session, args: &RestoreArgs) -> Result<(), CliError> {
    let started = Instant::now();
    let path = session.resolve(&args.path);
    let items = transfer::restore(&session.resources, &args.dir, &path, session.confirm.as_ref())?;
    report_transfers(session, "restore", EventType::Restore, started, &items)
}

fn run_export(session: &mut Session, args: &ExportArgs) -> Result<(), CliError> {
    let started = Instant::now();
    let path = session.resolve(&args.path);
    if transfer::has_wildcard(&path) {
        let items = transfer::export_all(&session.resources, &path, args.file.as_deref())?;
        return report_transfers(session, "export", EventType::Export, started, &items);
    }

    let file = args
        .file
        .as_deref()
        .ok_or_else(|| CliError::User("no file provided".to_string()))?;
    transfer::export(&session.resources, &path, file)?;
    let file = file.to_string_lossy().into_owned();
    session.progress(&format!("export: {path} -> {file}"));
    session.record(
        &LogEntry::done(EventType::Export, started)
            .source(path.as_str())
            .destination(file.as_str()),
    );
    session.report(&json!({"command": "export", "path": path, "file": file}))
}

fn run_import(session: &mut Session, args: &ImportArgs) -> Result<(), CliError> {
    let started = Instant::now();
    let path = session.resolve(&args.path);
    if transfer::has_wildcard(&args.file) {
        let items = transfer::import_all(
            &session.resources,
            &args.file,
            &path,
            session.confirm.as_ref(),
        )?;
        return report_transfers(session, "import", EventType::Import, started, &items);
    }

    let (destination, outcome) = transfer::import(
        &session.resources,
        Path::new(&args.file),
        &path,
        args.match_slug,
        session.confirm.as_ref(),
    )?;
    if outcome == SaveOutcome::Cancelled {
        session.cancelled(&destination);
    } else {
        session.progress(&format!("import: {} -> {destination}", args.file));
        session.record(
            &LogEntry::done(EventType::Import, started)
                .source(args.file.as_str())
                .destination(destination.as_str()),
        );
    }
    session.report(&json!({
        "command": "import",
        "file": args.file,
        "destination": destination,
        "outcome": outcome_label(outcome),
    }))
}

fn run_edit(session: &mut Session, args: &RequiredPathArgs) -> Result<(), CliError> {
    let started = Instant::now();
    let path = session.resolve(&args.path);
    let editor = session.config.prompt.editor.clone();
    let outcome = transfer::edit(&session.resources, &path, &editor, session.confirm.as_ref())?;
    let label = match outcome {
        EditOutcome::Saved => {
            session.progress(&format!("edit: {path}"));
            session.record(&LogEntry::done(EventType::Edit, started).destination(path.as_str()));
            "saved"
        }
        EditOutcome::Aborted => {
            if !session.quiet {
                eprintln!("Editor exited with an error; {path} left unchanged.");
            }
            "aborted"
        }
        EditOutcome::Cancelled => {
            session.cancelled(&path);
            "cancelled"
        }
    };
    session.report(&json!({"command": "edit", "path": path, "outcome": label}))
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    let mode = output_mode(cli);
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let config = Config::load(cli.config.as_deref())?;
            let exists = config.source_path.is_some();
            let path = config.source_path.unwrap_or_else(Config::default_path);
            match mode {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => write_json_line(&json!({
                    "command": "config path",
                    "path": path.to_string_lossy(),
                    "exists": exists,
                }))?,
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;
            match mode {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::User(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => write_json_line(&json!({
                    "command": "config show",
                    "config": serde_json::to_value(&config)?,
                }))?,
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let source = config
                    .source_path
                    .as_ref()
                    .map_or_else(|| "(defaults)".to_string(), |p| p.display().to_string());
                match mode {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {source}");
                        println!("  Hosts: {}", config.enabled_hosts().join(", "));
                    }
                    OutputMode::Json => write_json_line(&json!({
                        "command": "config validate",
                        "valid": true,
                        "path": source,
                        "hosts": config.enabled_hosts(),
                    }))?,
                }
                Ok(())
            }
            Err(e) => {
                match mode {
                    OutputMode::Human => eprintln!("Configuration is INVALID: {e}"),
                    OutputMode::Json => write_json_line(&json!({
                        "command": "config validate",
                        "valid": false,
                        "error": e.to_string(),
                        "code": e.code(),
                    }))?,
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("DPM_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        _ => OutputMode::Human,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_before_and_after_subcommand() {
        let before = Cli::try_parse_from([
            "dpm",
            "--config",
            "/tmp/dpm.toml",
            "--json",
            "--no-color",
            "-v",
            "ls",
        ]);
        assert!(before.is_ok());

        let after = Cli::try_parse_from(["dpm", "ls", "/backups", "--json", "--force", "-q"]);
        assert!(after.is_ok());
    }

    #[test]
    fn parses_every_subcommand() {
        let cases = [
            vec!["dpm", "ls"],
            vec!["dpm", "cat", "/backups/main"],
            vec!["dpm", "cp", "-m", "a", "b", "/backups/main"],
            vec!["dpm", "mv", "a", "b"],
            vec!["dpm", "rm", "/backups/main/1-a"],
            vec!["dpm", "template", "1-a"],
            vec!["dpm", "pos", "1-a", "-1"],
            vec!["dpm", "pos", "2-b", "+1"],
            vec!["dpm", "backup", "/remote/prod", "/tmp/prod"],
            vec!["dpm", "restore", "/tmp/prod", "/remote/prod"],
            vec!["dpm", "export", "/remote/prod/*"],
            vec!["dpm", "export", "/backups/main", "main.json"],
            vec!["dpm", "import", "-m", "main.json", "/backups"],
            vec!["dpm", "edit", "/backups/main"],
            vec!["dpm", "config", "validate"],
            vec!["dpm", "--cwd", "/backups", "cat", "main"],
        ];

        for case in cases {
            let parsed = Cli::try_parse_from(case.clone());
            assert!(parsed.is_ok(), "failed to parse case: {case:?}");
        }
    }

    #[test]
    fn copy_needs_a_destination() {
        assert!(Cli::try_parse_from(["dpm", "cp", "/backups/main"]).is_err());
        assert!(Cli::try_parse_from(["dpm", "pos", "1-a"]).is_err());
    }

    #[test]
    fn completions_support_bash_zsh_and_fish() {
        for shell in ["bash", "zsh", "fish"] {
            let parsed = Cli::try_parse_from(["dpm", "completions", shell]);
            assert!(parsed.is_ok(), "failed shell parse for {shell}");
        }
    }

    #[test]
    fn output_mode_resolution_honors_precedence() {
        assert_eq!(resolve_output_mode(true, Some("human")), OutputMode::Json);
        assert_eq!(resolve_output_mode(false, Some(" JSON ")), OutputMode::Json);
        assert_eq!(resolve_output_mode(false, None), OutputMode::Human);
    }

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(CliError::Dpm(DpmError::CommandCancelled).exit_code(), 0);
        assert!(CliError::Dpm(DpmError::CommandCancelled).is_silent());
        assert_eq!(CliError::Dpm(DpmError::not_found("x")).exit_code(), 1);
        assert_eq!(CliError::User("x".to_string()).exit_code(), 1);
        assert_eq!(
            CliError::Dpm(DpmError::Transport {
                details: "refused".to_string()
            })
            .exit_code(),
            2
        );
    }
}
