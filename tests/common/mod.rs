#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tempfile::TempDir;

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

impl CmdResult {
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    pub fn lines(&self) -> Vec<&str> {
        self.stdout.lines().collect()
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(self.stdout.trim()).unwrap_or_else(|e| {
            panic!("stdout is not JSON ({e}); log: {}", self.log_path.display())
        })
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_dpm") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "dpm.exe" } else { "dpm" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve dpm binary path for integration test"),
    }
}

/// Isolated data directory plus a config declaring one file-backed host,
/// `local`, stored in `<tmp>/local`.
pub struct Sandbox {
    pub dir: TempDir,
    pub config_path: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::with_hosts("")
    }

    /// Extra `[hosts.*]` tables are appended verbatim.
    pub fn with_hosts(extra: &str) -> Self {
        let dir = tempfile::tempdir().expect("create sandbox dir");
        let config_path = dir.path().join("dpm.toml");
        let config = format!(
            r#"[resources]
data_dir = "{data}"

[prompt]
editor = "true"
colorize = false

[log]
activity_log = "{log}"

[hosts.local]
type = "system"
path = "{local}"
{extra}
"#,
            data = dir.path().join("data").display(),
            log = dir.path().join("activity.jsonl").display(),
            local = dir.path().join("local").display(),
        );
        fs::write(&config_path, config).expect("write sandbox config");
        Self { dir, config_path }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn activity_log(&self) -> Vec<Value> {
        fs::read_to_string(self.dir.path().join("activity.jsonl"))
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).expect("activity line is JSON"))
            .collect()
    }

    /// Store a dashboard straight into the `local` host.
    pub fn seed(&self, id: &str, dashboard: &Value) {
        let dir = self.dir.path().join("local");
        fs::create_dir_all(&dir).expect("create host dir");
        fs::write(
            dir.join(format!("{id}.json")),
            serde_json::to_string_pretty(dashboard).expect("serialize seed"),
        )
        .expect("write seed");
    }

    pub fn stored(&self, id: &str) -> Value {
        let raw = fs::read_to_string(self.dir.path().join("local").join(format!("{id}.json")))
            .expect("read stored dashboard");
        serde_json::from_str(&raw).expect("stored dashboard is JSON")
    }

    pub fn run(&self, case_name: &str, args: &[&str]) -> CmdResult {
        run_cli_case_with_env(case_name, args, &[("DPM_CONFIG", self.config_path.as_os_str())])
    }
}

pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    run_cli_case_with_env(case_name, args, &[])
}

fn run_cli_case_with_env(
    case_name: &str,
    args: &[&str],
    env: &[(&str, &std::ffi::OsStr)],
) -> CmdResult {
    let root = std::env::temp_dir().join("dpm-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command
        .args(args)
        .env_remove("DPM_CONFIG")
        .env_remove("DPM_FORCE")
        .env_remove("DPM_OUTPUT_FORMAT")
        .env("RUST_BACKTRACE", "1")
        .stdin(Stdio::null());
    for (key, value) in env {
        command.env(key, value);
    }
    let output = command.output().expect("execute dpm command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Rows `1-a` (panels 1-aa, 2-ab) and `2-b` (panels 3-ba, 4-bb).
pub fn sample_dashboard(title: &str) -> Value {
    serde_json::json!({
        "title": title,
        "schemaVersion": 16,
        "rows": [
            {"title": "A", "panels": [
                {"id": 1, "title": "AA", "type": "graph"},
                {"id": 2, "title": "AB", "type": "singlestat"}
            ]},
            {"title": "B", "panels": [
                {"id": 3, "title": "BA", "type": "graph"},
                {"id": 4, "title": "BB", "type": "table"}
            ]}
        ]
    })
}
