//! CLI end-to-end tests: every command against a file-backed host.

mod common;

use common::{Sandbox, sample_dashboard};

#[test]
fn help_command_prints_usage() {
    let result = common::run_cli_case("help_command_prints_usage", &["--help"]);
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: dpm [OPTIONS] <COMMAND>"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
}

#[test]
fn subcommand_help_flags_work() {
    let subcommands = [
        "ls", "cat", "cp", "mv", "rm", "template", "pos", "backup", "restore", "export",
        "import", "edit", "config", "completions",
    ];
    for sub in subcommands {
        let result = common::run_cli_case(&format!("help_{sub}"), &[sub, "--help"]);
        assert!(
            result.status.success(),
            "{sub} --help failed; log: {}",
            result.log_path.display()
        );
    }
}

#[test]
fn ls_walks_the_virtual_tree() {
    let sandbox = Sandbox::new();
    sandbox.seed("main", &sample_dashboard("Main"));

    assert_eq!(sandbox.run("ls_root", &["ls"]).lines(), ["backups", "remote", "templates"]);
    assert_eq!(sandbox.run("ls_remote", &["ls", "/remote"]).lines(), ["local"]);
    assert_eq!(
        sandbox.run("ls_host", &["ls", "/remote/local"]).lines(),
        ["main"]
    );
    assert_eq!(
        sandbox
            .run("ls_dashboard", &["--cwd", "/remote/local", "ls", "main"])
            .lines(),
        ["1-a", "2-b"]
    );
    assert_eq!(
        sandbox
            .run("ls_row", &["--cwd", "/remote/local/main", "ls", "../main/2-b"])
            .lines(),
        ["3-ba", "4-bb"]
    );
    assert_eq!(
        sandbox.run("ls_templates", &["ls", "/templates"]).lines(),
        ["dashboards", "rows", "panels"]
    );
}

#[test]
fn invalid_paths_exit_with_user_error() {
    let sandbox = Sandbox::new();
    sandbox.seed("main", &sample_dashboard("Main"));

    let missing = sandbox.run("cat_missing", &["cat", "/remote/local/main/9-x"]);
    assert_eq!(missing.code(), Some(1), "log: {}", missing.log_path.display());
    assert!(missing.stderr.contains("DPM-2002"));

    let unknown_root = sandbox.run("ls_unknown_root", &["ls", "/nowhere"]);
    assert_eq!(unknown_root.code(), Some(1));
    assert!(unknown_root.stderr.contains("DPM-2001"));

    let past_leaf = sandbox.run("ls_past_leaf", &["ls", "/remote/local/main/1-a/1-aa/x"]);
    assert_eq!(past_leaf.code(), Some(1));
}

#[test]
fn cat_prints_sorted_json() {
    let sandbox = Sandbox::new();
    sandbox.seed("main", &sample_dashboard("Main"));

    let human = sandbox.run("cat_human", &["cat", "/remote/local/main/1-a/2-ab"]);
    assert!(human.status.success(), "log: {}", human.log_path.display());
    assert_eq!(
        human.stdout.trim_end(),
        "{\n    \"id\": 2,\n    \"title\": \"AB\",\n    \"type\": \"singlestat\"\n}"
    );

    let json = sandbox.run("cat_json", &["--json", "cat", "/remote/local/main/2-b"]).json();
    assert_eq!(json["kind"], "row");
    assert_eq!(json["document"]["title"], "B");
    assert_eq!(json["document"]["panels"][1]["id"], 4);
}

#[test]
fn cp_and_mv_between_locations() {
    let sandbox = Sandbox::new();
    sandbox.seed("main", &sample_dashboard("Main"));

    let copied = sandbox.run("cp_backup", &["--force", "cp", "/remote/local/main", "/backups"]);
    assert!(copied.status.success(), "log: {}", copied.log_path.display());
    assert_eq!(sandbox.run("ls_backups", &["ls", "/backups"]).lines(), ["main"]);

    let moved = sandbox.run(
        "mv_panel",
        &[
            "--force",
            "mv",
            "/remote/local/main/1-a/2-ab",
            "/remote/local/main/2-b",
        ],
    );
    assert!(moved.status.success(), "log: {}", moved.log_path.display());
    assert_eq!(
        sandbox.run("ls_a", &["ls", "/remote/local/main/1-a"]).lines(),
        ["1-aa"]
    );
    assert_eq!(
        sandbox.run("ls_b", &["ls", "/remote/local/main/2-b"]).lines(),
        ["2-ba", "3-bb", "4-ab"]
    );
    // Opaque panel fields travel with the panel.
    assert_eq!(sandbox.stored("main")["rows"][1]["panels"][2]["type"], "singlestat");

    let events: Vec<String> = sandbox
        .activity_log()
        .iter()
        .map(|entry| entry["event"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(events, ["copy", "move"]);
}

#[test]
fn cp_with_match_slug_replaces_the_existing_row() {
    let sandbox = Sandbox::new();
    sandbox.seed("main", &sample_dashboard("Main"));
    sandbox.seed("other", &sample_dashboard("Other"));

    let result = sandbox.run(
        "cp_match",
        &[
            "--force",
            "cp",
            "-m",
            "/remote/local/other/2-b",
            "/remote/local/main",
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert_eq!(
        sandbox.run("ls_main", &["ls", "/remote/local/main"]).lines(),
        ["1-a", "2-b"]
    );
}

#[test]
fn mv_of_sibling_rows_moves_each_named_row() {
    let sandbox = Sandbox::new();
    let mut main = sample_dashboard("Main");
    main["rows"]
        .as_array_mut()
        .expect("rows array")
        .push(serde_json::json!({"title": "C", "panels": [{"id": 5, "title": "CA"}]}));
    sandbox.seed("main", &main);
    sandbox.seed("other", &sample_dashboard("Other"));

    let moved = sandbox.run(
        "mv_rows",
        &[
            "--force",
            "mv",
            "/remote/local/main/1-a",
            "/remote/local/main/2-b",
            "/remote/local/other",
        ],
    );
    assert!(moved.status.success(), "log: {}", moved.log_path.display());
    assert_eq!(
        sandbox.run("ls_main", &["ls", "/remote/local/main"]).lines(),
        ["1-c"]
    );
    assert_eq!(
        sandbox.run("ls_other", &["ls", "/remote/local/other"]).lines(),
        ["1-a", "2-b", "3-a", "4-b"]
    );
    let other = sandbox.stored("other");
    assert_eq!(other["rows"][2]["panels"][1]["title"], "AB");
    assert_eq!(other["rows"][3]["panels"][0]["title"], "BA");
    assert_eq!(sandbox.stored("main")["rows"][0]["panels"][0]["title"], "CA");
    assert_eq!(sandbox.activity_log().len(), 2);
}

#[test]
fn declined_overwrite_is_silent_and_keeps_data() {
    let sandbox = Sandbox::new();
    sandbox.seed("main", &sample_dashboard("Main"));
    sandbox.seed("other", &sample_dashboard("Other"));

    // stdin is closed, so the confirmation can never read a "y".
    let result = sandbox.run(
        "cp_declined",
        &["cp", "/remote/local/other", "/remote/local/main"],
    );
    assert_eq!(result.code(), Some(0), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("[y/n]"));
    assert!(!result.stderr.contains("dpm:"));
    assert_eq!(sandbox.stored("main")["title"], "Main");
    assert!(sandbox.activity_log().is_empty());
}

#[test]
fn rm_pos_and_template() {
    let sandbox = Sandbox::new();
    sandbox.seed("main", &sample_dashboard("Main"));

    let pos = sandbox.run("pos_row", &["pos", "/remote/local/main/2-b", "-1"]);
    assert!(pos.status.success(), "log: {}", pos.log_path.display());
    assert_eq!(
        sandbox.run("ls_after_pos", &["ls", "/remote/local/main"]).lines(),
        ["1-b", "2-a"]
    );

    let template = sandbox.run("template_row", &["--force", "template", "/remote/local/main/1-b"]);
    assert!(template.status.success(), "log: {}", template.log_path.display());
    assert_eq!(sandbox.run("ls_rows", &["ls", "/templates/rows"]).lines(), ["b"]);
    assert_eq!(
        sandbox.run("ls_row_template", &["ls", "/templates/rows/b"]).lines(),
        ["1-ba", "2-bb"]
    );

    let rm = sandbox.run("rm_row", &["rm", "/remote/local/main/1-b"]);
    assert!(rm.status.success(), "log: {}", rm.log_path.display());
    assert_eq!(
        sandbox.run("ls_after_rm", &["ls", "/remote/local/main"]).lines(),
        ["1-a"]
    );

    let rm_dashboard = sandbox.run("rm_dashboard", &["rm", "/remote/local/main"]);
    assert!(rm_dashboard.status.success());
    assert!(sandbox.run("ls_empty", &["ls", "/remote/local"]).lines().is_empty());
}

#[test]
fn export_import_backup_restore() {
    let sandbox = Sandbox::new();
    sandbox.seed("main", &sample_dashboard("Main"));
    let file = sandbox.path().join("main.json");
    let file_arg = file.to_string_lossy().into_owned();

    let export = sandbox.run("export", &["export", "/remote/local/main", &file_arg]);
    assert!(export.status.success(), "log: {}", export.log_path.display());
    assert!(file.is_file());

    let import = sandbox.run("import", &["--force", "import", &file_arg, "/backups"]);
    assert!(import.status.success(), "log: {}", import.log_path.display());
    assert_eq!(sandbox.run("ls_backups", &["ls", "/backups"]).lines(), ["main"]);

    let archive = sandbox.path().join("archive");
    let archive_arg = archive.to_string_lossy().into_owned();
    let backup = sandbox.run("backup", &["backup", "/remote/local", &archive_arg]);
    assert!(backup.status.success(), "log: {}", backup.log_path.display());
    assert!(archive.join("main.json").is_file());

    assert!(sandbox.run("rm", &["rm", "/remote/local/main"]).status.success());
    let restore = sandbox.run(
        "restore",
        &["--json", "restore", &archive_arg, "/remote/local"],
    );
    assert!(restore.status.success(), "log: {}", restore.log_path.display());
    assert_eq!(restore.json()["items"][0]["outcome"], "saved");
    assert_eq!(sandbox.run("ls_host", &["ls", "/remote/local"]).lines(), ["main"]);
}

#[test]
fn bulk_export_uses_data_dir_by_default() {
    let sandbox = Sandbox::new();
    sandbox.seed("web-1", &sample_dashboard("Web 1"));
    sandbox.seed("web-2", &sample_dashboard("Web 2"));
    sandbox.seed("db", &sample_dashboard("Db"));

    let result = sandbox.run("export_all", &["export", "/remote/local/web-*"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let exports = sandbox.data_dir().join("exports").join("local");
    assert!(exports.join("web-1.json").is_file());
    assert!(exports.join("web-2.json").is_file());
    assert!(!exports.join("db.json").exists());
}

#[test]
fn edit_saves_on_success() {
    let sandbox = Sandbox::new();
    sandbox.seed("main", &sample_dashboard("Main"));
    let result = sandbox.run("edit", &["--force", "--json", "edit", "/remote/local/main/1-a"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert_eq!(result.json()["outcome"], "saved");
}

#[test]
fn config_validate_reports_hosts() {
    let sandbox = Sandbox::new();
    let result = sandbox.run("config_validate", &["--json", "config", "validate"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = result.json();
    assert_eq!(payload["valid"], true);
    assert_eq!(payload["hosts"][0], "local");

    let missing = common::run_cli_case(
        "config_missing",
        &["--config", "/nonexistent/dpm.toml", "ls"],
    );
    assert_eq!(missing.code(), Some(2));
    assert!(missing.stderr.contains("DPM-1002"));
}

#[test]
fn unknown_backend_type_is_rejected_at_load() {
    let sandbox = Sandbox::with_hosts(
        r#"
[hosts.legacy]
type = "mysql"
path = "/tmp/legacy"
"#,
    );
    let result = sandbox.run("unknown_backend", &["ls", "/"]);
    assert_eq!(result.code(), Some(2), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("DPM-1003"));
}

#[test]
fn copies_between_file_and_sqlite_hosts() {
    let scratch = Sandbox::new();
    let db = scratch.path().join("grafana.db");
    let sandbox = Sandbox::with_hosts(&format!(
        "\n[hosts.db]\ntype = \"sqlite\"\npath = \"{}\"\n",
        db.display()
    ));
    sandbox.seed("main", &sample_dashboard("Main"));

    assert_eq!(sandbox.run("ls_hosts", &["ls", "/remote"]).lines(), ["db", "local"]);
    let copied = sandbox.run("cp_sqlite", &["cp", "/remote/local/main", "/remote/db"]);
    assert!(copied.status.success(), "log: {}", copied.log_path.display());
    assert_eq!(sandbox.run("ls_db", &["ls", "/remote/db"]).lines(), ["main"]);
    assert_eq!(
        sandbox.run("ls_db_rows", &["ls", "/remote/db/main/2-b"]).lines(),
        ["3-ba", "4-bb"]
    );
}
