// End-to-end tests for the `panelmerge` binary.
// Run with: cargo test -p panelmerge-cli --test cli_tests

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const EMAIL_MODE_CSV: &str = "\
Email,Flag Reason,User_REF,Lucid_Reference,Country
a@x.com,speeder,U1,L1,US
b@x.com,straightliner,,,
c@x.com,gibberish,U2,L2,DE
";

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Binary with a scratch config dir, so a real user mapping file never leaks in.
fn panelmerge(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_panelmerge"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("PANELMERGE_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    panelmerge(home).args(args).output().expect("spawn panelmerge")
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn path_str(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn run_email_mode_writes_csv() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("out.csv");
    let out = run(
        dir.path(),
        &[
            "run",
            path_str(&fixture("bad_emails.csv")),
            path_str(&fixture("user_data.csv")),
            "-o",
            path_str(&out_path),
        ],
    );

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(std::fs::read_to_string(&out_path).unwrap(), EMAIL_MODE_CSV);

    let err = stderr(&out);
    assert!(err.contains("Bad responses: bad_emails.csv (3 rows)"), "{err}");
    assert!(err.contains("a@x.com, b@x.com, c@x.com"), "{err}");
    assert!(err.contains("User data: user_data.csv (3 rows, 8 columns)"), "{err}");
    assert!(err.contains("Summary: 3 total, 2 matched, 1 unmatched (3 output rows)"), "{err}");
    assert!(err.contains("warning: 1 bad response(s) had no matching user data"), "{err}");
    assert!(err.contains("<missing>"), "preview should mark unmatched cells: {err}");
    assert!(err.contains("wrote"), "{err}");
}

#[test]
fn run_reference_mode_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("refs.csv");
    let out = run(
        dir.path(),
        &[
            "run",
            path_str(&fixture("bad_refs.csv")),
            path_str(&fixture("user_data.csv")),
            "--key",
            "reference",
            "--json",
            "-o",
            path_str(&out_path),
        ],
    );
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let report: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(report["summary"]["total"], 3);
    assert_eq!(report["summary"]["matched"], 2);
    assert_eq!(report["summary"]["unmatched"], 1);
    assert_eq!(report["meta"]["key"], "reference");
    assert_eq!(report["mapping"]["bad_responses_key"]["label"], "User REF");
    assert_eq!(report["mime"], "text/csv");
    assert_eq!(report["output"], path_str(&out_path));

    let csv = std::fs::read_to_string(&out_path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("User REF,Survey,Flag Reason,Email,Lucid_Reference,Country"));
    assert_eq!(lines.next(), Some("U2,S-100,speeder,c@x.com,L2,DE"));
    assert_eq!(lines.next(), Some("U9,S-100,duplicate,,,"));
    assert_eq!(lines.next(), Some("U1,S-101,,a@x.com,L1,US"));
}

#[test]
fn run_out_dir_uses_timestamped_name() {
    let dir = tempfile::tempdir().unwrap();
    let exports = dir.path().join("exports");
    std::fs::create_dir(&exports).unwrap();

    let out = run(
        dir.path(),
        &[
            "run",
            path_str(&fixture("bad_emails.csv")),
            path_str(&fixture("user_data.csv")),
            "--out-dir",
            path_str(&exports),
            "--quiet",
        ],
    );
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let names: Vec<String> = std::fs::read_dir(&exports)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("consolidated_bad_responses_"), "{names:?}");
    assert!(names[0].ends_with(".csv"), "{names:?}");
}

#[test]
fn run_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(
        dir.path(),
        &[
            "run",
            path_str(&fixture("bad_emails.csv")),
            path_str(&fixture("user_data.csv")),
            "-o",
            "-",
            "--quiet",
        ],
    );
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), EMAIL_MODE_CSV);
    // Quiet keeps the unmatched warning
    assert!(stderr(&out).contains("warning: 1 bad response(s)"));
    assert!(!stderr(&out).contains("Summary:"));
}

#[test]
fn run_missing_marker() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(
        dir.path(),
        &[
            "run",
            path_str(&fixture("bad_emails.csv")),
            path_str(&fixture("user_data.csv")),
            "-o",
            "-",
            "--quiet",
            "--missing",
            "N/A",
        ],
    );
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("b@x.com,straightliner,N/A,N/A,N/A\n"));
}

#[test]
fn json_and_stdout_csv_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(
        dir.path(),
        &[
            "run",
            path_str(&fixture("bad_emails.csv")),
            path_str(&fixture("user_data.csv")),
            "-o",
            "-",
            "--json",
        ],
    );
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn insufficient_columns_exit_5_with_checklist() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(
        dir.path(),
        &[
            "run",
            path_str(&fixture("bad_emails.csv")),
            path_str(&fixture("user_data_short.csv")),
            "-o",
            path_str(&dir.path().join("never.csv")),
        ],
    );
    assert_eq!(out.status.code(), Some(5));

    let err = stderr(&out);
    assert!(err.contains("error: user data file doesn't have enough columns"), "{err}");
    assert_eq!(err.lines().filter(|l| l.starts_with("hint:")).count(), 3, "{err}");
    assert!(err.contains("positions B, C, F and H"), "{err}");
    assert!(!dir.path().join("never.csv").exists());
}

#[test]
fn unsupported_format_exit_3() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("bad.pdf");
    std::fs::write(&pdf, b"%PDF-1.4").unwrap();

    let out = run(dir.path(), &["run", path_str(&pdf), path_str(&fixture("user_data.csv"))]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("unsupported file format '.pdf'"));
}

#[test]
fn missing_input_exit_2() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(
        dir.path(),
        &["run", path_str(&dir.path().join("nope.csv")), path_str(&fixture("user_data.csv"))],
    );
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("cannot read"));
}

#[test]
fn fail_on_unmatched_exit_8_still_writes() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("out.csv");
    let out = run(
        dir.path(),
        &[
            "run",
            path_str(&fixture("bad_emails.csv")),
            path_str(&fixture("user_data.csv")),
            "-o",
            path_str(&out_path),
            "--fail-on-unmatched",
        ],
    );
    assert_eq!(out.status.code(), Some(8));
    assert_eq!(std::fs::read_to_string(&out_path).unwrap(), EMAIL_MODE_CSV);
}

#[test]
fn config_file_remaps_columns() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("short.toml");
    std::fs::write(
        &config,
        "[user_data]\nreference = 1\nemail = 2\nlucid_reference = 3\ncountry = 4\n",
    )
    .unwrap();

    let out = run(
        dir.path(),
        &[
            "run",
            path_str(&fixture("bad_emails.csv")),
            path_str(&fixture("user_data_short.csv")),
            "--config",
            path_str(&config),
            "-o",
            "-",
            "--quiet",
        ],
    );
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).starts_with("Email,Flag Reason,User_REF,Lucid_Reference,Country\na@x.com,speeder,U1,L1,US\n"));
}

#[test]
fn user_config_dir_is_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    let conf_dir = dir.path().join(".config").join("panelmerge");
    std::fs::create_dir_all(&conf_dir).unwrap();
    std::fs::write(conf_dir.join("mapping.toml"), "key = \"reference\"\n").unwrap();

    let out = run(dir.path(), &["mapping", "--json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let mapping: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    // Only meaningful where dirs honours XDG_CONFIG_HOME
    if cfg!(target_os = "linux") {
        assert_eq!(mapping["key"], "reference");
    }
}

#[test]
fn invalid_config_exit_7() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "[output]\ncountry = \"\"\n").unwrap();

    let out = run(
        dir.path(),
        &[
            "run",
            path_str(&fixture("bad_emails.csv")),
            path_str(&fixture("user_data.csv")),
            "--config",
            path_str(&config),
        ],
    );
    assert_eq!(out.status.code(), Some(7));
    assert!(stderr(&out).contains("output.country must not be empty"), "{}", stderr(&out));
}

#[test]
fn inspect_lists_columns() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["inspect", path_str(&fixture("user_data.csv")), "--rows", "2"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let text = stdout(&out);
    assert!(text.contains("Rows:    3"), "{text}");
    assert!(text.contains("Columns: 8"), "{text}");
    assert!(text.contains("  H   Country"), "{text}");
    assert!(text.contains("... 1 more row(s)"), "{text}");
}

#[test]
fn inspect_json() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["inspect", path_str(&fixture("user_data_short.csv")), "--json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let report: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(report["rows"], 1);
    assert_eq!(report["columns"].as_array().unwrap().len(), 5);
    assert_eq!(report["columns"][4]["letter"], "E");
    assert_eq!(report["preview"][0][2], "a@x.com");
}

#[test]
fn mapping_prints_defaults_as_toml() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["mapping"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let text = stdout(&out);
    assert!(text.contains("key = \"email\""), "{text}");
    assert!(text.contains("on_duplicate = \"fan_out\""), "{text}");
    assert!(text.contains("country = 7"), "{text}");
    assert!(stderr(&out).contains("built-in defaults"));
}

#[test]
fn mapping_json_with_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["mapping", "--json", "--key", "reference", "--on-duplicate", "first-match"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let mapping: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(mapping["key"], "reference");
    assert_eq!(mapping["on_duplicate"], "first_match");
    assert_eq!(mapping["user_data"]["lucid_reference"], 5);
}
