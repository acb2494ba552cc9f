use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

const SCRUBBED_ENV: [&str; 14] = [
    "TEMP",
    "TMP",
    "SystemRoot",
    "LOCALAPPDATA",
    "APPDATA",
    "WINDIET_CONFIG",
    "WINDIET_UI_COLOR",
    "WINDIET_UI_MAX_TABLE_ROWS",
    "WINDIET_ADVISOR_ENDPOINT",
    "WINDIET_ADVISOR_MODEL",
    "WINDIET_ADVISOR_TIMEOUT_SECS",
    "WINDIET_ADVISOR_MAX_RETRIES",
    "WINDIET_CLEANUP_EXCLUDE",
    "WINDIET_PRIVACY_MASK_HOME",
];

fn windiet_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_windiet"));
    cmd.env("USERPROFILE", home);
    cmd.env("HOME", home);
    for var in SCRUBBED_ENV {
        cmd.env_remove(var);
    }
    cmd
}

fn make_temp_home() -> PathBuf {
    static HOME_SEQ: AtomicU64 = AtomicU64::new(0);

    let temp = std::env::temp_dir();
    let seq = HOME_SEQ.fetch_add(1, Ordering::Relaxed);
    let uniq = format!("windiet-report-test-{}-{seq}", std::process::id());
    let home = temp.join(uniq);
    let _ = std::fs::remove_dir_all(&home);
    std::fs::create_dir_all(&home).expect("create home");
    home
}

fn write_sparse_file(path: &Path, len: u64) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdirs");
    }
    let f = std::fs::File::create(path).expect("create");
    f.set_len(len).expect("set len");
}

#[test]
fn report_json_has_expected_shape() {
    let home = make_temp_home();

    let out = windiet_cmd(&home)
        .args(["report", "--json"])
        .output()
        .expect("run windiet");
    assert!(out.status.success());

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("parse json");
    assert_eq!(v["schema_version"], "1.0");
    assert!(v["os"]["name"].is_string());
    assert!(v["os"]["version"].is_string());
    assert!(v["generated_at"].is_string());
    assert!(v["volumes"].is_array());
    assert!(v["large_temp_files"].is_array());

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn report_lists_large_temp_files_but_never_protected_names() {
    let home = make_temp_home();
    let temp_root = home.join("t");
    write_sparse_file(&temp_root.join("huge.iso"), 150 * 1024 * 1024);
    write_sparse_file(&temp_root.join("pagefile.sys"), 300 * 1024 * 1024);
    write_sparse_file(&temp_root.join("small.txt"), 1024);

    let out = windiet_cmd(&home)
        .env("TEMP", &temp_root)
        .args(["report", "--json"])
        .output()
        .expect("run windiet");
    assert!(out.status.success());

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("parse json");
    let files = v["large_temp_files"].as_array().expect("array");
    assert_eq!(files.len(), 1, "files={files:?}");
    assert!(
        files[0]["path"].as_str().unwrap().ends_with("huge.iso"),
        "files={files:?}"
    );
    assert_eq!(files[0]["bytes"], 150 * 1024 * 1024);

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn human_readable_report_mentions_missing_large_files() {
    let home = make_temp_home();

    let out = windiet_cmd(&home)
        .args(["report"])
        .output()
        .expect("run windiet");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("OS:"), "stdout={stdout}");
    assert!(
        stdout.contains("一時ディレクトリに100MB超のファイルはありません。"),
        "stdout={stdout}"
    );

    let _ = std::fs::remove_dir_all(&home);
}
