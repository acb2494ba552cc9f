use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

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
    let uniq = format!("windiet-plan-test-{}-{seq}", std::process::id());
    let home = temp.join(uniq);
    let _ = std::fs::remove_dir_all(&home);
    std::fs::create_dir_all(&home).expect("create home");
    home
}

fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdirs");
    }
    std::fs::write(path, bytes).expect("write");
}

fn age_file(path: &Path, days: u64) {
    let mtime = SystemTime::now()
        .checked_sub(Duration::from_secs(days * 24 * 60 * 60))
        .expect("mtime");
    let f = std::fs::File::options()
        .write(true)
        .open(path)
        .expect("open");
    f.set_modified(mtime).expect("set mtime");
}

fn run_plan(home: &Path, temp_root: &Path, extra: &[&str], text: &str) -> Output {
    windiet_cmd(home)
        .env("TEMP", temp_root)
        .args(["plan", "--text", text])
        .args(extra)
        .output()
        .expect("run windiet")
}

#[test]
fn unrecognized_and_valid_action_both_execute() {
    let home = make_temp_home();
    let temp_root = home.join("sandbox-temp");
    write_file(&temp_root.join("old.tmp"), &[0u8; 16]);
    write_file(&temp_root.join("fresh.tmp"), &[0u8; 16]);
    age_file(&temp_root.join("old.tmp"), 30);

    let out = run_plan(
        &home,
        &temp_root,
        &[],
        r#"{"acciones":[{"tipo":"defragmentar_disco"},{"tipo":"limpieza_temporales","intensidad":"alta"}]}"#,
    );
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("認識できないアクションです"), "stdout={stdout}");
    assert!(stdout.contains("解放しました"), "stdout={stdout}");
    assert!(!temp_root.join("old.tmp").exists());
    assert!(temp_root.join("fresh.tmp").exists());

    let logs_dir = home.join(".config/windiet/logs");
    let logs: Vec<_> = std::fs::read_dir(&logs_dir)
        .expect("logs dir")
        .collect();
    assert_eq!(logs.len(), 1);

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn valid_action_is_unaffected_by_following_invalid_one() {
    let home = make_temp_home();
    let temp_root = home.join("sandbox-temp");
    write_file(&temp_root.join("old.tmp"), &[0u8; 32]);
    age_file(&temp_root.join("old.tmp"), 30);

    let out = run_plan(
        &home,
        &temp_root,
        &["--json"],
        r#"{"acciones":[{"tipo":"limpieza_temporales","intensidad":"alta"},{"tipo":"defragmentar_disco"}]}"#,
    );
    assert!(out.status.success());

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("parse json");
    let entries = v.get("entries").and_then(|e| e.as_array()).expect("entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["action"], "limpieza_temporales");
    assert!(
        entries[0]["outcome"]
            .as_str()
            .unwrap()
            .contains("解放しました")
    );
    assert_eq!(entries[0]["freed_bytes"], 32);
    assert_eq!(entries[1]["action"], "defragmentar_disco");
    assert_eq!(entries[1]["outcome"], "認識できないアクションです");

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn repeated_action_executes_twice_and_last_result_wins() {
    let home = make_temp_home();
    let temp_root = home.join("sandbox-temp");
    write_file(&temp_root.join("old.tmp"), &[0u8; 64]);
    age_file(&temp_root.join("old.tmp"), 30);

    let out = run_plan(
        &home,
        &temp_root,
        &["--json"],
        r#"{"acciones":[{"tipo":"limpieza_temporales","intensidad":"alta"},{"tipo":"limpieza_temporales","intensidad":"alta"}]}"#,
    );
    assert!(out.status.success());

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("parse json");
    let entries = v.get("entries").and_then(|e| e.as_array()).expect("entries");
    assert_eq!(entries.len(), 1, "entries={entries:?}");
    assert_eq!(entries[0]["action"], "limpieza_temporales");
    assert_eq!(
        entries[0]["freed_bytes"], 0,
        "second execution found nothing left, and its result overwrites the first"
    );
    assert!(!temp_root.join("old.tmp").exists(), "first execution really ran");

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn plan_without_json_object_fails_with_plan_exit_code() {
    let home = make_temp_home();
    let out = windiet_cmd(&home)
        .args(["plan", "--text", "no hay plan aquí"])
        .output()
        .expect("run windiet");
    assert_eq!(out.status.code(), Some(11));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("プラン"), "stderr={stderr}");

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn empty_plan_succeeds_with_empty_report() {
    let home = make_temp_home();
    let out = windiet_cmd(&home)
        .args(["plan", "--text", r#"{"acciones":[]}"#])
        .output()
        .expect("run windiet");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains("実行されたアクションはありません"),
        "stdout={stdout}"
    );

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn plan_from_file_works_and_dry_run_skips_execution() {
    let home = make_temp_home();
    let temp_root = home.join("sandbox-temp");
    write_file(&temp_root.join("old.tmp"), &[0u8; 16]);
    age_file(&temp_root.join("old.tmp"), 30);

    let plan_path = home.join("plan.json");
    write_file(
        &plan_path,
        br#"{"acciones":[{"tipo":"limpieza_temporales","intensidad":"alta"}]}"#,
    );

    let out = windiet_cmd(&home)
        .env("TEMP", &temp_root)
        .args(["plan", "--dry-run", "--file"])
        .arg(&plan_path)
        .output()
        .expect("run windiet");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("最適化プラン（1件）"), "stdout={stdout}");
    assert!(
        temp_root.join("old.tmp").exists(),
        "dry-run must not delete anything"
    );

    let out = windiet_cmd(&home)
        .env("TEMP", &temp_root)
        .args(["plan", "--file"])
        .arg(&plan_path)
        .output()
        .expect("run windiet");
    assert!(out.status.success());
    assert!(!temp_root.join("old.tmp").exists());

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn plan_requires_exactly_one_source() {
    let home = make_temp_home();

    let out = windiet_cmd(&home)
        .args(["plan"])
        .output()
        .expect("run windiet");
    assert_eq!(out.status.code(), Some(2));

    let out = windiet_cmd(&home)
        .args(["plan", "--text", "{}", "--file", "x.json"])
        .output()
        .expect("run windiet");
    assert_eq!(out.status.code(), Some(2));

    let _ = std::fs::remove_dir_all(&home);
}
