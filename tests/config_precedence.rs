use std::path::{Path, PathBuf};
use std::process::{Command, Output};
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

fn run(home: &Path, args: &[&str]) -> Output {
    windiet_cmd(home).args(args).output().expect("run windiet")
}

fn make_temp_home() -> PathBuf {
    static HOME_SEQ: AtomicU64 = AtomicU64::new(0);

    let temp = std::env::temp_dir();
    let seq = HOME_SEQ.fetch_add(1, Ordering::Relaxed);
    let uniq = format!("windiet-config-test-{}-{seq}", std::process::id());
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

#[test]
fn config_show_emits_effective_config_with_defaults() {
    let home = make_temp_home();

    let out = run(&home, &["config", "--show"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("endpoint = \"http://localhost:11434\""), "stdout={stdout}");
    assert!(stdout.contains("model = \"phi3:mini\""), "stdout={stdout}");
    assert!(stdout.contains("timeout_secs = 300"), "stdout={stdout}");

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn config_file_at_default_path_is_loaded() {
    let home = make_temp_home();
    write_file(
        home.join(".config/windiet/config.toml").as_path(),
        br#"
[advisor]
model = "qwen2:0.5b"
max_retries = 5

[ui]
max_table_rows = 3
"#,
    );

    let out = run(&home, &["config", "--show"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("model = \"qwen2:0.5b\""), "stdout={stdout}");
    assert!(stdout.contains("max_retries = 5"), "stdout={stdout}");
    assert!(stdout.contains("max_table_rows = 3"), "stdout={stdout}");
    assert!(stdout.contains("config_path"), "stdout={stdout}");

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn env_overrides_beat_the_config_file() {
    let home = make_temp_home();
    write_file(
        home.join(".config/windiet/config.toml").as_path(),
        br#"
[advisor]
model = "qwen2:0.5b"
"#,
    );

    let out = windiet_cmd(&home)
        .env("WINDIET_ADVISOR_MODEL", "llama3:8b")
        .env("WINDIET_ADVISOR_TIMEOUT_SECS", "60")
        .args(["config", "--show"])
        .output()
        .expect("run windiet");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("model = \"llama3:8b\""), "stdout={stdout}");
    assert!(stdout.contains("timeout_secs = 60"), "stdout={stdout}");

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn explicit_config_flag_beats_default_path() {
    let home = make_temp_home();
    write_file(
        home.join(".config/windiet/config.toml").as_path(),
        b"[advisor]\nmodel = \"default-model\"\n",
    );
    write_file(
        home.join("other.toml").as_path(),
        b"[advisor]\nmodel = \"flag-model\"\n",
    );

    let other = home.join("other.toml");
    let out = windiet_cmd(&home)
        .args(["config", "--show", "--config"])
        .arg(&other)
        .output()
        .expect("run windiet");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("model = \"flag-model\""), "stdout={stdout}");

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn invalid_env_bool_is_an_argument_error() {
    let home = make_temp_home();

    let out = windiet_cmd(&home)
        .env("WINDIET_UI_COLOR", "maybe")
        .args(["config", "--show"])
        .output()
        .expect("run windiet");
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("WINDIET_UI_COLOR"), "stderr={stderr}");

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn malformed_config_file_is_an_argument_error() {
    let home = make_temp_home();
    write_file(
        home.join(".config/windiet/config.toml").as_path(),
        b"not toml at all [",
    );

    let out = run(&home, &["config", "--show"]);
    assert_eq!(out.status.code(), Some(2));

    let _ = std::fs::remove_dir_all(&home);
}
