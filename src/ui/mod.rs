use anyhow::Error;
use std::io::{self, Write};
use std::path::Path;

use crate::core::{LargeFile, Plan, PlanReport, SystemReport};

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub color: bool,
    pub stdin_is_tty: bool,
    pub stdout_is_tty: bool,
    pub stderr_is_tty: bool,
    pub max_table_rows: usize,
    pub quiet: bool,
    pub verbose: bool,
}

pub fn eprintln_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "エラー:");
    let _ = writeln!(stderr, "  {err}");

    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "原因:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }

    let _ = writeln!(stderr, "次に:");
    let _ = writeln!(
        stderr,
        "  - 詳細を見るには `--verbose` を付けて再実行してください"
    );
    let _ = writeln!(
        stderr,
        "  - 利用可能なコマンド/オプションは `windiet --help` を参照してください"
    );
}

pub fn mask_home(path: &Path, home_dir: &Path, mask: bool) -> String {
    if !mask {
        return path.display().to_string();
    }

    let Ok(stripped) = path.strip_prefix(home_dir) else {
        return path.display().to_string();
    };
    let stripped = stripped.display().to_string();
    if stripped.is_empty() {
        "~".to_string()
    } else {
        format!("~/{stripped}")
    }
}

pub fn print_system_report(report: &SystemReport, cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }

    let mut out = io::stdout().lock();
    let _ = writeln!(out, "OS: {} {}", report.os.name, report.os.version);

    match &report.memory {
        Some(mem) => {
            let _ = writeln!(
                out,
                "メモリ: 合計={}  空き={}  使用率={:.1}%",
                format_bytes(mem.total_bytes),
                format_bytes(mem.available_bytes),
                mem.used_percent
            );
        }
        None => {
            let _ = writeln!(out, "メモリ: 不明");
        }
    }

    if report.volumes.is_empty() {
        let _ = writeln!(out, "ボリューム: 不明");
    }
    for vol in &report.volumes {
        let _ = writeln!(
            out,
            "ボリューム {} ({}): 合計={}  空き={}  使用率={:.1}%",
            vol.name,
            vol.mount_point,
            format_bytes(vol.total_bytes),
            format_bytes(vol.free_bytes),
            vol.used_percent
        );
    }

    let _ = writeln!(out);
    if report.large_temp_files.is_empty() {
        let _ = writeln!(out, "一時ディレクトリに100MB超のファイルはありません。");
    } else {
        let _ = writeln!(
            out,
            "一時ディレクトリの大きなファイル（{}件）:",
            report.large_temp_files.len()
        );
        for file in report.large_temp_files.iter().take(cfg.max_table_rows) {
            let _ = writeln!(out, "- {}: {}", format_bytes(file.bytes), file.path);
        }
    }
}

pub fn print_plan(plan: &Plan, cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }

    let mut out = io::stdout().lock();
    if plan.is_empty() {
        let _ = writeln!(out, "プランにアクションがありません。");
        return;
    }

    let _ = writeln!(out, "最適化プラン（{}件）:", plan.len());
    for (index, request) in plan.actions.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {}（強度: {}）",
            index + 1,
            request.action,
            request.intensity
        );
    }
}

pub fn print_plan_report(report: &PlanReport, cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }

    let mut out = io::stdout().lock();
    let _ = writeln!(out, "=== 最適化結果 ===");
    if report.is_empty() {
        let _ = writeln!(out, "実行されたアクションはありません。");
        return;
    }

    for entry in &report.entries {
        let outcome = colorize_outcome(&entry.outcome, cfg.color);
        let _ = writeln!(out, "- {}: {}", entry.action, outcome);
    }

    let freed = report.total_freed_bytes();
    if freed > 0 {
        let _ = writeln!(out, "合計解放: {}", format_bytes(freed));
    }
}

pub fn print_large_files(
    files: &[LargeFile],
    cfg: &UiConfig,
    top_n: usize,
    home_dir: &Path,
    mask: bool,
) {
    if cfg.quiet {
        return;
    }

    let mut out = io::stdout().lock();
    if files.is_empty() {
        let _ = writeln!(out, "100MB超のファイルは見つかりませんでした。");
        return;
    }

    let rows = top_n.min(files.len()).max(1);
    if files.len() > rows {
        let _ = writeln!(
            out,
            "大きなファイル（{rows}件表示 / 全{}件）:",
            files.len()
        );
    } else {
        let _ = writeln!(out, "大きなファイル（{rows}件表示）:");
    }
    for file in files.iter().take(rows) {
        let shown = mask_home(Path::new(&file.path), home_dir, mask);
        let _ = writeln!(out, "- {}: {}", format_bytes(file.bytes), shown);
    }
}

fn colorize_outcome(outcome: &str, color: bool) -> String {
    if !color {
        return outcome.to_string();
    }
    let code = if outcome.starts_with("エラー") || outcome.starts_with("認識できない") {
        "31"
    } else {
        "32"
    };
    format!("\x1b[{code}m{outcome}\x1b[0m")
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    const TB: f64 = GB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        return format!("{bytes} B");
    }
    if b < MB {
        return format!("{:.1} KiB", b / KB);
    }
    if b < GB {
        return format!("{:.1} MiB", b / MB);
    }
    if b < TB {
        return format!("{:.1} GiB", b / GB);
    }
    format!("{:.1} TiB", b / TB)
}
