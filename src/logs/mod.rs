use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::{Plan, PlanReport};

#[derive(Debug, Serialize)]
struct PlanApplyLog {
    schema_version: &'static str,
    tool_version: String,
    command: &'static str,
    started_at: String,
    finished_at: String,
    status: String,
    plan_source: String,
    requested: Vec<PlanApplyRequest>,
    outcome: Vec<PlanApplyEntry>,
    total_freed_bytes: u64,
}

#[derive(Debug, Serialize)]
struct PlanApplyRequest {
    action: String,
    intensity: String,
}

#[derive(Debug, Serialize)]
struct PlanApplyEntry {
    action: String,
    outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    freed_bytes: Option<u64>,
}

pub fn logs_dir(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/windiet/logs")
}

pub fn write_plan_apply_log(
    home_dir: &Path,
    started_at: OffsetDateTime,
    finished_at: OffsetDateTime,
    plan_source: &str,
    plan: &Plan,
    report: &PlanReport,
) -> Result<PathBuf> {
    let dir = logs_dir(home_dir);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("ログディレクトリの作成に失敗しました: {}", dir.display()))?;

    let pid = std::process::id();
    let ts = finished_at.unix_timestamp_nanos();
    let file_name = format!("plan-apply-{pid}-{ts}.json");
    let path = dir.join(file_name);

    let log = PlanApplyLog {
        schema_version: "1.0",
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        command: "plan",
        started_at: started_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string()),
        finished_at: finished_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string()),
        status: report.status().to_string(),
        plan_source: plan_source.to_string(),
        requested: plan
            .actions
            .iter()
            .map(|r| PlanApplyRequest {
                action: r.action.clone(),
                intensity: r.intensity.to_string(),
            })
            .collect(),
        outcome: report
            .entries
            .iter()
            .map(|e| PlanApplyEntry {
                action: e.action.clone(),
                outcome: e.outcome.clone(),
                freed_bytes: e.freed_bytes,
            })
            .collect(),
        total_freed_bytes: report.total_freed_bytes(),
    };

    let buf = serde_json::to_vec_pretty(&log).context("ログ(JSON)のシリアライズに失敗しました")?;
    std::fs::write(&path, buf)
        .with_context(|| format!("ログの書き込みに失敗しました: {}", path.display()))?;
    Ok(path)
}

pub fn log_hint(log_path: &Path, home_dir: &Path) -> String {
    log_path
        .strip_prefix(home_dir)
        .map(|p| format!("~/{}", p.display()))
        .unwrap_or_else(|_| log_path.display().to_string())
}
