use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;

use crate::cleanup::{self, CleanupPaths};
use crate::core::{ActionId, Intensity, Plan, PlanReport};
use crate::native;
use crate::startup;
use crate::ui::format_bytes;

#[derive(Debug, Clone)]
pub struct AliasTable {
    map: HashMap<&'static str, ActionId>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let map = HashMap::from([
            ("limpieza_temporales", ActionId::TempCleanup),
            ("vaciar_papelera", ActionId::EmptyRecycleBin),
            ("optimizar_arranque", ActionId::StartupOptimize),
            ("gestion_programas_inicio", ActionId::StartupOptimize),
            ("limpiar_cache_navegadores", ActionId::BrowserCacheCleanup),
            ("limpieza_cache_navegadores", ActionId::BrowserCacheCleanup),
            ("analizar_disco", ActionId::DiskAnalyze),
            ("analisis_disco", ActionId::DiskAnalyze),
            ("ejecutar_cleanmgr", ActionId::RunNativeCleanup),
            ("optimizar_servicios", ActionId::ServiceOptimize),
            ("optimizacion_servicios", ActionId::ServiceOptimize),
            ("configurar_alto_rendimiento", ActionId::SetHighPerformancePower),
            ("configuracion_energia", ActionId::SetHighPerformancePower),
        ]);
        Self { map }
    }
}

impl AliasTable {
    pub fn normalize(&self, raw: &str) -> Option<ActionId> {
        let key = raw.trim().to_ascii_lowercase();
        self.map
            .get(key.as_str())
            .copied()
            .or_else(|| ActionId::parse_canonical(&key))
    }
}

#[derive(Debug, Clone, Default)]
pub struct DispatchContext {
    pub paths: CleanupPaths,
    pub mount_points: Vec<PathBuf>,
    pub excludes: Vec<String>,
}

pub struct Dispatcher {
    aliases: AliasTable,
    ctx: DispatchContext,
}

impl Dispatcher {
    pub fn new(aliases: AliasTable, ctx: DispatchContext) -> Self {
        Self { aliases, ctx }
    }

    pub fn execute(&self, plan: &Plan) -> PlanReport {
        let mut report = PlanReport::default();

        for request in &plan.actions {
            let Some(id) = self.aliases.normalize(&request.action) else {
                report.record(
                    &request.action,
                    "認識できないアクションです".to_string(),
                    None,
                );
                continue;
            };

            let (outcome, freed_bytes) = match self.run_action(id, request.intensity) {
                Ok(pair) => pair,
                Err(err) => (format!("エラー: {err:#}"), None),
            };
            report.record(&request.action, outcome, freed_bytes);
        }

        report
    }

    fn run_action(&self, id: ActionId, intensity: Intensity) -> Result<(String, Option<u64>)> {
        match id {
            ActionId::TempCleanup => {
                let outcome = cleanup::clean_temp(&self.ctx.paths, intensity);
                Ok((clean_summary(&outcome), Some(outcome.freed_bytes)))
            }
            ActionId::BrowserCacheCleanup => {
                let outcome = cleanup::clean_browser_caches(&self.ctx.paths, intensity);
                Ok((clean_summary(&outcome), Some(outcome.freed_bytes)))
            }
            ActionId::DiskAnalyze => {
                let found = cleanup::analyze_disk(&self.ctx.mount_points, &self.ctx.excludes)?;
                Ok((
                    format!("分析完了: 100MB超のファイル {}件", found.len()),
                    None,
                ))
            }
            ActionId::StartupOptimize => {
                let outcome = startup::prune_startup(intensity)?;
                Ok((outcome.summary(), None))
            }
            ActionId::EmptyRecycleBin => {
                native::empty_recycle_bin()?;
                Ok(("ごみ箱を空にしました".to_string(), None))
            }
            ActionId::RunNativeCleanup => {
                native::run_disk_cleanup_tool()?;
                Ok(("システムのクリーンアップが完了しました".to_string(), None))
            }
            ActionId::ServiceOptimize => Ok((native::optimize_services()?, None)),
            ActionId::SetHighPerformancePower => {
                Ok((native::set_high_performance_power()?, None))
            }
        }
    }
}

fn clean_summary(outcome: &cleanup::CleanOutcome) -> String {
    let mut summary = format!(
        "{} を解放しました（{}件削除）",
        format_bytes(outcome.freed_bytes),
        outcome.removed.len()
    );
    if outcome.errors > 0 {
        summary.push_str(&format!("、スキップ{}件", outcome.errors));
    }
    summary
}
