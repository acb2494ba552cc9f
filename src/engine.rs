use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use crate::advisor::AdvisorClient;
use crate::cleanup::{self, CleanOutcome, CleanupPaths};
use crate::config::EffectiveConfig;
use crate::core::{Intensity, LargeFile, Plan, PlanReport, SystemReport};
use crate::dispatch::{AliasTable, DispatchContext, Dispatcher};
use crate::probe;
use crate::startup::{self, StartupOutcome};

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub show_progress: bool,
}

pub struct Engine {
    opts: EngineOptions,
    home_dir: PathBuf,
    cfg: EffectiveConfig,
}

impl Engine {
    pub fn new(opts: EngineOptions, cfg: EffectiveConfig) -> Result<Self> {
        let home_dir = crate::platform::effective_home_dir()?;
        Ok(Self {
            opts,
            home_dir,
            cfg,
        })
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn mask_home(&self) -> bool {
        self.cfg.privacy.mask_home
    }

    pub fn config(&self) -> &EffectiveConfig {
        &self.cfg
    }

    fn spinner(&self, message: &str) -> Option<indicatif::ProgressBar> {
        use std::io::IsTerminal;
        if !(self.opts.show_progress && std::io::stderr().is_terminal()) {
            return None;
        }
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }

    pub fn probe(&self) -> SystemReport {
        let pb = self.spinner("システム情報を収集中...");
        let report = probe::probe(&self.home_dir);
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        report
    }

    pub fn advisor_client(&self) -> Result<AdvisorClient> {
        AdvisorClient::new(&self.cfg.advisor)
    }

    pub fn fetch_plan_text(&self, report: &SystemReport) -> Result<String> {
        let client = self.advisor_client()?;
        let pb = self.spinner("最適化プランを問い合わせ中...（数分かかることがあります）");
        let result = client.fetch_plan_text(report);
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        result
    }

    pub fn cleanup_paths(&self) -> CleanupPaths {
        CleanupPaths::resolve(&self.home_dir)
    }

    pub fn clean_temp(&self, intensity: Intensity) -> CleanOutcome {
        cleanup::clean_temp(&self.cleanup_paths(), intensity)
    }

    pub fn clean_browser_caches(&self, intensity: Intensity) -> CleanOutcome {
        cleanup::clean_browser_caches(&self.cleanup_paths(), intensity)
    }

    pub fn preview_startup(&self, intensity: Intensity) -> Result<StartupOutcome> {
        startup::preview_startup(intensity)
    }

    pub fn prune_startup(&self, intensity: Intensity) -> Result<StartupOutcome> {
        startup::prune_startup(intensity)
    }

    pub fn analyze_disk(&self) -> Result<Vec<LargeFile>> {
        cleanup::analyze_disk(&probe::fixed_volume_mounts(), &self.cfg.cleanup.exclude)
    }

    pub fn run_plan(&self, plan: &Plan) -> PlanReport {
        let ctx = DispatchContext {
            paths: self.cleanup_paths(),
            mount_points: probe::fixed_volume_mounts(),
            excludes: self.cfg.cleanup.exclude.clone(),
        };
        Dispatcher::new(AliasTable::default(), ctx).execute(plan)
    }
}
