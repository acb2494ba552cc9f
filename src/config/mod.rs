use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub ui: UiConfig,
    pub advisor: AdvisorConfig,
    pub cleanup: CleanupConfig,
    pub privacy: PrivacyConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UiConfig {
    pub color: bool,
    pub max_table_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvisorConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f64,
    pub num_predict: u32,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupConfig {
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrivacyConfig {
    pub mask_home: bool,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            ui: UiConfig {
                color: true,
                max_table_rows: 20,
            },
            advisor: AdvisorConfig {
                endpoint: "http://localhost:11434".to_string(),
                model: "phi3:mini".to_string(),
                temperature: 0.7,
                num_predict: 1000,
                timeout_secs: 300,
                max_retries: 2,
            },
            cleanup: CleanupConfig { exclude: vec![] },
            privacy: PrivacyConfig { mask_home: true },
            config_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    ui: Option<RawUiConfig>,
    advisor: Option<RawAdvisorConfig>,
    cleanup: Option<RawCleanupConfig>,
    privacy: Option<RawPrivacyConfig>,
}

#[derive(Debug, Deserialize)]
struct RawUiConfig {
    color: Option<bool>,
    max_table_rows: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawAdvisorConfig {
    endpoint: Option<String>,
    model: Option<String>,
    temperature: Option<f64>,
    num_predict: Option<u32>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawCleanupConfig {
    exclude: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawPrivacyConfig {
    mask_home: Option<bool>,
}

pub fn default_config_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/windiet/config.toml")
}

pub fn load(config_path: Option<&Path>, home_dir: &Path) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::default();

    let path = config_path
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| default_config_path(home_dir));

    if path.exists() {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("設定ファイルの読み取りに失敗しました: {}", path.display()))?;
        let raw: RawConfig =
            toml::from_str(&s).context("設定ファイル(TOML)の解析に失敗しました")?;
        apply_raw_config(&mut cfg, raw);
        cfg.config_path = Some(path.display().to_string());
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig) {
    if let Some(ui) = raw.ui {
        if let Some(color) = ui.color {
            cfg.ui.color = color;
        }
        if let Some(max_table_rows) = ui.max_table_rows {
            cfg.ui.max_table_rows = max_table_rows;
        }
    }

    if let Some(advisor) = raw.advisor {
        if let Some(endpoint) = advisor.endpoint {
            cfg.advisor.endpoint = endpoint;
        }
        if let Some(model) = advisor.model {
            cfg.advisor.model = model;
        }
        if let Some(temperature) = advisor.temperature {
            cfg.advisor.temperature = temperature;
        }
        if let Some(num_predict) = advisor.num_predict {
            cfg.advisor.num_predict = num_predict;
        }
        if let Some(timeout_secs) = advisor.timeout_secs {
            cfg.advisor.timeout_secs = timeout_secs;
        }
        if let Some(max_retries) = advisor.max_retries {
            cfg.advisor.max_retries = max_retries;
        }
    }

    if let Some(cleanup) = raw.cleanup {
        if let Some(exclude) = cleanup.exclude {
            cfg.cleanup.exclude = exclude;
        }
    }

    if let Some(privacy) = raw.privacy {
        if let Some(mask_home) = privacy.mask_home {
            cfg.privacy.mask_home = mask_home;
        }
    }
}

fn apply_env_overrides(cfg: &mut EffectiveConfig) -> Result<()> {
    if let Ok(v) = std::env::var("WINDIET_UI_COLOR") {
        cfg.ui.color = parse_bool(&v).with_context(|| "WINDIET_UI_COLOR")?;
    }
    if let Ok(v) = std::env::var("WINDIET_UI_MAX_TABLE_ROWS") {
        cfg.ui.max_table_rows = v
            .trim()
            .parse::<usize>()
            .with_context(|| "WINDIET_UI_MAX_TABLE_ROWS")?;
    }
    if let Ok(v) = std::env::var("WINDIET_ADVISOR_ENDPOINT") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.advisor.endpoint = v.to_string();
        }
    }
    if let Ok(v) = std::env::var("WINDIET_ADVISOR_MODEL") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.advisor.model = v.to_string();
        }
    }
    if let Ok(v) = std::env::var("WINDIET_ADVISOR_TIMEOUT_SECS") {
        cfg.advisor.timeout_secs = v
            .trim()
            .parse::<u64>()
            .with_context(|| "WINDIET_ADVISOR_TIMEOUT_SECS")?;
    }
    if let Ok(v) = std::env::var("WINDIET_ADVISOR_MAX_RETRIES") {
        cfg.advisor.max_retries = v
            .trim()
            .parse::<u32>()
            .with_context(|| "WINDIET_ADVISOR_MAX_RETRIES")?;
    }
    if let Ok(v) = std::env::var("WINDIET_CLEANUP_EXCLUDE") {
        let parts: Vec<String> = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        if !parts.is_empty() {
            cfg.cleanup.exclude = parts;
        }
    }
    if let Ok(v) = std::env::var("WINDIET_PRIVACY_MASK_HOME") {
        cfg.privacy.mask_home = parse_bool(&v).with_context(|| "WINDIET_PRIVACY_MASK_HOME")?;
    }

    Ok(())
}

fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "真偽値が不正です: {s}（true|false|1|0|yes|no|on|off を指定してください）"
        )),
    }
}

pub fn render_effective(cfg: &EffectiveConfig) -> Result<String> {
    toml::to_string_pretty(cfg).context("設定のシリアライズに失敗しました")
}
