use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::core::{ActionRequest, Intensity, Plan};

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default)]
    acciones: Vec<RawAction>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    #[serde(default)]
    tipo: String,
    #[serde(default)]
    intensidad: Option<String>,
}

pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

pub fn parse_plan(text: &str) -> Result<Plan> {
    let Some(json) = extract_json_object(text) else {
        return Err(anyhow!(
            "応答にプラン(JSON)が見つかりませんでした: {}",
            preview(text)
        ));
    };

    let raw: RawPlan =
        serde_json::from_str(json).context("プラン(JSON)の解析に失敗しました")?;

    let mut actions = Vec::with_capacity(raw.acciones.len());
    for (index, entry) in raw.acciones.into_iter().enumerate() {
        let tipo = entry.tipo.trim().to_string();
        if tipo.is_empty() {
            return Err(anyhow!("アクション名が空です（{}番目）", index + 1));
        }
        let intensity = match entry.intensidad.as_deref().map(str::trim) {
            None | Some("") => Intensity::Medium,
            Some(value) => value
                .parse::<Intensity>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("{}番目のアクション: {tipo}", index + 1))?,
        };
        actions.push(ActionRequest {
            action: tipo,
            intensity,
        });
    }

    Ok(Plan { actions })
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "（空の応答）".to_string();
    }
    let mut end = trimmed.len().min(MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    if end < trimmed.len() {
        format!("{}...", &trimmed[..end])
    } else {
        trimmed.to_string()
    }
}
