use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub name: String,
    pub mount_point: String,
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeFile {
    pub path: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemReport {
    pub schema_version: String,
    pub tool_version: String,
    pub os: OsInfo,
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryInfo>,
    pub volumes: Vec<VolumeInfo>,
    pub large_temp_files: Vec<LargeFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub action: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freed_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanReport {
    pub entries: Vec<PlanEntry>,
}

impl PlanReport {
    pub fn record(&mut self, action: &str, outcome: String, freed_bytes: Option<u64>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.action == action) {
            entry.outcome = outcome;
            entry.freed_bytes = freed_bytes;
            return;
        }
        self.entries.push(PlanEntry {
            action: action.to_string(),
            outcome,
            freed_bytes,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.outcome.starts_with("エラー"))
    }

    pub fn status(&self) -> &'static str {
        if self.has_errors() { "partial_error" } else { "ok" }
    }

    pub fn total_freed_bytes(&self) -> u64 {
        self.entries
            .iter()
            .filter_map(|e| e.freed_bytes)
            .fold(0u64, u64::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_preserves_insertion_order() {
        let mut report = PlanReport::default();
        report.record("limpieza_temporales", "ok".to_string(), Some(10));
        report.record("analizar_disco", "ok".to_string(), None);
        report.record("vaciar_papelera", "ok".to_string(), None);

        let order: Vec<&str> = report.entries.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(
            order,
            vec!["limpieza_temporales", "analizar_disco", "vaciar_papelera"]
        );
    }

    #[test]
    fn record_overwrites_in_place_last_write_wins() {
        let mut report = PlanReport::default();
        report.record("limpieza_temporales", "10 MB".to_string(), Some(10));
        report.record("analizar_disco", "ok".to_string(), None);
        report.record("limpieza_temporales", "2 MB".to_string(), Some(2));

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].action, "limpieza_temporales");
        assert_eq!(report.entries[0].outcome, "2 MB");
        assert_eq!(report.entries[0].freed_bytes, Some(2));
        assert_eq!(report.entries[1].action, "analizar_disco");
    }

    #[test]
    fn status_reflects_per_action_errors() {
        let mut report = PlanReport::default();
        report.record("a", "ok".to_string(), None);
        assert_eq!(report.status(), "ok");
        report.record("b", "エラー: 失敗しました".to_string(), None);
        assert_eq!(report.status(), "partial_error");
        assert!(report.has_errors());
    }
}
