use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::Intensity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionId {
    TempCleanup,
    EmptyRecycleBin,
    StartupOptimize,
    BrowserCacheCleanup,
    DiskAnalyze,
    RunNativeCleanup,
    ServiceOptimize,
    SetHighPerformancePower,
}

impl ActionId {
    pub const ALL: [ActionId; 8] = [
        ActionId::TempCleanup,
        ActionId::EmptyRecycleBin,
        ActionId::StartupOptimize,
        ActionId::BrowserCacheCleanup,
        ActionId::DiskAnalyze,
        ActionId::RunNativeCleanup,
        ActionId::ServiceOptimize,
        ActionId::SetHighPerformancePower,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ActionId::TempCleanup => "temp-cleanup",
            ActionId::EmptyRecycleBin => "empty-recycle-bin",
            ActionId::StartupOptimize => "startup-optimize",
            ActionId::BrowserCacheCleanup => "browser-cache-cleanup",
            ActionId::DiskAnalyze => "disk-analyze",
            ActionId::RunNativeCleanup => "run-native-cleanup",
            ActionId::ServiceOptimize => "service-optimize",
            ActionId::SetHighPerformancePower => "set-high-performance-power",
        }
    }

    pub fn parse_canonical(s: &str) -> Option<ActionId> {
        let s = s.trim().to_ascii_lowercase();
        ActionId::ALL.into_iter().find(|id| id.as_str() == s)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    pub intensity: Intensity,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<ActionRequest>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}
