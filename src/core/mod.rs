mod action;
mod intensity;
mod protected;
mod report;

pub use action::{ActionId, ActionRequest, Plan};
pub use intensity::Intensity;
pub use protected::{PROTECTED_FILES, is_protected_name, is_protected_path};
pub use report::{LargeFile, MemoryInfo, OsInfo, PlanEntry, PlanReport, SystemReport, VolumeInfo};
