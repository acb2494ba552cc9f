use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::core::{Intensity, LargeFile, is_protected_name, is_protected_path};
use crate::platform;

pub const LARGE_FILE_MIN_BYTES: u64 = 100 * 1024 * 1024;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Default)]
pub struct CleanOutcome {
    pub freed_bytes: u64,
    pub removed: Vec<PathBuf>,
    pub errors: u64,
}

impl CleanOutcome {
    fn merge(&mut self, other: CleanOutcome) {
        self.freed_bytes = self.freed_bytes.saturating_add(other.freed_bytes);
        self.removed.extend(other.removed);
        self.errors = self.errors.saturating_add(other.errors);
    }
}

#[derive(Debug, Clone, Default)]
pub struct CleanupPaths {
    pub temp_roots: Vec<PathBuf>,
    pub temp_roots_high: Vec<PathBuf>,
    pub browser_cache_dirs: Vec<PathBuf>,
}

impl CleanupPaths {
    pub fn resolve(home_dir: &Path) -> Self {
        let local = local_app_data(home_dir);

        let temp_roots = dedup_existing(vec![
            platform::env_dir("TEMP"),
            platform::env_dir("TMP"),
            platform::env_dir("SystemRoot").map(|r| r.join("Temp")),
            platform::env_dir("SystemRoot").map(|r| r.join("Prefetch")),
            Some(local.join("Temp")),
        ]);

        let temp_roots_high = dedup_existing(vec![
            Some(local.join("Microsoft").join("Windows").join("INetCache")),
            Some(
                local
                    .join("Microsoft")
                    .join("Edge")
                    .join("User Data")
                    .join("Default")
                    .join("Cache"),
            ),
        ]);

        Self {
            temp_roots,
            temp_roots_high,
            browser_cache_dirs: browser_cache_dirs(home_dir),
        }
    }

    fn temp_roots_for(&self, intensity: Intensity) -> impl Iterator<Item = &PathBuf> {
        let extra = if intensity == Intensity::High {
            self.temp_roots_high.as_slice()
        } else {
            &[]
        };
        self.temp_roots
            .iter()
            .chain(extra.iter().filter(|p| !self.temp_roots.contains(*p)))
    }
}

fn dedup_existing(candidates: Vec<Option<PathBuf>>) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for candidate in candidates.into_iter().flatten() {
        if !candidate.is_dir() {
            continue;
        }
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

pub fn temp_age_threshold(intensity: Intensity) -> Duration {
    match intensity {
        Intensity::Low => 7 * DAY,
        Intensity::Medium => 3 * DAY,
        Intensity::High => DAY,
    }
}

pub fn cache_age_threshold(intensity: Intensity) -> Duration {
    match intensity {
        Intensity::Low => 30 * DAY,
        Intensity::Medium => 14 * DAY,
        Intensity::High => DAY,
    }
}

pub fn local_app_data(home_dir: &Path) -> PathBuf {
    platform::env_dir("LOCALAPPDATA").unwrap_or_else(|| home_dir.join("AppData").join("Local"))
}

pub fn roaming_app_data(home_dir: &Path) -> PathBuf {
    platform::env_dir("APPDATA").unwrap_or_else(|| home_dir.join("AppData").join("Roaming"))
}

pub fn clean_temp(paths: &CleanupPaths, intensity: Intensity) -> CleanOutcome {
    let cutoff = SystemTime::now()
        .checked_sub(temp_age_threshold(intensity))
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut outcome = CleanOutcome::default();
    for root in paths.temp_roots_for(intensity) {
        outcome.merge(clean_dir_children(root, cutoff));
    }
    outcome
}

pub fn clean_dir_children(dir: &Path, cutoff: SystemTime) -> CleanOutcome {
    let mut outcome = CleanOutcome::default();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => {
            outcome.errors = 1;
            return outcome;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => {
                outcome.errors = outcome.errors.saturating_add(1);
                continue;
            }
        };

        let path = entry.path();
        if is_protected_path(&path) {
            continue;
        }

        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(_) => {
                outcome.errors = outcome.errors.saturating_add(1);
                continue;
            }
        };
        let modified = match meta.modified() {
            Ok(modified) => modified,
            Err(_) => {
                outcome.errors = outcome.errors.saturating_add(1);
                continue;
            }
        };
        if modified >= cutoff {
            continue;
        }

        if meta.is_dir() {
            let bytes = dir_size(&path);
            match std::fs::remove_dir_all(&path) {
                Ok(()) => {
                    outcome.freed_bytes = outcome.freed_bytes.saturating_add(bytes);
                    outcome.removed.push(path);
                }
                Err(_) => {
                    outcome.errors = outcome.errors.saturating_add(1);
                }
            }
        } else {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    outcome.freed_bytes = outcome.freed_bytes.saturating_add(meta.len());
                    outcome.removed.push(path);
                }
                Err(_) => {
                    outcome.errors = outcome.errors.saturating_add(1);
                }
            }
        }
    }

    outcome
}

pub fn dir_size(path: &Path) -> u64 {
    let mut bytes: u64 = 0;
    for entry in WalkDir::new(path).follow_links(false) {
        let Ok(entry) = entry else {
            continue;
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(meta) = entry.metadata() {
            bytes = bytes.saturating_add(meta.len());
        }
    }
    bytes
}

fn is_edge_profile_name(name: &str) -> bool {
    name == "Default" || name.starts_with("Profile ")
}

fn is_firefox_profile_name(name: &str) -> bool {
    name.ends_with(".default-release")
}

pub fn browser_cache_dirs(home_dir: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    let edge_root = local_app_data(home_dir)
        .join("Microsoft")
        .join("Edge")
        .join("User Data");
    if let Ok(entries) = std::fs::read_dir(&edge_root) {
        for entry in entries.flatten() {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_edge_profile_name(&name) {
                continue;
            }
            let cache = entry.path().join("Cache");
            if cache.is_dir() {
                dirs.push(cache);
            }
        }
    }

    let firefox_root = roaming_app_data(home_dir)
        .join("Mozilla")
        .join("Firefox")
        .join("Profiles");
    if let Ok(entries) = std::fs::read_dir(&firefox_root) {
        for entry in entries.flatten() {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_firefox_profile_name(&name) {
                continue;
            }
            let cache = entry.path().join("cache2");
            if cache.is_dir() {
                dirs.push(cache);
            }
        }
    }

    dirs.sort();
    dirs
}

pub fn clean_browser_caches(paths: &CleanupPaths, intensity: Intensity) -> CleanOutcome {
    let cutoff = SystemTime::now()
        .checked_sub(cache_age_threshold(intensity))
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut outcome = CleanOutcome::default();
    for dir in &paths.browser_cache_dirs {
        outcome.merge(clean_cache_files(dir, cutoff));
    }
    outcome
}

pub fn clean_cache_files(dir: &Path, cutoff: SystemTime) -> CleanOutcome {
    let mut outcome = CleanOutcome::default();

    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => {
                outcome.errors = outcome.errors.saturating_add(1);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if is_protected_path(entry.path()) {
            continue;
        }

        let Ok(meta) = entry.metadata() else {
            outcome.errors = outcome.errors.saturating_add(1);
            continue;
        };
        let Ok(modified) = meta.modified() else {
            outcome.errors = outcome.errors.saturating_add(1);
            continue;
        };
        if modified >= cutoff {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                outcome.freed_bytes = outcome.freed_bytes.saturating_add(meta.len());
                outcome.removed.push(entry.path().to_path_buf());
            }
            Err(_) => {
                outcome.errors = outcome.errors.saturating_add(1);
            }
        }
    }

    outcome
}

pub fn volume_scan_dirs(mount_point: &Path) -> Vec<PathBuf> {
    [
        mount_point.join("Windows").join("Temp"),
        mount_point.join("Users"),
        mount_point.join("Program Files"),
        mount_point.join("Program Files (x86)"),
        mount_point.join("ProgramData"),
    ]
    .into_iter()
    .filter(|p| p.is_dir())
    .collect()
}

pub fn analyze_disk(mount_points: &[PathBuf], excludes: &[String]) -> Result<Vec<LargeFile>> {
    let exclude_set = build_exclude_set(excludes)?;

    let mut roots = Vec::new();
    for mount in mount_points {
        for dir in volume_scan_dirs(mount) {
            if !roots.contains(&dir) {
                roots.push(dir);
            }
        }
    }

    let mut found = Vec::new();
    for root in roots {
        collect_large_files(&root, LARGE_FILE_MIN_BYTES, &exclude_set, &mut found);
    }

    found.sort_by_key(|f| std::cmp::Reverse(f.bytes));
    Ok(found)
}

pub fn collect_large_files(
    root: &Path,
    min_bytes: u64,
    excludes: &GlobSet,
    out: &mut Vec<LargeFile>,
) {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !excludes.is_match(e.path()));

    for entry in walker {
        let Ok(entry) = entry else {
            continue;
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if is_protected_name(name) {
            continue;
        }
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if meta.len() > min_bytes {
            out.push(LargeFile {
                path: entry.path().display().to_string(),
                bytes: meta.len(),
            });
        }
    }
}

pub fn build_exclude_set(excludes: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in excludes {
        builder.add(Glob::new(pat).with_context(|| format!("exclude glob が不正です: {pat}"))?);
    }
    Ok(builder.build()?)
}
