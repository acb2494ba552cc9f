use std::path::{Path, PathBuf};

use sysinfo::{Disks, System};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::cleanup::{self, LARGE_FILE_MIN_BYTES};
use crate::core::{LargeFile, MemoryInfo, OsInfo, SystemReport, VolumeInfo, is_protected_name};
use crate::platform;

pub fn probe(home_dir: &Path) -> SystemReport {
    let generated_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    SystemReport {
        schema_version: "1.0".to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        os: os_info(),
        generated_at,
        memory: memory_info(),
        volumes: volume_info(),
        large_temp_files: large_files_in(&probe_temp_roots(home_dir), LARGE_FILE_MIN_BYTES),
    }
}

pub fn os_info() -> OsInfo {
    OsInfo {
        name: System::name().unwrap_or_else(|| "unknown".to_string()),
        version: System::os_version().unwrap_or_else(|| "unknown".to_string()),
    }
}

fn memory_info() -> Option<MemoryInfo> {
    let mut sys = System::new();
    sys.refresh_memory();

    let total = sys.total_memory();
    if total == 0 {
        return None;
    }
    let available = sys.available_memory();
    let used_percent = (total.saturating_sub(available)) as f64 / total as f64 * 100.0;

    Some(MemoryInfo {
        total_bytes: total,
        available_bytes: available,
        used_percent,
    })
}

fn volume_info() -> Vec<VolumeInfo> {
    let disks = Disks::new_with_refreshed_list();
    let mut volumes = Vec::new();

    for disk in disks.list() {
        let total = disk.total_space();
        if total == 0 {
            continue;
        }
        let free = disk.available_space();
        let mount = disk.mount_point().display().to_string();
        if volumes
            .iter()
            .any(|v: &VolumeInfo| v.mount_point == mount)
        {
            continue;
        }
        volumes.push(VolumeInfo {
            name: disk.name().to_string_lossy().to_string(),
            mount_point: mount,
            total_bytes: total,
            free_bytes: free,
            used_percent: (total.saturating_sub(free)) as f64 / total as f64 * 100.0,
        });
    }

    volumes
}

pub fn fixed_volume_mounts() -> Vec<PathBuf> {
    let disks = Disks::new_with_refreshed_list();
    let mut mounts = Vec::new();
    for disk in disks.list() {
        let mount = disk.mount_point().to_path_buf();
        if !mounts.contains(&mount) {
            mounts.push(mount);
        }
    }
    mounts
}

pub fn probe_temp_roots(home_dir: &Path) -> Vec<PathBuf> {
    let candidates = [
        platform::env_dir("TEMP"),
        platform::env_dir("SystemRoot").map(|r| r.join("Temp")),
        Some(cleanup::local_app_data(home_dir).join("Temp")),
    ];

    let mut roots = Vec::new();
    for candidate in candidates.into_iter().flatten() {
        if !candidate.is_dir() {
            continue;
        }
        if !roots.contains(&candidate) {
            roots.push(candidate);
        }
    }
    roots
}

pub fn large_files_in(roots: &[PathBuf], min_bytes: u64) -> Vec<LargeFile> {
    let mut found = Vec::new();

    for root in roots {
        let Ok(entries) = std::fs::read_dir(root) else {
            continue;
        };
        for entry in entries.flatten() {
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if !meta.is_file() || meta.len() <= min_bytes {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_protected_name(&name) {
                continue;
            }
            found.push(LargeFile {
                path: entry.path().display().to_string(),
                bytes: meta.len(),
            });
        }
    }

    found.sort_by_key(|f| std::cmp::Reverse(f.bytes));
    found
}

fn gb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0 * 1024.0) * 100.0).round() / 100.0
}

fn mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

pub fn render_for_prompt(report: &SystemReport) -> String {
    let mut out = String::new();

    out.push_str("=== Información del Sistema ===\n");
    out.push_str(&format!(
        "Sistema operativo: {} {}\n",
        report.os.name, report.os.version
    ));

    out.push_str("\n--- Memoria ---\n");
    match &report.memory {
        Some(mem) => {
            out.push_str(&format!("Total: {} GB\n", gb(mem.total_bytes)));
            out.push_str(&format!("Disponible: {} GB\n", gb(mem.available_bytes)));
            out.push_str(&format!("En uso: {:.1}%\n", mem.used_percent));
        }
        None => out.push_str("desconocida\n"),
    }

    out.push_str("\n--- Almacenamiento (resumen) ---\n");
    if report.volumes.is_empty() {
        out.push_str("desconocido\n");
    }
    for vol in &report.volumes {
        out.push_str(&format!("Partición {} ({}):\n", vol.name, vol.mount_point));
        out.push_str(&format!("  Total: {} GB\n", gb(vol.total_bytes)));
        out.push_str(&format!("  Libre: {} GB\n", gb(vol.free_bytes)));
        out.push_str(&format!("  Uso: {:.1}%\n", vol.used_percent));
    }

    out.push_str("\n--- Archivos Temporales Grandes (>100MB) ---\n");
    if report.large_temp_files.is_empty() {
        out.push_str("(ninguno)\n");
    }
    for file in &report.large_temp_files {
        out.push_str(&format!("- {} MB: {}\n", mb(file.bytes), file.path));
    }

    out
}
