use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::core::Intensity;
use crate::platform;

pub const RUN_KEY: &str = r"HKCU\Software\Microsoft\Windows\CurrentVersion\Run";

const REG_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupEntry {
    pub name: String,
    pub command: String,
}

#[derive(Debug, Clone, Default)]
pub struct StartupOutcome {
    pub disabled: Vec<String>,
    pub kept: Vec<String>,
    pub errors: u64,
}

impl StartupOutcome {
    pub fn summary(&self) -> String {
        format!(
            "無効化: {}件, 維持: {}件",
            self.disabled.len(),
            self.kept.len()
        )
    }
}

pub fn parse_run_entries(output: &str) -> Vec<StartupEntry> {
    let mut entries = Vec::new();

    for line in output.lines() {
        if !line.starts_with(' ') && !line.starts_with('\t') {
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(pos) = line.find(" REG_") else {
            continue;
        };
        let name = line[..pos].trim_end();
        if name.is_empty() {
            continue;
        }
        let rest = line[pos..].trim_start();
        let command = match rest.split_once(char::is_whitespace) {
            Some((_type, command)) => command.trim(),
            None => "",
        };

        entries.push(StartupEntry {
            name: name.to_string(),
            command: command.to_string(),
        });
    }

    entries
}

pub fn should_disable(name: &str, intensity: Intensity) -> bool {
    if intensity == Intensity::High {
        return true;
    }
    let name = name.to_ascii_lowercase();
    name.contains("update") || name.contains("cloud")
}

fn query_run_entries() -> Result<Vec<StartupEntry>> {
    let query = platform::run_command("reg", &["query", RUN_KEY], REG_TIMEOUT)?;
    if query.exit_code != 0 {
        return Err(anyhow!(
            "スタートアップ項目の列挙に失敗しました（exit_code={}）: {}",
            query.exit_code,
            query.stderr.trim()
        ));
    }
    Ok(parse_run_entries(&query.stdout))
}

pub fn preview_startup(intensity: Intensity) -> Result<StartupOutcome> {
    let mut outcome = StartupOutcome::default();
    for entry in query_run_entries()? {
        if should_disable(&entry.name, intensity) {
            outcome.disabled.push(entry.name);
        } else {
            outcome.kept.push(entry.name);
        }
    }
    Ok(outcome)
}

pub fn prune_startup(intensity: Intensity) -> Result<StartupOutcome> {
    let entries = query_run_entries()?;

    let mut outcome = StartupOutcome::default();
    for entry in entries {
        if !should_disable(&entry.name, intensity) {
            outcome.kept.push(entry.name);
            continue;
        }

        let deleted =
            platform::run_command("reg", &["delete", RUN_KEY, "/v", &entry.name, "/f"], REG_TIMEOUT);
        match deleted {
            Ok(out) if out.exit_code == 0 => outcome.disabled.push(entry.name),
            _ => {
                outcome.errors = outcome.errors.saturating_add(1);
                outcome.kept.push(entry.name);
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\r\nHKEY_CURRENT_USER\\Software\\Microsoft\\Windows\\CurrentVersion\\Run\r\n    OneDrive    REG_SZ    \"C:\\Users\\u\\OneDrive.exe\" /background\r\n    Adobe Updater    REG_EXPAND_SZ    %ProgramFiles%\\Adobe\\updater.exe\r\n    SecurityHealth    REG_SZ    %windir%\\system32\\SecurityHealthSystray.exe\r\n\r\n";

    #[test]
    fn parses_reg_query_value_lines() {
        let entries = parse_run_entries(SAMPLE);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["OneDrive", "Adobe Updater", "SecurityHealth"]);
        assert_eq!(
            entries[0].command,
            "\"C:\\Users\\u\\OneDrive.exe\" /background"
        );
        assert_eq!(entries[1].command, "%ProgramFiles%\\Adobe\\updater.exe");
    }

    #[test]
    fn ignores_key_header_and_blank_lines() {
        let entries = parse_run_entries("HKEY_CURRENT_USER\\...\\Run\r\n\r\n");
        assert!(entries.is_empty());
    }

    #[test]
    fn heuristic_disables_update_and_cloud_names() {
        assert!(should_disable("Adobe Updater", Intensity::Medium));
        assert!(should_disable("CLOUDSYNC", Intensity::Low));
        assert!(!should_disable("SecurityHealth", Intensity::Medium));
        assert!(!should_disable("OneDrive", Intensity::Low));
    }

    #[test]
    fn high_intensity_disables_everything() {
        assert!(should_disable("SecurityHealth", Intensity::High));
        assert!(should_disable("anything", Intensity::High));
    }

    #[test]
    fn summary_counts_both_sides() {
        let outcome = StartupOutcome {
            disabled: vec!["a".to_string(), "b".to_string()],
            kept: vec!["c".to_string()],
            errors: 0,
        };
        assert_eq!(outcome.summary(), "無効化: 2件, 維持: 1件");
    }
}
