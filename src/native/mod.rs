use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::platform::{self, CommandOutput};
use crate::retry::RetryPolicy;

pub const NONESSENTIAL_SERVICES: [&str; 3] = ["DiagTrack", "dmwappushservice", "MapsBroker"];

const HIGH_PERFORMANCE_SCHEME: &str = "8c5e7fda-e8bf-4a96-9a85-a6e23a8c635c";
const ALTERNATE_SCHEME: &str = "SCHEME_MIN";

const CLEANMGR_TIMEOUT: Duration = Duration::from_secs(300);
const CONTROL_TIMEOUT: Duration = Duration::from_secs(30);

pub fn run_disk_cleanup_tool() -> Result<()> {
    RetryPolicy::native().run("cleanmgr", || {
        let out = platform::run_command("cleanmgr", &["/sagerun:1"], CLEANMGR_TIMEOUT)?;
        if out.exit_code != 0 {
            return Err(anyhow!(
                "cleanmgr が失敗しました（exit_code={}）: {}",
                out.exit_code,
                out.stderr.trim()
            ));
        }
        Ok(())
    })
}

pub fn service_not_found(query: &CommandOutput) -> bool {
    query.exit_code == 1060
        || query.stderr.contains("FAILED 1060")
        || query.stdout.contains("FAILED 1060")
}

pub fn optimize_services() -> Result<String> {
    RetryPolicy::native().run("サービス最適化", || {
        let mut attempted: u32 = 0;
        let mut succeeded: u32 = 0;

        for service in NONESSENTIAL_SERVICES {
            let query = platform::run_command("sc", &["query", service], CONTROL_TIMEOUT)?;
            if service_not_found(&query) {
                continue;
            }
            attempted += 1;

            let config = platform::run_command(
                "sc",
                &["config", service, "start=", "disabled"],
                CONTROL_TIMEOUT,
            );
            let config_ok = matches!(&config, Ok(out) if out.exit_code == 0);
            if !config_ok {
                continue;
            }

            if query.stdout.contains("RUNNING") {
                let stop = platform::run_command("sc", &["stop", service], CONTROL_TIMEOUT);
                if !matches!(&stop, Ok(out) if out.exit_code == 0) {
                    continue;
                }
            }

            succeeded += 1;
        }

        Ok(format!("サービス最適化: {succeeded}/{attempted} 件成功"))
    })
}

pub fn set_high_performance_power() -> Result<String> {
    RetryPolicy::native().run("電源プラン設定", || {
        let primary = platform::run_command(
            "powercfg",
            &["/setactive", HIGH_PERFORMANCE_SCHEME],
            CONTROL_TIMEOUT,
        )?;
        if primary.exit_code == 0 {
            return Ok("高パフォーマンス電源プランを有効化しました".to_string());
        }

        let alternate =
            platform::run_command("powercfg", &["/s", ALTERNATE_SCHEME], CONTROL_TIMEOUT)?;
        if alternate.exit_code == 0 {
            return Ok("高パフォーマンス電源プランを有効化しました（代替スキーム）".to_string());
        }

        Err(anyhow!(
            "電源プランを変更できませんでした（exit_code={}）: {}",
            alternate.exit_code,
            alternate.stderr.trim()
        ))
    })
}

pub fn empty_recycle_bin() -> Result<()> {
    RetryPolicy::native().run("ごみ箱", || {
        let out = platform::run_command(
            "powershell",
            &[
                "-NoProfile",
                "-Command",
                "Clear-RecycleBin -Force -ErrorAction SilentlyContinue",
            ],
            CONTROL_TIMEOUT,
        )?;
        if out.exit_code != 0 {
            return Err(anyhow!(
                "ごみ箱を空にできませんでした（exit_code={}）: {}",
                out.exit_code,
                out.stderr.trim()
            ));
        }
        Ok(())
    })
}
