use std::time::Duration;

use anyhow::Result;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    pub fn native() -> Self {
        Self::new(3, Duration::from_secs(2))
    }

    pub fn run<T>(&self, label: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let attempts = self.max_attempts.max(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match op() {
                Ok(v) => return Ok(v),
                Err(err) => {
                    last_err = Some(err);
                    if attempt < attempts {
                        std::thread::sleep(self.delay);
                    }
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| anyhow::anyhow!("不明なエラー"))
            .context(format!("{label}: {attempts}回試行してすべて失敗しました")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_first_success() {
        let policy = RetryPolicy::new(3, Duration::from_millis(0));
        let mut calls = 0;
        let out = policy.run("test", || {
            calls += 1;
            Ok::<_, anyhow::Error>(42)
        });
        assert_eq!(out.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[test]
    fn retries_until_success() {
        let policy = RetryPolicy::new(3, Duration::from_millis(0));
        let mut calls = 0;
        let out = policy.run("test", || {
            calls += 1;
            if calls < 3 {
                anyhow::bail!("まだ失敗");
            }
            Ok(calls)
        });
        assert_eq!(out.unwrap(), 3);
    }

    #[test]
    fn exhausts_attempts_and_reports_count() {
        let policy = RetryPolicy::new(2, Duration::from_millis(0));
        let mut calls = 0;
        let out: Result<()> = policy.run("cleanmgr", || {
            calls += 1;
            anyhow::bail!("失敗 {calls}");
        });
        assert_eq!(calls, 2);
        let msg = format!("{:#}", out.unwrap_err());
        assert!(msg.contains("cleanmgr"), "msg={msg}");
        assert!(msg.contains("2回"), "msg={msg}");
    }
}
