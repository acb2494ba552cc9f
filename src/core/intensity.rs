use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Medium => "medium",
            Intensity::High => "high",
        }
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Intensity::Medium
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baja" | "low" => Ok(Intensity::Low),
            "media" | "medium" => Ok(Intensity::Medium),
            "alta" | "high" => Ok(Intensity::High),
            other => Err(format!(
                "強度が不正です: {other}（baja|media|alta または low|medium|high を指定してください）"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_spanish_and_english_values() {
        assert_eq!("baja".parse::<Intensity>().unwrap(), Intensity::Low);
        assert_eq!("MEDIA".parse::<Intensity>().unwrap(), Intensity::Medium);
        assert_eq!(" alta ".parse::<Intensity>().unwrap(), Intensity::High);
        assert_eq!("low".parse::<Intensity>().unwrap(), Intensity::Low);
        assert_eq!("High".parse::<Intensity>().unwrap(), Intensity::High);
    }

    #[test]
    fn rejects_unknown_values() {
        assert!("maxima".parse::<Intensity>().is_err());
        assert!("".parse::<Intensity>().is_err());
    }
}
