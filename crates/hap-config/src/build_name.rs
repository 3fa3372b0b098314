//! Package name tagging.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How the build tag of the package file name is chosen.
///
/// Written as `ORIGINAL`, `ORIGINAL_TIMESTAMP` or `CUSTOM=<tag>` in
/// `hap.toml` and on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BuildNameFormat {
    /// No tag.
    #[default]
    Original,
    /// Build time as `yyyyMMddHHmm`.
    OriginalTimestamp,
    /// A fixed tag.
    Custom(String),
}

impl BuildNameFormat {
    /// Tag for a build started at `now`, if any.
    pub fn build_tag<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<String>
    where
        Tz::Offset: fmt::Display,
    {
        match self {
            BuildNameFormat::Original => None,
            BuildNameFormat::OriginalTimestamp => Some(now.format("%Y%m%d%H%M").to_string()),
            BuildNameFormat::Custom(tag) => Some(tag.clone()),
        }
    }
}

impl FromStr for BuildNameFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(tag) = trimmed.strip_prefix("CUSTOM=") {
            let valid = !tag.is_empty()
                && tag
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
            return if valid {
                Ok(BuildNameFormat::Custom(tag.to_string()))
            } else {
                Err(ConfigError::InvalidBuildNameFormat(s.to_string()))
            };
        }
        match trimmed {
            "" | "ORIGINAL" => Ok(BuildNameFormat::Original),
            "ORIGINAL_TIMESTAMP" => Ok(BuildNameFormat::OriginalTimestamp),
            _ => Err(ConfigError::InvalidBuildNameFormat(s.to_string())),
        }
    }
}

impl fmt::Display for BuildNameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildNameFormat::Original => f.write_str("ORIGINAL"),
            BuildNameFormat::OriginalTimestamp => f.write_str("ORIGINAL_TIMESTAMP"),
            BuildNameFormat::Custom(tag) => write!(f, "CUSTOM={tag}"),
        }
    }
}

impl TryFrom<String> for BuildNameFormat {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BuildNameFormat> for String {
    fn from(value: BuildNameFormat) -> Self {
        value.to_string()
    }
}
