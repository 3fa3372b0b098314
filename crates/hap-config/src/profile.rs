//! Build profiles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// `dev` builds may be unsigned; `release` builds must be signed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
    #[default]
    Dev,
    Release,
}

impl BuildProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildProfile::Dev => "dev",
            BuildProfile::Release => "release",
        }
    }

    pub fn requires_signing(self) -> bool {
        matches!(self, BuildProfile::Release)
    }
}

impl fmt::Display for BuildProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "debug" => Ok(BuildProfile::Dev),
            "release" | "prod" | "production" => Ok(BuildProfile::Release),
            _ => Err(ConfigError::UnknownProfile(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("release".parse::<BuildProfile>().unwrap(), BuildProfile::Release);
        assert_eq!("PROD".parse::<BuildProfile>().unwrap(), BuildProfile::Release);
        assert_eq!("debug".parse::<BuildProfile>().unwrap(), BuildProfile::Dev);
        assert!("staging".parse::<BuildProfile>().is_err());
    }

    #[test]
    fn only_release_requires_signing() {
        assert!(BuildProfile::Release.requires_signing());
        assert!(!BuildProfile::Dev.requires_signing());
    }
}
