//! `hap.toml` loading and profile merging.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format as _, Serialized, Toml};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::build_name::BuildNameFormat;
use crate::error::{ConfigError, Result};
use crate::profile::BuildProfile;
use crate::settings::GlobalSettings;

/// Name of the optional project config file.
pub const CONFIG_FILE: &str = "hap.toml";

/// Resolved project configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HapConfig {
    /// Source root, relative to the project root.
    pub src_dir: PathBuf,
    /// Where compiled assets are written.
    pub build_dir: PathBuf,
    /// Where packages are written.
    pub dist_dir: PathBuf,
    pub stream_pack: bool,
    /// Emit styles as `.css.json` assets instead of inlining them.
    pub split_style: bool,
    pub build_name_format: BuildNameFormat,
    /// Directories searched for package-local imports, relative to the
    /// project root and in order.
    pub module_dirs: Vec<String>,
    pub builtin_prefixes: Vec<String>,
    pub sign: SignConfig,
    pub watch: WatchConfig,
    #[serde(default)]
    pub settings: GlobalSettings,
    /// Raw `[profiles.<name>]` tables.
    #[serde(default, skip_serializing)]
    pub profiles: HashMap<String, Value>,
}

/// Signing material locations. `{profile}` is replaced by the profile name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignConfig {
    pub private_key: String,
    pub certificate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Quiet period before queued changes are rebuilt.
    pub debounce_ms: u64,
    /// Path fragments whose changes are ignored.
    pub ignore: Vec<String>,
}

impl Default for HapConfig {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::from("src"),
            build_dir: PathBuf::from("build"),
            dist_dir: PathBuf::from("dist"),
            stream_pack: false,
            split_style: false,
            build_name_format: BuildNameFormat::Original,
            module_dirs: vec!["src".to_string(), "node_modules".to_string()],
            builtin_prefixes: vec!["@system.".to_string(), "@service.".to_string()],
            sign: SignConfig::default(),
            watch: WatchConfig::default(),
            settings: GlobalSettings::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Default for SignConfig {
    fn default() -> Self {
        Self {
            private_key: "sign/{profile}/private.pem".to_string(),
            certificate: "sign/{profile}/certificate.pem".to_string(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            ignore: vec![".git".to_string(), "node_modules".to_string()],
        }
    }
}

impl HapConfig {
    /// Load configuration for `project_root`.
    ///
    /// Priority: `HAP_*` environment variables > `hap.toml` > defaults, then
    /// the `[profiles.<profile>]` table of the result is merged on top.
    pub fn load(project_root: &Path, profile: BuildProfile) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let file = project_root.join(CONFIG_FILE);
        if file.is_file() {
            debug!(path = %file.display(), "loading config file");
            figment = figment.merge(Toml::file(file));
        }

        figment = figment.merge(Env::prefixed("HAP_"));

        let config: HapConfig = figment.extract().map_err(|e| ConfigError::InvalidValue {
            field: "configuration".to_string(),
            hint: e.to_string(),
        })?;
        config.materialize_profile(profile)
    }

    /// Parse a `hap.toml` document without touching the environment.
    pub fn from_toml_str(text: &str, profile: BuildProfile) -> Result<Self> {
        let config: HapConfig = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(text))
            .extract()
            .map_err(|e| ConfigError::InvalidValue {
                field: "toml".to_string(),
                hint: e.to_string(),
            })?;
        config.materialize_profile(profile)
    }

    /// Apply the `[profiles.<profile>]` overrides.
    pub fn materialize_profile(mut self, profile: BuildProfile) -> Result<Self> {
        let Some(overrides) = self.profiles.get(profile.as_str()).cloned() else {
            return Ok(self);
        };
        if overrides.is_null() {
            return Ok(self);
        }

        let profiles = std::mem::take(&mut self.profiles);
        let mut base = serde_json::to_value(&self).map_err(|err| ConfigError::InvalidProfileOverride {
            message: err.to_string(),
        })?;
        merge_values(&mut base, &overrides);
        let mut merged: HapConfig =
            serde_json::from_value(base).map_err(|err| ConfigError::InvalidProfileOverride {
                message: err.to_string(),
            })?;
        merged.profiles = profiles;
        Ok(merged)
    }

    pub fn src_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.src_dir)
    }

    pub fn build_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.build_dir)
    }

    pub fn dist_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.dist_dir)
    }

    /// Private key and certificate paths for `profile`.
    pub fn sign_paths(&self, project_root: &Path, profile: BuildProfile) -> (PathBuf, PathBuf) {
        let expand = |template: &str| project_root.join(template.replace("{profile}", profile.as_str()));
        (expand(&self.sign.private_key), expand(&self.sign.certificate))
    }
}

fn merge_values(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_values(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target_slot, _) => {
            *target_slot = update.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults() {
        let config = HapConfig::default();
        assert_eq!(config.src_dir, PathBuf::from("src"));
        assert!(!config.stream_pack);
        assert_eq!(config.builtin_prefixes, ["@system.", "@service."]);
        assert_eq!(config.watch.debounce_ms, 100);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = HapConfig::from_toml_str(
            r#"
            stream_pack = true
            build_name_format = "CUSTOM=dev"

            [watch]
            debounce_ms = 250
            "#,
            BuildProfile::Dev,
        )
        .unwrap();
        assert!(config.stream_pack);
        assert_eq!(config.build_name_format, BuildNameFormat::Custom("dev".into()));
        assert_eq!(config.watch.debounce_ms, 250);
        assert_eq!(config.watch.ignore, [".git", "node_modules"]);
    }

    #[test]
    fn profile_overrides_are_merged() {
        let text = r#"
            split_style = false

            [profiles.release]
            split_style = true
            sign = { private_key = "keys/{profile}.pem" }
        "#;
        let dev = HapConfig::from_toml_str(text, BuildProfile::Dev).unwrap();
        assert!(!dev.split_style);

        let release = HapConfig::from_toml_str(text, BuildProfile::Release).unwrap();
        assert!(release.split_style);
        assert_eq!(release.sign.private_key, "keys/{profile}.pem");
        assert_eq!(release.sign.certificate, "sign/{profile}/certificate.pem");
        assert!(release.profiles.contains_key("release"));
    }

    #[test]
    fn invalid_build_name_format_is_rejected() {
        let err = HapConfig::from_toml_str(r#"build_name_format = "LATEST""#, BuildProfile::Dev).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn sign_paths_expand_profile() {
        let config = HapConfig::default();
        let (key, cert) = config.sign_paths(Path::new("/proj"), BuildProfile::Release);
        assert_eq!(key, PathBuf::from("/proj/sign/release/private.pem"));
        assert_eq!(cert, PathBuf::from("/proj/sign/release/certificate.pem"));
    }

    #[test]
    fn merge_replaces_arrays_and_scalars() {
        let mut base = json!({ "a": [1, 2], "b": { "c": 1, "d": 2 } });
        merge_values(&mut base, &json!({ "a": [3], "b": { "d": 4 } }));
        assert_eq!(base, json!({ "a": [3], "b": { "c": 1, "d": 4 } }));
    }
}
