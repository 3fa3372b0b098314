//! Settings shared across profiles.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Default tracing filter when neither `RUST_LOG` nor CLI flags set one.
    #[serde(default)]
    pub log_level: Option<String>,
}
