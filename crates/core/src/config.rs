//! Relay configuration.
//!
//! The same values the config plugin bakes into the app at build time
//! (app group, background delivery toggle, background modes, usage
//! description) plus the identifiers the relay derives from them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    APP_GROUP_PREFIX, BACKGROUND_TASK_SUFFIX, DATA_CHANGED_SUFFIX, DEFAULT_RESCHEDULE_DELAY_SECS,
    MAX_RESCHEDULE_DELAY_SECS,
};
use crate::errors::{Error, Result};

const ENV_BUNDLE_ID: &str = "FINANCEKIT_BUNDLE_ID";
const ENV_APP_GROUP: &str = "FINANCEKIT_APP_GROUP";
const ENV_TASK_ID: &str = "FINANCEKIT_TASK_ID";
const ENV_RESCHEDULE_DELAY: &str = "FINANCEKIT_RESCHEDULE_DELAY_SECS";

fn default_reschedule_delay_secs() -> u64 {
    DEFAULT_RESCHEDULE_DELAY_SECS
}

fn default_true() -> bool {
    true
}

fn default_background_modes() -> Vec<String> {
    vec!["fetch".to_string(), "processing".to_string()]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    /// Bundle identifier of the main app
    pub bundle_identifier: String,
    /// Explicit app group; `group.{bundleIdentifier}` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_group_identifier: Option<String>,
    /// Identifier the background task is registered under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_task_identifier: Option<String>,
    #[serde(default = "default_reschedule_delay_secs")]
    pub reschedule_delay_secs: u64,
    #[serde(default = "default_true")]
    pub enable_background_delivery: bool,
    #[serde(default = "default_background_modes")]
    pub background_modes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_description: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bundle_identifier: String::new(),
            app_group_identifier: None,
            background_task_identifier: None,
            reschedule_delay_secs: DEFAULT_RESCHEDULE_DELAY_SECS,
            enable_background_delivery: true,
            background_modes: default_background_modes(),
            usage_description: None,
        }
    }
}

impl RelayConfig {
    pub fn new(bundle_identifier: impl Into<String>) -> Self {
        Self {
            bundle_identifier: bundle_identifier.into(),
            ..Self::default()
        }
    }

    /// Reads the configuration from `FINANCEKIT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let bundle_identifier = std::env::var(ENV_BUNDLE_ID).unwrap_or_default();
        let mut config = Self::new(bundle_identifier);
        config.app_group_identifier = std::env::var(ENV_APP_GROUP)
            .ok()
            .filter(|s| !s.trim().is_empty());
        config.background_task_identifier = std::env::var(ENV_TASK_ID)
            .ok()
            .filter(|s| !s.trim().is_empty());
        if let Ok(raw) = std::env::var(ENV_RESCHEDULE_DELAY) {
            config.reschedule_delay_secs = raw.trim().parse().map_err(|_| {
                Error::unknown(format!(
                    "{} must be a number of seconds, got '{}'",
                    ENV_RESCHEDULE_DELAY, raw
                ))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bundle_identifier.trim().is_empty() {
            return Err(Error::unknown("bundle identifier must not be empty"));
        }
        if self.reschedule_delay_secs > MAX_RESCHEDULE_DELAY_SECS {
            return Err(Error::unknown(format!(
                "reschedule delay of {}s exceeds the {}s limit",
                self.reschedule_delay_secs, MAX_RESCHEDULE_DELAY_SECS
            )));
        }
        Ok(())
    }

    /// The app group the shared state store resolves.
    pub fn group_identifier(&self) -> String {
        self.app_group_identifier
            .clone()
            .unwrap_or_else(|| format!("{}{}", APP_GROUP_PREFIX, self.bundle_identifier))
    }

    /// Name of the payload-less broadcast the extension posts.
    pub fn signal_name(&self) -> String {
        format!("{}{}", self.bundle_identifier, DATA_CHANGED_SUFFIX)
    }

    pub fn task_identifier(&self) -> String {
        self.background_task_identifier
            .clone()
            .unwrap_or_else(|| format!("{}{}", self.bundle_identifier, BACKGROUND_TASK_SUFFIX))
    }

    pub fn reschedule_delay(&self) -> Duration {
        Duration::from_secs(self.reschedule_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_identifiers() {
        let config = RelayConfig::new("com.example.budget");

        assert_eq!(config.group_identifier(), "group.com.example.budget");
        assert_eq!(config.signal_name(), "com.example.budget.dataChanged");
        assert_eq!(config.task_identifier(), "com.example.budget.financekit.sync");
        assert_eq!(config.reschedule_delay(), Duration::from_secs(15));
    }

    #[test]
    fn test_explicit_group_wins() {
        let mut config = RelayConfig::new("com.example.budget");
        config.app_group_identifier = Some("group.shared.finance".to_string());

        assert_eq!(config.group_identifier(), "group.shared.finance");
    }

    #[test]
    fn test_deserialize_plugin_config_with_defaults() {
        let json = r#"{"bundleIdentifier": "com.example.app", "usageDescription": "Reads your cards"}"#;
        let config: RelayConfig = serde_json::from_str(json).unwrap();

        assert!(config.enable_background_delivery);
        assert_eq!(config.background_modes, vec!["fetch", "processing"]);
        assert_eq!(config.reschedule_delay_secs, 15);
        assert_eq!(config.usage_description.as_deref(), Some("Reads your cards"));
    }

    #[test]
    fn test_validate_rejects_empty_bundle() {
        assert!(RelayConfig::default().validate().is_err());
        assert!(RelayConfig::new("com.example.app").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_oversized_reschedule_delay() {
        let mut config = RelayConfig::new("com.example.app");
        config.reschedule_delay_secs = MAX_RESCHEDULE_DELAY_SECS;
        assert!(config.validate().is_ok());

        config.reschedule_delay_secs = 10_000_000_000_000;
        assert!(config.validate().is_err());

        config.reschedule_delay_secs = u64::MAX;
        assert!(config.validate().is_err());
    }
}
