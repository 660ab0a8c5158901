//! Run settings

use super::{BootError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Host-level configuration of a bootstrap run
///
/// ```json
/// {
///   "name": "orders",
///   "log_startup_info": true,
///   "additional_profiles": ["cloud"],
///   "default_properties": { "server.port": "8080" },
///   "include_system_environment": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    /// Display name of the application and its context
    pub name: String,
    /// Log "Starting"/"Started" lines around the run
    pub log_startup_info: bool,
    /// Profiles activated on top of whatever the environment declares
    pub additional_profiles: Vec<String>,
    /// Lowest-precedence property source
    pub default_properties: HashMap<String, String>,
    /// Add the process environment as a property source
    pub include_system_environment: bool,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            name: "application".to_string(),
            log_startup_info: true,
            additional_profiles: Vec::new(),
            default_properties: HashMap::new(),
            include_system_environment: true,
        }
    }
}

impl ApplicationSettings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(raw: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(raw).map_err(|e| {
            BootError::configuration(format!("invalid application settings: {}", e))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BootError::configuration("application name must not be empty"));
        }
        if let Some(profile) = self.additional_profiles.iter().find(|p| p.trim().is_empty()) {
            return Err(BootError::configuration(format!(
                "invalid profile name {:?}",
                profile
            )));
        }
        Ok(())
    }
}
