//! Environment handle
//!
//! An [`Environment`] is an ordered stack of named [`PropertySource`]s plus
//! the set of active profiles. Lookups walk the sources front to back and
//! the first source defining a key wins.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;

/// Property consulted by [`Environment::active_profiles`] when no profile
/// was activated explicitly.
pub const ACTIVE_PROFILES_PROPERTY: &str = "bootseq.profiles.active";

/// Name of the source written by [`Environment::set_property`].
pub const RUNTIME_OVERRIDES: &str = "runtimeOverrides";

/// Name of the source built from the process environment.
pub const SYSTEM_ENVIRONMENT: &str = "systemEnvironment";

/// A named set of key/value properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySource {
    name: String,
    properties: HashMap<String, String>,
}

impl PropertySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
        }
    }

    /// Build a source from any iterator of key/value pairs
    pub fn with_properties<K, V>(
        name: impl Into<String>,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            properties: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Snapshot of the process environment variables
    pub fn system_environment() -> Self {
        Self::with_properties(SYSTEM_ENVIRONMENT, env::vars())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Mutable configuration snapshot handed to listeners during
/// `environment_prepared` and owned by the context afterwards.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    sources: Vec<PropertySource>,
    active_profiles: Vec<String>,
}

impl Environment {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an environment seeded with the process environment variables
    pub fn from_system_env() -> Self {
        let mut environment = Self::new();
        environment.add_last(PropertySource::system_environment());
        environment
    }

    /// Insert a source with the highest precedence, replacing any source of the same name
    pub fn add_first(&mut self, source: PropertySource) {
        self.remove_source(source.name());
        self.sources.insert(0, source);
    }

    /// Insert a source with the lowest precedence, replacing any source of the same name
    pub fn add_last(&mut self, source: PropertySource) {
        self.remove_source(source.name());
        self.sources.push(source);
    }

    pub fn remove_source(&mut self, name: &str) -> Option<PropertySource> {
        let index = self.sources.iter().position(|s| s.name() == name)?;
        Some(self.sources.remove(index))
    }

    pub fn source(&self, name: &str) -> Option<&PropertySource> {
        self.sources.iter().find(|s| s.name() == name)
    }

    /// Names of all sources in precedence order
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(PropertySource::name).collect()
    }

    /// Resolve a property against the sources in precedence order
    pub fn get(&self, key: &str) -> Option<&str> {
        self.sources.iter().find_map(|source| source.get(key))
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Resolve and parse a property.
    ///
    /// Returns `Ok(None)` if the key is absent.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>, T::Err>
    where
        T: FromStr,
    {
        self.get(key).map(|raw| raw.trim().parse()).transpose()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set a property in the runtime override source, which always takes precedence
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if self.sources.first().map(PropertySource::name) != Some(RUNTIME_OVERRIDES) {
            let overrides = self
                .remove_source(RUNTIME_OVERRIDES)
                .unwrap_or_else(|| PropertySource::new(RUNTIME_OVERRIDES));
            self.sources.insert(0, overrides);
        }
        if let Some(overrides) = self.sources.first_mut() {
            overrides.insert(key, value);
        }
    }

    /// Profiles that are currently active.
    ///
    /// Explicitly activated profiles win; otherwise the comma separated
    /// [`ACTIVE_PROFILES_PROPERTY`] is consulted.
    pub fn active_profiles(&self) -> Vec<String> {
        if !self.active_profiles.is_empty() {
            return self.active_profiles.clone();
        }
        self.get(ACTIVE_PROFILES_PROPERTY)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn add_active_profile(&mut self, profile: impl Into<String>) {
        let profile = profile.into();
        if !self.active_profiles.contains(&profile) {
            self.active_profiles.push(profile);
        }
    }

    pub fn set_active_profiles<I, S>(&mut self, profiles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_profiles.clear();
        for profile in profiles {
            self.add_active_profile(profile);
        }
    }

    pub fn accepts_profile(&self, profile: &str) -> bool {
        self.active_profiles().iter().any(|p| p == profile)
    }
}
