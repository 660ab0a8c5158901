//! Host bootstrap steps
//!
//! The dispatcher does not build environments or contexts itself. It asks
//! the host for them through [`BootstrapSteps`] between phases.

use super::ApplicationSettings;
use crate::context::ApplicationContext;
use crate::env::{Environment, PropertySource};
use async_trait::async_trait;

/// Name of the property source built from [`ApplicationSettings::default_properties`]
pub const DEFAULT_PROPERTIES: &str = "defaultProperties";

/// The work a host performs between lifecycle phases
///
/// | Step                  | Runs before           |
/// |-----------------------|-----------------------|
/// | `prepare_environment` | `environment_prepared`|
/// | `create_context`      | `context_prepared`    |
/// | `load_context`        | `context_loaded`      |
/// | `refresh_context`     | `started`             |
/// | `call_runners`        | `running`             |
///
/// Any error returned here aborts the run exactly like a listener error.
#[async_trait]
pub trait BootstrapSteps: Send {
    async fn prepare_environment(&mut self) -> anyhow::Result<Environment> {
        Ok(Environment::new())
    }

    async fn create_context(
        &mut self,
        environment: Environment,
    ) -> anyhow::Result<ApplicationContext> {
        Ok(ApplicationContext::new("application", environment))
    }

    async fn load_context(&mut self, _context: &mut ApplicationContext) -> anyhow::Result<()> {
        Ok(())
    }

    async fn refresh_context(&mut self, context: &mut ApplicationContext) -> anyhow::Result<()> {
        context.refresh()?;
        Ok(())
    }

    async fn call_runners(&mut self, _context: &mut ApplicationContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Bootstrap steps driven by [`ApplicationSettings`]
///
/// Builds the environment from the runtime overrides, the process
/// environment (optional) and the default properties, in that precedence.
#[derive(Debug, Clone, Default)]
pub struct StandardBootstrap {
    settings: ApplicationSettings,
}

impl StandardBootstrap {
    pub fn new(settings: ApplicationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ApplicationSettings {
        &self.settings
    }
}

#[async_trait]
impl BootstrapSteps for StandardBootstrap {
    async fn prepare_environment(&mut self) -> anyhow::Result<Environment> {
        let mut environment = if self.settings.include_system_environment {
            Environment::from_system_env()
        } else {
            Environment::new()
        };

        if !self.settings.default_properties.is_empty() {
            environment.add_last(PropertySource::with_properties(
                DEFAULT_PROPERTIES,
                self.settings.default_properties.clone(),
            ));
        }

        if !self.settings.additional_profiles.is_empty() {
            let mut profiles = environment.active_profiles();
            profiles.extend(self.settings.additional_profiles.iter().cloned());
            environment.set_active_profiles(profiles);
        }

        if self.settings.log_startup_info {
            let profiles = environment.active_profiles();
            if profiles.is_empty() {
                tracing::info!("No active profile set");
            } else {
                tracing::info!("The following profiles are active: {}", profiles.join(", "));
            }
        }

        Ok(environment)
    }

    async fn create_context(
        &mut self,
        environment: Environment,
    ) -> anyhow::Result<ApplicationContext> {
        Ok(ApplicationContext::new(&self.settings.name, environment))
    }
}
