//! Application Bootstrap
//!
//! Provides a high-level API for running an application through the
//! listener lifecycle.

use super::{
    ApplicationSettings, BootError, BootstrapSteps, FailureAggregator, FailureReport,
    LifecycleDispatcher, ListenerRegistry, RunListener, StandardBootstrap, shutdown_signal,
};
use crate::context::ApplicationContext;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An application ready to be run
///
/// # Example
///
/// ```rust,ignore
/// use bootseq::lifecycle::Application;
///
/// #[tokio::main]
/// async fn main() {
///     let app = Application::builder()
///         .name("orders")
///         .listener(AuditListener::default())
///         .profile("cloud")
///         .build()
///         .expect("invalid application settings");
///
///     match app.run().await {
///         Ok(running) => running.wait_for_shutdown().await,
///         Err(report) => {
///             eprintln!("{}: {}", report, report.primary());
///             std::process::exit(1);
///         }
///     }
/// }
/// ```
pub struct Application {
    settings: ApplicationSettings,
    registry: ListenerRegistry,
}

impl Application {
    /// Create a new application builder
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn settings(&self) -> &ApplicationSettings {
        &self.settings
    }

    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    /// Run with the [`StandardBootstrap`] steps built from the settings
    pub async fn run(self) -> Result<RunningApplication, FailureReport> {
        let mut steps = StandardBootstrap::new(self.settings.clone());
        self.run_with(&mut steps).await
    }

    /// Run with host-supplied bootstrap steps
    ///
    /// The listener registry is frozen for the duration of the run.
    ///
    /// # Errors
    ///
    /// Returns the composite [`FailureReport`] if the registry cannot be
    /// ordered, or if any listener or step fails.
    pub async fn run_with<S>(self, steps: &mut S) -> Result<RunningApplication, FailureReport>
    where
        S: BootstrapSteps + ?Sized,
    {
        let start = Instant::now();
        let name = self.settings.name.clone();
        let log_startup_info = self.settings.log_startup_info;

        if log_startup_info {
            tracing::info!("Starting {}...", name);
        }

        let snapshot = self.registry.snapshot().map_err(|e| {
            tracing::error!("Failed to order run listeners: {}", e);
            FailureAggregator::new().into_report(e, None)
        })?;
        let dispatcher = LifecycleDispatcher::new(snapshot);
        let context = dispatcher.run(steps).await?;

        let startup_time = start.elapsed();
        if log_startup_info {
            tracing::info!(
                "Started {} in {:.3} seconds",
                name,
                startup_time.as_secs_f64()
            );
        }

        Ok(RunningApplication {
            context,
            startup_time,
        })
    }
}

/// A successfully started application
pub struct RunningApplication {
    context: ApplicationContext,
    startup_time: Duration,
}

impl RunningApplication {
    pub fn context(&self) -> &ApplicationContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ApplicationContext {
        &mut self.context
    }

    /// Time from the start of the run to the end of `running`
    pub fn startup_time(&self) -> Duration {
        self.startup_time
    }

    pub fn into_context(self) -> ApplicationContext {
        self.context
    }

    /// Close the context, running its close callbacks
    pub fn shutdown(mut self) {
        tracing::info!("Shutting down application...");
        self.context.close();
        tracing::info!("Application shutdown complete");
    }

    /// Wait for Ctrl+C or SIGTERM, then shut down
    pub async fn wait_for_shutdown(self) {
        shutdown_signal().await;
        self.shutdown();
    }

    /// Spawn a background task that waits for shutdown signals
    /// and shuts the application down.
    pub fn spawn_shutdown_handler(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.wait_for_shutdown().await;
        })
    }
}

/// Builder for Application
#[derive(Default)]
pub struct ApplicationBuilder {
    settings: ApplicationSettings,
    registry: ListenerRegistry,
}

impl ApplicationBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all settings at once
    pub fn settings(mut self, settings: ApplicationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.settings.name = name.into();
        self
    }

    pub fn log_startup_info(mut self, enabled: bool) -> Self {
        self.settings.log_startup_info = enabled;
        self
    }

    pub fn include_system_environment(mut self, enabled: bool) -> Self {
        self.settings.include_system_environment = enabled;
        self
    }

    /// Activate an additional profile
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.settings.additional_profiles.push(profile.into());
        self
    }

    /// Add a lowest-precedence default property
    pub fn default_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings
            .default_properties
            .insert(key.into(), value.into());
        self
    }

    /// Register a run listener
    pub fn listener<L>(mut self, listener: L) -> Self
    where
        L: RunListener + 'static,
    {
        self.registry.register(listener);
        self
    }

    /// Register a shared run listener
    pub fn listener_arc(mut self, listener: Arc<dyn RunListener>) -> Self {
        self.registry.register_arc(listener);
        self
    }

    /// Register a run listener with a textual priority key
    pub fn listener_with_order_key<L>(mut self, listener: L, key: impl Into<String>) -> Self
    where
        L: RunListener + 'static,
    {
        self.registry.register_with_order_key(listener, key);
        self
    }

    /// Validate the settings and build the application
    ///
    /// # Errors
    ///
    /// Returns [`BootError::Configuration`] for invalid settings.
    pub fn build(self) -> Result<Application, BootError> {
        self.settings.validate()?;
        Ok(Application {
            settings: self.settings,
            registry: self.registry,
        })
    }
}
