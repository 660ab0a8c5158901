//! Closure-backed run listener

use super::{BootError, LOWEST_PRECEDENCE, RunListener};
use crate::context::ApplicationContext;
use crate::env::Environment;
use async_trait::async_trait;

type StartingHook = Box<dyn Fn() -> anyhow::Result<()> + Send + Sync>;
type EnvironmentHook = Box<dyn Fn(&mut Environment) -> anyhow::Result<()> + Send + Sync>;
type ContextHook = Box<dyn Fn(&mut ApplicationContext) -> anyhow::Result<()> + Send + Sync>;
type FailedHook =
    Box<dyn Fn(Option<&mut ApplicationContext>, &BootError) -> anyhow::Result<()> + Send + Sync>;

/// A run listener assembled from optional callbacks
///
/// Each hook that was not set behaves as a no-op.
///
/// # Example
///
/// ```rust,ignore
/// use bootseq::lifecycle::CallbackListener;
///
/// let listener = CallbackListener::new("banner")
///     .with_order(-100)
///     .on_starting(|| {
///         println!("booting...");
///         Ok(())
///     })
///     .on_failed(|_, failure| {
///         eprintln!("boot failed: {}", failure);
///         Ok(())
///     });
/// ```
pub struct CallbackListener {
    name: String,
    order: i32,
    starting: Option<StartingHook>,
    environment_prepared: Option<EnvironmentHook>,
    context_prepared: Option<ContextHook>,
    context_loaded: Option<ContextHook>,
    started: Option<ContextHook>,
    running: Option<ContextHook>,
    failed: Option<FailedHook>,
}

impl CallbackListener {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: LOWEST_PRECEDENCE,
            starting: None,
            environment_prepared: None,
            context_prepared: None,
            context_loaded: None,
            started: None,
            running: None,
            failed: None,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn on_starting<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.starting = Some(Box::new(hook));
        self
    }

    pub fn on_environment_prepared<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Environment) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.environment_prepared = Some(Box::new(hook));
        self
    }

    pub fn on_context_prepared<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ApplicationContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.context_prepared = Some(Box::new(hook));
        self
    }

    pub fn on_context_loaded<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ApplicationContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.context_loaded = Some(Box::new(hook));
        self
    }

    pub fn on_started<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ApplicationContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.started = Some(Box::new(hook));
        self
    }

    pub fn on_running<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ApplicationContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.running = Some(Box::new(hook));
        self
    }

    pub fn on_failed<F>(mut self, hook: F) -> Self
    where
        F: Fn(Option<&mut ApplicationContext>, &BootError) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.failed = Some(Box::new(hook));
        self
    }
}

fn call_context(hook: &Option<ContextHook>, context: &mut ApplicationContext) -> anyhow::Result<()> {
    match hook {
        Some(hook) => hook(context),
        None => Ok(()),
    }
}

#[async_trait]
impl RunListener for CallbackListener {
    async fn starting(&self) -> anyhow::Result<()> {
        match &self.starting {
            Some(hook) => hook(),
            None => Ok(()),
        }
    }

    async fn environment_prepared(&self, environment: &mut Environment) -> anyhow::Result<()> {
        match &self.environment_prepared {
            Some(hook) => hook(environment),
            None => Ok(()),
        }
    }

    async fn context_prepared(&self, context: &mut ApplicationContext) -> anyhow::Result<()> {
        call_context(&self.context_prepared, context)
    }

    async fn context_loaded(&self, context: &mut ApplicationContext) -> anyhow::Result<()> {
        call_context(&self.context_loaded, context)
    }

    async fn started(&self, context: &mut ApplicationContext) -> anyhow::Result<()> {
        call_context(&self.started, context)
    }

    async fn running(&self, context: &mut ApplicationContext) -> anyhow::Result<()> {
        call_context(&self.running, context)
    }

    async fn failed(
        &self,
        context: Option<&mut ApplicationContext>,
        failure: &BootError,
    ) -> anyhow::Result<()> {
        match &self.failed {
            Some(hook) => hook(context, failure),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> i32 {
        self.order
    }
}
