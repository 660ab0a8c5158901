//! Lifecycle Dispatcher
//!
//! Drives one bootstrap run through the phase sequence and routes every
//! failure to the `failed` phase.

use super::{
    BootError, BootStep, BootstrapSteps, FailureAggregator, FailureReport, ListenerSnapshot,
    Phase, PhaseEvent, Result,
};
use crate::context::ApplicationContext;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// Dispatches lifecycle events to a frozen set of listeners
///
/// The LifecycleDispatcher is responsible for:
/// - Invoking each phase's hook on every listener, in snapshot order
/// - Running the host's bootstrap step before each phase
/// - Routing any failure to `failed` on every listener
///
/// # Example
///
/// ```rust,ignore
/// use bootseq::lifecycle::{LifecycleDispatcher, ListenerRegistry, StandardBootstrap};
///
/// let snapshot = registry.snapshot()?;
/// let dispatcher = LifecycleDispatcher::new(snapshot);
///
/// match dispatcher.run(&mut StandardBootstrap::default()).await {
///     Ok(context) => { /* application is running */ }
///     Err(report) => eprintln!("{}: {}", report, report.primary()),
/// }
/// ```
pub struct LifecycleDispatcher {
    listeners: ListenerSnapshot,
}

impl LifecycleDispatcher {
    /// Create a dispatcher over a frozen listener snapshot
    pub fn new(listeners: ListenerSnapshot) -> Self {
        Self { listeners }
    }

    pub fn listeners(&self) -> &ListenerSnapshot {
        &self.listeners
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Run the full phase sequence.
    ///
    /// Returns the running context, or a [`FailureReport`] once `failed`
    /// has been delivered to every listener. A context that was created
    /// before the failure is closed after that delivery.
    pub async fn run<S>(
        &self,
        steps: &mut S,
    ) -> std::result::Result<ApplicationContext, FailureReport>
    where
        S: BootstrapSteps + ?Sized,
    {
        let mut phase = Phase::Starting;

        let mut context = match self.prepare(steps, &mut phase).await {
            Ok(context) => context,
            Err(failure) => return Err(self.fail(None, failure, phase).await),
        };

        match self.complete(steps, &mut context, &mut phase).await {
            Ok(()) => Ok(context),
            Err(failure) => {
                let report = self.fail(Some(&mut context), failure, phase).await;
                context.close();
                Err(report)
            }
        }
    }

    /// `starting` through context creation
    async fn prepare<S>(&self, steps: &mut S, phase: &mut Phase) -> Result<ApplicationContext>
    where
        S: BootstrapSteps + ?Sized,
    {
        *phase = Phase::Starting;
        self.dispatch(&mut PhaseEvent::Starting).await?;

        *phase = Phase::EnvironmentPrepared;
        let mut environment = steps
            .prepare_environment()
            .await
            .map_err(|e| step_failed(BootStep::PrepareEnvironment, e))?;
        self.dispatch(&mut PhaseEvent::EnvironmentPrepared(&mut environment))
            .await?;

        *phase = Phase::ContextPrepared;
        steps
            .create_context(environment)
            .await
            .map_err(|e| step_failed(BootStep::CreateContext, e))
    }

    /// `context_prepared` through `running`
    async fn complete<S>(
        &self,
        steps: &mut S,
        context: &mut ApplicationContext,
        phase: &mut Phase,
    ) -> Result<()>
    where
        S: BootstrapSteps + ?Sized,
    {
        *phase = Phase::ContextPrepared;
        self.dispatch(&mut PhaseEvent::ContextPrepared(&mut *context)).await?;

        *phase = Phase::ContextLoaded;
        steps
            .load_context(context)
            .await
            .map_err(|e| step_failed(BootStep::LoadContext, e))?;
        self.dispatch(&mut PhaseEvent::ContextLoaded(&mut *context)).await?;

        *phase = Phase::Started;
        steps
            .refresh_context(context)
            .await
            .map_err(|e| step_failed(BootStep::RefreshContext, e))?;
        self.dispatch(&mut PhaseEvent::Started(&mut *context)).await?;

        *phase = Phase::Running;
        steps
            .call_runners(context)
            .await
            .map_err(|e| step_failed(BootStep::CallRunners, e))?;
        self.dispatch(&mut PhaseEvent::Running(&mut *context)).await
    }

    /// Deliver a phase to every listener.
    ///
    /// Ordinary phases stop at the first listener error. A `failed` event
    /// still reaches every listener; the first error it raised is returned
    /// once all of them have been notified.
    pub async fn dispatch(&self, event: &mut PhaseEvent<'_>) -> Result<()> {
        if matches!(event, PhaseEvent::Failed { .. }) {
            return match self.deliver_failed(event).await.into_suppressed().into_iter().next() {
                Some(first) => Err(first),
                None => Ok(()),
            };
        }

        let phase = event.phase();
        tracing::debug!("Dispatching {} to {} listeners", phase, self.listeners.len());

        for registered in self.listeners.iter() {
            tracing::debug!("{}: {}", phase, registered.name());
            event.deliver(registered.listener()).await.map_err(|e| {
                tracing::error!(
                    "Listener {} failed during {}: {:#}",
                    registered.name(),
                    phase,
                    e
                );
                BootError::listener(registered.name(), phase, e)
            })?;
        }

        tracing::debug!("{} complete ({} listeners notified)", phase, self.listeners.len());
        Ok(())
    }

    /// Deliver `failed` to every listener.
    ///
    /// Never stops early: listener errors and panics are recorded in the
    /// returned aggregator and delivery continues with the next listener.
    pub async fn dispatch_failed(
        &self,
        context: Option<&mut ApplicationContext>,
        failure: &BootError,
    ) -> FailureAggregator {
        self.deliver_failed(&mut PhaseEvent::Failed { context, failure })
            .await
    }

    async fn deliver_failed(&self, event: &mut PhaseEvent<'_>) -> FailureAggregator {
        let mut aggregator = FailureAggregator::new();

        for registered in self.listeners.iter() {
            tracing::debug!("{}: {}", Phase::Failed, registered.name());
            let outcome = AssertUnwindSafe(event.deliver(registered.listener()))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => aggregator.record(BootError::delivery(registered.name(), e)),
                Err(payload) => aggregator.record(BootError::delivery(
                    registered.name(),
                    anyhow::anyhow!("listener panicked: {}", panic_message(payload.as_ref())),
                )),
            }
        }

        aggregator
    }

    async fn fail(
        &self,
        context: Option<&mut ApplicationContext>,
        failure: BootError,
        phase: Phase,
    ) -> FailureReport {
        tracing::error!("Application run failed during {}: {}", phase, failure);
        let aggregator = self.dispatch_failed(context, &failure).await;
        aggregator.into_report(failure, Some(phase))
    }
}

fn step_failed(step: BootStep, source: anyhow::Error) -> BootError {
    tracing::error!("Bootstrap step {} failed: {:#}", step, source);
    BootError::step(step, source)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::lifecycle::{CallbackListener, ListenerRegistry, RunListener};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    type Journal = Arc<Mutex<Vec<String>>>;

    /// Records every hook it receives as "name:phase"
    struct Recorder {
        name: &'static str,
        order: i32,
        journal: Journal,
        fail_on: Option<Phase>,
    }

    impl Recorder {
        fn new(name: &'static str, order: i32, journal: &Journal) -> Self {
            Self {
                name,
                order,
                journal: Arc::clone(journal),
                fail_on: None,
            }
        }

        fn failing_on(mut self, phase: Phase) -> Self {
            self.fail_on = Some(phase);
            self
        }

        fn record(&self, phase: Phase) -> anyhow::Result<()> {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, phase));
            if self.fail_on == Some(phase) {
                anyhow::bail!("{} refused {}", self.name, phase);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RunListener for Recorder {
        async fn starting(&self) -> anyhow::Result<()> {
            self.record(Phase::Starting)
        }

        async fn environment_prepared(&self, _: &mut Environment) -> anyhow::Result<()> {
            self.record(Phase::EnvironmentPrepared)
        }

        async fn context_prepared(&self, _: &mut ApplicationContext) -> anyhow::Result<()> {
            self.record(Phase::ContextPrepared)
        }

        async fn context_loaded(&self, _: &mut ApplicationContext) -> anyhow::Result<()> {
            self.record(Phase::ContextLoaded)
        }

        async fn started(&self, _: &mut ApplicationContext) -> anyhow::Result<()> {
            self.record(Phase::Started)
        }

        async fn running(&self, _: &mut ApplicationContext) -> anyhow::Result<()> {
            self.record(Phase::Running)
        }

        async fn failed(
            &self,
            _: Option<&mut ApplicationContext>,
            _: &BootError,
        ) -> anyhow::Result<()> {
            self.record(Phase::Failed)
        }

        fn name(&self) -> &str {
            self.name
        }

        fn order(&self) -> i32 {
            self.order
        }
    }

    struct DefaultSteps;

    impl BootstrapSteps for DefaultSteps {}

    struct FailingRefresh;

    #[async_trait]
    impl BootstrapSteps for FailingRefresh {
        async fn refresh_context(&mut self, _: &mut ApplicationContext) -> anyhow::Result<()> {
            anyhow::bail!("refresh exploded")
        }
    }

    fn dispatcher(registry: &ListenerRegistry) -> LifecycleDispatcher {
        LifecycleDispatcher::new(registry.snapshot().unwrap())
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_successful_run_notifies_in_priority_order() {
        let journal = Journal::default();
        let mut registry = ListenerRegistry::new();
        registry
            .register(Recorder::new("b", 2, &journal))
            .register(Recorder::new("a", 1, &journal));

        let context = dispatcher(&registry).run(&mut DefaultSteps).await.unwrap();

        let expected: Vec<String> = Phase::ORDINARY
            .iter()
            .flat_map(|phase| [format!("a:{}", phase), format!("b:{}", phase)])
            .collect();
        assert_eq!(entries(&journal), expected);
        assert!(context.is_active());
    }

    #[tokio::test]
    async fn test_listener_failure_routes_every_listener_to_failed() {
        let journal = Journal::default();
        let mut registry = ListenerRegistry::new();
        registry
            .register(Recorder::new("a", 1, &journal))
            .register(Recorder::new("b", 2, &journal).failing_on(Phase::ContextLoaded))
            .register(Recorder::new("c", 3, &journal));

        let report = dispatcher(&registry)
            .run(&mut DefaultSteps)
            .await
            .unwrap_err();

        let journal = entries(&journal);
        assert!(journal.ends_with(&[
            "a:context_loaded".to_string(),
            "b:context_loaded".to_string(),
            "a:failed".to_string(),
            "b:failed".to_string(),
            "c:failed".to_string(),
        ]));
        assert!(!journal.contains(&"c:context_loaded".to_string()));
        assert!(!journal.iter().any(|e| e.ends_with(":started") || e.ends_with(":running")));

        assert_eq!(report.phase(), Some(Phase::ContextLoaded));
        assert!(report.suppressed().is_empty());
        match report.primary() {
            BootError::ListenerInvocation { listener, phase, source } => {
                assert_eq!(listener, "b");
                assert_eq!(*phase, Phase::ContextLoaded);
                assert_eq!(source.to_string(), "b refused context_loaded");
            }
            other => panic!("unexpected primary failure: {}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_delivery_is_exhaustive() {
        let journal = Journal::default();
        let mut registry = ListenerRegistry::new();
        registry
            .register(Recorder::new("l1", 1, &journal).failing_on(Phase::Started))
            .register(Recorder::new("l3", 3, &journal).failing_on(Phase::Failed))
            .register(Recorder::new("l4", 4, &journal));

        let report = dispatcher(&registry)
            .run(&mut DefaultSteps)
            .await
            .unwrap_err();

        assert!(entries(&journal).contains(&"l4:failed".to_string()));
        assert_eq!(report.suppressed().len(), 1);
        assert!(matches!(
            &report.suppressed()[0],
            BootError::FailureDelivery { listener, .. } if listener == "l3"
        ));
        assert_eq!(report.primary().listener_name(), Some("l1"));
    }

    #[tokio::test]
    async fn test_host_step_failure_reaches_listeners_with_context() {
        let seen = Arc::new(Mutex::new(None));
        let captured = Arc::clone(&seen);
        let mut registry = ListenerRegistry::new();
        registry.register(CallbackListener::new("observer").on_failed(move |context, failure| {
            *captured.lock().unwrap() = Some((context.is_some(), failure.to_string()));
            Ok(())
        }));

        let report = dispatcher(&registry)
            .run(&mut FailingRefresh)
            .await
            .unwrap_err();

        assert_eq!(
            *seen.lock().unwrap(),
            Some((true, "Bootstrap step refresh_context failed".to_string()))
        );
        assert_eq!(report.phase(), Some(Phase::Started));
        assert_eq!(report.primary().root_cause().to_string(), "refresh exploded");
    }

    #[tokio::test]
    async fn test_failure_before_context_has_no_context() {
        let journal = Journal::default();
        let seen = Arc::new(Mutex::new(None));
        let captured = Arc::clone(&seen);
        let mut registry = ListenerRegistry::new();
        registry
            .register(Recorder::new("env", 1, &journal).failing_on(Phase::EnvironmentPrepared))
            .register(CallbackListener::new("observer").on_failed(move |context, _| {
                *captured.lock().unwrap() = Some(context.is_none());
                Ok(())
            }));

        let report = dispatcher(&registry)
            .run(&mut DefaultSteps)
            .await
            .unwrap_err();

        assert_eq!(*seen.lock().unwrap(), Some(true));
        assert_eq!(report.phase(), Some(Phase::EnvironmentPrepared));
        assert_eq!(
            entries(&journal),
            vec!["env:starting", "env:environment_prepared", "env:failed"]
        );
    }

    #[tokio::test]
    async fn test_listeners_see_earlier_edits() {
        let mut registry = ListenerRegistry::new();
        registry
            .register(
                CallbackListener::new("writer")
                    .with_order(1)
                    .on_environment_prepared(|environment| {
                        environment.set_property("feature.enabled", "true");
                        Ok(())
                    }),
            )
            .register(
                CallbackListener::new("reader")
                    .with_order(2)
                    .on_environment_prepared(|environment| {
                        anyhow::ensure!(
                            environment.get("feature.enabled") == Some("true"),
                            "edit not visible"
                        );
                        Ok(())
                    }),
            );

        let context = dispatcher(&registry).run(&mut DefaultSteps).await.unwrap();
        assert_eq!(context.environment().get("feature.enabled"), Some("true"));
    }

    #[tokio::test]
    async fn test_empty_snapshot_runs_and_fails_cleanly() {
        let registry = ListenerRegistry::new();

        let context = dispatcher(&registry).run(&mut DefaultSteps).await.unwrap();
        assert!(context.is_active());

        let report = dispatcher(&registry)
            .run(&mut FailingRefresh)
            .await
            .unwrap_err();
        assert!(matches!(
            report.primary(),
            BootError::BootstrapStep { step: BootStep::RefreshContext, .. }
        ));
    }

    #[tokio::test]
    async fn test_dispatching_failed_directly_reaches_every_listener() {
        let journal = Journal::default();
        let mut registry = ListenerRegistry::new();
        registry
            .register(Recorder::new("l1", 1, &journal).failing_on(Phase::Failed))
            .register(Recorder::new("l2", 2, &journal))
            .register(Recorder::new("l3", 3, &journal).failing_on(Phase::Failed));

        let failure = BootError::configuration("bad key");
        let result = dispatcher(&registry)
            .dispatch(&mut PhaseEvent::Failed {
                context: None,
                failure: &failure,
            })
            .await;

        assert_eq!(entries(&journal), vec!["l1:failed", "l2:failed", "l3:failed"]);
        assert!(matches!(
            result,
            Err(BootError::FailureDelivery { listener, .. }) if listener == "l1"
        ));
    }

    #[tokio::test]
    async fn test_panicking_failed_hook_is_suppressed() {
        let journal = Journal::default();
        let mut registry = ListenerRegistry::new();
        registry
            .register(Recorder::new("l1", 1, &journal).failing_on(Phase::ContextPrepared))
            .register(
                CallbackListener::new("panicker")
                    .with_order(2)
                    .on_failed(|_, _| panic!("failed hook blew up")),
            )
            .register(Recorder::new("l3", 3, &journal));

        let report = dispatcher(&registry)
            .run(&mut DefaultSteps)
            .await
            .unwrap_err();

        assert!(entries(&journal).ends_with(&["l1:failed".to_string(), "l3:failed".to_string()]));
        assert_eq!(report.primary().listener_name(), Some("l1"));
        assert_eq!(report.suppressed().len(), 1);
        match &report.suppressed()[0] {
            BootError::FailureDelivery { listener, source } => {
                assert_eq!(listener, "panicker");
                assert_eq!(source.to_string(), "listener panicked: failed hook blew up");
            }
            other => panic!("unexpected suppressed failure: {}", other),
        }
    }
}
