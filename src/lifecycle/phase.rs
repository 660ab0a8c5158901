//! Lifecycle phases and the data each phase carries

use super::{BootError, RunListener};
use crate::context::ApplicationContext;
use crate::env::Environment;
use strum_macros::{AsRefStr, Display, EnumIter};

/// One named point in the bootstrap sequence
///
/// ```text
/// Starting → EnvironmentPrepared → ContextPrepared → ContextLoaded → Started → Running
///     └──────────────┴────────────────────┴────────────────┴────────────┴──────────┴──→ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Starting,
    EnvironmentPrepared,
    ContextPrepared,
    ContextLoaded,
    Started,
    Running,
    Failed,
}

impl Phase {
    /// The ordinary (non-failure) phases in dispatch order
    pub const ORDINARY: [Phase; 6] = [
        Phase::Starting,
        Phase::EnvironmentPrepared,
        Phase::ContextPrepared,
        Phase::ContextLoaded,
        Phase::Started,
        Phase::Running,
    ];

    /// The phase that follows this one on a successful run
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Starting => Some(Phase::EnvironmentPrepared),
            Phase::EnvironmentPrepared => Some(Phase::ContextPrepared),
            Phase::ContextPrepared => Some(Phase::ContextLoaded),
            Phase::ContextLoaded => Some(Phase::Started),
            Phase::Started => Some(Phase::Running),
            Phase::Running | Phase::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Running | Phase::Failed)
    }
}

/// A phase together with the handles it carries
pub enum PhaseEvent<'a> {
    Starting,
    EnvironmentPrepared(&'a mut Environment),
    ContextPrepared(&'a mut ApplicationContext),
    ContextLoaded(&'a mut ApplicationContext),
    Started(&'a mut ApplicationContext),
    Running(&'a mut ApplicationContext),
    Failed {
        /// Absent when the failure happened before the context existed
        context: Option<&'a mut ApplicationContext>,
        failure: &'a BootError,
    },
}

impl PhaseEvent<'_> {
    pub fn phase(&self) -> Phase {
        match self {
            PhaseEvent::Starting => Phase::Starting,
            PhaseEvent::EnvironmentPrepared(_) => Phase::EnvironmentPrepared,
            PhaseEvent::ContextPrepared(_) => Phase::ContextPrepared,
            PhaseEvent::ContextLoaded(_) => Phase::ContextLoaded,
            PhaseEvent::Started(_) => Phase::Started,
            PhaseEvent::Running(_) => Phase::Running,
            PhaseEvent::Failed { .. } => Phase::Failed,
        }
    }

    /// Invoke the hook matching this phase on one listener.
    ///
    /// The handles are reborrowed, so the event can be delivered to every
    /// listener in turn and each sees the edits made by the ones before it.
    pub async fn deliver(&mut self, listener: &dyn RunListener) -> anyhow::Result<()> {
        match self {
            PhaseEvent::Starting => listener.starting().await,
            PhaseEvent::EnvironmentPrepared(environment) => {
                listener.environment_prepared(environment).await
            }
            PhaseEvent::ContextPrepared(context) => listener.context_prepared(context).await,
            PhaseEvent::ContextLoaded(context) => listener.context_loaded(context).await,
            PhaseEvent::Started(context) => listener.started(context).await,
            PhaseEvent::Running(context) => listener.running(context).await,
            PhaseEvent::Failed { context, failure } => {
                listener.failed(context.as_deref_mut(), *failure).await
            }
        }
    }
}
