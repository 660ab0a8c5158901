//! Lifecycle-specific error types

use super::Phase;
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

/// The host bootstrap steps that run between phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum BootStep {
    PrepareEnvironment,
    CreateContext,
    LoadContext,
    RefreshContext,
    CallRunners,
}

/// Errors that can occur during a bootstrap run
#[derive(Debug, Error)]
pub enum BootError {
    /// A listener registration or run setting is invalid
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// What was wrong
        message: String,
    },

    /// A listener hook failed during an ordinary phase
    #[error("Listener {listener} failed during {phase}")]
    ListenerInvocation {
        /// Name of the listener that failed
        listener: String,
        /// The phase being dispatched
        phase: Phase,
        /// The error returned by the hook
        #[source]
        source: anyhow::Error,
    },

    /// A host bootstrap step failed
    #[error("Bootstrap step {step} failed")]
    BootstrapStep {
        /// The step that failed
        step: BootStep,
        /// The error returned by the host
        #[source]
        source: anyhow::Error,
    },

    /// A listener's `failed` hook itself failed
    #[error("Listener {listener} failed while handling an application failure")]
    FailureDelivery {
        /// Name of the listener that failed
        listener: String,
        /// The error returned by the hook
        #[source]
        source: anyhow::Error,
    },
}

impl BootError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a listener invocation error
    pub fn listener(listener: impl Into<String>, phase: Phase, source: anyhow::Error) -> Self {
        Self::ListenerInvocation {
            listener: listener.into(),
            phase,
            source,
        }
    }

    /// Create a bootstrap step error
    pub fn step(step: BootStep, source: anyhow::Error) -> Self {
        Self::BootstrapStep { step, source }
    }

    /// Create a failure delivery error
    pub fn delivery(listener: impl Into<String>, source: anyhow::Error) -> Self {
        Self::FailureDelivery {
            listener: listener.into(),
            source,
        }
    }

    /// Name of the listener involved, if any
    pub fn listener_name(&self) -> Option<&str> {
        match self {
            Self::ListenerInvocation { listener, .. } | Self::FailureDelivery { listener, .. } => {
                Some(listener)
            }
            _ => None,
        }
    }

    /// The innermost cause in the source chain
    pub fn root_cause(&self) -> &(dyn std::error::Error + 'static) {
        let mut current: &(dyn std::error::Error + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }
}

/// A specialized Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, BootError>;
