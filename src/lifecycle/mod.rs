//! Lifecycle Module
//!
//! This module dispatches the bootstrap lifecycle of an application to a set
//! of ordered run listeners.
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. starting                  ← Listener hook
//!    ↓
//! 2. Prepare Environment       (host step)
//!    ↓
//! 3. environment_prepared      ← Listener hook
//!    ↓
//! 4. Create Context            (host step)
//!    ↓
//! 5. context_prepared          ← Listener hook
//!    ↓
//! 6. Load Context              (host step)
//!    ↓
//! 7. context_loaded            ← Listener hook
//!    ↓
//! 8. Refresh Context           (host step)
//!    ↓
//! 9. started                   ← Listener hook
//!    ↓
//! 10. Call Runners             (host step)
//!    ↓
//! 11. running                  ← Listener hook
//!
//! Any failure in 1–11 → failed ← Listener hook (every listener, always)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use bootseq::lifecycle::{Application, RunListener};
//! use bootseq::context::ApplicationContext;
//! use async_trait::async_trait;
//!
//! struct StartupAudit;
//!
//! #[async_trait]
//! impl RunListener for StartupAudit {
//!     async fn started(&self, context: &mut ApplicationContext) -> anyhow::Result<()> {
//!         tracing::info!("Context {} is live", context.id());
//!         Ok(())
//!     }
//! }
//!
//! let running = Application::builder()
//!     .listener(StartupAudit)
//!     .build()?
//!     .run()
//!     .await?;
//! ```

mod application;
mod callback;
mod dispatcher;
mod error;
mod failure;
mod phase;
mod registry;
mod settings;
mod shutdown;
mod steps;
mod traits;

pub use application::{Application, ApplicationBuilder, RunningApplication};
pub use callback::CallbackListener;
pub use dispatcher::LifecycleDispatcher;
pub use error::{BootError, BootStep, Result};
pub use failure::{FailureAggregator, FailureReport};
pub use phase::{Phase, PhaseEvent};
pub use registry::{ListenerRegistry, ListenerSnapshot, RegisteredListener};
pub use settings::ApplicationSettings;
pub use shutdown::shutdown_signal;
pub use steps::{BootstrapSteps, DEFAULT_PROPERTIES, StandardBootstrap};
pub use traits::{HIGHEST_PRECEDENCE, LOWEST_PRECEDENCE, RunListener};
