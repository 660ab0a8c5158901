//! # bootseq
//!
//! An application bootstrap lifecycle dispatcher for Rust.
//!
//! bootseq drives an application through a fixed sequence of startup phases
//! and notifies an ordered set of run listeners at each one:
//!
//! ## Features
//!
//! - **Ordered Listeners**: Listeners run by ascending priority, ties in registration order
//! - **Shared Handles**: Each listener sees the environment and context edits of the ones before it
//! - **Exhaustive Failure Delivery**: Every listener hears about a failed run, even if a sibling misbehaves
//! - **Composite Reports**: The triggering failure plus every suppressed secondary failure
//! - **Pluggable Host Steps**: Environment and context construction behind one trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bootseq::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Application::builder()
//!         .name("orders")
//!         .listener(
//!             CallbackListener::new("banner")
//!                 .with_order(HIGHEST_PRECEDENCE)
//!                 .on_starting(|| {
//!                     tracing::info!("booting orders");
//!                     Ok(())
//!                 }),
//!         )
//!         .build()
//!         .expect("invalid settings");
//!
//!     match app.run().await {
//!         Ok(running) => running.wait_for_shutdown().await,
//!         Err(report) => eprintln!("{}: {}", report, report.primary()),
//!     }
//! }
//! ```

pub mod context;
pub mod env;
pub mod error;
pub mod lifecycle;

// Re-export core types
pub use context::ApplicationContext;
pub use env::Environment;
pub use error::{ContextError, Result};
pub use lifecycle::{Application, BootError, FailureReport, RunListener};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;

/// Prelude module for convenient imports
///
/// ```
/// use bootseq::prelude::*;
/// ```
pub mod prelude {
    pub use crate::context::{ApplicationContext, ContextState};
    pub use crate::env::{Environment, PropertySource};
    pub use crate::error::ContextError;
    pub use crate::lifecycle::{
        Application, ApplicationBuilder, ApplicationSettings, BootError, BootStep,
        BootstrapSteps, CallbackListener, FailureReport, HIGHEST_PRECEDENCE, LOWEST_PRECEDENCE,
        LifecycleDispatcher, ListenerRegistry, Phase, RunListener, RunningApplication,
        StandardBootstrap, shutdown_signal,
    };
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
