//! Run listener contract
//!
//! A run listener is notified at every point of the bootstrap sequence.
//! Every hook has a no-op default, so an implementation only overrides the
//! phases it cares about.

use super::BootError;
use crate::context::ApplicationContext;
use crate::env::Environment;
use async_trait::async_trait;

/// Order value that sorts before every other listener
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// Order value that sorts after every other listener; the default
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// Listens to one bootstrap run
///
/// Hooks are invoked one listener at a time in ascending [`order`](Self::order).
/// Returning an error from any hook other than [`failed`](Self::failed) aborts
/// the run and routes every listener to `failed`.
///
/// # Example
///
/// ```rust,ignore
/// use bootseq::lifecycle::RunListener;
/// use bootseq::env::Environment;
/// use async_trait::async_trait;
///
/// struct ProfileDefaults;
///
/// #[async_trait]
/// impl RunListener for ProfileDefaults {
///     async fn environment_prepared(&self, environment: &mut Environment) -> anyhow::Result<()> {
///         if environment.active_profiles().is_empty() {
///             environment.add_active_profile("default");
///         }
///         Ok(())
///     }
///
///     fn order(&self) -> i32 {
///         -10
///     }
/// }
/// ```
#[async_trait]
pub trait RunListener: Send + Sync {
    /// Called immediately when the run begins
    async fn starting(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once the environment is prepared, before the context is created
    ///
    /// Edits made here are visible to every listener invoked afterwards.
    async fn environment_prepared(&self, _environment: &mut Environment) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once the context is created, before its sources are loaded
    async fn context_prepared(&self, _context: &mut ApplicationContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once the context is loaded, before it is refreshed
    async fn context_loaded(&self, _context: &mut ApplicationContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after the context is refreshed, before the application runners
    async fn started(&self, _context: &mut ApplicationContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after the application runners finish; the run is then complete
    async fn running(&self, _context: &mut ApplicationContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called when the run fails at any point
    ///
    /// `context` is `None` if the failure happened before the context was
    /// created. An error returned or a panic raised here is recorded but
    /// never stops the other listeners from being notified.
    async fn failed(
        &self,
        _context: Option<&mut ApplicationContext>,
        _failure: &BootError,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Name used in logs and error reports
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Dispatch priority: lower values are notified first
    fn order(&self) -> i32 {
        LOWEST_PRECEDENCE
    }
}
