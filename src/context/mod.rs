//! Application context handle
//!
//! The [`ApplicationContext`] is created by the host once the environment is
//! ready and travels through every phase from `context_prepared` onward.

use crate::env::Environment;
use crate::error::{ContextError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use strum_macros::{AsRefStr, Display};
use uuid::Uuid;

type CloseCallback = Box<dyn FnOnce() -> anyhow::Result<()> + Send + Sync>;

/// Where a context is in its own lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ContextState {
    Created,
    Active,
    Closed,
}

#[derive(Clone)]
struct BeanEntry {
    name: String,
    instance: Arc<dyn Any + Send + Sync>,
}

/// Mutable application-context handle.
///
/// Holds a type-keyed bean registry, the environment it was built from and
/// callbacks that run when the context is closed.
pub struct ApplicationContext {
    id: String,
    display_name: String,
    environment: Environment,
    beans: DashMap<TypeId, BeanEntry>,
    state: ContextState,
    startup_date: Option<DateTime<Utc>>,
    close_callbacks: Vec<(String, CloseCallback)>,
}

impl fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("state", &self.state)
            .field("beans", &self.beans.len())
            .field("startup_date", &self.startup_date)
            .finish()
    }
}

impl ApplicationContext {
    pub fn new(display_name: impl Into<String>, environment: Environment) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.into(),
            environment,
            beans: DashMap::new(),
            state: ContextState::Created,
            startup_date: None,
            close_callbacks: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ContextState::Active
    }

    /// Timestamp of the successful refresh, if any
    pub fn startup_date(&self) -> Option<DateTime<Utc>> {
        self.startup_date
    }

    /// Register a singleton bean, replacing any bean of the same type
    pub fn register_bean<T: 'static + Send + Sync>(
        &self,
        name: impl Into<String>,
        instance: T,
    ) -> Result<()> {
        if self.state == ContextState::Closed {
            return Err(ContextError::illegal_state(format!(
                "cannot register bean on closed context {}",
                self.display_name
            )));
        }
        let entry = BeanEntry {
            name: name.into(),
            instance: Arc::new(instance),
        };
        self.beans.insert(TypeId::of::<T>(), entry);
        Ok(())
    }

    pub fn get_bean<T: 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let entry = self
            .beans
            .get(&TypeId::of::<T>())
            .ok_or_else(|| ContextError::BeanNotFound {
                type_name: std::any::type_name::<T>().to_string(),
            })?;
        entry
            .instance
            .clone()
            .downcast::<T>()
            .map_err(|_| ContextError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    pub fn contains_bean<T: 'static>(&self) -> bool {
        self.beans.contains_key(&TypeId::of::<T>())
    }

    pub fn bean_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.beans.iter().map(|e| e.name.clone()).collect();
        names.sort();
        names
    }

    pub fn bean_count(&self) -> usize {
        self.beans.len()
    }

    /// Register a callback to run when the context closes.
    ///
    /// Callbacks run in **reverse order** of registration.
    pub fn on_close<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: FnOnce() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.close_callbacks.push((name.into(), Box::new(callback)));
    }

    /// Mark the context active and stamp its startup date
    pub fn refresh(&mut self) -> Result<()> {
        match self.state {
            ContextState::Created => {
                self.state = ContextState::Active;
                self.startup_date = Some(Utc::now());
                tracing::debug!("Refreshed context {} ({})", self.display_name, self.id);
                Ok(())
            }
            state => Err(ContextError::illegal_state(format!(
                "context {} cannot be refreshed while {}",
                self.display_name, state
            ))),
        }
    }

    /// Close the context, running close callbacks in reverse order.
    ///
    /// Callback failures are logged and do not stop the remaining callbacks.
    /// Closing an already closed context is a no-op.
    pub fn close(&mut self) {
        if self.state == ContextState::Closed {
            return;
        }
        tracing::info!("Closing context {}", self.display_name);

        while let Some((name, callback)) = self.close_callbacks.pop() {
            tracing::debug!("Running close callback: {}", name);
            if let Err(e) = callback() {
                tracing::warn!("Close callback {} failed: {:#}", name, e);
            }
        }
        self.beans.clear();
        self.state = ContextState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Database {
        url: String,
    }

    #[test]
    fn test_beans_resolve_by_type() {
        let context = ApplicationContext::new("test", Environment::new());
        context
            .register_bean("database", Database { url: "mem://".into() })
            .unwrap();

        assert!(context.contains_bean::<Database>());
        assert_eq!(context.get_bean::<Database>().unwrap().url, "mem://");
        assert!(matches!(
            context.get_bean::<String>(),
            Err(ContextError::BeanNotFound { .. })
        ));
        assert_eq!(context.bean_names(), vec!["database"]);
    }

    #[test]
    fn test_refresh_only_once() {
        let mut context = ApplicationContext::new("test", Environment::new());
        assert_eq!(context.state(), ContextState::Created);
        assert!(context.startup_date().is_none());

        context.refresh().unwrap();
        assert!(context.is_active());
        assert!(context.startup_date().is_some());
        assert!(context.refresh().is_err());
    }

    #[test]
    fn test_close_runs_callbacks_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut context = ApplicationContext::new("test", Environment::new());

        for i in 0..3 {
            let order = Arc::clone(&order);
            context.on_close(format!("callback{}", i), move || {
                order.lock().unwrap().push(i);
                if i == 1 {
                    anyhow::bail!("callback {} failed", i);
                }
                Ok(())
            });
        }

        context.close();
        context.close();

        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
        assert_eq!(context.state(), ContextState::Closed);
        assert!(context.register_bean("late", 1u8).is_err());
    }
}
