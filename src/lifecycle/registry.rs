//! Listener Registry
//!
//! Collects run listeners during discovery and freezes them into an ordered,
//! immutable [`ListenerSnapshot`] before the first phase fires.

use super::{BootError, HIGHEST_PRECEDENCE, LOWEST_PRECEDENCE, Result, RunListener};
use std::ops::Deref;
use std::sync::Arc;

/// How a registered listener's priority is known
#[derive(Debug, Clone, PartialEq, Eq)]
enum PriorityKey {
    /// Taken from [`RunListener::order`]
    Resolved(i32),
    /// Declared as text by the discovery collaborator, parsed at snapshot time
    Declared(String),
}

struct Registration {
    listener: Arc<dyn RunListener>,
    key: PriorityKey,
}

/// A listener together with its resolved priority
#[derive(Clone)]
pub struct RegisteredListener {
    name: String,
    order: i32,
    listener: Arc<dyn RunListener>,
}

impl RegisteredListener {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn listener(&self) -> &dyn RunListener {
        self.listener.as_ref()
    }
}

/// Immutable, priority-ordered view of the registry for one run
#[derive(Clone)]
pub struct ListenerSnapshot {
    listeners: Arc<[RegisteredListener]>,
}

impl ListenerSnapshot {
    /// Listener names in dispatch order
    pub fn names(&self) -> Vec<&str> {
        self.listeners.iter().map(RegisteredListener::name).collect()
    }
}

impl Deref for ListenerSnapshot {
    type Target = [RegisteredListener];

    fn deref(&self) -> &Self::Target {
        &self.listeners
    }
}

/// Ordered collection of run listeners
///
/// # Example
///
/// ```rust,ignore
/// use bootseq::lifecycle::ListenerRegistry;
///
/// let mut registry = ListenerRegistry::new();
/// registry.register(AuditListener::new());
/// registry.register_with_order_key(MetricsListener, "HIGHEST_PRECEDENCE");
///
/// let snapshot = registry.snapshot()?;
/// ```
#[derive(Default)]
pub struct ListenerRegistry {
    registrations: Vec<Registration>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener, ordered by its own [`RunListener::order`]
    pub fn register<L>(&mut self, listener: L) -> &mut Self
    where
        L: RunListener + 'static,
    {
        self.register_arc(Arc::new(listener))
    }

    /// Register a shared listener, ordered by its own [`RunListener::order`]
    pub fn register_arc(&mut self, listener: Arc<dyn RunListener>) -> &mut Self {
        let key = PriorityKey::Resolved(listener.order());
        tracing::debug!("Registered run listener: {}", listener.name());
        self.registrations.push(Registration { listener, key });
        self
    }

    /// Register a listener with a textual priority key.
    ///
    /// Accepted keys are a signed 32-bit integer, `HIGHEST_PRECEDENCE` or
    /// `LOWEST_PRECEDENCE`. The key is only validated by [`snapshot`](Self::snapshot).
    pub fn register_with_order_key<L>(&mut self, listener: L, key: impl Into<String>) -> &mut Self
    where
        L: RunListener + 'static,
    {
        let listener: Arc<dyn RunListener> = Arc::new(listener);
        tracing::debug!("Registered run listener: {}", listener.name());
        self.registrations.push(Registration {
            listener,
            key: PriorityKey::Declared(key.into()),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Resolve every priority and return the listeners in dispatch order.
    ///
    /// Lower priority values come first; equal priorities keep their
    /// registration order.
    ///
    /// # Errors
    ///
    /// Returns [`BootError::Configuration`] if a declared key cannot be parsed.
    pub fn snapshot(&self) -> Result<ListenerSnapshot> {
        let mut listeners = self
            .registrations
            .iter()
            .map(|registration| -> Result<RegisteredListener> {
                let name = registration.listener.name().to_string();
                let order = match &registration.key {
                    PriorityKey::Resolved(order) => *order,
                    PriorityKey::Declared(key) => parse_order_key(key).ok_or_else(|| {
                        BootError::configuration(format!(
                            "listener {} declares unparseable priority key {:?}",
                            name, key
                        ))
                    })?,
                };
                Ok(RegisteredListener {
                    name,
                    order,
                    listener: Arc::clone(&registration.listener),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Stable: ties keep registration order
        listeners.sort_by_key(RegisteredListener::order);

        Ok(ListenerSnapshot {
            listeners: listeners.into(),
        })
    }
}

fn parse_order_key(key: &str) -> Option<i32> {
    match key.trim() {
        "HIGHEST_PRECEDENCE" => Some(HIGHEST_PRECEDENCE),
        "LOWEST_PRECEDENCE" => Some(LOWEST_PRECEDENCE),
        other => other.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::CallbackListener;

    #[test]
    fn test_snapshot_sorts_by_priority_then_registration() {
        let mut registry = ListenerRegistry::new();
        registry
            .register(CallbackListener::new("late").with_order(10))
            .register(CallbackListener::new("first-tie").with_order(0))
            .register(CallbackListener::new("default"))
            .register(CallbackListener::new("second-tie").with_order(0))
            .register_with_order_key(CallbackListener::new("declared"), " -5 ")
            .register_with_order_key(CallbackListener::new("highest"), "HIGHEST_PRECEDENCE");

        let snapshot = registry.snapshot().unwrap();
        assert_eq!(
            snapshot.names(),
            vec!["highest", "declared", "first-tie", "second-tie", "late", "default"]
        );
        assert_eq!(snapshot[0].order(), HIGHEST_PRECEDENCE);
        assert_eq!(snapshot.len(), registry.len());
    }

    #[test]
    fn test_declared_key_overrides_listener_order() {
        let mut registry = ListenerRegistry::new();
        registry
            .register(CallbackListener::new("a").with_order(1))
            .register_with_order_key(
                CallbackListener::new("b").with_order(-1),
                "LOWEST_PRECEDENCE",
            );

        let snapshot = registry.snapshot().unwrap();
        assert_eq!(snapshot.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_unparseable_key_is_a_configuration_error() {
        let mut registry = ListenerRegistry::new();
        registry
            .register(CallbackListener::new("fine"))
            .register_with_order_key(CallbackListener::new("broken"), "soon");

        match registry.snapshot() {
            Err(BootError::Configuration { message }) => {
                assert!(message.contains("broken"));
                assert!(message.contains("soon"));
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_registration() {
        let mut registry = ListenerRegistry::new();
        registry.register(CallbackListener::new("one"));
        let snapshot = registry.snapshot().unwrap();

        registry.register(CallbackListener::new("two"));
        assert_eq!(snapshot.names(), vec!["one"]);
        assert_eq!(registry.len(), 2);
        assert!(ListenerRegistry::new().snapshot().unwrap().is_empty());
    }
}
