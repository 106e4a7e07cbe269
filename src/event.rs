//! Cache lifecycle events and the listener registry.
//!
//! Listeners are held in a shared [`ListenerRegistry`]. Notification takes a
//! snapshot of the registered listeners and invokes them with the lock
//! released, so a listener may add or remove listeners from its callback.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// A change in cache or strategy state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheEvent {
    /// The cache's source was replaced.
    SourceChanged,
    /// The cache's strategy was replaced.
    StrategyChanged,
    /// The current position moved; carries its raster index.
    PositionChanged(usize),
    /// An axis priority changed; carries the axis index.
    PrioritiesChanged(usize),
    /// An axis order changed; carries the axis index.
    OrderChanged(usize),
    /// An axis range changed; carries the axis index.
    RangeChanged(usize),
    /// An object became resident; carries its raster index.
    ObjectLoaded(usize),
    /// An object was evicted; carries its raster index.
    ObjectDropped(usize),
}

impl std::fmt::Display for CacheEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheEvent::SourceChanged => write!(f, "source changed"),
            CacheEvent::StrategyChanged => write!(f, "strategy changed"),
            CacheEvent::PositionChanged(i) => write!(f, "position changed to {i}"),
            CacheEvent::PrioritiesChanged(a) => write!(f, "priority of axis {a} changed"),
            CacheEvent::OrderChanged(a) => write!(f, "order of axis {a} changed"),
            CacheEvent::RangeChanged(a) => write!(f, "range of axis {a} changed"),
            CacheEvent::ObjectLoaded(i) => write!(f, "object {i} loaded"),
            CacheEvent::ObjectDropped(i) => write!(f, "object {i} dropped"),
        }
    }
}

/// Observer of cache events.
pub trait CacheListener: Send + Sync {
    fn cache_updated(&self, event: &CacheEvent);
}

/// Shared, mutex-guarded set of listeners.
///
/// Cloning yields another handle to the same set.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: Arc<Mutex<Vec<Arc<dyn CacheListener>>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Returns `false` if it was already registered.
    pub fn add(&self, listener: Arc<dyn CacheListener>) -> bool {
        let mut listeners = self.listeners.lock();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Unregister a listener. Removing an unknown listener is a no-op.
    pub fn remove(&self, listener: &Arc<dyn CacheListener>) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        before != listeners.len()
    }

    /// Deliver `event` to every registered listener.
    pub fn notify(&self, event: CacheEvent) {
        let snapshot = self.snapshot();
        for listener in &snapshot {
            listener.cache_updated(&event);
        }
    }

    /// Current listeners, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<dyn CacheListener>> {
        self.listeners.lock().clone()
    }

    /// Remove and return every listener.
    pub fn drain(&self) -> Vec<Arc<dyn CacheListener>> {
        std::mem::take(&mut *self.listeners.lock())
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

fn same_listener(a: &Arc<dyn CacheListener>, b: &Arc<dyn CacheListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Forwards events into an unbounded channel.
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<CacheEvent>,
}

impl ChannelListener {
    /// Create a listener together with the receiving end of its channel.
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<CacheEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl CacheListener for ChannelListener {
    fn cache_updated(&self, event: &CacheEvent) {
        // A closed receiver just means nobody is watching any more.
        let _ = self.tx.send(*event);
    }
}

/// Logs every event through `tracing`.
#[derive(Debug, Default)]
pub struct TracingListener;

impl CacheListener for TracingListener {
    fn cache_updated(&self, event: &CacheEvent) {
        match event {
            CacheEvent::ObjectLoaded(index) => debug!(index, "Object loaded"),
            CacheEvent::ObjectDropped(index) => debug!(index, "Object dropped"),
            CacheEvent::PositionChanged(index) => info!(index, "Position changed"),
            other => info!(event = %other, "Cache updated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<CacheEvent>>,
    }

    impl CacheListener for Recorder {
        fn cache_updated(&self, event: &CacheEvent) {
            self.events.lock().push(*event);
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let registry = ListenerRegistry::new();
        let recorder: Arc<dyn CacheListener> = Arc::new(Recorder::default());

        assert!(registry.add(recorder.clone()));
        assert!(!registry.add(recorder.clone()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let registry = ListenerRegistry::new();
        let known: Arc<dyn CacheListener> = Arc::new(Recorder::default());
        let unknown: Arc<dyn CacheListener> = Arc::new(Recorder::default());
        registry.add(known.clone());

        assert!(!registry.remove(&unknown));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(&known));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_notify_reaches_all_listeners() {
        let registry = ListenerRegistry::new();
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        registry.add(a.clone());
        registry.add(b.clone());

        registry.notify(CacheEvent::ObjectLoaded(4));

        assert_eq!(*a.events.lock(), vec![CacheEvent::ObjectLoaded(4)]);
        assert_eq!(*b.events.lock(), vec![CacheEvent::ObjectLoaded(4)]);
    }

    #[test]
    fn test_listener_may_mutate_registry_during_notify() {
        struct SelfRemoving {
            registry: ListenerRegistry,
            me: Mutex<Option<Arc<dyn CacheListener>>>,
        }

        impl CacheListener for SelfRemoving {
            fn cache_updated(&self, _event: &CacheEvent) {
                if let Some(me) = self.me.lock().take() {
                    self.registry.remove(&me);
                }
            }
        }

        let registry = ListenerRegistry::new();
        let listener = Arc::new(SelfRemoving {
            registry: registry.clone(),
            me: Mutex::new(None),
        });
        let as_dyn: Arc<dyn CacheListener> = listener.clone();
        *listener.me.lock() = Some(as_dyn.clone());
        registry.add(as_dyn);

        registry.notify(CacheEvent::SourceChanged);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_drain_empties_registry() {
        let registry = ListenerRegistry::new();
        registry.add(Arc::new(Recorder::default()));
        registry.add(Arc::new(Recorder::default()));

        let drained = registry.drain();
        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_channel_listener_forwards_events() {
        let registry = ListenerRegistry::new();
        let (listener, mut rx) = ChannelListener::channel();
        registry.add(listener);

        registry.notify(CacheEvent::PositionChanged(17));
        registry.notify(CacheEvent::ObjectDropped(3));

        assert_eq!(rx.recv().await, Some(CacheEvent::PositionChanged(17)));
        assert_eq!(rx.recv().await, Some(CacheEvent::ObjectDropped(3)));
    }
}
