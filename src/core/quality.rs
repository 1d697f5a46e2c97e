//! Quality levels and the typed quality-change bus.
//!
//! The sampler is the only producer on the bus. Consumers subscribe and keep
//! their own [`QualityLevel`]; the bus never stores one. Delivery is
//! synchronous and best-effort: a signal published while nobody is subscribed
//! is dropped, and nothing is replayed to late subscribers.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use hashbrown::HashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Channel name carried by every signal on the bus.
pub const PERFORMANCE_OPTIMIZE: &str = "performance-optimize";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum QualityLevel {
    Low,
    Medium,
    #[default]
    High,
    Ultra,
}

impl QualityLevel {
    pub fn all() -> &'static [QualityLevel] {
        &[
            QualityLevel::Low,
            QualityLevel::Medium,
            QualityLevel::High,
            QualityLevel::Ultra,
        ]
    }

    fn index(self) -> usize {
        self as usize
    }

    /// One step toward `Low`, clamped.
    pub fn lower(self) -> Self {
        let all = Self::all();
        all[self.index().saturating_sub(1)]
    }

    /// One step toward `Ultra`, clamped.
    pub fn raise(self) -> Self {
        let all = Self::all();
        all[(self.index() + 1).min(all.len() - 1)]
    }

    pub fn step(self, action: QualityAction) -> Self {
        match action {
            QualityAction::ReduceQuality => self.lower(),
            QualityAction::IncreaseQuality => self.raise(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityLevel::Low => "low",
            QualityLevel::Medium => "medium",
            QualityLevel::High => "high",
            QualityLevel::Ultra => "ultra",
        }
    }

    pub fn parse(v: &str) -> Option<Self> {
        match v.trim().to_ascii_lowercase().as_str() {
            "low" => Some(QualityLevel::Low),
            "medium" => Some(QualityLevel::Medium),
            "high" => Some(QualityLevel::High),
            "ultra" => Some(QualityLevel::Ultra),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum QualityAction {
    ReduceQuality,
    IncreaseQuality,
}

impl QualityAction {
    pub fn label(self) -> &'static str {
        match self {
            QualityAction::ReduceQuality => "reduce-quality",
            QualityAction::IncreaseQuality => "increase-quality",
        }
    }
}

/// Payload published on [`PERFORMANCE_OPTIMIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QualitySignal {
    pub action: QualityAction,
}

type Listener = Arc<dyn Fn(QualitySignal) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<u64, Listener>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to a quality-change channel. Cloning shares the same listeners.
#[derive(Clone, Default)]
pub struct QualityBus {
    registry: Arc<Mutex<Registry>>,
}

impl QualityBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &'static str {
        PERFORMANCE_OPTIMIZE
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is dropped or cancelled.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(QualitySignal) + Send + Sync + 'static,
    {
        let mut reg = lock(&self.registry);
        let id = reg.next_id;
        reg.next_id += 1;
        reg.listeners.insert(id, Arc::new(listener));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `signal` to every current listener. Returns how many received it.
    pub fn publish(&self, signal: QualitySignal) -> usize {
        // Listeners run outside the lock so they may subscribe or unsubscribe.
        let listeners: Vec<Listener> = lock(&self.registry).listeners.values().cloned().collect();
        for l in &listeners {
            l(signal);
        }
        listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.registry).listeners.len()
    }
}

impl std::fmt::Debug for QualityBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityBus")
            .field("name", &PERFORMANCE_OPTIMIZE)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// RAII registration on a [`QualityBus`].
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(reg) = self.registry.upgrade() {
            lock(&reg).listeners.remove(&self.id);
        }
    }
}

/// Consumer-side quality state driven by bus signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QualityController {
    level: QualityLevel,
}

impl QualityController {
    pub fn new(level: QualityLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> QualityLevel {
        self.level
    }

    /// Apply a signal. Returns the new level when it changed.
    pub fn apply(&mut self, signal: QualitySignal) -> Option<QualityLevel> {
        let next = self.level.step(signal.action);
        if next == self.level {
            return None;
        }
        tracing::info!(
            from = self.level.label(),
            to = next.label(),
            action = signal.action.label(),
            "quality level changed"
        );
        self.level = next;
        Some(next)
    }
}

/// A [`QualityController`] subscribed to a bus for as long as it lives.
pub struct QualityListener {
    controller: Arc<Mutex<QualityController>>,
    _subscription: Subscription,
}

impl QualityListener {
    pub fn attach(bus: &QualityBus, initial: QualityLevel) -> Self {
        let controller = Arc::new(Mutex::new(QualityController::new(initial)));
        let shared = Arc::clone(&controller);
        let subscription = bus.subscribe(move |signal| {
            let mut c = shared.lock().unwrap_or_else(|p| p.into_inner());
            c.apply(signal);
        });
        Self {
            controller,
            _subscription: subscription,
        }
    }

    pub fn level(&self) -> QualityLevel {
        self.controller
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const REDUCE: QualitySignal = QualitySignal {
        action: QualityAction::ReduceQuality,
    };
    const INCREASE: QualitySignal = QualitySignal {
        action: QualityAction::IncreaseQuality,
    };

    #[test]
    fn steps_are_clamped() {
        assert_eq!(QualityLevel::Low.lower(), QualityLevel::Low);
        assert_eq!(QualityLevel::Ultra.raise(), QualityLevel::Ultra);
        assert_eq!(QualityLevel::High.lower(), QualityLevel::Medium);
        assert_eq!(QualityLevel::Medium.raise(), QualityLevel::High);
    }

    #[test]
    fn controller_walks_down_to_low_and_stops() {
        let mut c = QualityController::new(QualityLevel::Ultra);
        assert_eq!(c.apply(REDUCE), Some(QualityLevel::High));
        assert_eq!(c.apply(REDUCE), Some(QualityLevel::Medium));
        assert_eq!(c.apply(REDUCE), Some(QualityLevel::Low));
        assert_eq!(c.apply(REDUCE), None);
        assert_eq!(c.level(), QualityLevel::Low);
        assert_eq!(c.apply(INCREASE), Some(QualityLevel::Medium));
    }

    #[test]
    fn publish_reaches_every_listener() {
        let bus = QualityBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h1 = Arc::clone(&hits);
        let h2 = Arc::clone(&hits);
        let _a = bus.subscribe(move |_| {
            h1.fetch_add(1, Ordering::SeqCst);
        });
        let _b = bus.subscribe(move |_| {
            h2.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(bus.publish(REDUCE), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let bus = QualityBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let sub = bus.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        bus.publish(INCREASE);
        sub.cancel();
        assert_eq!(bus.listener_count(), 0);
        assert_eq!(bus.publish(INCREASE), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn no_replay_for_late_subscribers() {
        let bus = QualityBus::new();
        assert_eq!(bus.publish(REDUCE), 0);
        let listener = QualityListener::attach(&bus, QualityLevel::High);
        assert_eq!(listener.level(), QualityLevel::High);
        bus.publish(REDUCE);
        assert_eq!(listener.level(), QualityLevel::Medium);
    }

    #[test]
    fn listener_may_unsubscribe_itself_during_delivery() {
        let bus = QualityBus::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let inner = Arc::clone(&slot);
        let sub = bus.subscribe(move |_| {
            inner.lock().unwrap().take();
        });
        *slot.lock().unwrap() = Some(sub);
        assert_eq!(bus.publish(REDUCE), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn labels_match_wire_names() {
        assert_eq!(QualityAction::ReduceQuality.label(), "reduce-quality");
        assert_eq!(QualityAction::IncreaseQuality.label(), "increase-quality");
        assert_eq!(QualityBus::new().name(), "performance-optimize");
        for l in QualityLevel::all() {
            assert_eq!(QualityLevel::parse(l.label()), Some(*l));
        }
    }
}
