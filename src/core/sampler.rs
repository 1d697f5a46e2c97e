//! Adaptive frame sampler.
//!
//! [`FrameSampler`] is the pure per-frame state machine: it counts frames,
//! flushes a [`PerformanceSample`] once per flush interval and publishes
//! quality signals. [`MonitorSession`] drives it from a [`FrameHost`]'s paint
//! callbacks and owns the start/stop lifecycle.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::MonitorConfig;
use crate::history::FrameHistory;
use crate::host::{FrameHandle, FrameHost, HeapUsage};
use crate::quality::{QualityAction, QualityBus, QualitySignal};
use crate::tier::PerformanceTier;

/// One flushed measurement window.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PerformanceSample {
    /// Frames counted in the window that just closed.
    pub frame_rate: u32,
    /// Mean over the rolling history, including this window.
    pub average_frame_rate: f64,
    /// Host heap usage at flush time, `0` when unavailable.
    pub memory_used_bytes: u64,
    /// Host clock at flush time.
    #[cfg_attr(feature = "serde", serde(rename = "renderTime"))]
    pub render_time_ms: f64,
    pub tier: PerformanceTier,
    pub recommendations: Vec<String>,
}

impl PerformanceSample {
    pub fn memory_used_mib(&self) -> f64 {
        self.memory_used_bytes as f64 / crate::tier::MIB as f64
    }

    /// The quality request this sample implies, if any.
    pub fn quality_action(&self) -> Option<QualityAction> {
        match self.tier {
            PerformanceTier::Poor => Some(QualityAction::ReduceQuality),
            PerformanceTier::Excellent => Some(QualityAction::IncreaseQuality),
            PerformanceTier::Good | PerformanceTier::Fair => None,
        }
    }
}

pub type SampleCallback = Box<dyn FnMut(&PerformanceSample)>;

pub struct FrameSampler {
    history: FrameHistory,
    flush_interval_ms: f64,
    adaptive: bool,
    frame_count: u32,
    window_start_ms: Option<f64>,
    bus: Option<QualityBus>,
    on_sample: Option<SampleCallback>,
    last_sample: Option<PerformanceSample>,
    flushes: u64,
}

impl FrameSampler {
    pub fn new(config: &MonitorConfig) -> Self {
        let config = config.clone().normalized();
        Self {
            history: FrameHistory::new(config.history_len),
            flush_interval_ms: config.flush_interval_ms,
            adaptive: config.adaptive_quality,
            frame_count: 0,
            window_start_ms: None,
            bus: None,
            on_sample: None,
            last_sample: None,
            flushes: 0,
        }
    }

    /// Bus that receives quality signals when adaptive mode is on.
    pub fn with_bus(mut self, bus: QualityBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn on_sample<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&PerformanceSample) + 'static,
    {
        self.on_sample = Some(Box::new(callback));
        self
    }

    /// Open the first measurement window at `now_ms`.
    pub fn begin(&mut self, now_ms: f64) {
        self.frame_count = 0;
        self.window_start_ms = Some(now_ms);
    }

    /// Count one painted frame. Returns the sample when this frame closed a window.
    ///
    /// On flush the observer callback runs first, then the quality signal is
    /// published. `heap` is only consulted on flush.
    pub fn tick<F>(&mut self, now_ms: f64, heap: F) -> Option<PerformanceSample>
    where
        F: FnOnce() -> Option<HeapUsage>,
    {
        let sample = self.measure(now_ms, heap)?;
        if let Some(cb) = self.on_sample.as_mut() {
            cb(&sample);
        }
        if let Some((bus, signal)) = self.pending_signal(&sample) {
            bus.publish(signal);
        }
        Some(sample)
    }

    /// Count one frame and build the sample when the window closes, without
    /// calling the observer or publishing.
    fn measure<F>(&mut self, now_ms: f64, heap: F) -> Option<PerformanceSample>
    where
        F: FnOnce() -> Option<HeapUsage>,
    {
        self.frame_count = self.frame_count.saturating_add(1);
        let start = *self.window_start_ms.get_or_insert(now_ms);
        if now_ms - start < self.flush_interval_ms {
            return None;
        }

        let frame_rate = self.frame_count;
        self.frame_count = 0;
        self.window_start_ms = Some(now_ms);

        self.history.push(frame_rate);
        let average_frame_rate = self.history.mean();
        let memory_used_bytes = heap().map(|h| h.used_bytes).unwrap_or(0);
        let tier = PerformanceTier::classify(average_frame_rate, memory_used_bytes);

        let sample = PerformanceSample {
            frame_rate,
            average_frame_rate,
            memory_used_bytes,
            render_time_ms: now_ms,
            tier,
            recommendations: tier
                .recommendations()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        let previous_tier = self.last_sample.as_ref().map(|s| s.tier);
        if previous_tier != Some(tier) {
            tracing::info!(
                tier = tier.label(),
                previous = previous_tier.map(PerformanceTier::label),
                avg_fps = average_frame_rate,
                "performance tier changed"
            );
        }
        tracing::debug!(
            fps = frame_rate,
            avg_fps = average_frame_rate,
            memory_bytes = memory_used_bytes,
            tier = tier.label(),
            "frame window flushed"
        );

        self.flushes += 1;
        self.last_sample = Some(sample.clone());
        Some(sample)
    }

    fn pending_signal(&self, sample: &PerformanceSample) -> Option<(QualityBus, QualitySignal)> {
        if !self.adaptive {
            return None;
        }
        let bus = self.bus.as_ref()?;
        let action = sample.quality_action()?;
        Some((bus.clone(), QualitySignal { action }))
    }

    pub fn history(&self) -> &FrameHistory {
        &self.history
    }

    pub fn last_sample(&self) -> Option<&PerformanceSample> {
        self.last_sample.as_ref()
    }

    pub fn frames_in_window(&self) -> u32 {
        self.frame_count
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes
    }

    pub fn is_adaptive(&self) -> bool {
        self.adaptive
    }
}

struct SessionShared {
    sampler: RefCell<FrameSampler>,
    running: Cell<bool>,
    pending: Cell<Option<FrameHandle>>,
    frames: Cell<u64>,
}

/// A mounted sampler: one frame request in flight until [`MonitorSession::stop`].
pub struct MonitorSession<H: FrameHost + 'static> {
    host: Rc<H>,
    shared: Rc<SessionShared>,
}

impl<H: FrameHost + 'static> MonitorSession<H> {
    pub fn start(host: Rc<H>, mut sampler: FrameSampler) -> Self {
        sampler.begin(host.now_ms());
        let shared = Rc::new(SessionShared {
            sampler: RefCell::new(sampler),
            running: Cell::new(true),
            pending: Cell::new(None),
            frames: Cell::new(0),
        });
        schedule_next(&host, &shared);
        tracing::debug!("monitor session started");
        Self { host, shared }
    }

    /// Cancel the outstanding frame request. Idempotent.
    pub fn stop(&self) {
        if !self.shared.running.replace(false) {
            return;
        }
        if let Some(handle) = self.shared.pending.take() {
            self.host.cancel_frame(handle);
        }
        tracing::debug!(frames = self.shared.frames.get(), "monitor session stopped");
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.get()
    }

    /// Paint callbacks handled so far.
    pub fn frames_seen(&self) -> u64 {
        self.shared.frames.get()
    }

    pub fn last_sample(&self) -> Option<PerformanceSample> {
        self.shared.sampler.borrow().last_sample().cloned()
    }

    pub fn with_sampler<R>(&self, f: impl FnOnce(&FrameSampler) -> R) -> R {
        f(&self.shared.sampler.borrow())
    }
}

impl<H: FrameHost + 'static> Drop for MonitorSession<H> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn schedule_next<H: FrameHost + 'static>(host: &Rc<H>, shared: &Rc<SessionShared>) {
    let weak_host: Weak<H> = Rc::downgrade(host);
    let weak_shared: Weak<SessionShared> = Rc::downgrade(shared);
    let handle = host.request_frame(Box::new(move |timestamp_ms| {
        let (Some(host), Some(shared)) = (weak_host.upgrade(), weak_shared.upgrade()) else {
            return;
        };
        if !shared.running.get() {
            return;
        }
        shared.pending.set(None);
        shared.frames.set(shared.frames.get() + 1);
        let flushed = shared
            .sampler
            .borrow_mut()
            .measure(timestamp_ms, || host.heap_usage());
        if let Some(sample) = flushed {
            dispatch(&shared, &sample);
        }
        // An observer may have stopped the session during the flush.
        if shared.running.get() {
            schedule_next(&host, &shared);
        }
    }));
    shared.pending.set(Some(handle));
}

/// Run the observer and publish with the sampler unborrowed, so both may
/// read the session.
fn dispatch(shared: &SessionShared, sample: &PerformanceSample) {
    let callback = shared.sampler.borrow_mut().on_sample.take();
    if let Some(mut cb) = callback {
        cb(sample);
        let mut sampler = shared.sampler.borrow_mut();
        if sampler.on_sample.is_none() {
            sampler.on_sample = Some(cb);
        }
    }
    if !shared.running.get() {
        return;
    }
    let signal = shared.sampler.borrow().pending_signal(sample);
    if let Some((bus, signal)) = signal {
        bus.publish(signal);
    }
}
