//! Host seams: clock, paint scheduling, heap reporting, task spawning, timers.
//!
//! The browser crate implements these over `performance.now()`,
//! `requestAnimationFrame` and `setTimeout`. Tests implement them with
//! hand-driven fakes.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Callback run before the next paint, receiving the host timestamp in ms.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Identifies a pending frame request so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Heap statistics as reported by the host runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct HeapUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub limit_bytes: u64,
}

pub trait FrameHost {
    /// Monotonic clock in milliseconds.
    fn now_ms(&self) -> f64;

    /// Schedule `callback` to run once before the next paint.
    ///
    /// Implementations must not invoke the callback synchronously.
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle;

    fn cancel_frame(&self, handle: FrameHandle);

    /// `None` when the runtime does not expose heap usage.
    fn heap_usage(&self) -> Option<HeapUsage> {
        None
    }
}

/// Runs detached local (`!Send`) tasks on the host event loop.
pub trait Spawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}

pub trait Timer {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()>;
}

/// Hand-driven [`FrameHost`] for replays and tests.
///
/// Frame requests are parked until [`SimulatedHost::fire`] runs them.
#[derive(Default)]
pub struct SimulatedHost {
    now_ms: Cell<f64>,
    heap: Cell<Option<HeapUsage>>,
    pending: RefCell<Option<(FrameHandle, FrameCallback)>>,
    next_handle: Cell<i32>,
    requests: Cell<u32>,
    cancels: Cell<u32>,
}

impl SimulatedHost {
    pub fn new(start_ms: f64) -> Self {
        let host = Self::default();
        host.now_ms.set(start_ms);
        host
    }

    pub fn set_heap(&self, heap: Option<HeapUsage>) {
        self.heap.set(heap);
    }

    /// Advance the clock to `timestamp_ms` and run the parked callback, if any.
    pub fn fire(&self, timestamp_ms: f64) -> bool {
        self.now_ms.set(timestamp_ms);
        let parked = self.pending.borrow_mut().take();
        match parked {
            Some((_, callback)) => {
                callback(timestamp_ms);
                true
            }
            None => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    pub fn requests(&self) -> u32 {
        self.requests.get()
    }

    pub fn cancels(&self) -> u32 {
        self.cancels.get()
    }
}

impl FrameHost for SimulatedHost {
    fn now_ms(&self) -> f64 {
        self.now_ms.get()
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let handle = FrameHandle(self.next_handle.get());
        self.next_handle.set(handle.0.wrapping_add(1));
        self.requests.set(self.requests.get() + 1);
        *self.pending.borrow_mut() = Some((handle, callback));
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.cancels.set(self.cancels.get() + 1);
        let mut pending = self.pending.borrow_mut();
        if pending.as_ref().is_some_and(|(h, _)| *h == handle) {
            *pending = None;
        }
    }

    fn heap_usage(&self) -> Option<HeapUsage> {
        self.heap.get()
    }
}
