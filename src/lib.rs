//! # studyhall
//!
//! Runtime core of the study assistant's presentation layer: an adaptive
//! frame sampler that classifies rendering health and asks for quality
//! changes, and a lazy-unit orchestrator that defers loading UI units behind a
//! fallback.
//!
//! Everything here is host-independent. The browser crate (`studyhall_web`)
//! plugs `requestAnimationFrame`, `performance.now()` and `spawn_local` into
//! the [`host`] traits; tests and the replay tool use [`host::SimulatedHost`].
//!
//! ## Quick Start
//!
//! ```
//! use std::rc::Rc;
//! use studyhall::prelude::*;
//!
//! let bus = QualityBus::new();
//! let listener = QualityListener::attach(&bus, QualityLevel::High);
//!
//! let host = Rc::new(SimulatedHost::new(0.0));
//! let sampler = FrameSampler::new(&MonitorConfig::default()).with_bus(bus.clone());
//! let session = MonitorSession::start(Rc::clone(&host), sampler);
//!
//! // 20 frames in one second: poor tier, quality steps down.
//! for i in 1..=20 {
//!     host.fire(f64::from(i) * 50.0);
//! }
//! assert_eq!(session.last_sample().unwrap().tier, PerformanceTier::Poor);
//! assert_eq!(listener.level(), QualityLevel::Medium);
//! session.stop();
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): serialization of samples, config and frame traces
//! - `cli` (default): the `studyhall-cli` trace tool
//!
//! ## Modules
//!
//! - [`sampler`]: frame sampler and mounted monitor session
//! - [`tier`]: performance tier thresholds and recommendations
//! - [`quality`]: quality levels and the typed quality bus
//! - [`lazy`]: lazy units, boundaries and preloading
//! - [`observer`]: read-only snapshots and the debug overlay model

#[path = "core/history.rs"]
pub mod history;

#[path = "core/tier.rs"]
pub mod tier;

#[path = "core/quality.rs"]
pub mod quality;

#[path = "core/host.rs"]
pub mod host;

#[path = "core/config.rs"]
pub mod config;

#[path = "core/sampler.rs"]
pub mod sampler;

#[path = "core/lazy.rs"]
pub mod lazy;

#[path = "core/prng.rs"]
pub mod prng;

#[cfg(feature = "serde")]
#[path = "core/trace.rs"]
pub mod trace;

pub mod observer;

/// Prelude module for convenient imports.
///
/// ```
/// use studyhall::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConfigError, MonitorConfig};
    pub use crate::history::FrameHistory;
    pub use crate::host::{
        FrameCallback, FrameHandle, FrameHost, HeapUsage, LocalBoxFuture, SimulatedHost, Spawner,
        Timer,
    };
    pub use crate::lazy::{
        preload_all, LazyBoundary, LazyUnit, LoadError, LoadPhase, Rendered, Resolution,
        UnitLoader, DEFAULT_FALLBACK,
    };
    pub use crate::observer::{overlay_lines, MonitorSnapshot, SessionAdapter};
    pub use crate::quality::{
        QualityAction, QualityBus, QualityController, QualityLevel, QualityListener,
        QualitySignal, Subscription, PERFORMANCE_OPTIMIZE,
    };
    pub use crate::sampler::{FrameSampler, MonitorSession, PerformanceSample};
    pub use crate::tier::PerformanceTier;
}
