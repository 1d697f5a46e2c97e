//! Recorded or synthetic frame traces, replayed through a real
//! [`MonitorSession`] on a [`SimulatedHost`].

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::MonitorConfig;
use crate::host::{HeapUsage, SimulatedHost};
use crate::prng::Prng;
use crate::quality::{QualityAction, QualityBus, QualityController, QualityLevel};
use crate::sampler::{FrameSampler, MonitorSession, PerformanceSample};

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("trace I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("trace has no frames")]
    Empty,
    #[error("frame {index} goes back in time ({t_ms} ms)")]
    NotMonotonic { index: usize, t_ms: f64 },
    #[error("{name} must be a finite number, got {value}")]
    NonFinite { name: &'static str, value: f64 },
}

/// Longest trace `synthesize` will build.
pub const MAX_SYNTH_SECONDS: f64 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    /// Paint timestamp in ms.
    pub t: f64,
    /// Heap bytes in use at this frame, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heap_used: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameTrace {
    #[serde(default)]
    pub label: String,
    /// Clock value when the monitor was mounted.
    #[serde(default)]
    pub start_ms: f64,
    pub frames: Vec<TraceFrame>,
}

impl FrameTrace {
    pub fn from_json_str(raw: &str) -> Result<Self, TraceError> {
        let trace: Self = serde_json::from_str(raw)?;
        trace.validate()?;
        Ok(trace)
    }

    pub fn load(path: &std::path::Path) -> Result<Self, TraceError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String, TraceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), TraceError> {
        if self.frames.is_empty() {
            return Err(TraceError::Empty);
        }
        let mut prev = self.start_ms;
        for (index, f) in self.frames.iter().enumerate() {
            if !f.t.is_finite() || f.t < prev {
                return Err(TraceError::NotMonotonic { index, t_ms: f.t });
            }
            prev = f.t;
        }
        Ok(())
    }

    pub fn duration_ms(&self) -> f64 {
        self.frames.last().map(|f| f.t - self.start_ms).unwrap_or(0.0)
    }
}

/// Build a trace at roughly `fps` for `seconds`, with each frame interval
/// perturbed by up to `jitter` (fraction of the nominal interval).
///
/// Values are clamped into range; non-finite values are rejected.
pub fn synthesize(fps: f64, seconds: f64, jitter: f64, seed: u64) -> Result<FrameTrace, TraceError> {
    for (name, value) in [("fps", fps), ("seconds", seconds), ("jitter", jitter)] {
        if !value.is_finite() {
            return Err(TraceError::NonFinite { name, value });
        }
    }
    let fps = fps.clamp(1.0, 1000.0);
    let jitter = jitter.clamp(0.0, 0.9);
    let seconds = seconds.clamp(0.0, MAX_SYNTH_SECONDS);
    let interval = 1000.0 / fps;
    let end = seconds * 1000.0;

    let mut rng = Prng::new(seed);
    let mut frames = Vec::with_capacity((fps * seconds).ceil() as usize + 1);
    let mut t = 0.0;
    loop {
        t += interval * (1.0 + rng.jitter(jitter));
        if t > end {
            break;
        }
        frames.push(TraceFrame { t, heap_used: None });
    }

    Ok(FrameTrace {
        label: format!("synthetic {fps:.0}fps x{seconds:.0}s jitter={jitter:.2} seed={seed}"),
        start_ms: 0.0,
        frames,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityChange {
    pub action: QualityAction,
    pub level: QualityLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub frames: usize,
    pub samples: Vec<PerformanceSample>,
    pub quality_changes: Vec<QualityChange>,
    pub final_quality: QualityLevel,
}

/// Replay `trace` through a fresh monitor session and a quality listener.
pub fn replay(
    trace: &FrameTrace,
    config: &MonitorConfig,
    initial_quality: QualityLevel,
) -> Result<ReplayReport, TraceError> {
    trace.validate()?;

    let bus = QualityBus::new();
    let controller = Arc::new(Mutex::new(QualityController::new(initial_quality)));
    let changes: Arc<Mutex<Vec<QualityChange>>> = Arc::new(Mutex::new(Vec::new()));
    let _subscription = {
        let controller = Arc::clone(&controller);
        let changes = Arc::clone(&changes);
        bus.subscribe(move |signal| {
            let mut c = controller.lock().unwrap_or_else(|p| p.into_inner());
            if let Some(level) = c.apply(signal) {
                changes
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .push(QualityChange {
                        action: signal.action,
                        level,
                    });
            }
        })
    };

    let samples = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&samples);
    let sampler = FrameSampler::new(config)
        .with_bus(bus.clone())
        .on_sample(move |s| sink.borrow_mut().push(s.clone()));

    let host = Rc::new(SimulatedHost::new(trace.start_ms));
    let session = MonitorSession::start(Rc::clone(&host), sampler);
    for frame in &trace.frames {
        host.set_heap(frame.heap_used.map(|used| HeapUsage {
            used_bytes: used,
            ..HeapUsage::default()
        }));
        host.fire(frame.t);
    }
    session.stop();

    let final_quality = controller.lock().unwrap_or_else(|p| p.into_inner()).level();
    let quality_changes = changes.lock().unwrap_or_else(|p| p.into_inner()).clone();
    let samples = samples.borrow().clone();
    Ok(ReplayReport {
        frames: trace.frames.len(),
        samples,
        quality_changes,
        final_quality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::PerformanceTier;

    #[test]
    fn synthetic_trace_is_deterministic_and_monotonic() {
        let a = synthesize(60.0, 5.0, 0.2, 42).unwrap();
        let b = synthesize(60.0, 5.0, 0.2, 42).unwrap();
        assert_eq!(a, b);
        assert!(a.validate().is_ok());
        let n = a.frames.len() as f64;
        assert!((280.0..=320.0).contains(&n), "frames={n}");
    }

    #[test]
    fn steady_sixty_fps_climbs_to_ultra() {
        let trace = synthesize(60.0, 4.5, 0.0, 1).unwrap();
        let report = replay(&trace, &MonitorConfig::default(), QualityLevel::Medium).unwrap();
        assert_eq!(report.samples.len(), 4);
        assert!(report.samples.iter().all(|s| s.tier == PerformanceTier::Excellent));
        assert_eq!(report.final_quality, QualityLevel::Ultra);
        assert_eq!(report.quality_changes.len(), 2);
    }

    #[test]
    fn slow_trace_reduces_quality() {
        let trace = synthesize(20.0, 3.5, 0.0, 1).unwrap();
        let report = replay(&trace, &MonitorConfig::default(), QualityLevel::High).unwrap();
        assert!(report.samples.iter().all(|s| s.tier == PerformanceTier::Poor));
        assert_eq!(report.final_quality, QualityLevel::Low);
    }

    #[test]
    fn heap_readings_flow_into_samples() {
        let mut trace = synthesize(60.0, 1.5, 0.0, 1).unwrap();
        for f in &mut trace.frames {
            f.heap_used = Some(150 * crate::tier::MIB);
        }
        let report = replay(&trace, &MonitorConfig::default(), QualityLevel::High).unwrap();
        assert_eq!(report.samples[0].tier, PerformanceTier::Fair);
        assert!(report.quality_changes.is_empty());
    }

    #[test]
    fn rejects_backwards_time() {
        let raw = r#"{"frames":[{"t":10.0},{"t":5.0}]}"#;
        assert!(matches!(
            FrameTrace::from_json_str(raw),
            Err(TraceError::NotMonotonic { index: 1, .. })
        ));
        assert!(matches!(
            FrameTrace::from_json_str(r#"{"frames":[]}"#),
            Err(TraceError::Empty)
        ));
    }

    #[test]
    fn non_finite_parameters_are_rejected() {
        assert!(matches!(
            synthesize(f64::NAN, 1.0, 0.0, 1),
            Err(TraceError::NonFinite { name: "fps", .. })
        ));
        assert!(matches!(
            synthesize(60.0, f64::INFINITY, 0.0, 1),
            Err(TraceError::NonFinite { name: "seconds", .. })
        ));
        assert!(matches!(
            synthesize(60.0, 1.0, f64::NAN, 1),
            Err(TraceError::NonFinite { name: "jitter", .. })
        ));
    }

    #[test]
    fn out_of_range_parameters_are_clamped() {
        let trace = synthesize(1e9, -5.0, 7.0, 3).unwrap();
        assert!(trace.frames.is_empty());
        let trace = synthesize(0.0, 2.0, -1.0, 3).unwrap();
        assert_eq!(trace.frames.len(), 2);
    }
}
