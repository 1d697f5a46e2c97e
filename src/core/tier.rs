//! Performance tier classification.
//!
//! The tier is a pure function of `(average_frame_rate, memory_used_bytes)`.
//! Thresholds are checked in order; the first match wins.
//!
//! When the host does not report heap usage the caller passes `0`, which
//! satisfies every memory predicate. Classification then depends on frame
//! rate alone.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MIB: u64 = 1024 * 1024;

pub const EXCELLENT_MIN_FPS: f64 = 55.0;
pub const EXCELLENT_MAX_MEMORY: u64 = 50 * MIB;

pub const GOOD_MIN_FPS: f64 = 45.0;
pub const GOOD_MAX_MEMORY: u64 = 100 * MIB;

pub const FAIR_MIN_FPS: f64 = 30.0;
pub const FAIR_MAX_MEMORY: u64 = 200 * MIB;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PerformanceTier {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl PerformanceTier {
    pub fn classify(average_frame_rate: f64, memory_used_bytes: u64) -> Self {
        if average_frame_rate >= EXCELLENT_MIN_FPS && memory_used_bytes < EXCELLENT_MAX_MEMORY {
            PerformanceTier::Excellent
        } else if average_frame_rate >= GOOD_MIN_FPS && memory_used_bytes < GOOD_MAX_MEMORY {
            PerformanceTier::Good
        } else if average_frame_rate >= FAIR_MIN_FPS && memory_used_bytes < FAIR_MAX_MEMORY {
            PerformanceTier::Fair
        } else {
            PerformanceTier::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "excellent",
            PerformanceTier::Good => "good",
            PerformanceTier::Fair => "fair",
            PerformanceTier::Poor => "poor",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "🟢",
            PerformanceTier::Good => "🟡",
            PerformanceTier::Fair => "🟠",
            PerformanceTier::Poor => "🔴",
        }
    }

    /// Fixed advice for this tier, most important first.
    pub fn recommendations(self) -> &'static [&'static str] {
        match self {
            PerformanceTier::Excellent => &["Performance is excellent"],
            PerformanceTier::Good => &[
                "Performance is good",
                "Animations can stay at the current quality",
            ],
            PerformanceTier::Fair => &[
                "Consider reducing animation intensity",
                "Close unused browser tabs",
            ],
            PerformanceTier::Poor => &[
                "Reduce animation intensity",
                "Disable particle effects",
                "Lower animation quality",
                "Close other browser tabs",
            ],
        }
    }

    pub fn parse(v: &str) -> Option<Self> {
        match v.trim().to_ascii_lowercase().as_str() {
            "excellent" => Some(PerformanceTier::Excellent),
            "good" => Some(PerformanceTier::Good),
            "fair" => Some(PerformanceTier::Fair),
            "poor" => Some(PerformanceTier::Poor),
            _ => None,
        }
    }

    pub fn all() -> &'static [PerformanceTier] {
        &[
            PerformanceTier::Excellent,
            PerformanceTier::Good,
            PerformanceTier::Fair,
            PerformanceTier::Poor,
        ]
    }
}

impl std::fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
