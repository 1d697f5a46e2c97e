use crate::host::FrameHost;
use crate::quality::QualityLevel;
use crate::sampler::{FrameSampler, MonitorSession, PerformanceSample};
use crate::tier::PerformanceTier;

/// A read-only snapshot of what the sampler has measured.
///
/// Design intent:
/// - Observers cannot reset or steer the sampler.
/// - Snapshotting is *on-demand* and can allocate; the per-frame path stays unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSnapshot {
    pub running: bool,
    pub frames_seen: u64,
    pub frames_in_window: u32,
    pub history: Vec<u32>,
    pub last_sample: Option<PerformanceSample>,
    pub quality: Option<QualityLevel>,
}

pub struct SamplerAdapter<'a> {
    sampler: &'a FrameSampler,
}

impl<'a> SamplerAdapter<'a> {
    pub fn new(sampler: &'a FrameSampler) -> Self {
        Self { sampler }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            running: true,
            frames_seen: 0,
            frames_in_window: self.sampler.frames_in_window(),
            history: self.sampler.history().to_vec(),
            last_sample: self.sampler.last_sample().cloned(),
            quality: None,
        }
    }
}

pub struct SessionAdapter<'a, H: FrameHost + 'static> {
    session: &'a MonitorSession<H>,
}

impl<'a, H: FrameHost + 'static> SessionAdapter<'a, H> {
    pub fn new(session: &'a MonitorSession<H>) -> Self {
        Self { session }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        let mut snap = self
            .session
            .with_sampler(|s| SamplerAdapter::new(s).snapshot());
        snap.running = self.session.is_running();
        snap.frames_seen = self.session.frames_seen();
        snap
    }
}

impl MonitorSnapshot {
    pub fn with_quality(mut self, level: QualityLevel) -> Self {
        self.quality = Some(level);
        self
    }

    pub fn tier(&self) -> Option<PerformanceTier> {
        self.last_sample.as_ref().map(|s| s.tier)
    }
}

/// Text rows of the debug overlay. Empty when the overlay is hidden.
pub fn overlay_lines(snapshot: &MonitorSnapshot, show_debug: bool) -> Vec<String> {
    if !show_debug {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(8);
    match &snapshot.last_sample {
        Some(s) => {
            out.push(format!("FPS: {} (avg {:.1})", s.frame_rate, s.average_frame_rate));
            if s.memory_used_bytes > 0 {
                out.push(format!("Memory: {:.1} MB", s.memory_used_mib()));
            } else {
                out.push("Memory: n/a".to_string());
            }
            out.push(format!("Tier: {} {}", s.tier.icon(), s.tier.label()));
            for r in &s.recommendations {
                out.push(format!("• {r}"));
            }
        }
        None => out.push("FPS: measuring…".to_string()),
    }
    if let Some(q) = snapshot.quality {
        out.push(format!("Quality: {}", q.label()));
    }
    if !snapshot.history.is_empty() {
        out.push(format!("History: {}", sparkline(&snapshot.history)));
    }
    out
}

/// Block-character sparkline of per-second frame rates, scaled to 60 FPS.
pub fn sparkline(history: &[u32]) -> String {
    const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    history
        .iter()
        .map(|&f| {
            let idx = ((f.min(60) as usize) * (BLOCKS.len() - 1)) / 60;
            BLOCKS[idx]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;

    fn sample(tier: PerformanceTier, memory: u64) -> PerformanceSample {
        PerformanceSample {
            frame_rate: 58,
            average_frame_rate: 57.5,
            memory_used_bytes: memory,
            render_time_ms: 3000.0,
            tier,
            recommendations: tier.recommendations().iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn hidden_overlay_renders_nothing() {
        let snap = MonitorSnapshot {
            running: true,
            frames_seen: 120,
            frames_in_window: 3,
            history: vec![60, 58],
            last_sample: Some(sample(PerformanceTier::Excellent, 0)),
            quality: Some(QualityLevel::High),
        };
        assert!(overlay_lines(&snap, false).is_empty());
        assert!(!overlay_lines(&snap, true).is_empty());
    }

    #[test]
    fn overlay_lists_recommendations_and_quality() {
        let snap = MonitorSnapshot {
            running: true,
            frames_seen: 10,
            frames_in_window: 0,
            history: vec![20],
            last_sample: Some(sample(PerformanceTier::Poor, 64 * crate::tier::MIB)),
            quality: None,
        }
        .with_quality(QualityLevel::Low);
        let lines = overlay_lines(&snap, true);
        assert!(lines.iter().any(|l| l == "Memory: 64.0 MB"));
        assert!(lines.iter().any(|l| l.contains("Disable particle effects")));
        assert!(lines.iter().any(|l| l == "Quality: low"));
    }

    #[test]
    fn fresh_sampler_snapshot_is_measuring() {
        let s = FrameSampler::new(&MonitorConfig::default());
        let snap = SamplerAdapter::new(&s).snapshot();
        assert!(snap.tier().is_none());
        assert_eq!(overlay_lines(&snap, true), vec!["FPS: measuring…".to_string()]);
    }

    #[test]
    fn sparkline_scales_to_sixty() {
        assert_eq!(sparkline(&[0, 30, 60, 144]), "▁▄██");
    }
}
