use leptos::prelude::*;
use studyhall::config::MonitorConfig;
use studyhall::observer::{overlay_lines, MonitorSnapshot, SessionAdapter};
use studyhall::sampler::{FrameSampler, MonitorSession, PerformanceSample};

use super::host::BrowserHost;
use super::quality::use_quality;

/// Mounts a frame sampler for as long as the component lives.
///
/// Sampling runs whether or not the overlay is visible. When a
/// [`QualityProvider`](super::quality::QualityProvider) is above this
/// component and `adaptive_quality` is set, poor and excellent windows are
/// published to its bus.
#[component]
pub(super) fn PerformanceMonitor(
    #[prop(into)] show_debug: Signal<bool>,
    #[prop(optional)] config: MonitorConfig,
    #[prop(optional)] on_sample: Option<Callback<PerformanceSample>>,
) -> impl IntoView {
    let quality = use_quality();
    let (snapshot, set_snapshot) = signal::<Option<MonitorSnapshot>>(None);

    let session: StoredValue<Option<MonitorSession<BrowserHost>>, LocalStorage> =
        StoredValue::new_local(None);

    let mut sampler = FrameSampler::new(&config).on_sample(move |s: &PerformanceSample| {
        let snap = session.with_value(|slot| slot.as_ref().map(|m| SessionAdapter::new(m).snapshot()));
        set_snapshot.set(snap);
        if let Some(cb) = on_sample {
            cb.run(s.clone());
        }
    });
    if let Some(q) = quality {
        sampler = sampler.with_bus(q.bus.get_value());
    }

    match BrowserHost::new() {
        Some(host) => session.set_value(Some(MonitorSession::start(host, sampler))),
        None => web_sys::console::warn_1(&"performance monitor: no window".into()),
    }
    on_cleanup(move || {
        session.update_value(|s| {
            if let Some(s) = s.take() {
                s.stop();
            }
        });
    });

    let lines = move || {
        let level = quality.map(|q| q.level.get());
        let snap = snapshot.get().unwrap_or(MonitorSnapshot {
            running: true,
            frames_seen: 0,
            frames_in_window: 0,
            history: Vec::new(),
            last_sample: None,
            quality: None,
        });
        let snap = match level {
            Some(l) => snap.with_quality(l),
            None => snap,
        };
        overlay_lines(&snap, show_debug.get())
    };

    view! {
        <Show when=move || show_debug.get()>
            <div class="perf-overlay" aria-live="off">
                {move || {
                    lines()
                        .into_iter()
                        .map(|line| view! { <div class="perf-line">{line}</div> })
                        .collect_view()
                }}
            </div>
        </Show>
    }
}
