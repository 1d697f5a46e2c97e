use leptos::prelude::*;
use studyhall::config::MonitorConfig;
use studyhall::lazy::preload_all;
use studyhall::sampler::PerformanceSample;

use crate::ui_model::Page;

mod host;
mod lazy;
mod monitor;
mod pages;
mod quality;
mod storage;

use host::{BrowserTimer, LocalSpawner};
use lazy::LazyView;
use monitor::PerformanceMonitor;
use pages::PageProps;
use quality::{use_quality, QualityBadge, QualityProvider};

const LOCALSTORAGE_MONITOR_KEY: &str = "studyhall.monitor_settings.v1";

pub fn start() {
    mount_to_body(|| view! { <App /> });
}

#[component]
fn App() -> impl IntoView {
    let settings = storage::load_monitor_settings().unwrap_or_default();

    let (show_debug, set_show_debug) = signal(settings.show_debug);
    let (adaptive, set_adaptive) = signal(settings.adaptive_quality);
    let (page, set_page) = signal(Page::default());
    let (status, set_status) = signal(String::new());

    Effect::new({
        let base = settings.clone();
        move |_| {
            let cfg = MonitorConfig {
                show_debug: show_debug.get(),
                adaptive_quality: adaptive.get(),
                ..base.clone()
            };
            storage::save_monitor_settings(&cfg);
        }
    });

    let warm: Vec<_> = Page::idle_preload_set()
        .into_iter()
        .map(pages::page_unit)
        .collect();
    preload_all(warm, settings.preload_delay_ms, LocalSpawner, &BrowserTimer);

    let on_sample = Callback::new(move |s: PerformanceSample| {
        set_status.set(format!("{} {} · {} fps", s.tier.icon(), s.tier.label(), s.frame_rate));
    });

    view! {
        <QualityProvider>
            <div class="app">
                <header class="topbar">
                    <h1 class="brand">"Study Hall"</h1>
                    <nav class="tabs">
                        {Page::all()
                            .iter()
                            .copied()
                            .map(|p| {
                                view! {
                                    <button
                                        class=move || if page.get() == p { "tab active" } else { "tab" }
                                        on:click=move |_| set_page.set(p)
                                    >
                                        {format!("{} {}", p.icon(), p.label())}
                                    </button>
                                }
                            })
                            .collect_view()}
                    </nav>
                    <div class="topbar-right">
                        <QualityBadge />
                        <span class="subtle">{move || status.get()}</span>
                        <label class="toggle">
                            <input
                                type="checkbox"
                                prop:checked=move || show_debug.get()
                                on:change=move |_| set_show_debug.update(|v| *v = !*v)
                            />
                            "Debug overlay"
                        </label>
                        <label class="toggle">
                            <input
                                type="checkbox"
                                prop:checked=move || adaptive.get()
                                on:change=move |_| set_adaptive.update(|v| *v = !*v)
                            />
                            "Adaptive quality"
                        </label>
                    </div>
                </header>

                // Remounted when adaptive mode flips so the sampler picks it up.
                {move || {
                    let config = MonitorConfig {
                        adaptive_quality: adaptive.get(),
                        ..settings.clone()
                    };
                    view! { <PerformanceMonitor show_debug=show_debug config=config on_sample=on_sample /> }
                }}

                <main class="content">
                    <PageHost page=page />
                </main>
            </div>
        </QualityProvider>
    }
}

#[component]
fn PageHost(page: ReadSignal<Page>) -> impl IntoView {
    let quality = use_quality();
    move || {
        let p = page.get();
        let props = PageProps {
            page: p,
            quality: quality.map(|q| q.level.get_untracked()).unwrap_or_default(),
        };
        view! {
            <ErrorBoundary fallback=|errors| {
                view! {
                    <div class="load-error" role="alert">
                        <strong>"This page failed to load."</strong>
                        <ul>
                            {move || {
                                errors
                                    .get()
                                    .into_iter()
                                    .map(|(_, e)| view! { <li>{e.to_string()}</li> })
                                    .collect_view()
                            }}
                        </ul>
                    </div>
                }
            }>
                <LazyView unit=pages::page_unit(p) props=props />
            </ErrorBoundary>
        }
    }
}
