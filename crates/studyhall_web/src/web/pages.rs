//! Page units behind lazy boundaries.
//!
//! Page bodies are placeholders; what matters here is the load path. Each
//! loader yields once to the event loop before handing back its view, and
//! remembers which pages have been loaded so later loads skip the delay.

use std::cell::RefCell;

use hashbrown::HashSet;
use leptos::prelude::*;
use studyhall::host::Timer;
use studyhall::lazy::{LazyUnit, LoadError};
use studyhall::quality::QualityLevel;

use super::host::BrowserTimer;
use super::lazy::PageUnit;
use crate::ui_model::Page;

/// Props every page receives from the shell.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct PageProps {
    pub(super) page: Page,
    pub(super) quality: QualityLevel,
}

pub(super) type PageView = fn(PageProps) -> AnyView;

/// First (cold) load of a page waits this long, as a stand-in for fetching it.
const COLD_LOAD_MS: u32 = 120;

thread_local! {
    static LOADED: RefCell<HashSet<Page>> = RefCell::new(HashSet::new());
}

fn page_view(page: Page) -> PageView {
    match page {
        Page::Dashboard => dashboard,
        Page::Study => study,
        Page::Flashcards => flashcards,
        Page::Quiz => quiz,
        Page::Progress => progress,
        Page::Settings => settings,
    }
}

async fn load_page(page: Page) -> PageView {
    let warm = LOADED.with(|l| l.borrow().contains(&page));
    let delay = if warm { 0 } else { COLD_LOAD_MS };
    BrowserTimer.sleep(delay).await;
    LOADED.with(|l| {
        l.borrow_mut().insert(page);
    });
    page_view(page)
}

pub(super) fn page_unit(page: Page) -> PageUnit {
    LazyUnit::new(page.unit_name(), move || async move {
        Ok::<PageView, LoadError>(load_page(page).await)
    })
    .with_fallback(ViewFn::from(move || {
        view! {
            <div class="lazy-fallback">
                <span class="spinner" aria-hidden="true"></span>
                {format!("Loading {}...", page.label())}
            </div>
        }
    }))
}

fn page_shell(props: &PageProps, body: &'static str) -> AnyView {
    let title = format!("{} {}", props.page.icon(), props.page.label());
    let quality = props.quality.label();
    view! {
        <section class="page" data-page=props.page.unit_name() data-quality=quality>
            <h2>{title}</h2>
            <p class="subtle">{body}</p>
        </section>
    }
    .into_any()
}

fn dashboard(props: PageProps) -> AnyView {
    page_shell(&props, "Today's plan and recent activity.")
}

fn study(props: PageProps) -> AnyView {
    page_shell(&props, "Pick a subject and start a focused session.")
}

fn flashcards(props: PageProps) -> AnyView {
    page_shell(&props, "Review the cards that are due.")
}

fn quiz(props: PageProps) -> AnyView {
    page_shell(&props, "Test yourself on recent material.")
}

fn progress(props: PageProps) -> AnyView {
    page_shell(&props, "Streaks, scores and time spent.")
}

fn settings(props: PageProps) -> AnyView {
    page_shell(&props, "Monitor and display preferences.")
}
