use leptos::prelude::*;
use studyhall::lazy::{LazyUnit, LoadError, LoadPhase, Rendered, Resolution, DEFAULT_FALLBACK};
use wasm_bindgen_futures::spawn_local;

use super::pages::{PageProps, PageView};

/// Lazy page unit with a Leptos view as its fallback.
pub(super) type PageUnit = LazyUnit<PageView, ViewFn>;

/// Renders the unit's fallback, resolves the unit, then renders it with
/// `props` untouched.
///
/// Load failures are returned as `Err`, so they reach the nearest
/// `ErrorBoundary`. Nothing is retried. Unmounting before the load settles
/// discards the result.
#[component]
pub(super) fn LazyView(unit: PageUnit, props: PageProps) -> impl IntoView {
    let boundary = unit.mount();
    let resolution = boundary.resolve();
    let (phase, set_phase) = signal(LoadPhase::Pending);
    spawn_local(async move {
        let next = match resolution.await {
            Resolution::Ready => LoadPhase::Ready,
            Resolution::Failed => LoadPhase::Failed,
            Resolution::Cancelled | Resolution::AlreadyStarted => return,
        };
        // The owner may be gone by now.
        let _ = set_phase.try_set(next);
    });

    let boundary = StoredValue::new_local(boundary);
    let props = StoredValue::new(props);
    on_cleanup(move || boundary.with_value(|b| b.cancel()));

    move || -> Result<AnyView, LoadError> {
        phase.track();
        let rendered = boundary.with_value(|b| b.render(props.get_value()));
        match rendered {
            Rendered::Fallback(Some(fallback)) => Ok(fallback.run()),
            Rendered::Fallback(None) => Ok(view! {
                <div class="lazy-fallback">{DEFAULT_FALLBACK}</div>
            }
            .into_any()),
            Rendered::Unit { unit, props } => Ok(unit(props)),
            Rendered::Failed(e) => Err(e),
        }
    }
}
