use leptos::prelude::*;
use studyhall::quality::{QualityBus, QualityController, QualityLevel, Subscription};

use super::storage;

/// Shared through context by [`QualityProvider`].
#[derive(Clone, Copy)]
pub(super) struct QualityContext {
    pub(super) bus: StoredValue<QualityBus>,
    pub(super) level: ReadSignal<QualityLevel>,
}

pub(super) fn use_quality() -> Option<QualityContext> {
    use_context::<QualityContext>()
}

/// Owns the quality bus for its subtree and keeps the current level.
///
/// The listener subscribes on mount and unsubscribes on cleanup.
#[component]
pub(super) fn QualityProvider(
    #[prop(optional)] initial: QualityLevel,
    children: Children,
) -> impl IntoView {
    let bus = StoredValue::new(QualityBus::new());
    let (level, set_level) = signal(initial);
    let controller = StoredValue::new(QualityController::new(initial));

    let subscription: Subscription = bus.with_value(|b| {
        b.subscribe(move |signal| {
            let changed = controller
                .try_update_value(|c| c.apply(signal))
                .flatten();
            if let Some(next) = changed {
                set_level.set(next);
            }
        })
    });
    let subscription = StoredValue::new(Some(subscription));
    on_cleanup(move || {
        subscription.update_value(|s| {
            if let Some(s) = s.take() {
                s.cancel();
            }
        });
    });

    Effect::new(move |_| storage::apply_quality_to_document(level.get()));

    provide_context(QualityContext { bus, level });
    children()
}

/// Small readout of the current level for the header.
#[component]
pub(super) fn QualityBadge() -> impl IntoView {
    let level = use_quality().map(|q| q.level);
    view! {
        <span class="quality-badge" title="Animation quality">
            {move || level.map(|l| l.get().label()).unwrap_or("n/a")}
        </span>
    }
}
