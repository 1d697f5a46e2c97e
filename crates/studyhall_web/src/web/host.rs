//! Browser implementations of the sampler and loader host seams.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Promise, Reflect};
use studyhall::host::{
    FrameCallback, FrameHandle, FrameHost, HeapUsage, LocalBoxFuture, Spawner, Timer,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// The one outstanding paint request of a [`BrowserHost`].
#[derive(Default)]
struct FrameSlot {
    callback: RefCell<Option<FrameCallback>>,
    id: Cell<Option<i32>>,
}

/// `requestAnimationFrame` + `performance.now()` + `performance.memory`.
///
/// Holds at most one outstanding request; a new request replaces the
/// previous one. All requests share a single JS closure, freed with the host.
pub(super) struct BrowserHost {
    window: web_sys::Window,
    performance: Option<web_sys::Performance>,
    slot: Rc<FrameSlot>,
    on_frame: Closure<dyn FnMut(f64)>,
}

impl BrowserHost {
    pub(super) fn new() -> Option<Rc<Self>> {
        let window = web_sys::window()?;
        let performance = window.performance();
        let slot = Rc::new(FrameSlot::default());
        let on_frame = {
            let slot = Rc::clone(&slot);
            Closure::wrap(Box::new(move |ts: f64| {
                slot.id.set(None);
                let callback = slot.callback.borrow_mut().take();
                if let Some(cb) = callback {
                    cb(ts);
                }
            }) as Box<dyn FnMut(f64)>)
        };
        Some(Rc::new(Self {
            window,
            performance,
            slot,
            on_frame,
        }))
    }

    fn cancel_pending(&self) {
        if let Some(id) = self.slot.id.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        self.slot.callback.borrow_mut().take();
    }
}

impl Drop for BrowserHost {
    fn drop(&mut self) {
        // The shared closure must not be invoked once freed.
        self.cancel_pending();
    }
}

impl FrameHost for BrowserHost {
    fn now_ms(&self) -> f64 {
        match &self.performance {
            Some(p) => p.now(),
            None => js_sys::Date::now(),
        }
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        self.cancel_pending();
        match self
            .window
            .request_animation_frame(self.on_frame.as_ref().unchecked_ref())
        {
            Ok(id) => {
                *self.slot.callback.borrow_mut() = Some(callback);
                self.slot.id.set(Some(id));
                FrameHandle(id)
            }
            Err(_) => {
                web_sys::console::warn_1(&"requestAnimationFrame threw".into());
                FrameHandle(-1)
            }
        }
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        if self.slot.id.get() == Some(handle.0) {
            self.cancel_pending();
        }
    }

    fn heap_usage(&self) -> Option<HeapUsage> {
        // Non-standard (Chromium only); absent elsewhere.
        let perf = self.performance.as_ref()?;
        let memory = Reflect::get(perf, &JsValue::from_str("memory")).ok()?;
        if memory.is_undefined() || memory.is_null() {
            return None;
        }
        let field = |k: &str| {
            Reflect::get(&memory, &JsValue::from_str(k))
                .ok()
                .and_then(|v| v.as_f64())
                .map(|v| v.max(0.0) as u64)
        };
        Some(HeapUsage {
            used_bytes: field("usedJSHeapSize")?,
            total_bytes: field("totalJSHeapSize").unwrap_or(0),
            limit_bytes: field("jsHeapSizeLimit").unwrap_or(0),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct LocalSpawner;

impl Spawner for LocalSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// `setTimeout` wrapped in a promise.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct BrowserTimer;

impl Timer for BrowserTimer {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        let promise = Promise::new(&mut |resolve, _reject| {
            let Some(w) = web_sys::window() else {
                let _ = resolve.call0(&JsValue::NULL);
                return;
            };
            let delay = i32::try_from(ms).unwrap_or(i32::MAX);
            if w
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, delay)
                .is_err()
            {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        Box::pin(async move {
            let _ = JsFuture::from(promise).await;
        })
    }
}
