//! Lazy units: deferred, asynchronously resolved UI units behind a boundary.
//!
//! A [`LazyUnit`] names a loader and an optional fallback. Mounting it yields a
//! [`LazyBoundary`] that renders the fallback until [`LazyBoundary::resolve`]
//! completes, then renders the loaded unit with the caller's props untouched.
//! Load failures are handed back to the caller as [`Rendered::Failed`]; the
//! boundary never retries.
//!
//! Each boundary owns a [`CancellationToken`]. Unmounting cancels it and the
//! in-flight result is discarded.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::host::{LocalBoxFuture, Spawner, Timer};

/// Fallback shown when the caller supplies none.
pub const DEFAULT_FALLBACK: &str = "Loading...";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("unit `{unit}` failed to load: {message}")]
    Failed { unit: String, message: String },
    #[error("no unit named `{0}`")]
    NotFound(String),
}

impl LoadError {
    pub fn failed(unit: impl Into<String>, message: impl Into<String>) -> Self {
        LoadError::Failed {
            unit: unit.into(),
            message: message.into(),
        }
    }
}

pub trait UnitLoader<T> {
    /// Start one load. Any caching belongs to the implementation.
    fn load(&self) -> LocalBoxFuture<'static, Result<T, LoadError>>;
}

impl<T, F, Fut> UnitLoader<T> for F
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, LoadError>> + 'static,
{
    fn load(&self) -> LocalBoxFuture<'static, Result<T, LoadError>> {
        Box::pin(self())
    }
}

pub struct LazyUnit<T, Fb = &'static str> {
    name: &'static str,
    loader: Rc<dyn UnitLoader<T>>,
    fallback: Option<Fb>,
}

impl<T, Fb: Clone> Clone for LazyUnit<T, Fb> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            loader: Rc::clone(&self.loader),
            fallback: self.fallback.clone(),
        }
    }
}

impl<T: 'static> LazyUnit<T> {
    pub fn new<L>(name: &'static str, loader: L) -> Self
    where
        L: UnitLoader<T> + 'static,
    {
        Self {
            name,
            loader: Rc::new(loader),
            fallback: None,
        }
    }
}

impl<T: 'static, Fb: Clone + 'static> LazyUnit<T, Fb> {
    /// Replace the built-in fallback.
    pub fn with_fallback<F2>(self, fallback: F2) -> LazyUnit<T, F2> {
        LazyUnit {
            name: self.name,
            loader: self.loader,
            fallback: Some(fallback),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `None` means the built-in [`DEFAULT_FALLBACK`].
    pub fn fallback(&self) -> Option<&Fb> {
        self.fallback.as_ref()
    }

    /// Create a boundary in the pending state. Nothing is loaded until
    /// [`LazyBoundary::resolve`] runs.
    pub fn mount(&self) -> LazyBoundary<T, Fb> {
        LazyBoundary {
            unit: self.clone(),
            state: Rc::new(RefCell::new(LoadState::Pending)),
            token: CancellationToken::new(),
            started: Cell::new(false),
        }
    }

    /// Mount and immediately hand the resolution to `spawner`.
    pub fn mount_on<S: Spawner + ?Sized>(&self, spawner: &S) -> LazyBoundary<T, Fb>
    where
        T: Clone,
    {
        let boundary = self.mount();
        let resolution = boundary.resolve();
        spawner.spawn_local(Box::pin(async move {
            resolution.await;
        }));
        boundary
    }

    /// Invoke the loader now and discard the result once it settles.
    pub fn preload(&self) -> LocalBoxFuture<'static, ()> {
        let name = self.name;
        let load = self.loader.load();
        Box::pin(async move {
            match load.await {
                Ok(_) => tracing::debug!(unit = name, "preloaded"),
                Err(e) => tracing::debug!(unit = name, error = %e, "preload failed"),
            }
        })
    }
}

/// Preload every unit after `delay_ms`, without blocking the caller.
pub fn preload_all<T, Fb, S, Tm>(units: Vec<LazyUnit<T, Fb>>, delay_ms: u32, spawner: S, timer: &Tm)
where
    T: 'static,
    Fb: Clone + 'static,
    S: Spawner + Clone + 'static,
    Tm: Timer + ?Sized,
{
    let delay = timer.sleep(delay_ms);
    let inner = spawner.clone();
    spawner.spawn_local(Box::pin(async move {
        delay.await;
        tracing::debug!(count = units.len(), "preloading units");
        for unit in &units {
            inner.spawn_local(unit.preload());
        }
    }));
}

pub enum LoadState<T> {
    Pending,
    Ready(T),
    Failed(LoadError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Pending,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Ready,
    Failed,
    /// The boundary was unmounted first; the result was dropped.
    Cancelled,
    /// `resolve` had already been called on this boundary.
    AlreadyStarted,
}

/// What the boundary shows for the current render pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered<T, P, Fb> {
    /// `None` means the built-in [`DEFAULT_FALLBACK`].
    Fallback(Option<Fb>),
    Unit { unit: T, props: P },
    /// For the surrounding error boundary.
    Failed(LoadError),
}

pub struct LazyBoundary<T, Fb = &'static str> {
    unit: LazyUnit<T, Fb>,
    state: Rc<RefCell<LoadState<T>>>,
    token: CancellationToken,
    started: Cell<bool>,
}

impl<T: Clone + 'static, Fb: Clone + 'static> LazyBoundary<T, Fb> {
    pub fn name(&self) -> &'static str {
        self.unit.name
    }

    pub fn phase(&self) -> LoadPhase {
        match &*self.state.borrow() {
            LoadState::Pending => LoadPhase::Pending,
            LoadState::Ready(_) => LoadPhase::Ready,
            LoadState::Failed(_) => LoadPhase::Failed,
        }
    }

    pub fn render<P>(&self, props: P) -> Rendered<T, P, Fb> {
        match &*self.state.borrow() {
            LoadState::Pending => Rendered::Fallback(self.unit.fallback.clone()),
            LoadState::Ready(unit) => Rendered::Unit {
                unit: unit.clone(),
                props,
            },
            LoadState::Failed(e) => Rendered::Failed(e.clone()),
        }
    }

    /// Invoke the loader and store its outcome, unless unmounted first.
    ///
    /// The loader is invoked when this is called, not when the future is first
    /// polled.
    pub fn resolve(&self) -> LocalBoxFuture<'static, Resolution> {
        if self.started.replace(true) {
            return Box::pin(async { Resolution::AlreadyStarted });
        }
        let name = self.unit.name;
        let load = self.unit.loader.load();
        let state = Rc::clone(&self.state);
        let token = self.token.clone();
        Box::pin(async move {
            let outcome = token.run_until_cancelled(load).await;
            if token.is_cancelled() {
                tracing::debug!(unit = name, "boundary unmounted before load settled");
                return Resolution::Cancelled;
            }
            match outcome {
                Some(Ok(unit)) => {
                    *state.borrow_mut() = LoadState::Ready(unit);
                    tracing::debug!(unit = name, "unit resolved");
                    Resolution::Ready
                }
                Some(Err(e)) => {
                    tracing::warn!(unit = name, error = %e, "unit failed to load");
                    *state.borrow_mut() = LoadState::Failed(e);
                    Resolution::Failed
                }
                None => Resolution::Cancelled,
            }
        })
    }

    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Cancel the in-flight resolution without dropping the boundary.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn unmount(self) {
        drop(self);
    }
}

impl<T, Fb> Drop for LazyBoundary<T, Fb> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
