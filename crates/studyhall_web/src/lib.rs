//! Browser-hosted WASM front-end for the study assistant.
//!
//! This crate is a stub by default so the workspace builds on native targets
//! without wasm toolchains. The page inventory in [`ui_model`] is always
//! available so it can be unit-tested on the host.
//!
//! Enable the real app with: `--features web` (and a wasm32 target).

pub mod ui_model;

/// Placeholder function for non-web (or non-wasm) builds.
#[cfg(not(all(feature = "web", target_arch = "wasm32")))]
pub fn placeholder() {
    // No-op.
}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
mod web;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use web::start;
