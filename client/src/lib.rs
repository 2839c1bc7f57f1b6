//! # client
//!
//! Leptos + WASM frontend for the NF Hub invoice console.
//!
//! This crate owns the session lifecycle (startup resume, login,
//! registration, logout), the inactivity watchdog that signs idle users out,
//! and the render-time guard in front of protected routes. The `nfhub` host
//! crate renders it server-side and serves the hydrated bundle.

pub mod app;
pub mod components;
pub mod config;
pub mod net;
pub mod pages;
pub mod routes;
pub mod state;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;

/// WASM entry point: install browser logging and hydrate the SSR markup.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        leptos::logging::warn!("console logger unavailable: {e}");
    }
    leptos::mount::hydrate_body(app::App);
}
