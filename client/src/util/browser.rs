//! Browser bindings for the session seams.
//!
//! `RouterNavigator` works wherever the Leptos router does. The timer and
//! DOM listener implementations, the confirm dialog and file reading need a
//! browser and only exist under `hydrate`.

use std::rc::Rc;

use leptos_router::NavigateOptions;

use crate::routes::{AppRoute, Navigator};

/// [`Navigator`] backed by `leptos_router::hooks::use_navigate`.
pub struct RouterNavigator {
    navigate: Rc<dyn Fn(&str, NavigateOptions)>,
}

impl RouterNavigator {
    pub fn new(navigate: impl Fn(&str, NavigateOptions) + 'static) -> Self {
        Self { navigate: Rc::new(navigate) }
    }
}

impl Navigator for RouterNavigator {
    fn navigate_to(&self, route: AppRoute) {
        (self.navigate)(route.path(), NavigateOptions::default());
    }
}

#[cfg(feature = "hydrate")]
pub use dom::{DocumentActivity, DocumentListeners, TimeoutScheduler, confirm, read_selected_file};

#[cfg(feature = "hydrate")]
mod dom {
    use std::rc::Rc;
    use std::time::Duration;

    use gloo_timers::callback::Timeout;
    use wasm_bindgen::{JsCast, closure::Closure};

    use crate::net::types::CertificateUpload;
    use crate::state::idle::{ACTIVITY_EVENTS, ActivitySource, Scheduler};

    /// `window.confirm`; false when no window is available.
    pub fn confirm(message: &str) -> bool {
        web_sys::window().and_then(|w| w.confirm_with_message(message).ok()).unwrap_or(false)
    }

    /// Read the file picked in a file `<input>`'s change event.
    /// `Ok(None)` when the selection was cleared.
    pub async fn read_selected_file(ev: &web_sys::Event) -> Result<Option<CertificateUpload>, String> {
        let file = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
            .and_then(|input| input.files())
            .and_then(|files| files.get(0));
        let Some(file) = file else {
            return Ok(None);
        };

        let buffer = wasm_bindgen_futures::JsFuture::from(file.array_buffer())
            .await
            .map_err(|e| format!("could not read {}: {e:?}", file.name()))?;
        let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
        Ok(Some(CertificateUpload { file_name: file.name(), bytes }))
    }

    /// `setTimeout`-based scheduler. Dropping the handle calls `clearTimeout`.
    pub struct TimeoutScheduler;

    impl Scheduler for TimeoutScheduler {
        type Handle = Timeout;

        fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Timeout {
            let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
            Timeout::new(millis, callback)
        }
    }

    /// Listens for [`ACTIVITY_EVENTS`] on `document`.
    pub struct DocumentActivity;

    /// Attached document listeners; removed on drop.
    pub struct DocumentListeners {
        document: Option<web_sys::Document>,
        closures: Vec<(&'static str, Closure<dyn FnMut()>)>,
    }

    impl ActivitySource for DocumentActivity {
        type Listeners = DocumentListeners;

        fn attach(&self, on_activity: Rc<dyn Fn()>) -> DocumentListeners {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                log::warn!("no document; inactivity listeners not attached");
                return DocumentListeners { document: None, closures: Vec::new() };
            };

            let mut closures = Vec::with_capacity(ACTIVITY_EVENTS.len());
            for event in ACTIVITY_EVENTS {
                let on_activity = Rc::clone(&on_activity);
                let cb = Closure::wrap(Box::new(move || on_activity()) as Box<dyn FnMut()>);
                if document
                    .add_event_listener_with_callback(event, cb.as_ref().unchecked_ref())
                    .is_ok()
                {
                    closures.push((event, cb));
                }
            }
            DocumentListeners { document: Some(document), closures }
        }
    }

    impl Drop for DocumentListeners {
        fn drop(&mut self) {
            let Some(document) = &self.document else {
                return;
            };
            for (event, cb) in &self.closures {
                let _ = document.remove_event_listener_with_callback(event, cb.as_ref().unchecked_ref());
            }
        }
    }
}
