//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns route-scoped orchestration and delegates rendering details
//! to `components`. Access control lives in `ProtectedRoute`, not here.

pub mod companies;
pub mod dashboard;
pub mod login;
pub mod profile;
pub mod register;
pub mod xmls;

use leptos::prelude::*;

use crate::components::session_provider::SessionHandle;
use crate::net::gateway::RecordError;

/// Show a failed record call. A dead session token signs the user out.
pub(crate) fn report_record_error(session: SessionHandle, err: &RecordError, message: RwSignal<String>) {
    message.set(format!("Request failed: {err}"));
    if *err == RecordError::SessionExpired {
        #[cfg(feature = "hydrate")]
        {
            let store = session.store();
            leptos::task::spawn_local(async move { store.logout().await });
        }
    }
    #[cfg(not(feature = "hydrate"))]
    let _ = session;
}
