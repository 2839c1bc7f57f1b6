//! Reusable UI components.
//!
//! ARCHITECTURE
//! ============
//! `session_provider` owns session wiring, `protected_route` applies the
//! route guard, and `layout` renders shared chrome. Pages compose these.

pub mod layout;
pub mod protected_route;
pub mod session_provider;
