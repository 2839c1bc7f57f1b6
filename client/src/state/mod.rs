//! Shared client-side state modules.
//!
//! DESIGN
//! ======
//! `auth` owns the session, `idle` owns the inactivity deadline. Neither
//! touches the other's internals; the app shell wires them together through
//! the store's subscription and the monitor's `sync`.
//!
//! `companies`, `dashboard` and `xmls` hold the record screens' rules as plain
//! functions over the `RecordGateway` seam, so pages stay thin.


pub mod auth;
pub mod companies;
pub mod dashboard;
pub mod idle;
pub mod xmls;
