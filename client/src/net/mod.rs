//! Networking modules for the persistence backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `gateway` defines the capability trait the session store consumes,
//! `parse` implements it over Parse REST, and `types` holds the wire schema.

pub mod gateway;
pub mod parse;
pub mod types;
