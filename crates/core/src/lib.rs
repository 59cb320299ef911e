//! Domain logic for the Vigil incident-management platform.
//!
//! This crate has no internal dependencies and performs no I/O, so it can be
//! used by the DB/repository layer, the API, and any future worker or CLI
//! tooling. It owns the closed enumerations (status, severity, role, audit
//! action), the role policy, and the status transition engine.

pub mod architecture;
pub mod audit;
pub mod corrective;
pub mod error;
pub mod impact;
pub mod roles;
pub mod search;
pub mod status;
pub mod timeline;
pub mod types;
