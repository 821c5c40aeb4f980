//! Use-case services over the repositories.
//!
//! # Responsibility
//! - Sequence cross-collection side effects (sale/death status flips) so a
//!   subsequent read never sees a contradictory pair of collections.
//! - Gate every operation behind store readiness.
//!
//! # Invariants
//! - Mutating protocols run under one mutation lock, released on every exit
//!   path including failure.
//! - There is no transaction spanning two collections; the documented
//!   exposure is a crash between the two persists of one protocol.

pub mod farm_service;

pub use farm_service::{FarmService, NewHealthRecord, NewTransaction, ServiceError};
