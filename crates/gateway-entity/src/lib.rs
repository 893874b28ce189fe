//! # gateway-entity
//!
//! Domain models for the imaging gateway: the persisted job record with its
//! status state machine, and the authenticated caller's identity.

pub mod job;
pub mod user;
