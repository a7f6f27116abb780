//! Ports module (Hexagonal Architecture)
//!
//! Interfaces to the SMS gateway, the ERP lookups and the calendar.

pub mod outbound;

pub use outbound::*;
