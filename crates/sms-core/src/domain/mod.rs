//! Domain module
//!
//! Pricing, campaign and reminder rules. Nothing here performs I/O.

pub mod aggregates;
pub mod events;
pub mod services;
pub mod value_objects;

pub use aggregates::*;
pub use events::*;
pub use services::*;
pub use value_objects::*;
