//! Infrastructure layer
//!
//! Adapters implementing the outbound ports. The HTTP gateway adapter lives in
//! the CLI crate; this crate only ships in-memory ones.

pub mod memory;

pub use memory::{
    InMemoryCalendar, InMemoryEventPublisher, InMemoryGateway, InMemorySenderDirectory, SentMessage,
    StaticCustomerLookup, StaticRateLookup,
};
