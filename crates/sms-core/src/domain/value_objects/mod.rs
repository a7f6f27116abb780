//! Value Objects module
//!
//! Immutable, validated domain primitives.

pub mod phone;
pub mod sender;

pub use phone::{normalize, PhoneNumber, DEFAULT_COUNTRY_CODE};
pub use sender::{validate_sender, SenderName, SenderVerdict, Severity};

use serde::{Deserialize, Serialize};

/// How a line's markup is expressed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarginMode {
    /// Percentage of the base amount
    #[default]
    Percentage,
    /// Flat amount per unit
    Amount,
}

/// Identifier value object for entities
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
