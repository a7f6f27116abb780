//! Domain Events
//!
//! Raised by the campaign aggregate and drained by the caller with
//! `take_events`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::CampaignStatus;
use crate::domain::value_objects::EntityId;

/// Root domain event type
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "aggregate", content = "event")]
pub enum DomainEvent {
    Campaign(CampaignEvent),
}

/// Campaign events
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CampaignEvent {
    Created {
        campaign_id: EntityId,
        title: String,
        created_at: DateTime<Utc>,
    },
    MessageSent {
        campaign_id: EntityId,
        line: usize,
        mobile: String,
        sent_at: DateTime<Utc>,
    },
    MessageFailed {
        campaign_id: EntityId,
        line: usize,
        reason: String,
        failed_at: DateTime<Utc>,
    },
    StatusChanged {
        campaign_id: EntityId,
        from: CampaignStatus,
        to: CampaignStatus,
    },
}

impl DomainEvent {
    pub fn campaign_id(&self) -> &EntityId {
        match self {
            DomainEvent::Campaign(event) => match event {
                CampaignEvent::Created { campaign_id, .. }
                | CampaignEvent::MessageSent { campaign_id, .. }
                | CampaignEvent::MessageFailed { campaign_id, .. }
                | CampaignEvent::StatusChanged { campaign_id, .. } => campaign_id,
            },
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::Campaign(CampaignEvent::Created { .. }) => "campaign.created",
            DomainEvent::Campaign(CampaignEvent::MessageSent { .. }) => "campaign.message_sent",
            DomainEvent::Campaign(CampaignEvent::MessageFailed { .. }) => "campaign.message_failed",
            DomainEvent::Campaign(CampaignEvent::StatusChanged { .. }) => "campaign.status_changed",
        }
    }
}
