//! User reward model: a reward claimed by an end user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Resource, ResourceKind};
use crate::errors::ValidationErrors;
use crate::forms::FormDraft;
use crate::multipart::{AssetSchema, FieldMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRewardStatus {
    #[default]
    Pending,
    Redeemed,
    Cancelled,
}

impl UserRewardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRewardStatus::Pending => "PENDING",
            UserRewardStatus::Redeemed => "REDEEMED",
            UserRewardStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserReward {
    pub id: String,
    pub user_id: String,
    pub reward_id: String,
    pub status: UserRewardStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeemed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Admins only move a user reward between statuses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRewardDraft {
    pub status: UserRewardStatus,
    pub note: Option<String>,
}

impl FormDraft for UserRewardDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }

    fn write_fields(&self, fields: &mut FieldMap) {
        fields.set("status", self.status.as_str());
        fields.set("note", self.note.clone());
    }
}

impl Resource for UserReward {
    const KIND: ResourceKind = ResourceKind::UserReward;
    const ASSETS: Option<AssetSchema> = None;
    type Draft = UserRewardDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_draft(&self) -> UserRewardDraft {
        UserRewardDraft {
            status: self.status,
            note: None,
        }
    }
}
