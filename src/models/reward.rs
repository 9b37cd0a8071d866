//! Reward model.

use serde::{Deserialize, Serialize};

use super::{Resource, ResourceKind};
use crate::errors::ValidationErrors;
use crate::forms::{validation, FormDraft};
use crate::multipart::{AssetSchema, FieldMap};

/// A reward users redeem with points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default)]
    pub is_active: bool,
}

/// Create/update form for a reward.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardDraft {
    pub title: String,
    pub description: Option<String>,
    pub points: u32,
    pub category_id: Option<String>,
    pub stock: Option<u32>,
    pub is_active: bool,
}

impl FormDraft for RewardDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::require_text(&mut errors, "title", &self.title);
        validation::require_some(&mut errors, "categoryId", &self.category_id);
        errors.into_result()
    }

    fn write_fields(&self, fields: &mut FieldMap) {
        fields.set("title", self.title.trim());
        fields.set("description", self.description.clone());
        fields.set("points", self.points);
        fields.set("categoryId", self.category_id.clone());
        fields.set("stock", self.stock);
        fields.set("isActive", self.is_active);
    }
}

impl Resource for Reward {
    const KIND: ResourceKind = ResourceKind::Reward;
    const ASSETS: Option<AssetSchema> = Some(AssetSchema::IMAGES);
    type Draft = RewardDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_draft(&self) -> RewardDraft {
        RewardDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            points: self.points,
            category_id: self.category_id.clone(),
            stock: self.stock,
            is_active: self.is_active,
        }
    }

    fn asset_urls(&self) -> Vec<String> {
        self.image.iter().cloned().collect()
    }
}
