//! Category model.

use serde::{Deserialize, Serialize};

use super::{Resource, ResourceKind, Reward};
use crate::errors::ValidationErrors;
use crate::forms::{validation, FormDraft};
use crate::multipart::{AssetSchema, FieldMap};

/// A category grouping offers and rewards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Rewards filed under this category; a non-empty list blocks deletion server-side.
    #[serde(default)]
    pub rewards: Vec<Reward>,
}

impl Category {
    pub fn has_dependents(&self) -> bool {
        !self.rewards.is_empty()
    }
}

/// Create/update form for a category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryDraft {
    pub name: String,
    pub description: Option<String>,
}

impl FormDraft for CategoryDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::require_text(&mut errors, "name", &self.name);
        errors.into_result()
    }

    fn write_fields(&self, fields: &mut FieldMap) {
        fields.set("name", self.name.trim());
        fields.set("description", self.description.clone());
    }
}

impl Resource for Category {
    const KIND: ResourceKind = ResourceKind::Category;
    const ASSETS: Option<AssetSchema> = Some(AssetSchema::IMAGES);
    type Draft = CategoryDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_draft(&self) -> CategoryDraft {
        CategoryDraft {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }

    fn asset_urls(&self) -> Vec<String> {
        self.icon.iter().cloned().collect()
    }
}
