//! Content item model (banners, articles, videos).

use serde::{Deserialize, Serialize};

use super::{Resource, ResourceKind};
use crate::errors::ValidationErrors;
use crate::forms::{validation, FormDraft};
use crate::multipart::{AssetSchema, FieldMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    #[default]
    Image,
    Video,
    Article,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "IMAGE",
            MediaType::Video => "VIDEO",
            MediaType::Article => "ARTICLE",
        }
    }
}

/// Who a content item belongs to. Store-owned content must name its store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(
    tag = "ownerType",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ContentOwner {
    #[default]
    Platform,
    Store {
        store_id: String,
    },
}

impl ContentOwner {
    pub fn owner_type(&self) -> &'static str {
        match self {
            ContentOwner::Platform => "PLATFORM",
            ContentOwner::Store { .. } => "STORE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(flatten)]
    pub owner: ContentOwner,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default)]
    pub interest_ids: Vec<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentDraft {
    pub title: String,
    pub body: Option<String>,
    pub owner: ContentOwner,
    pub media_type: MediaType,
    pub interest_ids: Vec<String>,
    pub published: bool,
}

impl FormDraft for ContentDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::require_text(&mut errors, "title", &self.title);
        if let ContentOwner::Store { store_id } = &self.owner {
            validation::require_text(&mut errors, "storeId", store_id);
        }
        if self.media_type == MediaType::Article {
            validation::require_text(&mut errors, "body", self.body.as_deref().unwrap_or(""));
        }
        errors.into_result()
    }

    fn write_fields(&self, fields: &mut FieldMap) {
        fields.set("title", self.title.trim());
        fields.set("body", self.body.clone());
        fields.set("ownerType", self.owner.owner_type());
        match &self.owner {
            ContentOwner::Store { store_id } => fields.set("storeId", store_id.as_str()),
            ContentOwner::Platform => {
                fields.remove("storeId");
            }
        }
        fields.set("mediaType", self.media_type.as_str());
        fields.set("interestIds", self.interest_ids.clone());
        fields.set("published", self.published);
    }
}

impl Resource for Content {
    const KIND: ResourceKind = ResourceKind::Content;
    const ASSETS: Option<AssetSchema> = Some(AssetSchema::FILES);
    type Draft = ContentDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_draft(&self) -> ContentDraft {
        ContentDraft {
            title: self.title.clone(),
            body: self.body.clone(),
            owner: self.owner.clone(),
            media_type: self.media_type,
            interest_ids: self.interest_ids.clone(),
            published: self.published,
        }
    }

    fn asset_urls(&self) -> Vec<String> {
        self.media.clone()
    }
}
