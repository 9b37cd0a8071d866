//! Offer model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Resource, ResourceKind};
use crate::errors::ValidationErrors;
use crate::forms::{validation, FormDraft};
use crate::multipart::{AssetSchema, FieldMap};

/// How an offer is priced. Each variant carries only the fields it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "priceType",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum OfferPricing {
    Fixed {
        price: f64,
    },
    Discount {
        percentage: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_price: Option<f64>,
    },
    Free,
}

impl Default for OfferPricing {
    fn default() -> Self {
        OfferPricing::Fixed { price: 0.0 }
    }
}

impl OfferPricing {
    pub fn price_type(&self) -> &'static str {
        match self {
            OfferPricing::Fixed { .. } => "FIXED",
            OfferPricing::Discount { .. } => "DISCOUNT",
            OfferPricing::Free => "FREE",
        }
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        match self {
            OfferPricing::Fixed { price } => validation::check_non_negative(errors, "price", *price),
            OfferPricing::Discount {
                percentage,
                original_price,
            } => {
                if *percentage == 0 || *percentage > 100 {
                    errors.push("percentage", "must be between 1 and 100");
                }
                if let Some(original) = original_price {
                    validation::check_non_negative(errors, "originalPrice", *original);
                }
            }
            OfferPricing::Free => {}
        }
    }

    /// Write the discriminator and exactly this variant's fields.
    fn write_fields(&self, fields: &mut FieldMap) {
        for stale in ["price", "percentage", "originalPrice"] {
            fields.remove(stale);
        }
        fields.set("priceType", self.price_type());
        match self {
            OfferPricing::Fixed { price } => fields.set("price", *price),
            OfferPricing::Discount {
                percentage,
                original_price,
            } => {
                fields.set("percentage", i64::from(*percentage));
                fields.set("originalPrice", *original_price);
            }
            OfferPricing::Free => {}
        }
    }
}

/// A promotion published by a store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub store_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(flatten)]
    pub pricing: OfferPricing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_active: bool,
}

/// Create/update form for an offer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferDraft {
    pub title: String,
    pub description: Option<String>,
    pub store_id: Option<String>,
    pub category_id: Option<String>,
    pub pricing: OfferPricing,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl FormDraft for OfferDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::require_text(&mut errors, "title", &self.title);
        validation::require_some(&mut errors, "storeId", &self.store_id);
        self.pricing.validate(&mut errors);
        validation::check_date_range(&mut errors, self.start_date, self.end_date);
        errors.into_result()
    }

    fn write_fields(&self, fields: &mut FieldMap) {
        fields.set("title", self.title.trim());
        fields.set("description", self.description.clone());
        fields.set("storeId", self.store_id.clone());
        fields.set("categoryId", self.category_id.clone());
        self.pricing.write_fields(fields);
        fields.set("startDate", self.start_date.map(|d| d.to_string()));
        fields.set("endDate", self.end_date.map(|d| d.to_string()));
        fields.set("isActive", self.is_active);
    }
}

impl Resource for Offer {
    const KIND: ResourceKind = ResourceKind::Offer;
    const ASSETS: Option<AssetSchema> = Some(AssetSchema::IMAGES);
    type Draft = OfferDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_draft(&self) -> OfferDraft {
        OfferDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            store_id: Some(self.store_id.clone()),
            category_id: self.category_id.clone(),
            pricing: self.pricing.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            is_active: self.is_active,
        }
    }

    fn asset_urls(&self) -> Vec<String> {
        self.images.clone()
    }
}
