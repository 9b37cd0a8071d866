//! Store model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Resource, ResourceKind};
use crate::errors::ValidationErrors;
use crate::filters::FilterValue;
use crate::forms::{validation, FormDraft};
use crate::multipart::{AssetSchema, FieldMap};

/// Cities a store can be registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum City {
    #[default]
    Damascus,
    Aleppo,
    Homs,
    Hama,
    Latakia,
    Tartus,
}

impl City {
    pub fn as_str(&self) -> &'static str {
        match self {
            City::Damascus => "DAMASCUS",
            City::Aleppo => "ALEPPO",
            City::Homs => "HOMS",
            City::Hama => "HAMA",
            City::Latakia => "LATAKIA",
            City::Tartus => "TARTUS",
        }
    }
}

impl From<City> for FilterValue {
    fn from(city: City) -> Self {
        FilterValue::Text(city.as_str().to_string())
    }
}

/// A physical store that publishes offers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub city: City,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

/// Create/update form for a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreDraft {
    pub name: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub city: City,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: bool,
}

impl Default for StoreDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            phone: None,
            city: City::default(),
            address: None,
            latitude: None,
            longitude: None,
            is_active: true,
        }
    }
}

impl FormDraft for StoreDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::require_text(&mut errors, "name", &self.name);
        validation::check_phone(&mut errors, "phone", self.phone.as_deref());
        validation::check_coordinates(&mut errors, self.latitude, self.longitude);
        errors.into_result()
    }

    fn write_fields(&self, fields: &mut FieldMap) {
        fields.set("name", self.name.trim());
        fields.set("description", self.description.clone());
        fields.set("phone", self.phone.as_deref().map(str::trim));
        fields.set("city", self.city.as_str());
        fields.set("address", self.address.clone());
        fields.set("latitude", self.latitude);
        fields.set("longitude", self.longitude);
        fields.set("isActive", self.is_active);
    }
}

impl Resource for Store {
    const KIND: ResourceKind = ResourceKind::Store;
    const ASSETS: Option<AssetSchema> = Some(AssetSchema::IMAGES);
    type Draft = StoreDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_draft(&self) -> StoreDraft {
        StoreDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            phone: self.phone.clone(),
            city: self.city,
            address: self.address.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            is_active: self.is_active,
        }
    }

    fn asset_urls(&self) -> Vec<String> {
        self.images.clone()
    }
}
