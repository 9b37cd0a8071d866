//! Data models for the promotions platform.
//!
//! These models match the API's JSON shapes (camelCase) for seamless interoperability.

mod category;
mod content;
mod offer;
mod reward;
mod store;
mod user_reward;

pub use category::*;
pub use content::*;
pub use offer::*;
pub use reward::*;
pub use store::*;
pub use user_reward::*;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::forms::FormDraft;
use crate::multipart::AssetSchema;

/// Every resource type the dashboard manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Store,
    Offer,
    Category,
    Reward,
    Content,
    UserReward,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Store,
        ResourceKind::Offer,
        ResourceKind::Category,
        ResourceKind::Reward,
        ResourceKind::Content,
        ResourceKind::UserReward,
    ];

    /// Path segment under the API root.
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Store => "stores",
            ResourceKind::Offer => "offers",
            ResourceKind::Category => "categories",
            ResourceKind::Reward => "rewards",
            ResourceKind::Content => "contents",
            ResourceKind::UserReward => "user-rewards",
        }
    }

    /// Singular name used in user-facing notices.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Store => "store",
            ResourceKind::Offer => "offer",
            ResourceKind::Category => "category",
            ResourceKind::Reward => "reward",
            ResourceKind::Content => "content item",
            ResourceKind::UserReward => "user reward",
        }
    }

    /// Kinds whose cached collections embed this kind and go stale with it.
    pub fn embedded_in(&self) -> &'static [ResourceKind] {
        match self {
            ResourceKind::Reward => &[ResourceKind::Category, ResourceKind::UserReward],
            _ => &[],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A typed model bound to its resource kind and form schema.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    /// Part names for file uploads; `None` means the resource is submitted as JSON.
    const ASSETS: Option<AssetSchema>;

    /// Typed form input for create/update flows.
    type Draft: FormDraft;

    fn id(&self) -> &str;

    /// Form input pre-filled from this resource, for update flows.
    fn to_draft(&self) -> Self::Draft;

    /// Asset URLs already stored on the server.
    fn asset_urls(&self) -> Vec<String> {
        Vec::new()
    }
}
