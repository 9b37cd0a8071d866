//! Promotions admin resource client
//!
//! Typed client layer for the promotions admin dashboard: authenticated REST
//! calls, multipart submissions with retained and new assets, a de-duplicating
//! query cache, per-instance mutation coordination and client-side paging.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod errors;
pub mod filters;
pub mod forms;
pub mod manager;
pub mod models;
pub mod multipart;
pub mod mutation;
pub mod pagination;

pub use api::{ApiClient, RequestBody, ResourceClient};
pub use auth::{SessionAccessor, SessionStore};
pub use cache::{CacheEntry, CacheStatus, QueryCache};
pub use config::ClientConfig;
pub use errors::{ApiError, ConfigError, ValidationErrors};
pub use filters::{FilterPatch, FilterSet, FilterValue};
pub use forms::{EditForm, FormDraft, SubmitOutcome};
pub use manager::{AdminClient, ResourceManager};
pub use models::{Resource, ResourceKind};
pub use multipart::{build_multipart, EditState, LocalFile, MultipartBody};
pub use mutation::{FailureNotice, MutationCoordinator, MutationObserver, MutationOutcome};
pub use pagination::{window_of, Page, PageMeta, Window};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Calling this twice is harmless.
pub fn init_tracing(config: &ClientConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if installed.is_ok() {
        tracing::info!("Logging initialized at {}", config.log_level);
    }
}

#[cfg(test)]
mod tests;
