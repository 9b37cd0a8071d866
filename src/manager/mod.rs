//! Resource managers.
//!
//! [`ResourceManager`] is the one generic stack behind every resource screen:
//! cached listing, paging, single fetches and coordinated writes.
//! [`AdminClient`] wires one manager per kind around a shared cache and
//! mutation coordinator.

use std::sync::Arc;

use crate::api::{ApiClient, RequestBody, ResourceClient};
use crate::auth::SessionAccessor;
use crate::cache::{CacheEntry, QueryCache};
use crate::config::ClientConfig;
use crate::errors::ApiError;
use crate::filters::FilterSet;
use crate::forms::EditForm;
use crate::models::{Category, Content, Offer, Resource, Reward, Store, UserReward};
use crate::multipart::{build_multipart, EditState};
use crate::mutation::{
    Instance, MutationCoordinator, MutationKind, MutationOutcome, MutationRecord, ObserverRef,
};
use crate::pagination::Page;

pub struct ResourceManager<R> {
    client: ResourceClient<R>,
    cache: QueryCache,
    mutations: MutationCoordinator,
    page_size: usize,
}

impl<R> Clone for ResourceManager<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            cache: self.cache.clone(),
            mutations: self.mutations.clone(),
            page_size: self.page_size,
        }
    }
}

impl<R: Resource> ResourceManager<R> {
    pub fn new(
        api: ApiClient,
        cache: QueryCache,
        mutations: MutationCoordinator,
        page_size: usize,
    ) -> Self {
        Self {
            client: ResourceClient::new(api),
            cache,
            mutations,
            page_size,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Cached collection for `filters`; fetched at most once per invalidation.
    pub async fn list(&self, filters: &FilterSet) -> Result<Arc<Vec<R>>, ApiError> {
        let client = self.client.clone();
        let query = filters.clone();
        self.cache
            .fetch_with(R::KIND, filters, move || async move { client.list(&query).await })
            .await
    }

    /// One page of the cached collection.
    pub async fn page(
        &self,
        filters: &FilterSet,
        page_index: i64,
        page_size: usize,
    ) -> Result<Page<R>, ApiError> {
        let collection = self.list(filters).await?;
        Ok(Page::new(collection, page_index, page_size))
    }

    /// [`ResourceManager::page`] with the configured page size.
    pub async fn default_page(&self, filters: &FilterSet, page_index: i64) -> Result<Page<R>, ApiError> {
        self.page(filters, page_index, self.page_size).await
    }

    /// Whatever is cached for `filters`, without fetching.
    pub async fn cached(&self, filters: &FilterSet) -> Option<CacheEntry<R>> {
        self.cache.get(R::KIND, filters).await
    }

    /// Uncached single fetch.
    pub async fn get(&self, id: &str) -> Result<R, ApiError> {
        self.client.get(id).await
    }

    /// Multipart when the kind carries assets, JSON otherwise.
    pub fn request_body(&self, state: &EditState) -> RequestBody {
        match R::ASSETS {
            Some(schema) => RequestBody::Multipart(build_multipart(state, &schema)),
            None => RequestBody::Json(state.fields.to_json()),
        }
    }

    pub async fn create(&self, state: &EditState, observer: Option<ObserverRef>) -> MutationOutcome<R> {
        let client = self.client.clone();
        let body = self.request_body(state);
        self.mutations
            .run(R::KIND, Instance::New, MutationKind::Create, observer, move || async move {
                client.create(body).await
            })
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        state: &EditState,
        observer: Option<ObserverRef>,
    ) -> MutationOutcome<R> {
        let client = self.client.clone();
        let body = self.request_body(state);
        let target = id.to_string();
        self.mutations
            .run(
                R::KIND,
                Instance::existing(id),
                MutationKind::Update,
                observer,
                move || async move { client.update(&target, body).await },
            )
            .await
    }

    pub async fn delete(&self, id: &str, observer: Option<ObserverRef>) -> MutationOutcome<()> {
        let client = self.client.clone();
        let target = id.to_string();
        self.mutations
            .run(
                R::KIND,
                Instance::existing(id),
                MutationKind::Delete,
                observer,
                move || async move { client.delete(&target).await },
            )
            .await
    }

    pub async fn mutation_record(&self, instance: &Instance) -> MutationRecord {
        self.mutations.record(R::KIND, instance).await
    }

    pub fn create_form(&self) -> EditForm<R> {
        EditForm::create(self.clone())
    }

    pub fn update_form(&self, resource: &R) -> EditForm<R> {
        EditForm::update(self.clone(), resource)
    }
}

/// Every resource manager of the dashboard, built once at startup.
#[derive(Clone)]
pub struct AdminClient {
    pub stores: ResourceManager<Store>,
    pub offers: ResourceManager<Offer>,
    pub categories: ResourceManager<Category>,
    pub rewards: ResourceManager<Reward>,
    pub contents: ResourceManager<Content>,
    pub user_rewards: ResourceManager<UserReward>,
    cache: QueryCache,
    mutations: MutationCoordinator,
}

impl AdminClient {
    pub fn new(config: &ClientConfig, session: Arc<dyn SessionAccessor>) -> Result<Self, ApiError> {
        let api = ApiClient::new(config, session)?;
        let cache = QueryCache::new();
        let mutations = MutationCoordinator::new(cache.clone());
        let page_size = config.page_size;

        tracing::info!("Admin client ready for {}", config.base_url);

        Ok(Self {
            stores: ResourceManager::new(api.clone(), cache.clone(), mutations.clone(), page_size),
            offers: ResourceManager::new(api.clone(), cache.clone(), mutations.clone(), page_size),
            categories: ResourceManager::new(api.clone(), cache.clone(), mutations.clone(), page_size),
            rewards: ResourceManager::new(api.clone(), cache.clone(), mutations.clone(), page_size),
            contents: ResourceManager::new(api.clone(), cache.clone(), mutations.clone(), page_size),
            user_rewards: ResourceManager::new(api, cache.clone(), mutations.clone(), page_size),
            cache,
            mutations,
        })
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn mutations(&self) -> &MutationCoordinator {
        &self.mutations
    }

    /// Drop every cached collection, e.g. after the session ends.
    pub async fn reset(&self) {
        self.cache.clear().await;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::SessionStore;
    use crate::models::{OfferDraft, OfferPricing, UserRewardDraft, UserRewardStatus};
    use crate::forms::FormDraft;
    use crate::multipart::LocalFile;

    /// A manager pointed at a closed port; only for paths that never reach the network.
    pub(crate) fn offline_manager<R: Resource>() -> ResourceManager<R> {
        let config = ClientConfig::for_base_url("http://127.0.0.1:9/api").unwrap();
        let api = ApiClient::new(&config, Arc::new(SessionStore::default())).unwrap();
        let cache = QueryCache::new();
        let mutations = MutationCoordinator::new(cache.clone());
        ResourceManager::new(api, cache, mutations, config.page_size)
    }

    #[test]
    fn test_assets_select_multipart_body() {
        let manager = offline_manager::<Offer>();
        let draft = OfferDraft {
            title: "Half price".to_string(),
            store_id: Some("s1".to_string()),
            pricing: OfferPricing::Free,
            ..OfferDraft::default()
        };
        let mut state = EditState::with_retained(["https://cdn.example.com/o.png"]);
        draft.write_fields(&mut state.fields);
        state.attach(LocalFile::new("new.png", "image/png", vec![1, 2]));

        match manager.request_body(&state) {
            RequestBody::Multipart(body) => {
                assert_eq!(body.existing_assets(), vec!["https://cdn.example.com/o.png"]);
                assert_eq!(body.files().len(), 1);
                assert_eq!(body.text_values("priceType"), vec!["FREE"]);
            }
            RequestBody::Json(_) => panic!("offers carry images"),
        }
    }

    #[test]
    fn test_no_assets_selects_json_body() {
        let manager = offline_manager::<UserReward>();
        let draft = UserRewardDraft {
            status: UserRewardStatus::Redeemed,
            note: None,
        };
        let mut state = EditState::new();
        draft.write_fields(&mut state.fields);

        match manager.request_body(&state) {
            RequestBody::Json(value) => {
                assert_eq!(value, serde_json::json!({ "status": "REDEEMED" }))
            }
            RequestBody::Multipart(_) => panic!("user rewards are JSON"),
        }
    }

    #[test]
    fn test_admin_client_shares_one_cache() {
        let config = ClientConfig::for_base_url("http://127.0.0.1:9/api").unwrap();
        let admin = AdminClient::new(&config, Arc::new(SessionStore::default())).unwrap();
        assert_eq!(admin.stores.page_size(), config.page_size);
        assert_eq!(admin.user_rewards.page_size(), config.page_size);
    }
}
