//! Per-resource CRUD calls.

use std::marker::PhantomData;

use reqwest::Method;

use super::{ApiClient, RequestBody};
use crate::errors::ApiError;
use crate::filters::FilterSet;
use crate::models::Resource;

/// `GET/POST/PUT/DELETE /{resource}[/{id}]` for one resource type.
pub struct ResourceClient<R> {
    api: ApiClient,
    _marker: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R: Resource> ResourceClient<R> {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            _marker: PhantomData,
        }
    }

    /// GET /{resource} - List with query-string filters.
    pub async fn list(&self, filters: &FilterSet) -> Result<Vec<R>, ApiError> {
        let url = self.api.endpoint(&[R::KIND.path()])?;
        tracing::debug!("GET {} {:?}", url, filters.to_query_pairs());
        let builder = self
            .api
            .request(Method::GET, url.clone())
            .query(&filters.to_query_pairs());
        self.api.send_json(builder, &url).await
    }

    /// GET /{resource}/{id} - Fetch a single resource.
    pub async fn get(&self, id: &str) -> Result<R, ApiError> {
        let url = self.api.endpoint(&[R::KIND.path(), id])?;
        tracing::debug!("GET {}", url);
        let builder = self.api.request(Method::GET, url.clone());
        self.api.send_json(builder, &url).await
    }

    /// POST /{resource} - Create.
    pub async fn create(&self, body: RequestBody) -> Result<R, ApiError> {
        let url = self.api.endpoint(&[R::KIND.path()])?;
        tracing::debug!("POST {}", url);
        let builder = self.api.request_with_body(Method::POST, url.clone(), body)?;
        self.api.send_json(builder, &url).await
    }

    /// PUT /{resource}/{id} - Update.
    pub async fn update(&self, id: &str, body: RequestBody) -> Result<R, ApiError> {
        let url = self.api.endpoint(&[R::KIND.path(), id])?;
        tracing::debug!("PUT {}", url);
        let builder = self.api.request_with_body(Method::PUT, url.clone(), body)?;
        self.api.send_json(builder, &url).await
    }

    /// DELETE /{resource}/{id} - Delete.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let url = self.api.endpoint(&[R::KIND.path(), id])?;
        tracing::debug!("DELETE {}", url);
        let builder = self.api.request(Method::DELETE, url.clone());
        self.api.send_empty(builder, &url).await
    }
}
