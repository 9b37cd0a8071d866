//! REST API client module.
//!
//! `ApiClient` owns the transport, the base URL and the session; every
//! request it builds carries the current bearer credential.

mod resource;

pub use resource::*;

use std::sync::Arc;

use reqwest::{header, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::auth::{bearer_header, SessionAccessor};
use crate::config::ClientConfig;
use crate::errors::ApiError;
use crate::multipart::MultipartBody;

/// Success payloads, either wrapped in the `{ "success", "data" }` envelope or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> T {
        match self {
            ApiResponse::Wrapped { data } => data,
            ApiResponse::Bare(data) => data,
        }
    }
}

/// Body of a create or update call.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(MultipartBody),
}

impl RequestBody {
    fn apply(self, builder: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        Ok(match self {
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(body) => builder.multipart(body.into_form()?),
        })
    }
}

/// Shared HTTP client for the promotions API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<dyn SessionAccessor>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<dyn SessionAccessor>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::from_reqwest(e, config.base_url.as_str()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL extended by percent-encoded path segments.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request with the credential attached. Without a credential the
    /// request goes out unauthenticated and the server decides.
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match bearer_header(self.session.as_ref()) {
            Some(value) => builder.header(header::AUTHORIZATION, value),
            None => builder,
        }
    }

    pub(crate) fn request_with_body(
        &self,
        method: Method,
        url: Url,
        body: RequestBody,
    ) -> Result<RequestBuilder, ApiError> {
        body.apply(self.request(method, url))
    }

    /// Send and decode a JSON payload. Non-2xx responses become errors; nothing is retried.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        url: &Url,
    ) -> Result<T, ApiError> {
        let text = self.send_raw(builder, url).await?;
        serde_json::from_str::<ApiResponse<T>>(&text)
            .map(ApiResponse::into_data)
            .map_err(|e| ApiError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    /// Send a request whose response body is ignored.
    pub(crate) async fn send_empty(&self, builder: RequestBuilder, url: &Url) -> Result<(), ApiError> {
        self.send_raw(builder, url).await.map(|_| ())
    }

    async fn send_raw(&self, builder: RequestBuilder, url: &Url) -> Result<String, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, url.as_str()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(e, url.as_str()))?;

        if !status.is_success() {
            let err = ApiError::from_response(status.as_u16(), url.as_str(), &text);
            tracing::warn!("{}", err);
            return Err(err);
        }

        Ok(text)
    }
}
