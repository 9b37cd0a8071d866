//! Integration tests against an in-process mock of the promotions API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower_http::trace::TraceLayer;

use crate::auth::{SessionStore, BEARER_PREFIX};
use crate::cache::CacheStatus;
use crate::config::ClientConfig;
use crate::errors::{codes, ApiError};
use crate::filters::FilterSet;
use crate::forms::SubmitOutcome;
use crate::manager::AdminClient;
use crate::models::{City, ResourceKind, StoreDraft, UserReward, UserRewardStatus};
use crate::multipart::assets::load_local_file;
use crate::multipart::LocalFile;
use crate::mutation::{FailureNotice, Instance, MutationFailure, MutationKind, MutationObserver};

#[derive(Debug, Clone)]
struct RecordedPart {
    name: String,
    file_name: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: &'static str,
    path: String,
    authorization: Option<String>,
    parts: Vec<RecordedPart>,
    json: Option<Value>,
}

/// Mock promotions API state: seeded stores plus a log of every request.
#[derive(Default)]
struct MockApi {
    requests: Mutex<Vec<RecordedRequest>>,
    stores: Mutex<Vec<Value>>,
}

impl MockApi {
    fn record(
        &self,
        method: &'static str,
        path: String,
        headers: &HeaderMap,
        parts: Vec<RecordedPart>,
        json: Option<Value>,
    ) {
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            path,
            authorization,
            parts,
            json,
        });
    }

    fn count(&self, method: &str, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn last(&self, method: &str, path: &str) -> RecordedRequest {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
            .cloned()
            .expect("request was recorded")
    }

    fn seed_store(&self, id: &str, name: &str, city: &str) {
        self.stores.lock().unwrap().push(json!({
            "id": id,
            "name": name,
            "city": city,
            "images": [],
            "isActive": true
        }));
    }
}

async fn read_parts(mut multipart: Multipart) -> Vec<RecordedPart> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.unwrap();
        let text = file_name
            .is_none()
            .then(|| String::from_utf8_lossy(&bytes).into_owned());
        parts.push(RecordedPart {
            name,
            file_name,
            text,
        });
    }
    parts
}

/// Token carried by an `Authorization: Bearer ...` header, as the server sees it.
fn parse_bearer(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn texts<'a>(parts: &'a [RecordedPart], name: &str) -> Vec<&'a str> {
    parts
        .iter()
        .filter(|p| p.name == name)
        .filter_map(|p| p.text.as_deref())
        .collect()
}

fn file_names<'a>(parts: &'a [RecordedPart], name: &str) -> Vec<&'a str> {
    parts
        .iter()
        .filter(|p| p.name == name)
        .filter_map(|p| p.file_name.as_deref())
        .collect()
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "error": { "code": code, "message": message }
        })),
    )
        .into_response()
}

fn sample_offer(images: Vec<String>) -> Value {
    json!({
        "id": "o1",
        "title": "Two for one",
        "storeId": "s1",
        "priceType": "FIXED",
        "price": 5000,
        "images": images,
        "isActive": true
    })
}

async fn list_stores(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    api.record("GET", "/api/stores".to_string(), &headers, Vec::new(), None);
    // long enough for concurrent readers to pile up behind one request
    tokio::time::sleep(Duration::from_millis(50)).await;

    let stores: Vec<Value> = api
        .stores
        .lock()
        .unwrap()
        .iter()
        .filter(|s| query.get("city").map_or(true, |city| s["city"] == city.as_str()))
        .cloned()
        .collect();
    Json(json!({ "success": true, "data": stores })).into_response()
}

async fn get_store(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    api.record("GET", format!("/api/stores/{}", id), &headers, Vec::new(), None);
    let found = api
        .stores
        .lock()
        .unwrap()
        .iter()
        .find(|s| s["id"] == id.as_str())
        .cloned();
    match found {
        Some(store) => Json(json!({ "success": true, "data": store })).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "NOT_FOUND", "Store not found"),
    }
}

async fn create_store(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let parts = read_parts(multipart).await;
    api.record("POST", "/api/stores".to_string(), &headers, parts.clone(), None);

    let name = texts(&parts, "name").first().map(|s| s.to_string()).unwrap_or_default();
    if name == "Broken" {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "store insert failed");
    }

    let images: Vec<String> = file_names(&parts, "images")
        .iter()
        .map(|f| format!("https://cdn.test/{}", f))
        .collect();
    let store = json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "name": name,
        "city": texts(&parts, "city").first().copied().unwrap_or("DAMASCUS"),
        "images": images,
        "isActive": texts(&parts, "isActive").first().copied() == Some("true")
    });
    api.stores.lock().unwrap().push(store.clone());
    Json(json!({ "success": true, "data": store })).into_response()
}

async fn list_offers(State(api): State<Arc<MockApi>>, headers: HeaderMap) -> Response {
    api.record("GET", "/api/offers".to_string(), &headers, Vec::new(), None);
    let images = ["a", "b", "c"]
        .iter()
        .map(|n| format!("https://cdn.test/{}.png", n))
        .collect();
    // bare array, no envelope
    Json(json!([sample_offer(images)])).into_response()
}

async fn update_offer(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let parts = read_parts(multipart).await;
    api.record("PUT", format!("/api/offers/{}", id), &headers, parts.clone(), None);

    let mut images: Vec<String> = texts(&parts, "existingImages")
        .into_iter()
        .map(str::to_string)
        .collect();
    images.extend(
        file_names(&parts, "images")
            .iter()
            .map(|f| format!("https://cdn.test/{}", f)),
    );
    Json(json!({ "success": true, "data": sample_offer(images) })).into_response()
}

async fn list_categories(State(api): State<Arc<MockApi>>, headers: HeaderMap) -> Response {
    api.record("GET", "/api/categories".to_string(), &headers, Vec::new(), None);
    Json(json!({
        "success": true,
        "data": [
            {
                "id": "c-with-rewards",
                "name": "Drinks",
                "rewards": [{ "id": "r1", "title": "Free coffee", "points": 150 }]
            },
            { "id": "c-empty", "name": "Snacks" }
        ]
    }))
    .into_response()
}

async fn delete_category(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    api.record("DELETE", format!("/api/categories/{}", id), &headers, Vec::new(), None);
    if id == "c-with-rewards" {
        return error_response(StatusCode::CONFLICT, "CONFLICT", "Category still has rewards");
    }
    Json(json!({ "success": true, "data": null })).into_response()
}

async fn delete_reward(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    api.record("DELETE", format!("/api/rewards/{}", id), &headers, Vec::new(), None);
    tokio::time::sleep(Duration::from_millis(200)).await;
    StatusCode::NO_CONTENT.into_response()
}

async fn update_user_reward(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    api.record(
        "PUT",
        format!("/api/user-rewards/{}", id),
        &headers,
        Vec::new(),
        Some(body.clone()),
    );
    Json(json!({
        "success": true,
        "data": {
            "id": id,
            "userId": "u1",
            "rewardId": "r1",
            "status": body["status"]
        }
    }))
    .into_response()
}

fn mock_router(api: Arc<MockApi>) -> Router {
    Router::new()
        .route("/api/stores", get(list_stores).post(create_store))
        .route("/api/stores/{id}", get(get_store))
        .route("/api/offers", get(list_offers))
        .route("/api/offers/{id}", put(update_offer))
        .route("/api/categories", get(list_categories))
        .route("/api/categories/{id}", delete(delete_category))
        .route("/api/rewards/{id}", delete(delete_reward))
        .route("/api/user-rewards/{id}", put(update_user_reward))
        .layer(TraceLayer::new_for_http())
        .with_state(api)
}

/// Test fixture for integration tests.
struct TestFixture {
    admin: AdminClient,
    api: Arc<MockApi>,
    session: Arc<SessionStore>,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_token(Some("test-token")).await
    }

    async fn with_token(token: Option<&str>) -> Self {
        let api = Arc::new(MockApi::default());
        let app = mock_router(Arc::clone(&api));

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = ClientConfig::for_base_url(&format!("http://{}/api", addr)).unwrap();
        let session = Arc::new(SessionStore::new(token.map(str::to_string)));
        let admin = AdminClient::new(&config, session.clone()).unwrap();

        TestFixture {
            admin,
            api,
            session,
        }
    }
}

#[derive(Default)]
struct RecordingView {
    notices: Mutex<Vec<FailureNotice>>,
    successes: Mutex<Vec<(ResourceKind, MutationKind)>>,
}

impl MutationObserver for RecordingView {
    fn mutation_succeeded(&self, kind: ResourceKind, operation: MutationKind, _: &Instance) {
        self.successes.lock().unwrap().push((kind, operation));
    }

    fn mutation_failed(&self, failure: &MutationFailure) {
        self.notices.lock().unwrap().push(failure.notice.clone());
    }
}

#[tokio::test]
async fn test_bearer_attached_to_requests() {
    let fixture = TestFixture::new().await;

    fixture.admin.stores.list(&FilterSet::new()).await.unwrap();

    let request = fixture.api.last("GET", "/api/stores");
    let header = request.authorization.expect("authorization header");
    assert_eq!(parse_bearer(&header), Some("test-token"));
}

#[tokio::test]
async fn test_missing_token_sends_no_header() {
    let fixture = TestFixture::with_token(None).await;

    let err = fixture.admin.stores.get("missing").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.error_code(), codes::NOT_FOUND);
    assert!(matches!(err, ApiError::Status { ref code, .. } if code.as_deref() == Some("NOT_FOUND")));
    assert_eq!(fixture.api.last("GET", "/api/stores/missing").authorization, None);

    // the credential is read per request
    fixture.session.set_token("late-token");
    fixture.admin.stores.get("missing").await.unwrap_err();
    assert_eq!(
        fixture.api.last("GET", "/api/stores/missing").authorization.as_deref(),
        Some("Bearer late-token")
    );
}

#[tokio::test]
async fn test_concurrent_reads_share_one_request() {
    let fixture = TestFixture::new().await;
    fixture.api.seed_store("s1", "Bakdash", "DAMASCUS");
    fixture.api.seed_store("s2", "Naranj", "DAMASCUS");
    fixture.api.seed_store("s3", "Citadel Grill", "ALEPPO");

    let filters = FilterSet::new().with("city", City::Damascus);
    let stores = &fixture.admin.stores;
    let (a, b, c) = tokio::join!(stores.list(&filters), stores.list(&filters), stores.list(&filters));
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

    assert_eq!(fixture.api.count("GET", "/api/stores"), 1);
    assert_eq!(a.len(), 2);
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));

    // a later read is served from cache
    stores.list(&filters).await.unwrap();
    assert_eq!(fixture.api.count("GET", "/api/stores"), 1);
}

#[tokio::test]
async fn test_create_store_sends_multipart_and_invalidates() {
    let fixture = TestFixture::new().await;
    fixture.api.seed_store("s1", "Bakdash", "DAMASCUS");

    let all = FilterSet::new();
    let damascus = FilterSet::new().with("city", City::Damascus);
    fixture.admin.stores.list(&all).await.unwrap();
    fixture.admin.stores.list(&damascus).await.unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logo.png");
    std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();
    let logo = load_local_file(&path).await.unwrap();

    let mut form = fixture.admin.stores.create_form();
    form.draft_mut().name = "Cham Souq".to_string();
    form.draft_mut().is_active = false;
    form.assets_mut().attach(logo);

    let saved = form.submit(None).await.saved().expect("store saved");
    assert_eq!(saved.name, "Cham Souq");
    assert!(!saved.is_active);
    assert_eq!(saved.images, vec!["https://cdn.test/logo.png".to_string()]);

    let request = fixture.api.last("POST", "/api/stores");
    assert_eq!(request.authorization.as_deref(), Some("Bearer test-token"));
    assert_eq!(texts(&request.parts, "isActive"), vec!["false"]);
    assert_eq!(texts(&request.parts, "city"), vec!["DAMASCUS"]);
    assert_eq!(file_names(&request.parts, "images"), vec!["logo.png"]);
    assert!(texts(&request.parts, "phone").is_empty());

    // create form is cleared but stays open
    assert!(form.is_open());
    assert_eq!(form.draft(), &StoreDraft::default());
    assert!(form.assets().new_files().is_empty());

    for filters in [&all, &damascus] {
        let entry = fixture.admin.stores.cached(filters).await.unwrap();
        assert_eq!(entry.status, CacheStatus::Stale);
    }

    let refreshed = fixture.admin.stores.list(&all).await.unwrap();
    assert_eq!(refreshed.len(), 2);
    assert_eq!(fixture.api.count("GET", "/api/stores"), 3);
}

#[tokio::test]
async fn test_offer_update_keeps_retained_images() {
    let fixture = TestFixture::new().await;

    let all = FilterSet::new();
    let by_store = FilterSet::new().with("storeId", "s1");
    let offers = fixture.admin.offers.list(&all).await.unwrap();
    fixture.admin.offers.list(&by_store).await.unwrap();
    let offer = offers[0].clone();

    let mut form = fixture.admin.offers.update_form(&offer);
    assert_eq!(form.assets().retained().len(), 3);
    assert!(form.assets_mut().remove_retained("https://cdn.test/c.png"));
    form.assets_mut()
        .attach(LocalFile::new("d.png", "image/png", vec![1, 2, 3]));

    let updated = form.submit(None).await.saved().expect("offer saved");
    assert_eq!(updated.images.len(), 3);

    let request = fixture.api.last("PUT", "/api/offers/o1");
    assert_eq!(
        texts(&request.parts, "existingImages"),
        vec!["https://cdn.test/a.png", "https://cdn.test/b.png"]
    );
    assert_eq!(file_names(&request.parts, "images"), vec!["d.png"]);
    assert_eq!(texts(&request.parts, "priceType"), vec!["FIXED"]);
    assert_eq!(texts(&request.parts, "price"), vec!["5000"]);

    assert!(!form.is_open());
    for filters in [&all, &by_store] {
        let entry = fixture.admin.offers.cached(filters).await.unwrap();
        assert_eq!(entry.status, CacheStatus::Stale);
    }
}

#[tokio::test]
async fn test_category_with_rewards_cannot_be_deleted() {
    let fixture = TestFixture::new().await;
    let categories = fixture.admin.categories.list(&FilterSet::new()).await.unwrap();
    assert!(categories[0].has_dependents());

    let view = Arc::new(RecordingView::default());
    let observer: Arc<dyn MutationObserver> = view.clone();

    let outcome = fixture
        .admin
        .categories
        .delete("c-with-rewards", Some(Arc::downgrade(&observer)))
        .await;
    let failure = outcome.failure().expect("delete refused").clone();
    assert_eq!(failure.notice, FailureNotice::HasDependents(ResourceKind::Category));
    assert_eq!(
        failure.notice.to_string(),
        "Unable to delete category: dependent items exist"
    );
    assert!(failure.error.is_conflict());
    assert_eq!(view.notices.lock().unwrap().as_slice(), [failure.notice.clone()]);

    let record = fixture
        .admin
        .categories
        .mutation_record(&Instance::existing("c-with-rewards"))
        .await;
    assert!(!record.pending);
    assert!(record.error.is_some());

    // failed writes leave the cache alone
    let entry = fixture.admin.categories.cached(&FilterSet::new()).await.unwrap();
    assert_eq!(entry.status, CacheStatus::Fresh);

    let outcome = fixture
        .admin
        .categories
        .delete("c-empty", Some(Arc::downgrade(&observer)))
        .await;
    assert!(outcome.succeeded().is_some());
    assert_eq!(
        view.successes.lock().unwrap().as_slice(),
        [(ResourceKind::Category, MutationKind::Delete)]
    );
    let entry = fixture.admin.categories.cached(&FilterSet::new()).await.unwrap();
    assert_eq!(entry.status, CacheStatus::Stale);
}

#[tokio::test]
async fn test_second_delete_rejected_while_pending() {
    let fixture = TestFixture::new().await;
    fixture.admin.categories.list(&FilterSet::new()).await.unwrap();

    let rewards = fixture.admin.rewards.clone();
    let first = tokio::spawn(async move { rewards.delete("r1", None).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = fixture.admin.rewards.delete("r1", None).await;
    assert!(second.is_rejected());

    assert!(first.await.unwrap().succeeded().is_some());
    assert_eq!(fixture.api.count("DELETE", "/api/rewards/r1"), 1);

    // categories embed rewards
    let entry = fixture.admin.categories.cached(&FilterSet::new()).await.unwrap();
    assert_eq!(entry.status, CacheStatus::Stale);
}

#[tokio::test]
async fn test_failed_create_retains_form() {
    let fixture = TestFixture::new().await;

    let mut form = fixture.admin.stores.create_form();
    form.draft_mut().name = "Broken".to_string();
    form.assets_mut()
        .attach(LocalFile::new("x.png", "image/png", vec![7]));

    match form.submit(None).await {
        SubmitOutcome::Failed(notice) => {
            assert_eq!(notice, FailureNotice::CreateFailed(ResourceKind::Store));
        }
        other => panic!("expected a failure notice, got {:?}", other),
    }

    assert!(form.is_open());
    assert_eq!(form.draft().name, "Broken");
    assert_eq!(form.assets().new_files().len(), 1);
    assert_eq!(
        form.last_failure(),
        Some(&FailureNotice::CreateFailed(ResourceKind::Store))
    );
    assert_eq!(fixture.api.count("POST", "/api/stores"), 1);
}

#[tokio::test]
async fn test_invalid_form_never_reaches_network() {
    let fixture = TestFixture::new().await;

    let mut form = fixture.admin.stores.create_form();
    form.draft_mut().phone = Some("0123".to_string());

    assert!(matches!(form.submit(None).await, SubmitOutcome::Invalid(_)));
    assert_eq!(fixture.api.count("POST", "/api/stores"), 0);
}

#[tokio::test]
async fn test_user_reward_update_sends_json() {
    let fixture = TestFixture::new().await;
    let claimed = UserReward {
        id: "ur1".to_string(),
        user_id: "u1".to_string(),
        reward_id: "r1".to_string(),
        status: UserRewardStatus::Pending,
        redeemed_at: None,
        created_at: None,
    };

    let mut form = fixture.admin.user_rewards.update_form(&claimed);
    form.draft_mut().status = UserRewardStatus::Redeemed;

    let saved = form.submit(None).await.saved().expect("user reward saved");
    assert_eq!(saved.status, UserRewardStatus::Redeemed);

    let request = fixture.api.last("PUT", "/api/user-rewards/ur1");
    assert_eq!(request.json, Some(json!({ "status": "REDEEMED" })));
    assert!(request.parts.is_empty());
}

#[tokio::test]
async fn test_pages_over_one_cached_list() {
    let fixture = TestFixture::new().await;
    for i in 0..25 {
        fixture
            .api
            .seed_store(&format!("s{}", i), &format!("Store {}", i), "HOMS");
    }

    let filters = FilterSet::new().with("city", City::Homs);
    let stores = &fixture.admin.stores;

    let last = stores.default_page(&filters, 3).await.unwrap();
    assert_eq!(last.items().len(), 5);
    assert_eq!(last.meta.page_count, 3);
    assert!(!last.meta.has_next());

    let clamped = stores.page(&filters, 99, 10).await.unwrap();
    assert_eq!(clamped.meta.page_index, 3);

    let first = stores.page(&filters, 0, 10).await.unwrap();
    assert_eq!(first.meta.page_index, 1);
    assert_eq!(first.items()[0].id, "s0");

    assert_eq!(fixture.api.count("GET", "/api/stores"), 1);
}
