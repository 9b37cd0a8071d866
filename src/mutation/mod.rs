//! Mutation coordinator.
//!
//! Tracks one write at a time per resource instance:
//! `idle -> pending -> (success | error) -> idle`. A second write while one
//! is pending is rejected before any request goes out. Successful writes
//! invalidate the query cache for the affected kind.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use tokio::sync::Mutex;

use crate::cache::QueryCache;
use crate::errors::ApiError;
use crate::models::ResourceKind;

/// The resource instance a mutation targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instance {
    /// The synthetic instance of a create form.
    New,
    Existing(String),
}

impl Instance {
    pub fn existing(id: impl Into<String>) -> Self {
        Instance::Existing(id.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

/// User-facing failure indicator, distinct per operation and resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureNotice {
    CreateFailed(ResourceKind),
    UpdateFailed(ResourceKind),
    DeleteFailed(ResourceKind),
    /// Delete refused because other resources still reference this one.
    HasDependents(ResourceKind),
}

impl FailureNotice {
    pub fn classify(kind: ResourceKind, operation: MutationKind, error: &ApiError) -> Self {
        match operation {
            MutationKind::Create => FailureNotice::CreateFailed(kind),
            MutationKind::Update => FailureNotice::UpdateFailed(kind),
            MutationKind::Delete if error.is_conflict() => FailureNotice::HasDependents(kind),
            MutationKind::Delete => FailureNotice::DeleteFailed(kind),
        }
    }
}

impl fmt::Display for FailureNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureNotice::CreateFailed(kind) => write!(f, "Failed to create {}", kind),
            FailureNotice::UpdateFailed(kind) => write!(f, "Failed to update {}", kind),
            FailureNotice::DeleteFailed(kind) => write!(f, "Failed to delete {}", kind),
            FailureNotice::HasDependents(kind) => {
                write!(f, "Unable to delete {}: dependent items exist", kind)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct MutationFailure {
    pub kind: ResourceKind,
    pub operation: MutationKind,
    pub instance: Instance,
    pub notice: FailureNotice,
    pub error: ApiError,
}

/// Write state of one instance.
#[derive(Debug, Clone, Default)]
pub struct MutationRecord {
    pub pending: bool,
    pub error: Option<MutationFailure>,
}

#[derive(Debug)]
pub enum MutationOutcome<T> {
    Succeeded(T),
    Failed(MutationFailure),
    /// Another mutation on the same instance is still pending; nothing was sent.
    Rejected,
}

impl<T> MutationOutcome<T> {
    pub fn is_rejected(&self) -> bool {
        matches!(self, MutationOutcome::Rejected)
    }

    pub fn succeeded(self) -> Option<T> {
        match self {
            MutationOutcome::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&MutationFailure> {
        match self {
            MutationOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// The view that started a mutation. Held weakly: a dismissed view is not notified.
pub trait MutationObserver: Send + Sync {
    fn mutation_succeeded(&self, kind: ResourceKind, operation: MutationKind, instance: &Instance);
    fn mutation_failed(&self, failure: &MutationFailure);
}

pub type ObserverRef = Weak<dyn MutationObserver>;

type RecordKey = (ResourceKind, Instance);

#[derive(Clone)]
pub struct MutationCoordinator {
    cache: QueryCache,
    records: Arc<Mutex<HashMap<RecordKey, MutationRecord>>>,
}

impl MutationCoordinator {
    pub fn new(cache: QueryCache) -> Self {
        Self {
            cache,
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Snapshot of the instance's write state.
    pub async fn record(&self, kind: ResourceKind, instance: &Instance) -> MutationRecord {
        let records = self.records.lock().await;
        records
            .get(&(kind, instance.clone()))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn is_pending(&self, kind: ResourceKind, instance: &Instance) -> bool {
        self.record(kind, instance).await.pending
    }

    /// Forget a displayed error (e.g. when its toast is dismissed).
    pub async fn clear_error(&self, kind: ResourceKind, instance: &Instance) {
        let mut records = self.records.lock().await;
        let key = (kind, instance.clone());
        if records.get(&key).is_some_and(|r| !r.pending) {
            records.remove(&key);
        }
    }

    /// Run one mutation for an instance.
    ///
    /// `call` is only invoked when no other mutation is pending for the
    /// instance. The request runs on its own task and completes even if the
    /// caller is dropped; `observer` is notified only if it is still alive.
    pub async fn run<T, F, Fut>(
        &self,
        kind: ResourceKind,
        instance: Instance,
        operation: MutationKind,
        observer: Option<ObserverRef>,
        call: F,
    ) -> MutationOutcome<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        if !self.begin(kind, &instance).await {
            tracing::debug!("Rejected {:?} on {} {:?}: already pending", operation, kind, instance);
            return MutationOutcome::Rejected;
        }

        let request = call();
        let coordinator = self.clone();
        let task_instance = instance.clone();
        let handle = tokio::spawn(async move {
            let result = request.await;
            coordinator
                .finish(kind, task_instance, operation, result, observer)
                .await
        });

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let error = ApiError::Task(e.to_string());
                let failure = MutationFailure {
                    kind,
                    operation,
                    notice: FailureNotice::classify(kind, operation, &error),
                    instance: instance.clone(),
                    error,
                };
                self.settle(kind, instance, Some(failure.clone())).await;
                MutationOutcome::Failed(failure)
            }
        }
    }

    /// `idle -> pending`; false when already pending.
    async fn begin(&self, kind: ResourceKind, instance: &Instance) -> bool {
        let mut records = self.records.lock().await;
        let record = records.entry((kind, instance.clone())).or_default();
        if record.pending {
            return false;
        }
        record.pending = true;
        record.error = None;
        true
    }

    async fn settle(&self, kind: ResourceKind, instance: Instance, error: Option<MutationFailure>) {
        let mut records = self.records.lock().await;
        match error {
            Some(failure) => {
                records.insert(
                    (kind, instance),
                    MutationRecord {
                        pending: false,
                        error: Some(failure),
                    },
                );
            }
            None => {
                records.remove(&(kind, instance));
            }
        }
    }

    async fn finish<T>(
        &self,
        kind: ResourceKind,
        instance: Instance,
        operation: MutationKind,
        result: Result<T, ApiError>,
        observer: Option<ObserverRef>,
    ) -> MutationOutcome<T> {
        let observer = observer.as_ref().and_then(Weak::upgrade);

        match result {
            Ok(value) => {
                self.cache.invalidate(kind).await;
                for related in kind.embedded_in() {
                    self.cache.invalidate(*related).await;
                }
                self.settle(kind, instance.clone(), None).await;
                tracing::info!("{:?} on {} {:?} succeeded", operation, kind, instance);

                match observer {
                    Some(view) => view.mutation_succeeded(kind, operation, &instance),
                    None => tracing::debug!("Initiating view is gone; dropping success notice"),
                }
                MutationOutcome::Succeeded(value)
            }
            Err(error) => {
                let failure = MutationFailure {
                    kind,
                    operation,
                    instance: instance.clone(),
                    notice: FailureNotice::classify(kind, operation, &error),
                    error,
                };
                tracing::warn!("{}: {}", failure.notice, failure.error);
                self.settle(kind, instance, Some(failure.clone())).await;

                match observer {
                    Some(view) => view.mutation_failed(&failure),
                    None => tracing::debug!("Initiating view is gone; dropping failure notice"),
                }
                MutationOutcome::Failed(failure)
            }
        }
    }
}
