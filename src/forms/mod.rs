//! Create/update edit flows.
//!
//! An [`EditForm`] runs one submission as a straight pipeline:
//! validate, build the body, hand it to the mutation coordinator, then apply
//! the outcome to the form.

pub mod validation;

use std::fmt;

use crate::errors::ValidationErrors;
use crate::manager::ResourceManager;
use crate::models::Resource;
use crate::multipart::{EditState, FieldMap};
use crate::mutation::{FailureNotice, MutationOutcome, ObserverRef};

/// Typed form input of one resource kind.
pub trait FormDraft: Clone + Default + Send + Sync + 'static {
    /// Client-side checks run before anything is sent.
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Write the scalar fields. Unset optionals are written as null and omitted on the wire.
    fn write_fields(&self, fields: &mut FieldMap);

    fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        self.write_fields(&mut fields);
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update { id: String },
}

/// Result of [`EditForm::submit`].
pub enum SubmitOutcome<R> {
    Saved(R),
    /// Client-side validation failed; nothing was sent.
    Invalid(ValidationErrors),
    Failed(FailureNotice),
    /// A previous submission for the same instance is still pending.
    Rejected,
}

impl<R> SubmitOutcome<R> {
    pub fn saved(self) -> Option<R> {
        match self {
            SubmitOutcome::Saved(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, SubmitOutcome::Saved(_))
    }
}

impl<R> fmt::Debug for SubmitOutcome<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitOutcome::Saved(_) => f.write_str("Saved"),
            SubmitOutcome::Invalid(errors) => f.debug_tuple("Invalid").field(errors).finish(),
            SubmitOutcome::Failed(notice) => f.debug_tuple("Failed").field(notice).finish(),
            SubmitOutcome::Rejected => f.write_str("Rejected"),
        }
    }
}

/// One open create or update form.
pub struct EditForm<R: Resource> {
    manager: ResourceManager<R>,
    mode: FormMode,
    draft: R::Draft,
    assets: EditState,
    open: bool,
    last_failure: Option<FailureNotice>,
}

impl<R: Resource> EditForm<R> {
    pub fn create(manager: ResourceManager<R>) -> Self {
        Self {
            manager,
            mode: FormMode::Create,
            draft: R::Draft::default(),
            assets: EditState::new(),
            open: true,
            last_failure: None,
        }
    }

    /// Pre-fill from an existing resource; its server-side assets start out retained.
    pub fn update(manager: ResourceManager<R>, resource: &R) -> Self {
        Self {
            manager,
            mode: FormMode::Update {
                id: resource.id().to_string(),
            },
            draft: resource.to_draft(),
            assets: EditState::with_retained(resource.asset_urls()),
            open: true,
            last_failure: None,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &R::Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut R::Draft {
        &mut self.draft
    }

    pub fn assets(&self) -> &EditState {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut EditState {
        &mut self.assets
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn last_failure(&self) -> Option<&FailureNotice> {
        self.last_failure.as_ref()
    }

    /// Everything that would be submitted right now.
    pub fn edit_state(&self) -> EditState {
        let mut state = self.assets.clone();
        self.draft.write_fields(&mut state.fields);
        state
    }

    pub async fn submit(&mut self, observer: Option<ObserverRef>) -> SubmitOutcome<R> {
        if let Err(errors) = self.draft.validate() {
            tracing::debug!("{} form has {} invalid field(s)", R::KIND, errors.len());
            return SubmitOutcome::Invalid(errors);
        }

        let state = self.edit_state();
        let outcome = match &self.mode {
            FormMode::Create => self.manager.create(&state, observer).await,
            FormMode::Update { id } => self.manager.update(id, &state, observer).await,
        };

        match outcome {
            MutationOutcome::Succeeded(saved) => {
                self.last_failure = None;
                match self.mode {
                    FormMode::Create => {
                        self.draft = R::Draft::default();
                        self.assets.clear();
                    }
                    FormMode::Update { .. } => self.open = false,
                }
                SubmitOutcome::Saved(saved)
            }
            MutationOutcome::Failed(failure) => {
                self.last_failure = Some(failure.notice.clone());
                SubmitOutcome::Failed(failure.notice)
            }
            MutationOutcome::Rejected => SubmitOutcome::Rejected,
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }
}
