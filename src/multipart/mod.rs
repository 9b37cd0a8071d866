//! Multipart submission builder.
//!
//! Turns an [`EditState`] (scalar fields, retained remote assets and newly
//! attached local files) into a [`MultipartBody`]. Building is pure; the
//! conversion into a `reqwest` form happens at the transport edge.

pub mod assets;

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::errors::{ApiError, AssetError};

/// Part names used for asset uploads of one resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetSchema {
    /// Shared name of the binary parts for newly added files.
    pub field: &'static str,
    /// Shared name of the text parts for assets already on the server.
    pub retained_field: &'static str,
}

impl AssetSchema {
    pub const IMAGES: AssetSchema = AssetSchema {
        field: "images",
        retained_field: "existingImages",
    };

    pub const FILES: AssetSchema = AssetSchema {
        field: "files",
        retained_field: "existingFiles",
    };
}

/// A scalar form value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Bool(bool),
    /// Multi-valued field, sent as one part per value.
    List(Vec<String>),
    Null,
}

impl FieldValue {
    /// Only null and empty text are omitted; zero and `false` are real values.
    pub fn is_omitted(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(values) => values.iter().all(|v| v.is_empty()),
            _ => false,
        }
    }

    /// Wire strings, one per part.
    pub fn wire_values(&self) -> Vec<String> {
        match self {
            FieldValue::Text(s) => vec![s.clone()],
            FieldValue::Integer(n) => vec![n.to_string()],
            FieldValue::Decimal(n) => vec![n.to_string()],
            FieldValue::Bool(b) => vec![b.to_string()],
            FieldValue::List(values) => values.iter().filter(|v| !v.is_empty()).cloned().collect(),
            FieldValue::Null => Vec::new(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Integer(n) => Value::from(*n),
            FieldValue::Decimal(n) => Value::from(*n),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::List(_) => Value::from(self.wire_values()),
            FieldValue::Null => Value::Null,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Ordered scalar fields of a form. Setting an existing key replaces it in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, FieldValue)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object body for resources without file assets. Omitted values are skipped.
    pub fn to_json(&self) -> Value {
        let object: Map<String, Value> = self
            .entries
            .iter()
            .filter(|(_, v)| !v.is_omitted())
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(object)
    }
}

/// A file selected on the local machine, already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Arc<Vec<u8>>,
}

impl LocalFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: Arc::new(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// In-progress create/update form data.
///
/// Retained URLs and new files are kept apart; dropping a retained URL is
/// always an explicit [`EditState::remove_retained`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditState {
    pub fields: FieldMap,
    retained: Vec<String>,
    new_files: Vec<LocalFile>,
}

impl EditState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the assets an existing resource already has on the server.
    pub fn with_retained<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = Self::new();
        for url in urls {
            state.retain_asset(url);
        }
        state
    }

    /// Keep a server-side asset. Returns false for empty or already retained URLs.
    pub fn retain_asset(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if url.trim().is_empty() || self.retained.contains(&url) {
            return false;
        }
        self.retained.push(url);
        true
    }

    /// Explicitly drop a retained asset.
    pub fn remove_retained(&mut self, url: &str) -> bool {
        let before = self.retained.len();
        self.retained.retain(|u| u != url);
        self.retained.len() != before
    }

    pub fn attach(&mut self, file: LocalFile) {
        self.new_files.push(file);
    }

    pub fn detach(&mut self, index: usize) -> Option<LocalFile> {
        (index < self.new_files.len()).then(|| self.new_files.remove(index))
    }

    pub fn retained(&self) -> &[String] {
        &self.retained
    }

    pub fn new_files(&self) -> &[LocalFile] {
        &self.new_files
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Payload of one body part.
#[derive(Debug, Clone, PartialEq)]
pub enum PartContent {
    Text(String),
    /// Reference to an asset the server already stores.
    Existing(String),
    File(LocalFile),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyPart {
    pub name: String,
    pub content: PartContent,
}

/// Deterministic, inspectable multipart body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartBody {
    parts: Vec<BodyPart>,
}

impl MultipartBody {
    pub fn parts(&self) -> &[BodyPart] {
        &self.parts
    }

    /// All text values sent under `name`, in order.
    pub fn text_values(&self, name: &str) -> Vec<&str> {
        self.parts
            .iter()
            .filter(|p| p.name == name)
            .filter_map(|p| match &p.content {
                PartContent::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn existing_assets(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|p| match &p.content {
                PartContent::Existing(url) => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn files(&self) -> Vec<&LocalFile> {
        self.parts
            .iter()
            .filter_map(|p| match &p.content {
                PartContent::File(file) => Some(file),
                _ => None,
            })
            .collect()
    }

    /// Convert into a `reqwest` form, preserving part order.
    pub fn into_form(self) -> Result<reqwest::multipart::Form, ApiError> {
        let mut form = reqwest::multipart::Form::new();
        for part in self.parts {
            form = match part.content {
                PartContent::Text(value) | PartContent::Existing(value) => {
                    form.text(part.name, value)
                }
                PartContent::File(file) => {
                    let file_part = reqwest::multipart::Part::bytes(file.bytes.as_ref().clone())
                        .file_name(file.file_name.clone())
                        .mime_str(&file.content_type)
                        .map_err(|_| AssetError::InvalidContentType {
                            file_name: file.file_name.clone(),
                            content_type: file.content_type.clone(),
                        })?;
                    form.part(part.name, file_part)
                }
            };
        }
        Ok(form)
    }
}

/// Serialize an edit state: scalar fields, then retained assets, then new files.
pub fn build_multipart(state: &EditState, schema: &AssetSchema) -> MultipartBody {
    let mut parts = Vec::new();

    for (key, value) in state.fields.iter() {
        if value.is_omitted() {
            continue;
        }
        for wire in value.wire_values() {
            parts.push(BodyPart {
                name: key.to_string(),
                content: PartContent::Text(wire),
            });
        }
    }

    for url in state.retained() {
        parts.push(BodyPart {
            name: schema.retained_field.to_string(),
            content: PartContent::Existing(url.clone()),
        });
    }

    for file in state.new_files() {
        parts.push(BodyPart {
            name: schema.field.to_string(),
            content: PartContent::File(file.clone()),
        });
    }

    MultipartBody { parts }
}
