//! Field validation rules shared by the form drafts.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::errors::ValidationErrors;

/// Local mobile (09xxxxxxxx) or international (+9639xxxxxxxx) phone numbers.
static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+963|0)9\d{8}$").expect("phone pattern is a valid regex")
});

pub fn require_text(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, "is required");
    }
}

pub fn require_some<T>(errors: &mut ValidationErrors, field: &str, value: &Option<T>) {
    if value.is_none() {
        errors.push(field, "is required");
    }
}

pub fn is_valid_phone(value: &str) -> bool {
    PHONE_REGEX.is_match(value.trim())
}

/// Optional phone: only checked when present.
pub fn check_phone(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if let Some(phone) = value.filter(|p| !p.trim().is_empty()) {
        if !is_valid_phone(phone) {
            errors.push(field, "must be a valid phone number");
        }
    }
}

/// Both coordinates or neither, each within range.
pub fn check_coordinates(errors: &mut ValidationErrors, latitude: Option<f64>, longitude: Option<f64>) {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) {
                errors.push("latitude", "must be between -90 and 90");
            }
            if !(-180.0..=180.0).contains(&lng) {
                errors.push("longitude", "must be between -180 and 180");
            }
        }
        (Some(_), None) => errors.push("longitude", "is required when latitude is set"),
        (None, Some(_)) => errors.push("latitude", "is required when longitude is set"),
        (None, None) => {}
    }
}

pub fn check_date_range(errors: &mut ValidationErrors, start: Option<NaiveDate>, end: Option<NaiveDate>) {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            errors.push("endDate", "must not be before the start date");
        }
    }
}

pub fn check_non_negative(errors: &mut ValidationErrors, field: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        errors.push(field, "must be zero or greater");
    }
}
