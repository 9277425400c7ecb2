//! Field-level input checks shared by the entity inputs.
//!
//! Each check takes the raw form value and either returns the cleaned value
//! or records a [`FieldError`]. Inputs run every check so that a form shows
//! all of its problems at once.

use crate::error::Violation;
use derive_more::Error;
use regex::Regex;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::LazyLock;
use time::Date;
use time::macros::format_description;

/// Longest accepted name, author or category name (in characters).
pub const MAX_NAME_LEN: usize = 100;
/// Longest accepted email address (in characters).
pub const MAX_EMAIL_LEN: usize = 120;
/// Pseudo-field for problems that concern the form as a whole.
pub const FORM: &str = "form";

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$").unwrap()
});

/// One rejected form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}
impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Every rejected field of one submitted form, in field order.
#[derive(Debug, Error, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    #[error(not(source))]
    errors: Vec<FieldError>,
}
impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "invalid input ({})", self.fields().collect::<Vec<_>>().join(", "))
    }
}
impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, reason: impl Into<String>) {
        self.errors.push(FieldError { field, reason: reason.into() });
    }

    /// The first reason recorded against `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.iter().find(|e| e.field == field).map(|e| e.reason.as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.errors.iter().map(|e| e.field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Finish a validation pass: `Ok(value)` when nothing was recorded.
    pub(crate) fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        match self.errors.is_empty() {
            true => Ok(value()),
            false => Err(self),
        }
    }
}
impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        Self { errors: vec![error] }
    }
}

/// Store-level rejections are shown to the user exactly like input mistakes.
impl From<Violation> for ValidationErrors {
    fn from(violation: Violation) -> Self {
        let mut errors = Self::new();
        match violation {
            Violation::Unique { field, .. } => errors.push(field, "is already in use"),
            Violation::MissingReference { field, .. } => errors.push(field, "does not exist"),
            Violation::StillReferenced { entity } => {
                errors.push(FORM, format!("this {entity} is still used by books"))
            },
            Violation::ForeignKey { .. } => errors.push(FORM, "refers to a record that does not exist"),
        }
        errors
    }
}

/// A required, non-blank text value no longer than `max` characters.
pub(crate) fn text(errors: &mut ValidationErrors, field: &'static str, value: &str, max: usize) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(field, "is required");
    } else if value.chars().count() > max {
        errors.push(field, format!("must be at most {max} characters"));
    }
    value.to_string()
}

/// A required email address.
pub(crate) fn email(errors: &mut ValidationErrors, field: &'static str, value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(field, "is required");
    } else if value.chars().count() > MAX_EMAIL_LEN {
        errors.push(field, format!("must be at most {MAX_EMAIL_LEN} characters"));
    } else if !EMAIL.is_match(value) {
        errors.push(field, "is not a valid email address");
    }
    value.to_string()
}

/// A required positive record identifier.
pub(crate) fn id(errors: &mut ValidationErrors, field: &'static str, value: &str) -> i64 {
    let value = value.trim();
    if value.is_empty() {
        errors.push(field, "is required");
        return 0;
    }
    optional_id(errors, field, value).unwrap_or_default()
}

/// An optional positive record identifier; blank means "none".
pub(crate) fn optional_id(errors: &mut ValidationErrors, field: &'static str, value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse::<i64>() {
        Ok(id) if id > 0 => Some(id),
        _ => {
            errors.push(field, "must be a positive whole number");
            None
        },
    }
}

/// A required calendar date in `YYYY-MM-DD` form.
pub(crate) fn date(errors: &mut ValidationErrors, field: &'static str, value: &str) -> Option<Date> {
    let value = value.trim();
    if value.is_empty() {
        errors.push(field, "is required");
        return None;
    }
    match parse_date(value) {
        Some(date) => Some(date),
        None => {
            errors.push(field, "must be a date (YYYY-MM-DD)");
            None
        },
    }
}

pub(crate) fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).ok()
}

pub(crate) fn format_date(date: Date) -> Result<String, time::error::Format> {
    date.format(format_description!("[year]-[month]-[day]"))
}
