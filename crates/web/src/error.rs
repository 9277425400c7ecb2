//! Web Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! [`HttpError`] is the boundary type: every handler failure, whether it came
//! from the catalog or from rendering a view, is turned into one before it
//! reaches actix-web.

use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError};
use derive_more::{Display, Error};
use shelf_catalog::error::{Error as CatalogError, ErrorKind as CatalogErrorKind};

/// A view error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for view operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An embedded template is missing from the binary.
    #[display("template not found: {_0}")]
    TemplateNotFound(#[error(not(source))] String),
    /// A template failed to compile or render.
    #[display("template error: {_0}")]
    Template(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// A failed request, ready to be sent back to the client.
#[derive(Debug, Display)]
#[display("{status}: {message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
}
impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<CatalogError> for HttpError {
    fn from(err: CatalogError) -> Self {
        let kind = &*err;
        match kind {
            CatalogErrorKind::NotFound(..) => Self::new(StatusCode::NOT_FOUND, kind.to_string()),
            CatalogErrorKind::Constraint(violation) => Self::new(StatusCode::CONFLICT, violation.to_string()),
            CatalogErrorKind::Unavailable => {
                tracing::error!(error = ?err, "catalog unavailable");
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "the catalog is temporarily unavailable")
            },
            _ => {
                tracing::error!(error = ?err, "catalog failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            },
        }
    }
}

impl From<Error> for HttpError {
    fn from(err: Error) -> Self {
        tracing::error!(error = ?err, "could not render view");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl ResponseError for HttpError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).content_type(ContentType::plaintext()).body(self.message.clone())
    }
}
