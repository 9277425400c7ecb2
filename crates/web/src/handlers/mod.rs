pub(crate) mod books;
pub(crate) mod categories;
pub(crate) mod users;
#[cfg(test)]
pub(crate) mod testing;

use crate::error::HttpError;
use crate::state::AppState;
use crate::views::IndexView;
use actix_web::http::StatusCode;
use actix_web::http::header::{self, ContentType};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use shelf_catalog::error::{Error as CatalogError, ErrorKind as CatalogErrorKind};
use shelf_catalog::{PageRequest, ValidationErrors};
use tracing::instrument;

pub(crate) fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status).content_type(ContentType::html()).body(body)
}

/// Successful writes always land back on the catalog overview.
pub(crate) fn redirect_home() -> HttpResponse {
    HttpResponse::SeeOther().insert_header((header::LOCATION, "/")).finish()
}

/// Turn a rejected write into form errors when the user can fix it.
///
/// Constraint violations go back to the form; anything else fails the request.
pub(crate) fn rejected(err: CatalogError) -> Result<ValidationErrors, HttpError> {
    match &*err {
        CatalogErrorKind::Constraint(violation) => {
            tracing::debug!(%violation, "write rejected by the catalog");
            Ok(ValidationErrors::from(*violation))
        },
        _ => Err(HttpError::from(err)),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IndexQuery {
    page: Option<String>,
}
impl IndexQuery {
    /// Anything but a positive whole number means the first page.
    fn page(&self) -> u32 {
        self.page.as_deref().and_then(|page| page.trim().parse().ok()).filter(|page| *page > 0).unwrap_or(1)
    }
}

/// A query string that does not even parse, such as a repeated `page`, also
/// means the first page.
#[instrument(skip_all, fields(page = tracing::field::Empty))]
pub(crate) async fn index(
    state: web::Data<AppState>,
    query: Option<web::Query<IndexQuery>>,
) -> Result<HttpResponse, HttpError> {
    let page = query.map_or(1, |query| query.page());
    tracing::Span::current().record("page", page);
    let books = state.books().list_page(PageRequest::new(page, state.page_size())).await?;
    let categories = state.categories().list().await?;
    let users = state.users().list().await?;
    let body = state.views().index(&IndexView::new(books, &categories, &users))?;
    Ok(html(StatusCode::OK, body))
}

#[derive(Serialize)]
struct Status {
    status: &'static str,
}

/// Liveness probe.
pub(crate) async fn status() -> HttpResponse {
    HttpResponse::Ok().json(Status { status: "ok" })
}

#[cfg(test)]
mod tests {
    use super::testing::{self, app, body};
    use super::*;
    use actix_web::test;
    use rstest::rstest;

    #[rstest]
    #[case(None, 1)]
    #[case(Some("3"), 3)]
    #[case(Some(" 2 "), 2)]
    #[case(Some("0"), 1)]
    #[case(Some("-4"), 1)]
    #[case(Some("two"), 1)]
    #[case(Some(""), 1)]
    fn test_page_parameter(#[case] page: Option<&str>, #[case] expected: u32) {
        let query = IndexQuery { page: page.map(str::to_string) };
        assert_eq!(query.page(), expected);
    }

    #[actix_web::test]
    async fn test_status() {
        let state = testing::state().await;
        let app = app!(state);
        let resp = test::call_service(&app, test::TestRequest::get().uri("/status").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json, serde_json::json!({"status": "ok"}));
    }

    #[actix_web::test]
    async fn test_empty_catalog() {
        let state = testing::state().await;
        let app = app!(state);
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body(resp).await.contains("No books on this page."));
    }

    #[actix_web::test]
    async fn test_index_pages_through_books() {
        let state = testing::state().await;
        let category = testing::category(&state, "Fiction").await;
        for n in 1..=12 {
            testing::book(&state, &format!("Book {n:02}"), category.id).await;
        }
        let app = app!(state);

        let first = body(test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await).await;
        assert!(first.contains("Book 01") && first.contains("Book 05"));
        assert!(!first.contains("Book 06"));
        assert!(first.contains("page 1 of 3"));

        let third = body(test::call_service(&app, test::TestRequest::get().uri("/?page=3").to_request()).await).await;
        assert!(third.contains("Book 11") && third.contains("Book 12"));
        assert!(!third.contains("Book 10"));
        assert!(!third.contains("?page=4"));

        // Past the end is an empty page, not an error.
        let resp = test::call_service(&app, test::TestRequest::get().uri("/?page=40").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body(resp).await.contains("No books on this page."));

        let garbage = body(test::call_service(&app, test::TestRequest::get().uri("/?page=abc").to_request()).await).await;
        assert_eq!(garbage, first);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/?page=2&page=3").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(resp).await, first);
    }
}
