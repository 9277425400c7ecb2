use super::{html, redirect_home, rejected};
use crate::error::HttpError;
use crate::state::AppState;
use crate::views::{FieldKind, FormView};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use shelf_catalog::{BookInput, ValidationErrors};
use tracing::instrument;

const CREATE: &str = "/libro/create";

/// Render the book form. Category and borrower choices come from the store,
/// so this is the one form page that needs the database.
async fn form_page(
    state: &AppState,
    status: StatusCode,
    title: &str,
    action: &str,
    input: &BookInput,
    errors: &ValidationErrors,
) -> Result<HttpResponse, HttpError> {
    let categories = state.categories().list().await?;
    let users = state.users().list().await?;
    let form = FormView::new(title, action)
        .field("name", "Name", FieldKind::Text, &input.name, errors)
        .field("author", "Author", FieldKind::Text, &input.author, errors)
        .select(
            "category_id",
            "Category",
            &input.category_id,
            errors,
            Some("(choose a category)"),
            categories.into_iter().map(|category| (category.id, category.name)),
        )
        .field("publication_date", "Publication date", FieldKind::Date, &input.publication_date, errors)
        .select(
            "user_id",
            "Borrowed by",
            &input.user_id,
            errors,
            Some("(on the shelf)"),
            users.into_iter().map(|user| (user.id, user.name)),
        )
        .with_form_errors(errors);
    Ok(html(status, state.views().form(&form)?))
}

pub(crate) async fn new(state: web::Data<AppState>) -> Result<HttpResponse, HttpError> {
    form_page(&state, StatusCode::OK, "New book", CREATE, &BookInput::default(), &ValidationErrors::new()).await
}

#[instrument(skip_all)]
pub(crate) async fn create(state: web::Data<AppState>, form: web::Form<BookInput>) -> Result<HttpResponse, HttpError> {
    let input = form.into_inner();
    let errors = match input.validate() {
        Ok(book) => match state.books().create(&book).await {
            Ok(created) => {
                tracing::info!(id = created.id, name = %created.name, "book created");
                return Ok(redirect_home());
            },
            Err(err) => rejected(err)?,
        },
        Err(errors) => errors,
    };
    form_page(&state, StatusCode::UNPROCESSABLE_ENTITY, "New book", CREATE, &input, &errors).await
}

pub(crate) async fn edit(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, HttpError> {
    let id = path.into_inner();
    let book = state.books().get(id).await?;
    let action = format!("/libro/edit/{id}");
    form_page(&state, StatusCode::OK, "Edit book", &action, &BookInput::from(&book), &ValidationErrors::new()).await
}

/// Lending and returning are edits: set or clear the borrower.
#[instrument(skip(state, form))]
pub(crate) async fn update(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    form: web::Form<BookInput>,
) -> Result<HttpResponse, HttpError> {
    let id = path.into_inner();
    state.books().get(id).await?;
    let input = form.into_inner();
    let errors = match input.validate() {
        Ok(book) => match state.books().update(id, &book).await {
            Ok(updated) => {
                tracing::info!(borrowed = updated.is_borrowed(), "book updated");
                return Ok(redirect_home());
            },
            Err(err) => rejected(err)?,
        },
        Err(errors) => errors,
    };
    let action = format!("/libro/edit/{id}");
    form_page(&state, StatusCode::UNPROCESSABLE_ENTITY, "Edit book", &action, &input, &errors).await
}

#[instrument(skip(state))]
pub(crate) async fn delete(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, HttpError> {
    state.books().delete(path.into_inner()).await?;
    tracing::info!("book deleted");
    Ok(redirect_home())
}
