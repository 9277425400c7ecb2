use super::{html, redirect_home, rejected};
use crate::error::HttpError;
use crate::state::AppState;
use crate::views::{FieldKind, FormView};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use shelf_catalog::{CategoryInput, ValidationErrors};
use tracing::instrument;

const CREATE: &str = "/categoria/create";

fn form_page(
    state: &AppState,
    status: StatusCode,
    title: &str,
    action: &str,
    input: &CategoryInput,
    errors: &ValidationErrors,
) -> Result<HttpResponse, HttpError> {
    let form = FormView::new(title, action)
        .field("name", "Name", FieldKind::Text, &input.name, errors)
        .field("description", "Description", FieldKind::TextArea, &input.description, errors)
        .with_form_errors(errors);
    Ok(html(status, state.views().form(&form)?))
}

pub(crate) async fn new(state: web::Data<AppState>) -> Result<HttpResponse, HttpError> {
    form_page(&state, StatusCode::OK, "New category", CREATE, &CategoryInput::default(), &ValidationErrors::new())
}

#[instrument(skip_all)]
pub(crate) async fn create(
    state: web::Data<AppState>,
    form: web::Form<CategoryInput>,
) -> Result<HttpResponse, HttpError> {
    let input = form.into_inner();
    let errors = match input.validate() {
        Ok(category) => match state.categories().create(&category).await {
            Ok(created) => {
                tracing::info!(id = created.id, name = %created.name, "category created");
                return Ok(redirect_home());
            },
            Err(err) => rejected(err)?,
        },
        Err(errors) => errors,
    };
    form_page(&state, StatusCode::UNPROCESSABLE_ENTITY, "New category", CREATE, &input, &errors)
}

pub(crate) async fn edit(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, HttpError> {
    let id = path.into_inner();
    let category = state.categories().get(id).await?;
    let action = format!("/categoria/edit/{id}");
    form_page(&state, StatusCode::OK, "Edit category", &action, &CategoryInput::from(&category), &ValidationErrors::new())
}

#[instrument(skip(state, form))]
pub(crate) async fn update(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    form: web::Form<CategoryInput>,
) -> Result<HttpResponse, HttpError> {
    let id = path.into_inner();
    // Unknown ids are a 404 whatever was submitted.
    state.categories().get(id).await?;
    let input = form.into_inner();
    let errors = match input.validate() {
        Ok(category) => match state.categories().update(id, &category).await {
            Ok(_) => {
                tracing::info!("category updated");
                return Ok(redirect_home());
            },
            Err(err) => rejected(err)?,
        },
        Err(errors) => errors,
    };
    let action = format!("/categoria/edit/{id}");
    form_page(&state, StatusCode::UNPROCESSABLE_ENTITY, "Edit category", &action, &input, &errors)
}

/// Categories that still have books cannot be deleted.
#[instrument(skip(state))]
pub(crate) async fn delete(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, HttpError> {
    state.categories().delete(path.into_inner()).await?;
    tracing::info!("category deleted");
    Ok(redirect_home())
}
