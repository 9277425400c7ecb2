use super::{html, redirect_home, rejected};
use crate::error::HttpError;
use crate::state::AppState;
use crate::views::{FieldKind, FormView};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use shelf_catalog::{UserInput, ValidationErrors};
use tracing::instrument;

const CREATE: &str = "/usuario/create";

fn form_page(
    state: &AppState,
    status: StatusCode,
    title: &str,
    action: &str,
    input: &UserInput,
    errors: &ValidationErrors,
) -> Result<HttpResponse, HttpError> {
    let form = FormView::new(title, action)
        .field("name", "Name", FieldKind::Text, &input.name, errors)
        .field("email", "Email", FieldKind::Email, &input.email, errors)
        .with_form_errors(errors);
    Ok(html(status, state.views().form(&form)?))
}

pub(crate) async fn new(state: web::Data<AppState>) -> Result<HttpResponse, HttpError> {
    form_page(&state, StatusCode::OK, "New user", CREATE, &UserInput::default(), &ValidationErrors::new())
}

#[instrument(skip_all)]
pub(crate) async fn create(state: web::Data<AppState>, form: web::Form<UserInput>) -> Result<HttpResponse, HttpError> {
    let input = form.into_inner();
    let errors = match input.validate() {
        Ok(user) => match state.users().create(&user).await {
            Ok(created) => {
                tracing::info!(id = created.id, "user created");
                return Ok(redirect_home());
            },
            Err(err) => rejected(err)?,
        },
        Err(errors) => errors,
    };
    form_page(&state, StatusCode::UNPROCESSABLE_ENTITY, "New user", CREATE, &input, &errors)
}

pub(crate) async fn edit(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, HttpError> {
    let id = path.into_inner();
    let user = state.users().get(id).await?;
    let action = format!("/usuario/edit/{id}");
    form_page(&state, StatusCode::OK, "Edit user", &action, &UserInput::from(&user), &ValidationErrors::new())
}

#[instrument(skip(state, form))]
pub(crate) async fn update(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    form: web::Form<UserInput>,
) -> Result<HttpResponse, HttpError> {
    let id = path.into_inner();
    state.users().get(id).await?;
    let input = form.into_inner();
    let errors = match input.validate() {
        Ok(user) => match state.users().update(id, &user).await {
            Ok(_) => {
                tracing::info!("user updated");
                return Ok(redirect_home());
            },
            Err(err) => rejected(err)?,
        },
        Err(errors) => errors,
    };
    let action = format!("/usuario/edit/{id}");
    form_page(&state, StatusCode::UNPROCESSABLE_ENTITY, "Edit user", &action, &input, &errors)
}

/// Books the user was borrowing go back on the shelf.
#[instrument(skip(state))]
pub(crate) async fn delete(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, HttpError> {
    state.users().delete(path.into_inner()).await?;
    tracing::info!("user deleted");
    Ok(redirect_home())
}

#[cfg(test)]
mod tests {
    use super::super::testing::{self, app, body, location};
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_web::test]
    async fn test_create_user() {
        let state = testing::state().await;
        let app = app!(state);
        let req = test::TestRequest::post()
            .uri("/usuario/create")
            .set_form([("name", "Ada"), ("email", "ada@example.com")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), Some("/"));

        let html = body(test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await).await;
        assert!(html.contains("ada@example.com"));
    }

    #[actix_web::test]
    async fn test_invalid_user() {
        let state = testing::state().await;
        let app = app!(state);
        let cases = [
            ("", "ada@example.com", "Name is required"),
            ("Ada", "", "Email is required"),
            ("Ada", "not-an-email", "Email is not a valid email address"),
        ];
        for (name, email, message) in cases {
            let req =
                test::TestRequest::post().uri("/usuario/create").set_form([("name", name), ("email", email)]).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
            assert!(body(resp).await.contains(message), "{message}");
        }
        assert_eq!(state.users().count().await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn test_duplicate_email() {
        let state = testing::state().await;
        let ada = testing::user(&state, "Ada").await;
        let grace = testing::user(&state, "Grace").await;
        let app = app!(state);
        let req = test::TestRequest::post()
            .uri(&format!("/usuario/edit/{}", grace.id))
            .set_form([("name", "Grace"), ("email", ada.email.as_str())])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body(resp).await.contains("Email is already in use"));
        assert_eq!(state.users().get(grace.id).await.unwrap().email, "grace@example.com");
    }

    #[actix_web::test]
    async fn test_edit_missing_user() {
        let state = testing::state().await;
        let app = app!(state);
        let resp = test::call_service(&app, test::TestRequest::get().uri("/usuario/edit/3").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_delete_user_returns_books() {
        let state = testing::state().await;
        let category = testing::category(&state, "Fiction").await;
        let ada = testing::user(&state, "Ada").await;
        let book = testing::book(&state, "Dune", category.id).await;
        let mut lent = shelf_catalog::BookInput::from(&book);
        lent.user_id = ada.id.to_string();
        state.books().update(book.id, &lent.validate().unwrap()).await.unwrap();
        let app = app!(state);

        let uri = format!("/usuario/delete/{}", ada.id);
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(state.books().get(book.id).await.unwrap().user_id, None);

        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
