//! Shared helpers for the route tests.

use crate::state::AppState;
use crate::views::Views;
use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::test;
use shelf_catalog::{Book, Category, Database, NewBook, NewCategory, NewUser, User};
use time::{Date, Month};

/// Build the full application around `state` and start it as a test service.
macro_rules! app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new().app_data(actix_web::web::Data::new($state.clone())).configure(crate::configure),
        )
        .await
    };
}
pub(crate) use app;

pub(crate) async fn state() -> AppState {
    let db = Database::connect_in_memory().await.unwrap();
    AppState::new(db, Views::load().unwrap(), shelf_catalog::DEFAULT_PAGE_SIZE)
}

pub(crate) async fn body<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
}

pub(crate) fn location<B>(resp: &ServiceResponse<B>) -> Option<&str> {
    resp.headers().get(actix_web::http::header::LOCATION).and_then(|value| value.to_str().ok())
}

pub(crate) async fn category(state: &AppState, name: &str) -> Category {
    state
        .categories()
        .create(&NewCategory { name: name.to_string(), description: format!("All about {name}") })
        .await
        .unwrap()
}

pub(crate) async fn user(state: &AppState, name: &str) -> User {
    state
        .users()
        .create(&NewUser { name: name.to_string(), email: format!("{}@example.com", name.to_lowercase()) })
        .await
        .unwrap()
}

pub(crate) async fn book(state: &AppState, name: &str, category_id: i64) -> Book {
    state
        .books()
        .create(&NewBook {
            name: name.to_string(),
            author: "Herbert".to_string(),
            category_id,
            publication_date: Date::from_calendar_date(1965, Month::August, 1).unwrap(),
            user_id: None,
        })
        .await
        .unwrap()
}
