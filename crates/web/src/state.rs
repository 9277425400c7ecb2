use crate::views::Views;
use shelf_catalog::{BookRepository, CategoryRepository, Database, UserRepository};
use std::sync::Arc;

/// Everything a request handler needs, built once at startup and shared
/// across workers through [`web::Data`](actix_web::web::Data).
#[derive(Clone)]
pub struct AppState {
    db: Database,
    views: Arc<Views>,
    page_size: u32,
}
impl AppState {
    pub fn new(db: Database, views: Views, page_size: u32) -> Self {
        Self { db, views: Arc::new(views), page_size: page_size.max(1) }
    }

    pub fn books(&self) -> BookRepository {
        BookRepository::from(&self.db)
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::from(&self.db)
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::from(&self.db)
    }

    pub fn views(&self) -> &Views {
        &self.views
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}
