use super::{begin_write, bounds, total};
use crate::Database;
use crate::error::{ErrorKind, QueryResultExt, Result, Violation};
use crate::models::{Category, Entity, NewCategory};
use crate::pagination::{Page, PageRequest};
use exn::OptionExt;
use sqlx::SqlitePool;
use tracing::instrument;

/// Repository for categories.
///
/// Category names are unique. A category cannot be deleted while any book
/// still belongs to it.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}
impl From<&Database> for CategoryRepository {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}
impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a category and return it with its new id.
    ///
    /// Returns [`Violation::Unique`] if the name is already taken.
    #[instrument(skip_all, fields(name = %category.name))]
    pub async fn create(&self, category: &NewCategory) -> Result<Category> {
        let created: Category = sqlx::query_as(include_str!("../../queries/insert_category.sql"))
            .bind(&category.name)
            .bind(&category.description)
            .fetch_one(&self.pool)
            .await
            .or_classify(Entity::Category)?;
        tracing::debug!(id = created.id, "created category");
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> Result<Category> {
        let category: Option<Category> = sqlx::query_as(include_str!("../../queries/get_category.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_classify(Entity::Category)?;
        category.ok_or_raise(|| ErrorKind::NotFound(Entity::Category, id))
    }

    /// Replace every field of an existing category.
    #[instrument(skip(self, category))]
    pub async fn update(&self, id: i64, category: &NewCategory) -> Result<Category> {
        let updated: Option<Category> = sqlx::query_as(include_str!("../../queries/update_category.sql"))
            .bind(&category.name)
            .bind(&category.description)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_classify(Entity::Category)?;
        updated.ok_or_raise(|| ErrorKind::NotFound(Entity::Category, id))
    }

    /// Delete a category nothing refers to.
    ///
    /// Returns [`Violation::StillReferenced`] (and deletes nothing) while
    /// books still belong to the category.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = begin_write(&self.pool, Entity::Category).await?;
        let books: i64 = sqlx::query_scalar(include_str!("../../queries/count_books_by_category.sql"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .or_classify(Entity::Category)?;
        if books > 0 {
            tracing::warn!(books, "refusing to delete category still in use");
            exn::bail!(ErrorKind::Constraint(Violation::StillReferenced { entity: Entity::Category }));
        }
        let result = sqlx::query(include_str!("../../queries/delete_category.sql"))
            .bind(id)
            .execute(&mut *tx)
            .await
            .or_classify(Entity::Category)?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound(Entity::Category, id));
        }
        tx.commit().await.or_classify(Entity::Category)?;
        Ok(())
    }

    /// All categories in id order.
    pub async fn list(&self) -> Result<Vec<Category>> {
        sqlx::query_as(include_str!("../../queries/list_categories.sql"))
            .fetch_all(&self.pool)
            .await
            .or_classify(Entity::Category)
    }

    pub async fn list_page(&self, request: PageRequest) -> Result<Page<Category>> {
        let (limit, offset) = bounds(request)?;
        let items: Vec<Category> = sqlx::query_as(include_str!("../../queries/list_categories_page.sql"))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .or_classify(Entity::Category)?;
        Ok(Page::new(items, request, self.count().await?))
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../../queries/count_categories.sql"))
            .fetch_one(&self.pool)
            .await
            .or_classify(Entity::Category)?;
        total(count)
    }
}
