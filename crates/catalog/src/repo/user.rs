use super::{begin_write, bounds, total};
use crate::Database;
use crate::error::{ErrorKind, QueryResultExt, Result};
use crate::models::{Entity, NewUser, User};
use crate::pagination::{Page, PageRequest};
use exn::OptionExt;
use sqlx::SqlitePool;
use tracing::instrument;

/// Repository for users (borrowers).
///
/// Email addresses are unique, ignoring case. Deleting a user returns every
/// book they were borrowing to the shelf.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}
impl From<&Database> for UserRepository {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}
impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user and return it with its new id.
    ///
    /// Returns [`Violation::Unique`](crate::error::Violation::Unique) if the
    /// email address is already registered.
    #[instrument(skip_all, fields(email = %user.email))]
    pub async fn create(&self, user: &NewUser) -> Result<User> {
        let created: User = sqlx::query_as(include_str!("../../queries/insert_user.sql"))
            .bind(&user.name)
            .bind(&user.email)
            .fetch_one(&self.pool)
            .await
            .or_classify(Entity::User)?;
        tracing::debug!(id = created.id, "created user");
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        let user: Option<User> = sqlx::query_as(include_str!("../../queries/get_user.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_classify(Entity::User)?;
        user.ok_or_raise(|| ErrorKind::NotFound(Entity::User, id))
    }

    #[instrument(skip(self, user))]
    pub async fn update(&self, id: i64, user: &NewUser) -> Result<User> {
        let updated: Option<User> = sqlx::query_as(include_str!("../../queries/update_user.sql"))
            .bind(&user.name)
            .bind(&user.email)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_classify(Entity::User)?;
        updated.ok_or_raise(|| ErrorKind::NotFound(Entity::User, id))
    }

    /// Delete a user. Books they had borrowed become available again.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = begin_write(&self.pool, Entity::User).await?;
        let borrowed: i64 = sqlx::query_scalar(include_str!("../../queries/count_books_by_user.sql"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .or_classify(Entity::User)?;
        // `ON DELETE SET NULL` on books.user_id does the returning.
        let result = sqlx::query(include_str!("../../queries/delete_user.sql"))
            .bind(id)
            .execute(&mut *tx)
            .await
            .or_classify(Entity::User)?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound(Entity::User, id));
        }
        tx.commit().await.or_classify(Entity::User)?;
        if borrowed > 0 {
            tracing::info!(borrowed, "returned books borrowed by deleted user");
        }
        Ok(())
    }

    /// All users in id order.
    pub async fn list(&self) -> Result<Vec<User>> {
        sqlx::query_as(include_str!("../../queries/list_users.sql"))
            .fetch_all(&self.pool)
            .await
            .or_classify(Entity::User)
    }

    pub async fn list_page(&self, request: PageRequest) -> Result<Page<User>> {
        let (limit, offset) = bounds(request)?;
        let items: Vec<User> = sqlx::query_as(include_str!("../../queries/list_users_page.sql"))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .or_classify(Entity::User)?;
        Ok(Page::new(items, request, self.count().await?))
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../../queries/count_users.sql"))
            .fetch_one(&self.pool)
            .await
            .or_classify(Entity::User)?;
        total(count)
    }
}
