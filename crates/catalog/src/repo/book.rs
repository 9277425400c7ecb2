use super::{begin_write, bounds, total};
use crate::Database;
use crate::error::{ErrorKind, QueryResultExt, Result, Violation};
use crate::models::{Book, BookDetails, BookDetailsRow, BookRow, Entity, NewBook};
use crate::pagination::{Page, PageRequest};
use exn::OptionExt;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::instrument;

/// Repository for books.
///
/// Writes check, in the same transaction, that the category and the borrower
/// they name exist, so callers learn exactly which reference is wrong. The
/// foreign keys on the table stay in place behind that check.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}
impl From<&Database> for BookRepository {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}
impl BookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn ensure_references(conn: &mut SqliteConnection, book: &NewBook) -> Result<()> {
        let category: bool = sqlx::query_scalar(include_str!("../../queries/category_exists.sql"))
            .bind(book.category_id)
            .fetch_one(&mut *conn)
            .await
            .or_classify(Entity::Book)?;
        if !category {
            exn::bail!(ErrorKind::Constraint(Violation::MissingReference {
                field: "category_id",
                id: book.category_id
            }));
        }
        if let Some(user_id) = book.user_id {
            let user: bool = sqlx::query_scalar(include_str!("../../queries/user_exists.sql"))
                .bind(user_id)
                .fetch_one(&mut *conn)
                .await
                .or_classify(Entity::Book)?;
            if !user {
                exn::bail!(ErrorKind::Constraint(Violation::MissingReference { field: "user_id", id: user_id }));
            }
        }
        Ok(())
    }

    /// Insert a book and return it with its new id.
    ///
    /// Returns [`Violation::MissingReference`] if the category (or the
    /// borrower, when one is given) does not exist.
    #[instrument(skip_all, fields(name = %book.name, category_id = book.category_id))]
    pub async fn create(&self, book: &NewBook) -> Result<Book> {
        let mut tx = begin_write(&self.pool, Entity::Book).await?;
        Self::ensure_references(&mut tx, book).await?;
        let row: BookRow = sqlx::query_as(include_str!("../../queries/insert_book.sql"))
            .bind(&book.name)
            .bind(&book.author)
            .bind(book.category_id)
            .bind(book.publication_date_text()?)
            .bind(book.user_id)
            .fetch_one(&mut *tx)
            .await
            .or_classify(Entity::Book)?;
        tx.commit().await.or_classify(Entity::Book)?;
        let created = Book::try_from(row)?;
        tracing::debug!(id = created.id, "created book");
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> Result<Book> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../../queries/get_book.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_classify(Entity::Book)?;
        row.ok_or_raise(|| ErrorKind::NotFound(Entity::Book, id))?.try_into()
    }

    /// Get a book with its category name and borrower name.
    pub async fn get_details(&self, id: i64) -> Result<BookDetails> {
        let row: Option<BookDetailsRow> = sqlx::query_as(include_str!("../../queries/get_book_details.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_classify(Entity::Book)?;
        row.ok_or_raise(|| ErrorKind::NotFound(Entity::Book, id))?.try_into()
    }

    /// Replace every field of an existing book.
    ///
    /// Lending and returning are edits too: set or clear `user_id`.
    #[instrument(skip(self, book))]
    pub async fn update(&self, id: i64, book: &NewBook) -> Result<Book> {
        let mut tx = begin_write(&self.pool, Entity::Book).await?;
        Self::ensure_references(&mut tx, book).await?;
        let row: Option<BookRow> = sqlx::query_as(include_str!("../../queries/update_book.sql"))
            .bind(&book.name)
            .bind(&book.author)
            .bind(book.category_id)
            .bind(book.publication_date_text()?)
            .bind(book.user_id)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .or_classify(Entity::Book)?;
        let row = row.ok_or_raise(|| ErrorKind::NotFound(Entity::Book, id))?;
        tx.commit().await.or_classify(Entity::Book)?;
        row.try_into()
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query(include_str!("../../queries/delete_book.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_classify(Entity::Book)?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound(Entity::Book, id));
        }
        Ok(())
    }

    /// All books in id order.
    pub async fn list(&self) -> Result<Vec<Book>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../../queries/list_books.sql"))
            .fetch_all(&self.pool)
            .await
            .or_classify(Entity::Book)?;
        rows.into_iter().map(Book::try_from).collect()
    }

    /// One page of books, in id order, with category and borrower names.
    ///
    /// A page past the end is empty but still reports the full total.
    pub async fn list_page(&self, request: PageRequest) -> Result<Page<BookDetails>> {
        let (limit, offset) = bounds(request)?;
        let rows: Vec<BookDetailsRow> = sqlx::query_as(include_str!("../../queries/list_books_page.sql"))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .or_classify(Entity::Book)?;
        let items = rows.into_iter().map(BookDetails::try_from).collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, request, self.count().await?))
    }

    /// Books filed under a category.
    pub async fn list_by_category(&self, category_id: i64) -> Result<Vec<Book>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../../queries/list_books_by_category.sql"))
            .bind(category_id)
            .fetch_all(&self.pool)
            .await
            .or_classify(Entity::Book)?;
        rows.into_iter().map(Book::try_from).collect()
    }

    /// Books a user currently has borrowed.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Book>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../../queries/list_books_by_user.sql"))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .or_classify(Entity::Book)?;
        rows.into_iter().map(Book::try_from).collect()
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../../queries/count_books.sql"))
            .fetch_one(&self.pool)
            .await
            .or_classify(Entity::Book)?;
        total(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::paginate;
    use crate::repo::fixtures;
    use time::{Date, Month};

    #[tokio::test]
    async fn test_create_then_listed() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = BookRepository::from(&db);
        let fiction = fixtures::category(&db, "Fiction").await;
        let created = repo.create(&fixtures::new_book("Dune", fiction.id, None)).await.unwrap();
        assert_eq!(created.publication_date, Date::from_calendar_date(1965, Month::August, 1).unwrap());

        let page = repo.list_page(PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
        let entry = &page.items[0];
        assert_eq!(entry.book, created);
        assert_eq!(entry.category, "Fiction");
        assert_eq!(entry.borrower, None);
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = BookRepository::from(&db);
        let err = repo.create(&fixtures::new_book("Dune", 42, None)).await.unwrap_err();
        assert_eq!(
            *err,
            ErrorKind::Constraint(Violation::MissingReference { field: "category_id", id: 42 })
        );
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_borrower_is_rejected() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = BookRepository::from(&db);
        let fiction = fixtures::category(&db, "Fiction").await;
        let err = repo.create(&fixtures::new_book("Dune", fiction.id, Some(7))).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Constraint(Violation::MissingReference { field: "user_id", id: 7 }));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_foreign_key_backstop() {
        // Bypassing the repository still cannot create a dangling book.
        let db = Database::connect_in_memory().await.unwrap();
        let err = sqlx::query(include_str!("../../queries/insert_book.sql"))
            .bind("Dune")
            .bind("Herbert")
            .bind(42i64)
            .bind("1965-08-01")
            .bind(None::<i64>)
            .execute(db.pool())
            .await
            .or_classify(Entity::Book)
            .unwrap_err();
        assert_eq!(*err, ErrorKind::Constraint(Violation::ForeignKey { entity: Entity::Book }));
    }

    #[tokio::test]
    async fn test_concurrent_writes_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(dir.path().join("catalog.db")).await.unwrap();
        let fiction = fixtures::category(&db, "Fiction").await;
        let ada = fixtures::user(&db, "Ada").await;
        let shelved = fixtures::book(&db, "Dune", fiction.id, None).await;
        let (category_id, user_id, book_id) = (fiction.id, ada.id, shelved.id);

        let mut tasks = tokio::task::JoinSet::new();
        for n in 0..20 {
            let repo = BookRepository::from(&db);
            tasks.spawn(async move {
                if n % 4 == 0 {
                    let borrower = (n % 8 == 0).then_some(user_id);
                    repo.update(book_id, &fixtures::new_book("Dune", category_id, borrower)).await.map(drop)
                } else {
                    repo.create(&fixtures::new_book(&format!("Book {n}"), category_id, None)).await.map(drop)
                }
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
        }
        assert_eq!(BookRepository::from(&db).count().await.unwrap(), 16);
        db.close().await;
    }

    #[tokio::test]
    async fn test_lend_and_return() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = BookRepository::from(&db);
        let fiction = fixtures::category(&db, "Fiction").await;
        let ada = fixtures::user(&db, "Ada").await;
        let book = fixtures::book(&db, "Dune", fiction.id, None).await;

        let lent = repo.update(book.id, &fixtures::new_book("Dune", fiction.id, Some(ada.id))).await.unwrap();
        assert!(lent.is_borrowed());
        assert_eq!(repo.get_details(book.id).await.unwrap().borrower.as_deref(), Some("Ada"));
        assert_eq!(repo.list_by_user(ada.id).await.unwrap(), vec![lent]);

        let returned = repo.update(book.id, &fixtures::new_book("Dune", fiction.id, None)).await.unwrap();
        assert!(!returned.is_borrowed());
        assert!(repo.list_by_user(ada.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_book_writes_nothing() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = BookRepository::from(&db);
        let fiction = fixtures::category(&db, "Fiction").await;
        let err = repo.update(3, &fixtures::new_book("Dune", fiction.id, None)).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound(Entity::Book, 3));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_to_unknown_category_keeps_book() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = BookRepository::from(&db);
        let fiction = fixtures::category(&db, "Fiction").await;
        let book = fixtures::book(&db, "Dune", fiction.id, None).await;
        let err = repo.update(book.id, &fixtures::new_book("Dune", 99, None)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Constraint(Violation::MissingReference { .. })));
        assert_eq!(repo.get(book.id).await.unwrap().category_id, fiction.id);
    }

    #[tokio::test]
    async fn test_delete_is_permanent() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = BookRepository::from(&db);
        let fiction = fixtures::category(&db, "Fiction").await;
        let book = fixtures::book(&db, "Dune", fiction.id, None).await;
        repo.delete(book.id).await.unwrap();
        assert_eq!(*repo.get(book.id).await.unwrap_err(), ErrorKind::NotFound(Entity::Book, book.id));
        assert_eq!(*repo.delete(book.id).await.unwrap_err(), ErrorKind::NotFound(Entity::Book, book.id));
    }

    #[tokio::test]
    async fn test_list_by_category() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = BookRepository::from(&db);
        let fiction = fixtures::category(&db, "Fiction").await;
        let poetry = fixtures::category(&db, "Poetry").await;
        fixtures::book(&db, "Dune", fiction.id, None).await;
        fixtures::book(&db, "Odes", poetry.id, None).await;
        fixtures::book(&db, "Emma", fiction.id, None).await;
        let names = repo
            .list_by_category(fiction.id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect::<Vec<_>>();
        assert_eq!(names, ["Dune", "Emma"]);
    }

    #[tokio::test]
    async fn test_pages_match_in_memory_pagination() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = BookRepository::from(&db);
        let fiction = fixtures::category(&db, "Fiction").await;
        for n in 1..=12 {
            fixtures::book(&db, &format!("Book {n}"), fiction.id, None).await;
        }
        let all = repo.list().await.unwrap();
        for (page, expected) in [(1, 5), (2, 5), (3, 2), (4, 0)] {
            let stored = repo.list_page(PageRequest::new(page, 5)).await.unwrap();
            let in_memory = paginate(all.clone(), page, 5);
            assert_eq!(stored.items.len(), expected, "page {page}");
            assert_eq!(stored.total, 12);
            assert_eq!(stored.map(|d| d.book), in_memory);
        }
    }
}
