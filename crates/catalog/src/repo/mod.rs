//! Repositories for the three catalog entities.
//!
//! Each repository wraps a clone of the connection pool and is cheap to build
//! from a [`Database`](crate::Database). Reads go straight to the pool; writes
//! that need more than one statement run in a transaction that is committed
//! once, at the end. Those transactions take the write lock when they begin,
//! so waiting on a concurrent writer falls under the busy timeout.
//!
//! # Relationships
//!
//! - Every book references exactly one category (`books.category_id`).
//! - A book may reference the user currently borrowing it (`books.user_id`).
//! - Deleting a category that books still use is refused.
//! - Deleting a user returns every book they were borrowing.

mod book;
mod category;
mod user;

pub use self::book::BookRepository;
pub use self::category::CategoryRepository;
pub use self::user::UserRepository;

use crate::error::{ErrorKind, QueryResultExt, Result};
use crate::models::Entity;
use crate::pagination::PageRequest;
use exn::ResultExt;
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Begin a transaction that reads before it writes.
///
/// A deferred `BEGIN` would have to upgrade its read lock on the first write,
/// which SQLite refuses outright when another connection has written since.
async fn begin_write(pool: &SqlitePool, entity: Entity) -> Result<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE").await.or_classify(entity)
}

/// `LIMIT` and `OFFSET` values for a page request.
fn bounds(request: PageRequest) -> Result<(i64, i64)> {
    let limit = i64::try_from(request.limit()).or_raise(|| ErrorKind::InvalidData("limit"))?;
    let offset = i64::try_from(request.offset()).or_raise(|| ErrorKind::InvalidData("offset"))?;
    Ok((limit, offset))
}

fn total(count: i64) -> Result<u64> {
    u64::try_from(count).or_raise(|| ErrorKind::InvalidData("count"))
}
