//! The catalog's SQLite pool.
//!
//! Every constructor applies the same connection settings and brings the
//! schema up to date before handing the pool out.

use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Schema migrations, compiled into the binary.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
/// Path that selects an in-memory database instead of a file.
pub const IN_MEMORY: &str = ":memory:";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Database connection pool for the catalog.
///
/// This is the main entry point for interacting with the catalog database.
/// It manages the SQLite connection pool; repositories are built from it.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn new(options: SqliteConnectOptions, max: u32) -> Result<Self> {
        Self::with_pool_options(SqlitePoolOptions::new().max_connections(max), options).await
    }

    async fn with_pool_options(pool_options: SqlitePoolOptions, options: SqliteConnectOptions) -> Result<Self> {
        let pool = pool_options
            // Query-based PRAGMAs must be applied to EVERY connection the
            // pool opens, not only the first one.
            .after_connect(|conn, meta| Box::pin(async move {
                Self::apply_pragmas(conn, meta).await
            }))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Unavailable)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Connect to the catalog database at the given path.
    ///
    /// Creates the database file if it doesn't exist and runs migrations.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        Self::connect_with(path, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Connect with an explicit pool size.
    ///
    /// A path of [`IN_MEMORY`] opens an in-memory database, in which case the
    /// pool size is ignored.
    pub async fn connect_with(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let path = path.as_ref();
        if path == Path::new(IN_MEMORY) {
            return Self::connect_in_memory().await;
        }
        tracing::info!(path = %path.display(), max_connections, "opening catalog database");
        let options = Self::base_options()
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .filename(path)
            .create_if_missing(true);
        Self::new(options, max_connections.max(1)).await
    }

    /// A fresh, empty catalog that lives only as long as the pool.
    ///
    /// Public rather than test-only: the web crate builds its test
    /// applications on it.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = Self::base_options().filename(IN_MEMORY);
        // Parallel connections to ":memory:" would each see their own empty
        // database, so the pool is limited to one connection. That connection
        // must also never be recycled, or the data goes with it.
        let pool_options = SqlitePoolOptions::new().max_connections(1).idle_timeout(None).max_lifetime(None);
        Self::with_pool_options(pool_options, options).await
    }

    /// Settings every connection gets, file-backed or not.
    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            // Books must reference an existing category.
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            // Writers queue behind each other rather than failing straight
            // away with SQLITE_BUSY.
            .busy_timeout(std::time::Duration::from_millis(1500))
    }

    /// Per-connection PRAGMAs with no `SqliteConnectOptions` setter.
    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        // 4 MiB page cache; sorts and temporary indexes stay off disk.
        sqlx::query("PRAGMA cache_size = -4096; PRAGMA temp_store = MEMORY;").execute(conn).await.map(drop)
    }

    /// Apply pending migrations. Already-applied ones are skipped.
    #[instrument("migrating catalog schema", skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    /// The pool the repositories run their queries on.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Refresh planner statistics, then wait for checked-out connections and
    /// close the pool. Queries made afterwards fail with
    /// [`ErrorKind::Unavailable`].
    pub async fn close(&self) {
        if let Err(err) = sqlx::query("PRAGMA optimize").execute(&self.pool).await {
            tracing::debug!(%err, "skipped PRAGMA optimize");
        }
        self.pool.close().await;
    }
}
