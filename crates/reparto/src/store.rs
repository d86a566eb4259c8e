// File: src/store.rs
// Purpose: Connection lifecycle for the on-disk SQLite store
//
// One connection and one transaction per logical operation. No pooling.

use serde::{Deserialize, Serialize};
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqliteRow,
};
use sqlx::{Column, Connection, Row as _, TypeInfo, ValueRef};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::value::{Row, Value};

/// Boxed future borrowed from a handle for the duration of a scoped operation
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handle does with its transaction when the unit of work failed
///
/// Successful work is always committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Commit even after a failure (statements that succeeded stay applied)
    Always,
    /// Roll the whole unit of work back after a failure
    #[default]
    RollbackOnError,
}

// ============================================================================
// PURE FUNCTIONS
// ============================================================================

/// Builds the database file name from a configured base name (pure function)
///
/// Dots and path separators are removed before `.db` is appended, so the file
/// always lands directly inside the output directory.
///
/// # Examples
/// ```
/// use reparto::store::db_file_name;
///
/// assert_eq!(db_file_name("database.db"), "databasedb.db");
/// assert_eq!(db_file_name("hospitals"), "hospitals.db");
/// assert_eq!(db_file_name("../etc/x"), "etcx.db");
/// ```
pub fn db_file_name(name: &str) -> String {
    let stem: String = name
        .chars()
        .filter(|c| !matches!(c, '.' | '/' | '\\'))
        .collect();
    format!("{}.db", stem)
}

fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in params {
        query = match value {
            Value::Null => query.bind(None::<i64>),
            Value::Integer(n) => query.bind(*n),
            Value::Real(n) => query.bind(*n),
            Value::Text(s) => query.bind(s.as_str()),
            Value::Blob(bytes) => query.bind(bytes.as_slice()),
        };
    }
    query
}

/// Reads one column using the storage class SQLite reports for the value
fn decode_value(row: &SqliteRow, index: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage_class = raw.type_info().name().to_string();

    match storage_class.as_str() {
        "INTEGER" => row.try_get::<i64, _>(index).map(Value::Integer),
        "REAL" => row.try_get::<f64, _>(index).map(Value::Real),
        "BLOB" => row.try_get::<Vec<u8>, _>(index).map(Value::Blob),
        _ => row.try_get::<String, _>(index).map(Value::Text),
    }
}

fn decode_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let columns = row
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();
    let values = (0..row.len())
        .map(|index| decode_value(row, index))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Row::new(columns, values))
}

/// Like `try_exists`, but an I/O failure is an error rather than "absent"
async fn file_exists(path: &Path) -> Result<bool, StoreError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|source| StoreError::Inspect {
            path: path.to_path_buf(),
            source,
        })
}

async fn remove_if_exists(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "failed to remove file");
        }
    }
}

// ============================================================================
// HANDLE
// ============================================================================

/// One exclusively-owned unit of work: a fresh connection with an open
/// transaction
///
/// Finish it with [`Handle::commit`], [`Handle::rollback`] or
/// [`Handle::finish`]. A handle dropped unfinished closes its connection and
/// SQLite discards the open transaction.
pub struct Handle {
    conn: SqliteConnection,
    path: PathBuf,
    policy: CommitPolicy,
    finished: bool,
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .field("finished", &self.finished)
            .finish()
    }
}

impl Handle {
    /// Runs a statement and returns the number of affected rows
    pub async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, StoreError> {
        debug!(sql, params = params.len(), "execute");
        let result = bind_params(sqlx::query(sql), params)
            .execute(&mut self.conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Runs a query and returns every row
    pub async fn fetch_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, StoreError> {
        debug!(sql, params = params.len(), "fetch_all");
        let rows = bind_params(sqlx::query(sql), params)
            .fetch_all(&mut self.conn)
            .await?;
        let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Commits the unit of work
    pub async fn commit(mut self) -> Result<(), StoreError> {
        self.end("COMMIT").await
    }

    /// Discards the unit of work
    pub async fn rollback(mut self) -> Result<(), StoreError> {
        self.end("ROLLBACK").await
    }

    /// Commits or rolls back depending on `result` and the commit policy,
    /// then hands `result` back
    ///
    /// A failed commit after successful work turns the result into an error.
    /// A failure while finishing already-failed work is only logged; the
    /// original error wins.
    pub async fn finish<T, E>(mut self, result: Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        match result {
            Ok(value) => {
                self.end("COMMIT").await?;
                Ok(value)
            }
            Err(err) => {
                let statement = match self.policy {
                    CommitPolicy::Always => "COMMIT",
                    CommitPolicy::RollbackOnError => "ROLLBACK",
                };
                if let Err(finish_err) = self.end(statement).await {
                    warn!(
                        path = %self.path.display(),
                        statement,
                        error = %finish_err,
                        "failed to finish unit of work after an error"
                    );
                }
                Err(err)
            }
        }
    }

    /// Commit policy applied by [`Handle::finish`]
    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    /// Database file this handle is connected to
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn end(&mut self, statement: &'static str) -> Result<(), StoreError> {
        self.finished = true;
        debug!(path = %self.path.display(), statement, "finishing unit of work");
        sqlx::query(statement).execute(&mut self.conn).await?;
        Ok(())
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                path = %self.path.display(),
                "database handle dropped without commit or rollback; pending work discarded"
            );
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

/// Owns the database file location and schema bootstrap
///
/// Shared across requests behind an `Arc`; every acquisition opens its own
/// connection.
#[derive(Debug)]
pub struct Store {
    output_dir: PathBuf,
    file_name: String,
    schema: Vec<String>,
    policy: CommitPolicy,
    bootstrap_lock: Mutex<()>,
}

impl Store {
    /// Store at `<output_dir>/<name>.db` with no schema and the default policy
    pub fn new(output_dir: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_name: db_file_name(name),
            schema: Vec::new(),
            policy: CommitPolicy::default(),
            bootstrap_lock: Mutex::new(()),
        }
    }

    /// Store described by the `[database]` config section
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(&config.output_dir, &config.name)
            .with_schema(config.schema.clone())
            .with_commit_policy(config.commit_policy)
    }

    /// Sets the statements run when the file is first created
    pub fn with_schema(mut self, schema: Vec<String>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_commit_policy(mut self, policy: CommitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Full path of the database file
    pub fn path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }

    pub fn commit_policy(&self) -> CommitPolicy {
        self.policy
    }

    /// Opens a fresh handle, bootstrapping the database first if its file
    /// does not exist yet
    ///
    /// No handle is returned when the bootstrap fails.
    pub async fn acquire(&self) -> Result<Handle, StoreError> {
        self.ensure_bootstrapped().await?;

        let path = self.path();
        let options = SqliteConnectOptions::new().filename(&path);
        let mut conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(|source| StoreError::Connect {
                path: path.clone(),
                source,
            })?;

        sqlx::query("BEGIN").execute(&mut conn).await?;
        debug!(path = %path.display(), "acquired database handle");

        Ok(Handle {
            conn,
            path,
            policy: self.policy,
            finished: false,
        })
    }

    /// Acquires a handle, runs `op` on it and finishes the handle on every
    /// exit path
    ///
    /// # Examples
    /// ```no_run
    /// use reparto::store::Store;
    /// use reparto::StoreError;
    ///
    /// # async fn demo() -> Result<(), StoreError> {
    /// let store = Store::new("/tmp/reparto", "demo")
    ///     .with_schema(vec!["CREATE TABLE t (id INTEGER)".to_string()]);
    ///
    /// let inserted = store
    ///     .scoped(|handle| Box::pin(async move {
    ///         handle.execute("INSERT INTO t (id) VALUES (?)", &[1_i64.into()]).await
    ///     }))
    ///     .await?;
    /// assert_eq!(inserted, 1);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scoped<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: for<'h> FnOnce(&'h mut Handle) -> BoxFuture<'h, Result<T, E>>,
        E: From<StoreError>,
    {
        let mut handle = self.acquire().await?;
        let result = op(&mut handle).await;
        handle.finish(result).await
    }

    async fn ensure_bootstrapped(&self) -> Result<(), StoreError> {
        let path = self.path();
        if file_exists(&path).await? {
            return Ok(());
        }

        // Serialize first-time creation; re-check once the lock is held
        let _guard = self.bootstrap_lock.lock().await;
        if file_exists(&path).await? {
            return Ok(());
        }

        if let Err(source) = tokio::fs::create_dir_all(&self.output_dir).await {
            error!(
                dir = %self.output_dir.display(),
                error = %source,
                "failed to create database directory"
            );
            return Err(StoreError::CreateDir {
                path: self.output_dir.clone(),
                source,
            });
        }

        self.bootstrap(&path).await.map_err(|err| {
            error!(path = %path.display(), error = %err, "database bootstrap failed");
            err
        })
    }

    /// Builds the schema in a staging file and links it into place, so a
    /// half-built database is never visible under the real name
    ///
    /// A database that appeared under the real name in the meantime (another
    /// process or another `Store`) is kept and the staging file discarded.
    async fn bootstrap(&self, path: &Path) -> Result<(), StoreError> {
        let staging = path.with_extension("db-bootstrap");
        remove_if_exists(&staging).await;

        info!(
            path = %path.display(),
            statements = self.schema.len(),
            "bootstrapping database schema"
        );

        if let Err(err) = self.run_schema(&staging, path).await {
            remove_if_exists(&staging).await;
            return Err(err);
        }

        let installed = tokio::fs::hard_link(&staging, path).await;
        remove_if_exists(&staging).await;
        match installed {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                info!(path = %path.display(), "database created concurrently; keeping existing file");
                Ok(())
            }
            Err(source) => Err(StoreError::Install {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    async fn run_schema(&self, staging: &Path, path: &Path) -> Result<(), StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(staging)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);

        let mut conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(|source| StoreError::Connect {
                path: staging.to_path_buf(),
                source,
            })?;

        let outcome = self.apply_schema(&mut conn, path).await;

        // The staging file is linked or removed right after this returns
        if let Err(err) = conn.close().await {
            warn!(path = %staging.display(), error = %err, "failed to close bootstrap connection");
        }
        outcome
    }

    async fn apply_schema(&self, conn: &mut SqliteConnection, path: &Path) -> Result<(), StoreError> {
        let mut tx = conn.begin().await?;
        for (index, statement) in self.schema.iter().enumerate() {
            if let Err(source) = sqlx::query(statement).execute(&mut *tx).await {
                if let Err(err) = tx.rollback().await {
                    warn!(error = %err, "failed to roll back schema bootstrap");
                }
                return Err(StoreError::Bootstrap {
                    path: path.to_path_buf(),
                    index,
                    source,
                });
            }
        }
        tx.commit().await?;
        Ok(())
    }
}
