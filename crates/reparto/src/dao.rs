// File: src/dao.rs
// Purpose: Generic CRUD over any table, one scoped handle per call
//
// Table and attribute names are interpolated into SQL text, so every one of
// them is checked against the identifier grammar before a statement is built.
// Values are always bound as parameters.

use std::sync::Arc;
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::DaoError;
use crate::store::Store;
use crate::value::{Row, Value};

// ============================================================================
// PURE FUNCTIONS
// ============================================================================

/// Checks `[A-Za-z_][A-Za-z0-9_]*` (pure function)
///
/// # Examples
/// ```
/// use reparto::dao::validate_identifier;
///
/// assert!(validate_identifier("items").is_ok());
/// assert!(validate_identifier("_scanned_at2").is_ok());
/// assert!(validate_identifier("items; DROP TABLE items").is_err());
/// assert!(validate_identifier("2items").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), DaoError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(DaoError::InvalidIdentifier(name.to_string()))
    }
}

/// Checks the attribute list against the value tuple (pure function)
fn validate_attributes(attrs: &[&str], values: &[Value]) -> Result<(), DaoError> {
    if attrs.is_empty() {
        return Err(DaoError::NoAttributes);
    }
    if attrs.len() != values.len() {
        return Err(DaoError::ArityMismatch {
            attrs: attrs.len(),
            values: values.len(),
        });
    }
    attrs.iter().try_for_each(|attr| validate_identifier(attr))
}

/// `k1 = ? AND k2 = ?` (pure function)
fn where_clause(key_attrs: &[&str]) -> String {
    key_attrs
        .iter()
        .map(|attr| format!("{} = ?", attr))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// `SELECT * FROM <table>` (pure function)
pub fn select_all_sql(table: &str) -> String {
    format!("SELECT * FROM {}", table)
}

/// `SELECT * FROM <table> WHERE k1 = ? AND ...` (pure function)
///
/// # Examples
/// ```
/// use reparto::dao::select_where_sql;
///
/// assert_eq!(
///     select_where_sql("items", &["id", "name"]),
///     "SELECT * FROM items WHERE id = ? AND name = ?"
/// );
/// ```
pub fn select_where_sql(table: &str, key_attrs: &[&str]) -> String {
    format!("SELECT * FROM {} WHERE {}", table, where_clause(key_attrs))
}

/// `INSERT INTO <table> (a, b) VALUES (?, ?)` (pure function)
pub fn insert_sql(table: &str, attrs: &[&str]) -> String {
    let placeholders = vec!["?"; attrs.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        attrs.join(", "),
        placeholders
    )
}

/// `DELETE FROM <table> WHERE k1 = ? AND ...` (pure function)
pub fn delete_where_sql(table: &str, key_attrs: &[&str]) -> String {
    format!("DELETE FROM {} WHERE {}", table, where_clause(key_attrs))
}

// ============================================================================
// DAO
// ============================================================================

/// Table-agnostic data access
///
/// Holds no schema knowledge: every call names its table and attributes.
/// Cheap to share behind an `Arc`; each call acquires its own handle.
#[derive(Debug)]
pub struct Dao {
    store: Arc<Store>,
    allowed_tables: Vec<String>,
}

impl Dao {
    /// DAO over `store` accepting any valid table name
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            allowed_tables: Vec::new(),
        }
    }

    /// DAO and store described by the `[database]` config section
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(Arc::new(Store::from_config(config)))
            .with_allowed_tables(config.allowed_tables.clone())
    }

    /// Restricts the DAO to the given tables; an empty list lifts the restriction
    pub fn with_allowed_tables(mut self, tables: Vec<String>) -> Self {
        self.allowed_tables = tables;
        self
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn allowed_tables(&self) -> &[String] {
        &self.allowed_tables
    }

    fn check_table(&self, table: &str) -> Result<(), DaoError> {
        validate_identifier(table)?;
        if !self.allowed_tables.is_empty() && !self.allowed_tables.iter().any(|t| t == table) {
            return Err(DaoError::TableNotAllowed(table.to_string()));
        }
        Ok(())
    }

    /// Every row of `table`
    pub async fn read_all(&self, table: &str) -> Result<Vec<Row>, DaoError> {
        self.check_table(table)?;
        let sql = select_all_sql(table);
        self.fetch(sql, Vec::new()).await
    }

    /// Rows of `table` whose key attributes equal the given values
    pub async fn read(
        &self,
        table: &str,
        key_attrs: &[&str],
        key_values: &[Value],
    ) -> Result<Vec<Row>, DaoError> {
        self.check_table(table)?;
        validate_attributes(key_attrs, key_values)?;
        let sql = select_where_sql(table, key_attrs);
        self.fetch(sql, key_values.to_vec()).await
    }

    /// Inserts one row
    pub async fn insert(&self, table: &str, attrs: &[&str], values: &[Value]) -> Result<(), DaoError> {
        self.check_table(table)?;
        validate_attributes(attrs, values)?;
        let sql = insert_sql(table, attrs);
        self.execute(sql, values.to_vec()).await.map(|_| ())
    }

    /// Deletes the rows whose key attributes equal the given values
    pub async fn delete(
        &self,
        table: &str,
        key_attrs: &[&str],
        key_values: &[Value],
    ) -> Result<(), DaoError> {
        self.check_table(table)?;
        validate_attributes(key_attrs, key_values)?;
        let sql = delete_where_sql(table, key_attrs);
        self.execute(sql, key_values.to_vec()).await.map(|_| ())
    }

    async fn fetch(&self, sql: String, params: Vec<Value>) -> Result<Vec<Row>, DaoError> {
        debug!(sql = %sql, "dao fetch");
        self.store
            .scoped(move |handle| {
                Box::pin(async move {
                    handle
                        .fetch_all(&sql, &params)
                        .await
                        .map_err(DaoError::from)
                })
            })
            .await
    }

    async fn execute(&self, sql: String, params: Vec<Value>) -> Result<u64, DaoError> {
        debug!(sql = %sql, "dao execute");
        self.store
            .scoped(move |handle| {
                Box::pin(async move {
                    handle
                        .execute(&sql, &params)
                        .await
                        .map_err(DaoError::from)
                })
            })
            .await
    }
}
