//! Record store adapter: the pooled SQLite handle, schema bootstrap, and the parameter values
//! that generated SQL binds.

pub mod codec;
pub mod filter;

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::query::{Query, QueryAs};
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};
use sqlx::Sqlite;
use tracing::info;

use crate::error::Result;

pub use filter::{CompiledFilter, PriceRange, PropertyFilters};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    phone TEXT,
    password_hash TEXT NOT NULL,
    user_type TEXT NOT NULL,
    is_verified INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS properties (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    property_type TEXT NOT NULL,
    price REAL NOT NULL,
    barrio TEXT NOT NULL,
    street_type TEXT,
    city TEXT NOT NULL,
    province TEXT NOT NULL,
    zonificacion TEXT,
    condition TEXT,
    situation TEXT,
    antiquity INTEGER,
    surface REAL,
    covered_surface REAL,
    urbanization TEXT,
    security TEXT,
    description TEXT,
    ambientes TEXT NOT NULL DEFAULT '',
    services TEXT NOT NULL DEFAULT '',
    media_urls TEXT NOT NULL DEFAULT '[]',
    user_id INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_properties_city ON properties(city);
CREATE INDEX IF NOT EXISTS idx_properties_user ON properties(user_id);
";

/// A value bound to a `?` placeholder. Nothing user-supplied is ever spliced into SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Real(f64),
    Integer(i64),
    Timestamp(DateTime<Utc>),
}

/// Opens the connection pool and makes sure the tables exist.
///
/// Called once by the application root; the pool is then handed to each repository.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;
    info!(max_connections, "record store ready");

    Ok(pool)
}

pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

/// Binds [`SqlValue`]s onto a query in emission order.
pub(crate) trait BindValues: Sized {
    fn bind_value(self, value: SqlValue) -> Self;

    fn bind_values(self, values: impl IntoIterator<Item = SqlValue>) -> Self {
        values.into_iter().fold(self, Self::bind_value)
    }
}

impl<'q> BindValues for Query<'q, Sqlite, SqliteArguments<'q>> {
    fn bind_value(self, value: SqlValue) -> Self {
        match value {
            SqlValue::Text(v) => self.bind(v),
            SqlValue::Real(v) => self.bind(v),
            SqlValue::Integer(v) => self.bind(v),
            SqlValue::Timestamp(v) => self.bind(v),
        }
    }
}

impl<'q, O> BindValues for QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    fn bind_value(self, value: SqlValue) -> Self {
        match value {
            SqlValue::Text(v) => self.bind(v),
            SqlValue::Real(v) => self.bind(v),
            SqlValue::Integer(v) => self.bind(v),
            SqlValue::Timestamp(v) => self.bind(v),
        }
    }
}
