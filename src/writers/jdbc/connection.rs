//! Database access used by the JDBC writer
//!
//! The writer only needs three things from a database: the identifier quote
//! string, single statement execution and transactional batch execution.
//! [`SqlDriver`]s open [`SqlConnection`]s from a connection url; SQLite is
//! supported out of the box through `rusqlite`.

use crate::core::error::{LoggerError, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, ToSqlOutput, Value};
use rusqlite::Connection;
use std::fmt;

/// Value bound to one statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
}

impl From<Option<String>> for SqlValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::Text)
    }
}

impl From<Option<&str>> for SqlValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(SqlValue::Null, |text| SqlValue::Text(text.to_string()))
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlValue::Null => Ok(ToSqlOutput::Owned(Value::Null)),
            SqlValue::Text(text) => Ok(ToSqlOutput::Owned(Value::Text(text.clone()))),
            SqlValue::Integer(number) => Ok(ToSqlOutput::Owned(Value::Integer(*number))),
            SqlValue::Timestamp(timestamp) => Ok(ToSqlOutput::Owned(Value::Text(
                timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            ))),
        }
    }
}

/// Open database connection
pub trait SqlConnection: Send {
    /// String used to quote identifiers; `None` if the database has none
    fn identifier_quote(&self) -> Option<String>;

    /// Prepare, bind and execute one statement
    fn execute(&mut self, sql: &str, row: &[SqlValue]) -> Result<()>;

    /// Execute one statement per row inside a single transaction
    fn execute_batch(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> Result<()>;

    fn close(self: Box<Self>) -> Result<()>;
}

/// Credentials from the writer's `username` and `password` keys
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Opens connections for the urls it accepts
pub trait SqlDriver: Send + Sync {
    fn name(&self) -> &str;

    fn accepts(&self, url: &str) -> bool;

    fn connect(&self, url: &str, credentials: Option<&Credentials>) -> Result<Box<dyn SqlConnection>>;
}

/// Driver for `sqlite:<path>`, `jdbc:sqlite:<path>` and `sqlite::memory:`
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl SqliteDriver {
    fn database(url: &str) -> Option<&str> {
        let url = url.trim();
        url.strip_prefix("jdbc:sqlite:")
            .or_else(|| url.strip_prefix("sqlite:"))
            .map(|rest| rest.strip_prefix("//").unwrap_or(rest))
    }
}

impl SqlDriver for SqliteDriver {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn accepts(&self, url: &str) -> bool {
        Self::database(url).is_some_and(|database| !database.is_empty())
    }

    fn connect(&self, url: &str, _credentials: Option<&Credentials>) -> Result<Box<dyn SqlConnection>> {
        let database = Self::database(url)
            .filter(|database| !database.is_empty())
            .ok_or_else(|| LoggerError::config("jdbc", format!("Not a SQLite url: '{}'", url)))?;

        let connection = if database == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(database)?
        };
        Ok(Box::new(SqliteConnection { connection }))
    }
}

/// Connection to a SQLite database
pub struct SqliteConnection {
    connection: Connection,
}

impl SqliteConnection {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

impl SqlConnection for SqliteConnection {
    fn identifier_quote(&self) -> Option<String> {
        Some("\"".to_string())
    }

    fn execute(&mut self, sql: &str, row: &[SqlValue]) -> Result<()> {
        let mut statement = self.connection.prepare(sql)?;
        statement.execute(rusqlite::params_from_iter(row.iter()))?;
        Ok(())
    }

    fn execute_batch(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> Result<()> {
        let transaction = self.connection.unchecked_transaction()?;
        {
            let mut statement = transaction.prepare(sql)?;
            for row in rows {
                statement.execute(rusqlite::params_from_iter(row.iter()))?;
            }
        }
        transaction.commit()?;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.connection.close().map_err(|(_, error)| error)?;
        Ok(())
    }
}
