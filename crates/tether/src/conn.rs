//! The connection seam.
//!
//! The engine talks to the database through the [`Conn`] trait; the
//! shipped implementation ([`MySqlConn`]) drives a synchronous MySQL
//! connection. Everything that executes SQL goes through [`Traced`],
//! which logs each statement via tracing.

use crate::value::{Row, Value};
use thiserror::Error;

/// An error surfaced by the database driver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ConnError {
    message: String,
}

impl ConnError {
    pub fn new(message: impl Into<String>) -> Self {
        ConnError {
            message: message.into(),
        }
    }
}

impl From<mysql::Error> for ConnError {
    fn from(e: mysql::Error) -> Self {
        ConnError::new(e.to_string())
    }
}

/// A live database connection.
///
/// Transaction control defaults to raw statements, which is all the
/// engine needs: a transaction never outlives a single call.
pub trait Conn {
    /// Execute a query, returning all rows.
    fn query(&mut self, sql: &str) -> Result<Vec<Row>, ConnError>;

    /// Execute a statement, returning the number of rows affected.
    fn execute(&mut self, sql: &str) -> Result<u64, ConnError>;

    fn begin(&mut self) -> Result<(), ConnError> {
        self.execute("START TRANSACTION;").map(drop)
    }

    fn commit(&mut self) -> Result<(), ConnError> {
        self.execute("COMMIT;").map(drop)
    }

    fn rollback(&mut self) -> Result<(), ConnError> {
        self.execute("ROLLBACK;").map(drop)
    }
}

/// Opens connections against a server; the adapter asks for a fresh one
/// on every database selection.
pub trait Driver {
    type Conn: Conn;

    fn connect(&self, opts: &ConnectOpts, db_name: &str) -> Result<Self::Conn, ConnError>;
}

/// Server address and credentials.
///
/// The database name is not part of the options: it is chosen (and
/// re-chosen) through `Adapter::select_db`.
#[derive(Debug, Clone)]
pub struct ConnectOpts {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl ConnectOpts {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        ConnectOpts {
            host: host.into(),
            port: 3306,
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Load options from `TETHER_DB_{HOST,PORT,USER,PASSWORD}`, reading a
    /// `.env` file first when one is present.
    pub fn from_env() -> crate::Result<Self> {
        let _ = dotenvy::dotenv();

        let host =
            std::env::var("TETHER_DB_HOST").map_err(|_| crate::Error::MissingEnv("TETHER_DB_HOST"))?;
        let username =
            std::env::var("TETHER_DB_USER").map_err(|_| crate::Error::MissingEnv("TETHER_DB_USER"))?;
        let password = std::env::var("TETHER_DB_PASSWORD").unwrap_or_default();

        let mut opts = ConnectOpts::new(host, username, password);
        if let Ok(port) = std::env::var("TETHER_DB_PORT") {
            opts.port = port
                .parse()
                .map_err(|_| crate::Error::InvalidEnv("TETHER_DB_PORT"))?;
        }
        Ok(opts)
    }
}

/// The MySQL driver, backed by the `mysql` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDriver;

impl Driver for MySqlDriver {
    type Conn = MySqlConn;

    fn connect(&self, opts: &ConnectOpts, db_name: &str) -> Result<MySqlConn, ConnError> {
        let builder = mysql::OptsBuilder::new()
            .ip_or_hostname(Some(opts.host.clone()))
            .tcp_port(opts.port)
            .user(Some(opts.username.clone()))
            .pass(Some(opts.password.clone()))
            .db_name(Some(db_name.to_string()));

        let inner = mysql::Conn::new(builder)?;
        Ok(MySqlConn { inner })
    }
}

/// A synchronous MySQL connection.
pub struct MySqlConn {
    inner: mysql::Conn,
}

impl Conn for MySqlConn {
    fn query(&mut self, sql: &str) -> Result<Vec<Row>, ConnError> {
        use mysql::prelude::Queryable;

        let rows: Vec<mysql::Row> = self.inner.query(sql)?;
        Ok(rows.into_iter().map(from_mysql_row).collect())
    }

    fn execute(&mut self, sql: &str) -> Result<u64, ConnError> {
        use mysql::prelude::Queryable;

        self.inner.query_drop(sql)?;
        Ok(self.inner.affected_rows())
    }
}

fn from_mysql_row(row: mysql::Row) -> Row {
    let columns = row.columns();
    let names: Vec<String> = columns
        .iter()
        .map(|c| c.name_str().into_owned())
        .collect();
    names.into_iter().zip(row.unwrap()).map(|(name, value)| (name, from_mysql_value(value))).collect()
}

fn from_mysql_value(value: mysql::Value) -> Value {
    match value {
        mysql::Value::NULL => Value::Null,
        // Text-protocol results arrive as bytes; decode when they are UTF-8.
        mysql::Value::Bytes(b) => match String::from_utf8(b) {
            Ok(s) => Value::String(s),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        mysql::Value::Int(v) => Value::I64(v),
        mysql::Value::UInt(v) => Value::I64(v as i64),
        mysql::Value::Float(v) => Value::F64(v as f64),
        mysql::Value::Double(v) => Value::F64(v),
        mysql::Value::Date(y, mo, d, 0, 0, 0, 0) => Value::String(format!("{y:04}-{mo:02}-{d:02}")),
        mysql::Value::Date(y, mo, d, h, mi, s, 0) => {
            Value::String(format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}"))
        }
        mysql::Value::Date(y, mo, d, h, mi, s, us) => Value::String(format!(
            "{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}.{us:06}"
        )),
        mysql::Value::Time(neg, days, h, mi, s, 0) => {
            let sign = if neg { "-" } else { "" };
            let hours = days * 24 + u32::from(h);
            Value::String(format!("{sign}{hours:02}:{mi:02}:{s:02}"))
        }
        mysql::Value::Time(neg, days, h, mi, s, us) => {
            let sign = if neg { "-" } else { "" };
            let hours = days * 24 + u32::from(h);
            Value::String(format!("{sign}{hours:02}:{mi:02}:{s:02}.{us:06}"))
        }
    }
}

/// A wrapper around a connection that logs all statements via tracing.
pub struct Traced<'a, C: Conn> {
    conn: &'a mut C,
}

impl<'a, C: Conn> Traced<'a, C> {
    pub fn new(conn: &'a mut C) -> Self {
        Traced { conn }
    }

    /// Execute a query, returning all rows.
    pub fn query(&mut self, sql: &str) -> Result<Vec<Row>, ConnError> {
        let span = tracing::debug_span!("db.query", sql = %sql, rows = tracing::field::Empty);
        let _guard = span.enter();
        let rows = self.conn.query(sql)?;
        span.record("rows", rows.len());
        Ok(rows)
    }

    /// Execute a statement, returning the number of rows affected.
    pub fn execute(&mut self, sql: &str) -> Result<u64, ConnError> {
        let span = tracing::debug_span!("db.execute", sql = %sql, affected = tracing::field::Empty);
        let _guard = span.enter();
        let affected = self.conn.execute(sql)?;
        span.record("affected", affected);
        Ok(affected)
    }

    pub fn begin(&mut self) -> Result<(), ConnError> {
        self.execute("START TRANSACTION;").map(drop)
    }

    pub fn commit(&mut self) -> Result<(), ConnError> {
        self.execute("COMMIT;").map(drop)
    }

    pub fn rollback(&mut self) -> Result<(), ConnError> {
        self.execute("ROLLBACK;").map(drop)
    }
}
