#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;

use db_manager::connection::AutoCommitTracker;
use db_manager::prelude::*;
use db_manager::results::RawResult;
use rusqlite::types::{Value, ValueRef};

/// Users table in SQLite syntax.
pub const USERS_COLUMNS: &str =
    "id INTEGER PRIMARY KEY AUTOINCREMENT, name VARCHAR(100), age INT, email VARCHAR(100)";

/// A manager over an on-disk SQLite database. MySQL's dialect is used because its
/// `IF [NOT] EXISTS` DDL and `?` placeholders are valid SQLite.
pub fn sqlite_manager(path: &Path) -> DatabaseManager {
    DatabaseManager::with_connector(
        Backend::MySql,
        ConnectionConfig::new(path.to_string_lossy()).with_driver("rusqlite"),
        sqlite_connect,
    )
}

pub fn sqlite_connect(config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
    if config.url.is_empty() {
        return Err(DbManagerError::ConnectionError("no database path".into()));
    }
    let conn = rusqlite::Connection::open(&config.url)
        .map_err(|e| DbManagerError::ConnectionError(e.to_string()))?;
    conn.busy_timeout(Duration::from_secs(5))
        .map_err(|e| DbManagerError::ConnectionError(e.to_string()))?;
    Ok(Box::new(SqliteConnection {
        conn: Some(conn),
        tx: AutoCommitTracker::default(),
    }))
}

/// `Connection` over rusqlite with the same lazy-BEGIN auto-commit handling as the
/// server backends.
pub struct SqliteConnection {
    conn: Option<rusqlite::Connection>,
    tx: AutoCommitTracker,
}

fn query_error(err: rusqlite::Error) -> DbManagerError {
    DbManagerError::QueryError(err.to_string())
}

fn to_sqlite(value: &DbValue) -> Value {
    match value {
        DbValue::Null => Value::Null,
        DbValue::Int(i) => Value::Integer(*i),
        DbValue::Float(f) => Value::Real(*f),
        DbValue::Text(s) => Value::Text(s.clone()),
        DbValue::Bool(b) => Value::Integer(i64::from(*b)),
        DbValue::Timestamp(dt) => Value::Text(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        DbValue::Blob(b) => Value::Blob(b.clone()),
    }
}

fn from_sqlite(value: ValueRef<'_>) -> DbValue {
    match value {
        ValueRef::Null => DbValue::Null,
        ValueRef::Integer(i) => DbValue::Int(i),
        ValueRef::Real(f) => DbValue::Float(f),
        ValueRef::Text(t) => DbValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => DbValue::Blob(b.to_vec()),
    }
}

impl SqliteConnection {
    fn conn(&self) -> Result<&rusqlite::Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| DbManagerError::ConnectionError("connection is closed".into()))
    }

    fn begin_if_needed(&mut self) -> Result<()> {
        if self.tx.begin_needed() {
            self.conn()?.execute_batch("BEGIN").map_err(query_error)?;
            self.tx.mark_begun();
        }
        Ok(())
    }

    fn finish_transaction(&mut self, sql: &str) -> Result<()> {
        if self.tx.is_open() {
            self.conn()?.execute_batch(sql).map_err(query_error)?;
            self.tx.mark_finished();
        }
        Ok(())
    }
}

impl Connection for SqliteConnection {
    fn query(&mut self, sql: &str, params: &[DbValue]) -> Result<RawResult> {
        self.begin_if_needed()?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(query_error)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| (*c).to_string()).collect();
        let width = columns.len();
        let mut raw = RawResult::new(columns);

        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter().map(to_sqlite)))
            .map_err(query_error)?;
        while let Some(row) = rows.next().map_err(query_error)? {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                values.push(from_sqlite(row.get_ref(idx).map_err(query_error)?));
            }
            raw.push_row(values);
        }
        Ok(raw)
    }

    fn execute(&mut self, sql: &str, params: &[DbValue]) -> Result<u64> {
        self.begin_if_needed()?;
        let affected = self
            .conn()?
            .execute(sql, rusqlite::params_from_iter(params.iter().map(to_sqlite)))
            .map_err(query_error)?;
        Ok(affected as u64)
    }

    fn auto_commit(&self) -> bool {
        self.tx.enabled()
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
        if self.tx.commit_needed_for(enabled) {
            self.finish_transaction("COMMIT")?;
        }
        self.tx.set_enabled(enabled);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.finish_transaction("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.finish_transaction("ROLLBACK")
    }

    fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            self.tx.mark_finished();
            conn.close()
                .map_err(|(_, e)| DbManagerError::ConnectionError(e.to_string()))?;
        }
        Ok(())
    }
}

/// Everything a [`RecordingConnection`] was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open(u32),
    Query(u32, String),
    Execute(u32, String),
    AutoCommit(u32, bool),
    Commit(u32),
    Rollback(u32),
    Close(u32),
}

thread_local! {
    static EVENTS: RefCell<Vec<Event>> = const { RefCell::new(Vec::new()) };
    static NEXT_ID: RefCell<u32> = const { RefCell::new(0) };
}

/// Drain the events recorded on this thread.
pub fn take_events() -> Vec<Event> {
    EVENTS.with(|events| std::mem::take(&mut *events.borrow_mut()))
}

fn record(event: Event) {
    EVENTS.with(|events| events.borrow_mut().push(event));
}

/// A manager whose connections only record calls.
///
/// URLs steer the fake: `fake://refuse` fails to connect. Statements containing
/// `FAIL` are rejected with a query error; `CLOSE_FAILS` in the URL makes `close` fail.
pub fn recording_manager(backend: Backend, url: &str) -> DatabaseManager {
    take_events();
    DatabaseManager::with_connector(backend, ConnectionConfig::new(url), recording_connect)
}

pub fn recording_connect(config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
    if config.url.contains("refuse") {
        return Err(DbManagerError::ConnectionError("connection refused".into()));
    }
    let id = NEXT_ID.with(|next| {
        let mut next = next.borrow_mut();
        *next += 1;
        *next
    });
    record(Event::Open(id));
    Ok(Box::new(RecordingConnection {
        id,
        auto_commit: true,
        closed: false,
        fail_close: config.url.contains("CLOSE_FAILS"),
    }))
}

pub struct RecordingConnection {
    id: u32,
    auto_commit: bool,
    closed: bool,
    fail_close: bool,
}

impl Connection for RecordingConnection {
    fn query(&mut self, sql: &str, _params: &[DbValue]) -> Result<RawResult> {
        record(Event::Query(self.id, sql.to_string()));
        if sql.contains("FAIL") {
            return Err(DbManagerError::QueryError("rejected".into()));
        }
        let mut raw = RawResult::new(vec!["ID".into(), "Name".into(), "count".into()]);
        raw.push_row(vec![DbValue::Int(1), DbValue::Text("Jean".into()), DbValue::Int(1)]);
        Ok(raw)
    }

    fn execute(&mut self, sql: &str, _params: &[DbValue]) -> Result<u64> {
        record(Event::Execute(self.id, sql.to_string()));
        if sql.contains("FAIL") {
            return Err(DbManagerError::QueryError("rejected".into()));
        }
        Ok(1)
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
        record(Event::AutoCommit(self.id, enabled));
        self.auto_commit = enabled;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        record(Event::Commit(self.id));
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        record(Event::Rollback(self.id));
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        record(Event::Close(self.id));
        self.closed = true;
        if self.fail_close {
            return Err(DbManagerError::ConnectionError("close failed".into()));
        }
        Ok(())
    }
}
