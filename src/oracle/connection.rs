use chrono::NaiveDateTime;
use oracle::sql_type::{OracleType, ToSql};
use oracle::{ResultSet, Row};

use super::url::connect_string;
use crate::config::ConnectionConfig;
use crate::connection::Connection;
use crate::error::{DbManagerError, Result};
use crate::results::RawResult;
use crate::types::{DbValue, parse_decimal};

/// ORA/DPI codes that mean the session itself is unusable.
const CONNECTION_ERROR_CODES: &[&str] = &[
    "ORA-01012", "ORA-01017", "ORA-03113", "ORA-03114", "ORA-03135", "ORA-12170",
    "ORA-12514", "ORA-12541", "ORA-12545", "DPI-1010", "DPI-1080",
];

/// Blocking Oracle connection.
pub struct OracleConnection {
    conn: Option<oracle::Connection>,
}

/// Open an Oracle connection with auto-commit on.
///
/// # Errors
/// `ConnectionError` if the client libraries are missing or the login fails.
pub fn connect(config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
    Ok(Box::new(OracleConnection::open(config)?))
}

impl OracleConnection {
    /// # Errors
    /// See [`connect`].
    pub fn open(config: &ConnectionConfig) -> Result<Self> {
        let mut conn = oracle::Connection::connect(
            &config.username,
            &config.password,
            connect_string(&config.url),
        )
        .map_err(|e| DbManagerError::ConnectionError(format!("failed to connect to Oracle: {e}")))?;
        conn.set_autocommit(true);
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&self) -> Result<&oracle::Connection> {
        self.conn.as_ref().ok_or_else(|| {
            DbManagerError::ConnectionError("Oracle connection is closed".to_string())
        })
    }

    fn conn_mut(&mut self) -> Result<&mut oracle::Connection> {
        self.conn.as_mut().ok_or_else(|| {
            DbManagerError::ConnectionError("Oracle connection is closed".to_string())
        })
    }
}

fn bind_values(params: &[DbValue]) -> Vec<Box<dyn ToSql>> {
    params
        .iter()
        .map(|param| -> Box<dyn ToSql> {
            match param {
                DbValue::Null => Box::new(None::<String>),
                DbValue::Int(v) => Box::new(*v),
                DbValue::Float(v) => Box::new(*v),
                DbValue::Text(v) => Box::new(v.clone()),
                // NUMBER(1) flags; BOOLEAN columns only exist from 23ai on
                DbValue::Bool(v) => Box::new(i64::from(*v)),
                DbValue::Timestamp(v) => Box::new(*v),
                DbValue::Blob(v) => Box::new(v.clone()),
            }
        })
        .collect()
}

fn collect_rows(rows: ResultSet<'_, Row>) -> Result<RawResult> {
    let types: Vec<OracleType> = rows
        .column_info()
        .iter()
        .map(|info| info.oracle_type().clone())
        .collect();
    let columns = rows
        .column_info()
        .iter()
        .map(|info| info.name().to_string())
        .collect();

    let mut raw = RawResult::new(columns);
    for row in rows {
        let row = row.map_err(classify_error)?;
        let values = types
            .iter()
            .enumerate()
            .map(|(idx, ty)| extract_value(&row, idx, ty))
            .collect::<Result<Vec<_>>>()?;
        raw.push_row(values);
    }
    Ok(raw)
}

fn extract_value(row: &Row, idx: usize, ty: &OracleType) -> Result<DbValue> {
    let value = match ty {
        OracleType::Number(..)
        | OracleType::Float(_)
        | OracleType::Int64
        | OracleType::UInt64 => row
            .get::<_, Option<String>>(idx)
            .map_err(classify_error)?
            .map(|text| parse_decimal(&text)),
        OracleType::BinaryFloat | OracleType::BinaryDouble => row
            .get::<_, Option<f64>>(idx)
            .map_err(classify_error)?
            .map(DbValue::Float),
        OracleType::Date
        | OracleType::Timestamp(_)
        | OracleType::TimestampTZ(_)
        | OracleType::TimestampLTZ(_) => row
            .get::<_, Option<NaiveDateTime>>(idx)
            .map_err(classify_error)?
            .map(DbValue::Timestamp),
        OracleType::Raw(_) | OracleType::LongRaw | OracleType::BLOB => row
            .get::<_, Option<Vec<u8>>>(idx)
            .map_err(classify_error)?
            .map(DbValue::Blob),
        OracleType::Boolean => row
            .get::<_, Option<bool>>(idx)
            .map_err(classify_error)?
            .map(DbValue::Bool),
        _ => row
            .get::<_, Option<String>>(idx)
            .map_err(classify_error)?
            .map(DbValue::Text),
    };
    Ok(value.unwrap_or(DbValue::Null))
}

fn classify_error(err: oracle::Error) -> DbManagerError {
    let message = err.to_string();
    if CONNECTION_ERROR_CODES
        .iter()
        .any(|code| message.contains(code))
    {
        DbManagerError::ConnectionError(format!("Oracle connection error: {message}"))
    } else {
        DbManagerError::QueryError(format!("Oracle error: {message}"))
    }
}

impl Connection for OracleConnection {
    fn query(&mut self, sql: &str, params: &[DbValue]) -> Result<RawResult> {
        let conn = self.conn()?;
        let values = bind_values(params);
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| &**v).collect();
        let rows = conn.query(sql, &refs).map_err(classify_error)?;
        collect_rows(rows)
    }

    fn execute(&mut self, sql: &str, params: &[DbValue]) -> Result<u64> {
        let conn = self.conn()?;
        let values = bind_values(params);
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| &**v).collect();
        let stmt = conn.execute(sql, &refs).map_err(classify_error)?;
        stmt.row_count().map_err(classify_error)
    }

    fn auto_commit(&self) -> bool {
        self.conn.as_ref().is_some_and(oracle::Connection::autocommit)
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
        let conn = self.conn_mut()?;
        if enabled && !conn.autocommit() {
            conn.commit().map_err(classify_error)?;
        }
        conn.set_autocommit(enabled);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn()?.commit().map_err(classify_error)
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn()?.rollback().map_err(classify_error)
    }

    fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(classify_error)?;
        }
        Ok(())
    }
}
