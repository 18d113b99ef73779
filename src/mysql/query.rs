use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Column, Decode, Executor, MySql, MySqlConnection, Row, Statement, Type, TypeInfo, ValueRef};

use super::params::bind_params;
use crate::error::{DbManagerError, Result};
use crate::results::RawResult;
use crate::types::{DbValue, parse_decimal};

/// Run a statement and collect every row. Column labels come from the prepared
/// statement so that empty results still carry them.
pub(super) async fn fetch_raw_result(
    conn: &mut MySqlConnection,
    sql: &str,
    params: &[DbValue],
) -> Result<RawResult> {
    let stmt = (&mut *conn).prepare(sql).await?;
    let columns = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    let rows = bind_params(stmt.query(), params)
        .fetch_all(&mut *conn)
        .await?;

    let mut raw = RawResult::new(columns);
    for row in &rows {
        let values = (0..row.len())
            .map(|idx| decode_column(row, idx))
            .collect::<Result<Vec<_>>>()?;
        raw.push_row(values);
    }
    Ok(raw)
}

pub(super) async fn execute_dml(
    conn: &mut MySqlConnection,
    sql: &str,
    params: &[DbValue],
) -> Result<u64> {
    let result = bind_params(sqlx::query(sql), params)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Run a statement over the text protocol; transaction control cannot be prepared.
pub(super) async fn execute_batch(conn: &mut MySqlConnection, sql: &str) -> Result<()> {
    sqlx::raw_sql(sql).execute(&mut *conn).await?;
    Ok(())
}

/// Logical category of a MySQL column type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeCategory {
    Boolean,
    Decimal,
    Integer,
    Float,
    DateTime,
    Date,
    Binary,
    Other,
}

fn categorize_type(type_name: &str) -> TypeCategory {
    let upper = type_name.to_ascii_uppercase();
    if upper == "BOOLEAN" {
        TypeCategory::Boolean
    } else if upper.contains("DECIMAL") || upper.contains("NUMERIC") {
        TypeCategory::Decimal
    } else if upper.contains("INT") || upper == "YEAR" {
        TypeCategory::Integer
    } else if upper.contains("FLOAT") || upper.contains("DOUBLE") || upper == "REAL" {
        TypeCategory::Float
    } else if upper == "DATETIME" || upper == "TIMESTAMP" {
        TypeCategory::DateTime
    } else if upper == "DATE" {
        TypeCategory::Date
    } else if upper.contains("BLOB") || upper.contains("BINARY") {
        TypeCategory::Binary
    } else {
        TypeCategory::Other
    }
}

fn decode_column(row: &MySqlRow, idx: usize) -> Result<DbValue> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(DbValue::Null);
    }

    let decoded = match categorize_type(row.column(idx).type_info().name()) {
        TypeCategory::Boolean => row.try_get::<bool, _>(idx).ok().map(DbValue::Bool),
        TypeCategory::Decimal => row
            .try_get::<RawDecimal, _>(idx)
            .ok()
            .map(|d| parse_decimal(&d.0)),
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::DateTime => row
            .try_get::<NaiveDateTime, _>(idx)
            .ok()
            .map(DbValue::Timestamp),
        TypeCategory::Date => row
            .try_get::<NaiveDate, _>(idx)
            .ok()
            .map(|d| DbValue::Timestamp(d.and_time(NaiveTime::MIN))),
        TypeCategory::Binary => row.try_get::<Vec<u8>, _>(idx).ok().map(DbValue::Blob),
        TypeCategory::Other => None,
    };

    match decoded {
        Some(value) => Ok(value),
        None => decode_fallback(row, idx),
    }
}

fn decode_integer(row: &MySqlRow, idx: usize) -> Option<DbValue> {
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return Some(DbValue::Int(v));
    }
    if let Ok(v) = row.try_get::<i32, _>(idx) {
        return Some(DbValue::Int(i64::from(v)));
    }
    if let Ok(v) = row.try_get::<i16, _>(idx) {
        return Some(DbValue::Int(i64::from(v)));
    }
    if let Ok(v) = row.try_get::<i8, _>(idx) {
        return Some(DbValue::Int(i64::from(v)));
    }
    if let Ok(v) = row.try_get::<u64, _>(idx) {
        // BIGINT UNSIGNED above i64::MAX keeps its exact digits
        return Some(i64::try_from(v).map_or_else(|_| DbValue::Text(v.to_string()), DbValue::Int));
    }
    if let Ok(v) = row.try_get::<u32, _>(idx) {
        return Some(DbValue::Int(i64::from(v)));
    }
    if let Ok(v) = row.try_get::<u16, _>(idx) {
        return Some(DbValue::Int(i64::from(v)));
    }
    if let Ok(v) = row.try_get::<u8, _>(idx) {
        return Some(DbValue::Int(i64::from(v)));
    }
    None
}

fn decode_float(row: &MySqlRow, idx: usize) -> Option<DbValue> {
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return Some(DbValue::Float(v));
    }
    row.try_get::<f32, _>(idx)
        .ok()
        .map(|v| DbValue::Float(f64::from(v)))
}

fn decode_fallback(row: &MySqlRow, idx: usize) -> Result<DbValue> {
    if let Ok(text) = row.try_get::<String, _>(idx) {
        return Ok(DbValue::Text(text));
    }
    let bytes = row.try_get_unchecked::<Vec<u8>, _>(idx)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => DbValue::Text(text),
        Err(err) => DbValue::Blob(err.into_bytes()),
    })
}

/// Raw DECIMAL/NUMERIC text as sent by the server.
struct RawDecimal(String);

impl Type<MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_ascii_uppercase();
        name.contains("DECIMAL") || name.contains("NUMERIC")
    }
}

impl<'r> Decode<'r, MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let text = <&str as Decode<MySql>>::decode(value)?;
        Ok(RawDecimal(text.to_string()))
    }
}

impl From<sqlx::Error> for DbManagerError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DbManagerError::QueryError(match db_err.code() {
                Some(code) => format!("MySQL error {code}: {}", db_err.message()),
                None => format!("MySQL error: {}", db_err.message()),
            }),
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => {
                DbManagerError::ConnectionError(format!("MySQL connection error: {err}"))
            }
            other => DbManagerError::QueryError(format!("MySQL error: {other}")),
        }
    }
}
