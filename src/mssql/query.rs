use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures_util::TryStreamExt;
use tiberius::numeric::Numeric;
use tiberius::{Client, ColumnData, FromSql, QueryItem};
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

use super::params::bind_query_params;
use crate::error::{DbManagerError, Result};
use crate::results::RawResult;
use crate::types::DbValue;

pub(super) type MssqlClient = Client<Compat<TcpStream>>;

/// Run a statement and collect its first result set.
pub(super) async fn build_raw_result(
    client: &mut MssqlClient,
    sql: &str,
    params: &[DbValue],
) -> Result<RawResult> {
    let mut stream = bind_query_params(sql, params).query(client).await?;

    let mut raw = RawResult::new(Vec::new());
    while let Some(item) = stream.try_next().await? {
        match item {
            QueryItem::Metadata(meta) if meta.result_index() == 0 => {
                raw.columns = meta
                    .columns()
                    .iter()
                    .map(|col| col.name().to_string())
                    .collect();
            }
            QueryItem::Metadata(_) => break,
            QueryItem::Row(row) => {
                let values = row
                    .into_iter()
                    .map(|data| extract_value(&data))
                    .collect::<Result<Vec<_>>>()?;
                raw.push_row(values);
            }
        }
    }
    Ok(raw)
}

/// Run a statement and sum the affected-row counts of every statement in the batch.
pub(super) async fn execute_dml(
    client: &mut MssqlClient,
    sql: &str,
    params: &[DbValue],
) -> Result<u64> {
    let result = bind_query_params(sql, params).execute(client).await?;
    Ok(result.rows_affected().iter().sum())
}

/// Run a parameterless batch such as `BEGIN TRANSACTION`.
pub(super) async fn execute_batch(client: &mut MssqlClient, sql: &str) -> Result<()> {
    client.simple_query(sql).await?.into_results().await?;
    Ok(())
}

fn extract_value(data: &ColumnData<'static>) -> Result<DbValue> {
    let value = match data {
        ColumnData::U8(v) => v.map(|v| DbValue::Int(i64::from(v))),
        ColumnData::I16(v) => v.map(|v| DbValue::Int(i64::from(v))),
        ColumnData::I32(v) => v.map(|v| DbValue::Int(i64::from(v))),
        ColumnData::I64(v) => v.map(DbValue::Int),
        ColumnData::F32(v) => v.map(|v| DbValue::Float(f64::from(v))),
        ColumnData::F64(v) => v.map(DbValue::Float),
        ColumnData::Bit(v) => v.map(DbValue::Bool),
        ColumnData::String(v) => v.as_ref().map(|s| DbValue::Text(s.to_string())),
        ColumnData::Guid(v) => v.map(|g| DbValue::Text(g.to_string())),
        ColumnData::Binary(v) => v.as_ref().map(|b| DbValue::Blob(b.to_vec())),
        ColumnData::Numeric(v) => v.as_ref().map(numeric_value),
        _ => temporal_or_text(data)?,
    };
    Ok(value.unwrap_or(DbValue::Null))
}

#[allow(clippy::cast_precision_loss)]
fn numeric_value(numeric: &Numeric) -> DbValue {
    if numeric.scale() == 0 {
        if let Ok(whole) = i64::try_from(numeric.value()) {
            return DbValue::Int(whole);
        }
    }
    DbValue::Float(numeric.value() as f64 / 10_f64.powi(i32::from(numeric.scale())))
}

// Date and time variants depend on the negotiated TDS version, so they go through
// the driver's own conversions instead of a variant match.
fn temporal_or_text(data: &ColumnData<'static>) -> Result<Option<DbValue>> {
    if let Ok(v) = NaiveDateTime::from_sql(data) {
        return Ok(v.map(DbValue::Timestamp));
    }
    if let Ok(v) = DateTime::<FixedOffset>::from_sql(data) {
        return Ok(v.map(|dt| DbValue::Timestamp(dt.naive_utc())));
    }
    if let Ok(v) = NaiveDate::from_sql(data) {
        return Ok(v.map(|d| DbValue::Timestamp(d.and_time(NaiveTime::MIN))));
    }
    if let Ok(v) = NaiveTime::from_sql(data) {
        return Ok(v.map(|t| DbValue::Text(t.to_string())));
    }
    if let Ok(v) = <&str>::from_sql(data) {
        return Ok(v.map(|s| DbValue::Text(s.to_string())));
    }
    Err(DbManagerError::QueryError(format!(
        "unsupported SQL Server column value: {data:?}"
    )))
}

impl From<tiberius::error::Error> for DbManagerError {
    fn from(err: tiberius::error::Error) -> Self {
        use tiberius::error::Error;
        match err {
            Error::Server(token) => DbManagerError::QueryError(format!(
                "SQL Server error {}: {}",
                token.code(),
                token.message()
            )),
            Error::Io { .. } | Error::Tls { .. } | Error::Protocol { .. } | Error::Routing { .. } => {
                DbManagerError::ConnectionError(format!("SQL Server connection error: {err}"))
            }
            other => DbManagerError::QueryError(format!("SQL Server error: {other}")),
        }
    }
}
