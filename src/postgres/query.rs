use std::error::Error;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tokio_postgres::types::{FromSql, Type};
use tokio_postgres::{Row, Statement};

use crate::error::{DbManagerError, Result};
use crate::results::RawResult;
use crate::types::DbValue;

/// Collect rows into a raw result, taking column labels from the prepared statement
/// so that empty results still carry them.
pub(super) fn build_raw_result(stmt: &Statement, rows: &[Row]) -> Result<RawResult> {
    let columns: Vec<String> = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    let column_count = columns.len();

    let mut raw = RawResult::new(columns);
    for row in rows {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            values.push(extract_value(row, idx)?);
        }
        raw.push_row(values);
    }
    Ok(raw)
}

/// Extract a `DbValue` from a `tokio_postgres` row at the given index.
///
/// # Errors
/// Returns `QueryError` if the column cannot be decoded.
pub(super) fn extract_value(row: &Row, idx: usize) -> Result<DbValue> {
    let type_info = row.columns()[idx].type_();

    let value = match type_info.name() {
        "int2" => row.try_get::<_, Option<i16>>(idx)?.map(|v| DbValue::Int(i64::from(v))),
        "int4" => row.try_get::<_, Option<i32>>(idx)?.map(|v| DbValue::Int(i64::from(v))),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.map(DbValue::Int),
        "oid" => row.try_get::<_, Option<u32>>(idx)?.map(|v| DbValue::Int(i64::from(v))),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| DbValue::Float(f64::from(v))),
        "float8" => row.try_get::<_, Option<f64>>(idx)?.map(DbValue::Float),
        "numeric" => row.try_get::<_, Option<PgNumeric>>(idx)?.map(|n| n.0),
        "bool" => row.try_get::<_, Option<bool>>(idx)?.map(DbValue::Bool),
        "timestamp" => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(DbValue::Timestamp),
        "timestamptz" => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(|v| DbValue::Timestamp(v.naive_utc())),
        "date" => row
            .try_get::<_, Option<NaiveDate>>(idx)?
            .map(|d| DbValue::Timestamp(d.and_time(chrono::NaiveTime::MIN))),
        "bytea" => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(DbValue::Blob),
        _ => {
            // text, varchar, bpchar, name and anything else with a textual decoding
            row.try_get::<_, Option<String>>(idx)?.map(DbValue::Text)
        }
    };
    Ok(value.unwrap_or(DbValue::Null))
}

impl From<tokio_postgres::Error> for DbManagerError {
    fn from(err: tokio_postgres::Error) -> Self {
        classify_error(&err)
    }
}

/// Server-reported errors and conversion failures are query errors; socket and
/// closed-connection failures are connection errors.
pub(super) fn classify_error(err: &tokio_postgres::Error) -> DbManagerError {
    if let Some(db_err) = err.as_db_error() {
        return DbManagerError::QueryError(format!(
            "{} ({}): {}",
            db_err.severity(),
            db_err.code().code(),
            db_err.message()
        ));
    }
    let io_failure = err
        .source()
        .is_some_and(|source| source.downcast_ref::<std::io::Error>().is_some());
    if err.is_closed() || io_failure {
        DbManagerError::ConnectionError(format!("postgres connection error: {err}"))
    } else {
        DbManagerError::QueryError(format!("postgres error: {err}"))
    }
}

/// Binary `numeric` decoded into an integer when it has no fractional digits,
/// otherwise into a float.
struct PgNumeric(DbValue);

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;

impl<'a> FromSql<'a> for PgNumeric {
    #[allow(clippy::cast_possible_wrap)]
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> std::result::Result<Self, Box<dyn Error + Sync + Send>> {
        let word = |i: usize| -> std::result::Result<u16, Box<dyn Error + Sync + Send>> {
            raw.get(i * 2..i * 2 + 2)
                .map(|b| u16::from_be_bytes([b[0], b[1]]))
                .ok_or_else(|| "truncated numeric value".into())
        };
        let ndigits = usize::from(word(0)?);
        let weight = i32::from(word(1)? as i16);
        let sign = word(2)?;
        let dscale = word(3)?;

        if sign == NUMERIC_NAN {
            return Ok(PgNumeric(DbValue::Float(f64::NAN)));
        }

        let mut digits = Vec::with_capacity(ndigits);
        for i in 0..ndigits {
            digits.push(word(4 + i)?);
        }

        let negative = sign == NUMERIC_NEG;
        if dscale == 0 {
            let mut acc: i64 = 0;
            let mut fits = true;
            for (i, digit) in digits.iter().enumerate() {
                let exponent = weight - i32::try_from(i)?;
                if exponent < 0 {
                    continue;
                }
                let term = 10_000_i64
                    .checked_pow(u32::try_from(exponent)?)
                    .and_then(|scale| scale.checked_mul(i64::from(*digit)));
                match term.and_then(|t| acc.checked_add(t)) {
                    Some(next) => acc = next,
                    None => {
                        fits = false;
                        break;
                    }
                }
            }
            if fits {
                return Ok(PgNumeric(DbValue::Int(if negative { -acc } else { acc })));
            }
        }

        let mut value = 0.0_f64;
        for (i, digit) in digits.iter().enumerate() {
            let exponent = weight - i32::try_from(i)?;
            value += f64::from(*digit) * 10_000_f64.powi(exponent);
        }
        Ok(PgNumeric(DbValue::Float(if negative { -value } else { value })))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}
