use std::error::Error;

use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_util::bytes;

use crate::types::DbValue;

/// Borrow parameters as `tokio-postgres` bind values.
pub(super) fn as_refs(params: &[DbValue]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

// Integers and floats are narrowed to the width the server inferred for the
// placeholder; the wire format is binary, so an i64 cannot be sent for an int4.
impl ToSql for DbValue {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            DbValue::Null => Ok(IsNull::Yes),
            DbValue::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                Type::BOOL => (*i != 0).to_sql(ty, out),
                Type::NUMERIC => encode_numeric(&i.to_string(), out),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                    i.to_string().to_sql(ty, out)
                }
                _ => i.to_sql(ty, out),
            },
            DbValue::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::NUMERIC if f.is_nan() => {
                    write_numeric_header(out, 0, 0, NUMERIC_NAN, 0);
                    Ok(IsNull::No)
                }
                Type::NUMERIC if f.is_infinite() => Err("infinite float cannot bind as numeric".into()),
                // Display never uses exponent notation for f64
                Type::NUMERIC => encode_numeric(&f.to_string(), out),
                _ => f.to_sql(ty, out),
            },
            DbValue::Text(s) => match *ty {
                Type::NUMERIC => encode_numeric(s, out),
                _ => s.to_sql(ty, out),
            },
            DbValue::Bool(b) => match *ty {
                Type::NUMERIC => encode_numeric(if *b { "1" } else { "0" }, out),
                _ => b.to_sql(ty, out),
            },
            DbValue::Timestamp(dt) => match *ty {
                Type::DATE => dt.date().to_sql(ty, out),
                Type::TIMESTAMPTZ => dt.and_utc().to_sql(ty, out),
                _ => dt.to_sql(ty, out),
            },
            DbValue::Blob(bytes) => bytes.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::NUMERIC
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::UNKNOWN
                | Type::BOOL
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::DATE
                | Type::BYTEA
        )
    }

    to_sql_checked!();
}

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;

fn write_numeric_header(out: &mut bytes::BytesMut, ndigits: u16, weight: i16, sign: u16, dscale: u16) {
    out.extend_from_slice(&ndigits.to_be_bytes());
    out.extend_from_slice(&weight.to_be_bytes());
    out.extend_from_slice(&sign.to_be_bytes());
    out.extend_from_slice(&dscale.to_be_bytes());
}

/// Encode plain decimal text (`-12.50`, `3`, `.5`) in the binary `numeric` format:
/// base-10000 digit groups around the decimal point, trimmed of zero groups.
fn encode_numeric(text: &str, out: &mut bytes::BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    let text = text.trim();
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !is_digits(int_part) || !is_digits(frac_part) {
        return Err(format!("invalid numeric value: {text:?}").into());
    }

    let int_part = int_part.trim_start_matches('0');
    let dscale = u16::try_from(frac_part.len())?;

    // Left-pad the integer part and right-pad the fraction to whole groups of four.
    let int_pad = (4 - int_part.len() % 4) % 4;
    let frac_pad = (4 - frac_part.len() % 4) % 4;
    let padded: Vec<u8> = std::iter::repeat_n(b'0', int_pad)
        .chain(int_part.bytes())
        .chain(frac_part.bytes())
        .chain(std::iter::repeat_n(b'0', frac_pad))
        .collect();
    let mut groups: Vec<u16> = padded
        .chunks(4)
        .map(|chunk| chunk.iter().fold(0_u16, |acc, b| acc * 10 + u16::from(b - b'0')))
        .collect();
    let mut weight = i32::try_from((int_pad + int_part.len()) / 4)? - 1;

    let leading = groups.iter().take_while(|&&g| g == 0).count();
    groups.drain(..leading);
    weight -= i32::try_from(leading)?;
    while groups.last() == Some(&0) {
        groups.pop();
    }

    if groups.is_empty() {
        write_numeric_header(out, 0, 0, NUMERIC_POS, dscale);
        return Ok(IsNull::No);
    }
    let sign = if negative { NUMERIC_NEG } else { NUMERIC_POS };
    write_numeric_header(out, u16::try_from(groups.len())?, i16::try_from(weight)?, sign, dscale);
    for group in groups {
        out.extend_from_slice(&group.to_be_bytes());
    }
    Ok(IsNull::No)
}
