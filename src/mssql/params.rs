use tiberius::Query;

use crate::types::DbValue;

/// Bind parameters to the query in order; `@P1` is the first.
pub(super) fn bind_query_params<'a>(sql: &'a str, params: &[DbValue]) -> Query<'a> {
    let mut query = Query::new(sql);
    for param in params {
        match param {
            DbValue::Null => query.bind(Option::<String>::None),
            DbValue::Int(i) => query.bind(*i),
            DbValue::Float(f) => query.bind(*f),
            DbValue::Text(s) => query.bind(s.clone()),
            DbValue::Bool(b) => query.bind(*b),
            DbValue::Timestamp(dt) => query.bind(*dt),
            DbValue::Blob(bytes) => query.bind(bytes.clone()),
        }
    }
    query
}
