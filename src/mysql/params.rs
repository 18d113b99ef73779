use sqlx::MySql;
use sqlx::mysql::MySqlArguments;
use sqlx::query::Query;

use crate::types::DbValue;

pub(super) type MySqlQuery<'q> = Query<'q, MySql, MySqlArguments>;

pub(super) fn bind_params<'q>(mut query: MySqlQuery<'q>, params: &'q [DbValue]) -> MySqlQuery<'q> {
    for param in params {
        query = bind_param(query, param);
    }
    query
}

fn bind_param<'q>(query: MySqlQuery<'q>, param: &'q DbValue) -> MySqlQuery<'q> {
    match param {
        DbValue::Null => query.bind(None::<String>),
        DbValue::Int(v) => query.bind(*v),
        DbValue::Float(v) => query.bind(*v),
        DbValue::Text(v) => query.bind(v.as_str()),
        DbValue::Bool(v) => query.bind(*v),
        DbValue::Timestamp(v) => query.bind(*v),
        DbValue::Blob(v) => query.bind(v.as_slice()),
    }
}
