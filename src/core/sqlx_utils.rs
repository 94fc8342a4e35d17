use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgArguments, PgRow},
    query::QueryAs,
    Postgres,
};
use uuid::Uuid;

#[derive(Clone)]
pub enum SqlxBinds {
    String(String),
    Bool(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
}

pub fn binds_query_as<'a, T: for<'r> sqlx::FromRow<'r, PgRow>>(
    stmt: &'a str,
    binds: Vec<SqlxBinds>,
) -> QueryAs<'a, Postgres, T, PgArguments> {
    let mut q: QueryAs<'_, Postgres, T, PgArguments> = sqlx::query_as(stmt);
    for bind in binds.into_iter() {
        q = match bind {
            SqlxBinds::String(val) => q.bind(val),
            SqlxBinds::Bool(val) => q.bind(val),
            SqlxBinds::Uuid(val) => q.bind(val),
            SqlxBinds::DateTime(val) => q.bind(val),
        };
    }
    q
}

pub fn query_builder(
    select: Option<&str>,
    table_name: &str,
    wheres: &[String],
    order_by: &[&str],
    limit: Option<u32>,
    offset: Option<u32>,
) -> String {
    let mut stmt = format!("SELECT {} FROM {}", select.unwrap_or("*"), table_name);
    if !wheres.is_empty() {
        stmt.push_str(" WHERE ");
        stmt.push_str(&wheres.join(" AND "));
    }
    if !order_by.is_empty() {
        stmt.push_str(" ORDER BY ");
        stmt.push_str(&order_by.join(", "));
    }
    if let Some(limit) = limit {
        stmt.push_str(&format!(" LIMIT {}", limit));
    }
    if let Some(offset) = offset {
        stmt.push_str(&format!(" OFFSET {}", offset));
    }
    stmt
}
