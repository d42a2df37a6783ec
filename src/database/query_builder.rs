use sqlx::{self, postgres::PgArguments, postgres::PgRow, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::filter::filter_where::FilterWhere;
use crate::filter::types::{FilterValue, SqlResult};
use crate::filter::TicketFilter;

/// SELECT over a fixed table and column list, narrowed by a [`TicketFilter`].
pub struct QueryBuilder<'a> {
    table_name: &'a str,
    columns: &'a str,
    filter: Option<&'a TicketFilter>,
    order_by: Option<&'a str>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(table_name: &'a str, columns: &'a str) -> Self {
        Self {
            table_name,
            columns,
            filter: None,
            order_by: None,
        }
    }

    pub fn filter(mut self, filter: &'a TicketFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, order_by: &'a str) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn to_sql(&self) -> SqlResult {
        let where_sql = match self.filter {
            Some(filter) => FilterWhere::generate(filter, 0),
            None => SqlResult { query: "1=1".to_string(), params: vec![] },
        };

        let mut query = format!(
            "SELECT {} FROM \"{}\" WHERE {}",
            self.columns, self.table_name, where_sql.query
        );
        if let Some(order_by) = self.order_by {
            query.push_str(" ORDER BY ");
            query.push_str(order_by);
        }

        SqlResult { query, params: where_sql.params }
    }

    pub async fn select_all<T>(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql_result = self.to_sql();
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q FilterValue,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        FilterValue::Text(s) => q.bind(s.as_str()),
        FilterValue::Id(id) => q.bind(*id),
        FilterValue::Timestamp(ts) => q.bind(*ts),
    }
}
