use crate::{
    error::{ConnectorError, DbError},
    source::RelationalSource,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use model::{
    config::SourceConfig,
    core::value::Value,
    records::row::{Field, Row},
    schema::source::{Column, ForeignKey, Table},
};
use mysql_async::{Pool, prelude::*};
use tracing::{debug, info};

const QUERY_TABLE_NAMES_SQL: &str = include_str!("sql/table_names.sql");
const QUERY_TABLE_COLUMNS_SQL: &str = include_str!("sql/table_columns.sql");
const QUERY_TABLE_FOREIGN_KEYS_SQL: &str = include_str!("sql/table_foreign_keys.sql");

/// Relational source backed by a `mysql_async` pool. All queries are
/// read-only; introspection goes through `information_schema`.
#[derive(Clone)]
pub struct MySqlSource {
    pool: Pool,
    database: String,
}

impl MySqlSource {
    /// Builds the pool and verifies reachability with a ping query, so that
    /// unreachable hosts and bad credentials fail here rather than at the
    /// first fetch.
    pub async fn connect(config: &SourceConfig) -> Result<Self, ConnectorError> {
        let url = config.url();
        let opts = mysql_async::Opts::from_url(&url).map_err(mysql_async::Error::Url)?;
        let pool = Pool::new(opts);

        let mut conn = pool.get_conn().await?;
        let _: Option<i32> = conn.query_first("SELECT 1").await?;
        info!(database = %config.database, "connected to MySQL source");

        Ok(MySqlSource {
            pool,
            database: config.database.clone(),
        })
    }
}

#[async_trait]
impl RelationalSource for MySqlSource {
    fn kind(&self) -> &'static str {
        "mysql"
    }

    async fn table_names(&self) -> Result<Vec<String>, DbError> {
        let mut conn = self.pool.get_conn().await?;
        let names: Vec<String> = conn
            .exec(QUERY_TABLE_NAMES_SQL, (self.database.as_str(),))
            .await?;
        Ok(names)
    }

    async fn table_metadata(&self, table: &str) -> Result<Table, DbError> {
        let mut conn = self.pool.get_conn().await?;

        let column_rows: Vec<(String, String, String, Option<String>, String)> = conn
            .exec(QUERY_TABLE_COLUMNS_SQL, (self.database.as_str(), table))
            .await?;
        if column_rows.is_empty() {
            return Err(DbError::UnknownTable(table.to_string()));
        }

        let columns = column_rows
            .into_iter()
            .map(|(name, data_type, is_nullable, default, key)| Column {
                name,
                source_type: data_type,
                is_primary_key: key == "PRI",
                is_nullable: is_nullable.eq_ignore_ascii_case("yes"),
                default_value: default.map(Value::String),
            })
            .collect();

        let fk_rows: Vec<(String, String, String, String)> = conn
            .exec(
                QUERY_TABLE_FOREIGN_KEYS_SQL,
                (self.database.as_str(), table),
            )
            .await?;

        // Rows arrive ordered by constraint and ordinal; fold composite
        // constraints into one ForeignKey each.
        let mut foreign_keys: Vec<(String, ForeignKey)> = Vec::new();
        for (constraint, column, ref_table, ref_column) in fk_rows {
            match foreign_keys.last_mut() {
                Some((name, fk)) if *name == constraint => {
                    fk.columns.push(column);
                    fk.referenced_columns.push(ref_column);
                }
                _ => foreign_keys.push((
                    constraint,
                    ForeignKey {
                        columns: vec![column],
                        referenced_table: ref_table,
                        referenced_columns: vec![ref_column],
                    },
                )),
            }
        }

        Ok(Table {
            name: table.to_string(),
            columns,
            foreign_keys: foreign_keys.into_iter().map(|(_, fk)| fk).collect(),
        })
    }

    async fn fetch_page(
        &self,
        table: &str,
        limit: usize,
        offset: u64,
    ) -> Result<Vec<Row>, DbError> {
        let mut conn = self.pool.get_conn().await?;
        let sql = format!("SELECT * FROM {} LIMIT ? OFFSET ?", quote_ident(table));
        debug!(table, limit, offset, "fetching page");

        let rows: Vec<mysql_async::Row> = conn.exec(sql, (limit as u64, offset)).await?;
        rows.iter().map(to_model_row).collect()
    }

    async fn count(&self, table: &str) -> Result<u64, DbError> {
        let mut conn = self.pool.get_conn().await?;
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let count: Option<u64> = conn.query_first(sql).await?;
        Ok(count.unwrap_or(0))
    }

    async fn sample(&self, table: &str, limit: usize) -> Result<Vec<Row>, DbError> {
        let mut conn = self.pool.get_conn().await?;
        let sql = format!(
            "SELECT * FROM {} ORDER BY RAND() LIMIT ?",
            quote_ident(table)
        );
        let rows: Vec<mysql_async::Row> = conn.exec(sql, (limit as u64,)).await?;
        rows.iter().map(to_model_row).collect()
    }
}

fn quote_ident(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

fn to_model_row(row: &mysql_async::Row) -> Result<Row, DbError> {
    let mut fields = Vec::with_capacity(row.columns_ref().len());
    for (idx, column) in row.columns_ref().iter().enumerate() {
        let raw = row
            .as_ref(idx)
            .ok_or_else(|| DbError::Decode(format!("missing value at index {idx}")))?;
        fields.push(Field {
            name: column.name_str().into_owned(),
            value: convert_value(raw),
        });
    }
    Ok(Row::new(fields))
}

fn convert_value(value: &mysql_async::Value) -> Value {
    use mysql_async::Value as My;

    match value {
        My::NULL => Value::Null,
        My::Int(v) => Value::Int(*v),
        My::UInt(v) => Value::Uint(*v),
        My::Float(v) => Value::Float(*v as f64),
        My::Double(v) => Value::Float(*v),
        My::Bytes(bytes) => match String::from_utf8(bytes.clone()) {
            Ok(text) => Value::String(text),
            Err(_) => Value::Bytes(bytes.clone()),
        },
        My::Date(year, month, day, hour, minute, second, micro) => {
            convert_date(*year, *month, *day, *hour, *minute, *second, *micro)
        }
        My::Time(negative, days, hours, minutes, seconds, _micro) => {
            let sign = if *negative { "-" } else { "" };
            let total_hours = u32::from(*hours) + days * 24;
            Value::String(format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}"))
        }
    }
}

fn convert_date(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8, micro: u32) -> Value {
    let Some(date) = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
    else {
        return Value::Null;
    };

    if hour == 0 && minute == 0 && second == 0 && micro == 0 {
        return Value::Date(date);
    }

    date.and_hms_micro_opt(
        u32::from(hour),
        u32::from(minute),
        u32::from(second),
        micro,
    )
    .map(|dt| Value::Timestamp(dt.and_utc()))
    .unwrap_or(Value::Null)
}
