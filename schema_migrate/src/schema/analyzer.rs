//! Database schema analyzer
//!
//! This module introspects the live database into a [`DatabaseSchema`]:
//! tables, columns, primary keys and secondary indexes.

use async_trait::async_trait;
use indexmap::IndexMap;
use sqlx::{FromRow, MySql, Pool, Postgres, Row, Sqlite};

use crate::db::connection::DatabaseConnection;
use crate::error::Result;
use crate::schema::types::{Column, DatabaseSchema, Index, PrimaryKey, Table};
use crate::utils::naming::quote_identifier;

/// Schema analyzer trait
#[async_trait]
pub trait Analyzer {
    /// Analyze the database schema
    async fn analyze_schema(&self, schema_name: Option<&str>) -> Result<DatabaseSchema> {
        let mut db_schema = DatabaseSchema::new(schema_name.map(str::to_string));
        db_schema.tables = self.analyze_tables(schema_name).await?;
        Ok(db_schema)
    }

    /// Analyze table definitions
    async fn analyze_tables(&self, schema_name: Option<&str>) -> Result<IndexMap<String, Table>>;
}

/// Schema analyzer for database schema introspection
#[derive(Debug, Clone)]
pub struct SchemaAnalyzer {
    connection: DatabaseConnection,
    schema_name: Option<String>,
}

impl SchemaAnalyzer {
    /// Create a new schema analyzer
    pub fn new(connection: DatabaseConnection, schema_name: Option<String>) -> Self {
        Self {
            connection,
            schema_name,
        }
    }

    /// Analyze the current database schema
    pub async fn analyze(&self) -> Result<DatabaseSchema> {
        let schema_name = self.schema_name.as_deref();
        let schema = match &self.connection {
            DatabaseConnection::Postgres(pool) => {
                PostgresAnalyzer { pool }
                    .analyze_schema(Some(schema_name.unwrap_or("public")))
                    .await?
            }
            DatabaseConnection::MySql(pool) => MySqlAnalyzer { pool }.analyze_schema(schema_name).await?,
            DatabaseConnection::Sqlite(pool) => SqliteAnalyzer { pool }.analyze_schema(None).await?,
        };

        tracing::debug!(
            driver = self.connection.driver(),
            tables = schema.tables.len(),
            "Analyzed database schema"
        );
        Ok(schema)
    }
}

#[derive(FromRow)]
struct TableRow {
    table_name: String,
}

#[derive(FromRow)]
struct ColumnRow {
    column_name: String,
    data_type: String,
    is_nullable: String,
    column_default: Option<String>,
}

#[derive(FromRow)]
struct PrimaryKeyRow {
    constraint_name: String,
    column_name: String,
}

#[derive(FromRow)]
struct IndexRow {
    index_name: String,
    column_name: String,
    is_unique: bool,
}

fn group_indexes(rows: Vec<IndexRow>) -> Vec<Index> {
    let mut indexes: IndexMap<String, Index> = IndexMap::new();
    for row in rows {
        indexes
            .entry(row.index_name.clone())
            .or_insert_with(|| Index {
                name: row.index_name,
                columns: Vec::new(),
                is_unique: row.is_unique,
            })
            .columns
            .push(row.column_name);
    }
    indexes.into_values().collect()
}

fn primary_key(rows: Vec<PrimaryKeyRow>) -> Option<PrimaryKey> {
    let name = rows.first()?.constraint_name.clone();
    Some(PrimaryKey {
        name: Some(name),
        columns: rows.into_iter().map(|r| r.column_name).collect(),
    })
}

fn to_column(row: ColumnRow) -> Column {
    Column {
        name: row.column_name,
        data_type: row.data_type,
        nullable: row.is_nullable == "YES",
        default: row.column_default,
        comment: None,
        is_unique: false,
    }
}

/// PostgreSQL schema analyzer
struct PostgresAnalyzer<'a> {
    pool: &'a Pool<Postgres>,
}

#[async_trait]
impl<'a> Analyzer for PostgresAnalyzer<'a> {
    async fn analyze_tables(&self, schema_name: Option<&str>) -> Result<IndexMap<String, Table>> {
        let schema = schema_name.unwrap_or("public");
        let mut tables = IndexMap::new();

        let sql = r#"
            SELECT table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = $1 AND table_type = 'BASE TABLE'
            ORDER BY table_name
        "#;

        let table_rows = sqlx::query_as::<_, TableRow>(sql)
            .bind(schema)
            .fetch_all(self.pool)
            .await?;

        for row in table_rows {
            let table_name = row.table_name;
            let mut table = Table::new(&table_name);

            let sql = r#"
                SELECT
                    column_name::text AS column_name,
                    CASE
                        WHEN data_type = 'character varying' AND character_maximum_length IS NOT NULL
                            THEN 'varchar(' || character_maximum_length || ')'
                        ELSE data_type::text
                    END AS data_type,
                    is_nullable::text AS is_nullable,
                    column_default::text AS column_default
                FROM information_schema.columns
                WHERE table_schema = $1 AND table_name = $2
                ORDER BY ordinal_position
            "#;

            let column_rows = sqlx::query_as::<_, ColumnRow>(sql)
                .bind(schema)
                .bind(&table_name)
                .fetch_all(self.pool)
                .await?;
            for col in column_rows {
                table.add_column(to_column(col));
            }

            let sql = r#"
                SELECT
                    tc.constraint_name::text AS constraint_name,
                    kcu.column_name::text AS column_name
                FROM information_schema.table_constraints tc
                JOIN information_schema.key_column_usage kcu
                    ON tc.constraint_name = kcu.constraint_name
                    AND tc.table_schema = kcu.table_schema
                WHERE tc.constraint_type = 'PRIMARY KEY'
                    AND tc.table_schema = $1
                    AND tc.table_name = $2
                ORDER BY kcu.ordinal_position
            "#;

            let pk_rows = sqlx::query_as::<_, PrimaryKeyRow>(sql)
                .bind(schema)
                .bind(&table_name)
                .fetch_all(self.pool)
                .await?;
            table.primary_key = primary_key(pk_rows);

            let sql = r#"
                SELECT
                    i.relname::text AS index_name,
                    a.attname::text AS column_name,
                    ix.indisunique AS is_unique
                FROM pg_index ix
                JOIN pg_class i ON i.oid = ix.indexrelid
                JOIN pg_class t ON t.oid = ix.indrelid
                JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
                JOIN pg_namespace n ON n.oid = t.relnamespace
                WHERE t.relname = $1
                    AND n.nspname = $2
                    AND NOT ix.indisprimary
                ORDER BY i.relname, array_position(ix.indkey::int2[], a.attnum)
            "#;

            let index_rows = sqlx::query_as::<_, IndexRow>(sql)
                .bind(&table_name)
                .bind(schema)
                .fetch_all(self.pool)
                .await?;
            table.indexes = group_indexes(index_rows);

            tables.insert(table_name, table);
        }

        Ok(tables)
    }
}

/// MySQL schema analyzer; without a schema name the connected database is used
struct MySqlAnalyzer<'a> {
    pool: &'a Pool<MySql>,
}

impl<'a> MySqlAnalyzer<'a> {
    fn schema_filter(schema_name: Option<&str>) -> &'static str {
        match schema_name {
            Some(_) => "table_schema = ?",
            None => "table_schema = DATABASE()",
        }
    }
}

#[async_trait]
impl<'a> Analyzer for MySqlAnalyzer<'a> {
    async fn analyze_tables(&self, schema_name: Option<&str>) -> Result<IndexMap<String, Table>> {
        let filter = Self::schema_filter(schema_name);
        let mut tables = IndexMap::new();

        let sql = format!(
            "SELECT CAST(table_name AS CHAR) AS table_name \
             FROM information_schema.tables \
             WHERE {} AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
            filter
        );
        let mut query = sqlx::query_as::<_, TableRow>(&sql);
        if let Some(schema) = schema_name {
            query = query.bind(schema);
        }
        let table_rows = query.fetch_all(self.pool).await?;

        for row in table_rows {
            let table_name = row.table_name;
            let mut table = Table::new(&table_name);

            let sql = format!(
                "SELECT CAST(column_name AS CHAR) AS column_name, \
                        CAST(column_type AS CHAR) AS data_type, \
                        CAST(is_nullable AS CHAR) AS is_nullable, \
                        CAST(column_default AS CHAR) AS column_default \
                 FROM information_schema.columns \
                 WHERE {} AND table_name = ? \
                 ORDER BY ordinal_position",
                filter
            );
            let mut query = sqlx::query_as::<_, ColumnRow>(&sql);
            if let Some(schema) = schema_name {
                query = query.bind(schema);
            }
            for col in query.bind(&table_name).fetch_all(self.pool).await? {
                table.add_column(to_column(col));
            }

            let sql = format!(
                "SELECT CAST(index_name AS CHAR) AS index_name, \
                        CAST(column_name AS CHAR) AS column_name, \
                        CAST(non_unique AS SIGNED) AS non_unique \
                 FROM information_schema.statistics \
                 WHERE {} AND table_name = ? \
                 ORDER BY index_name, seq_in_index",
                filter
            );
            let mut query = sqlx::query(&sql);
            if let Some(schema) = schema_name {
                query = query.bind(schema);
            }

            let mut pk_rows = Vec::new();
            let mut index_rows = Vec::new();
            for row in query.bind(&table_name).fetch_all(self.pool).await? {
                let index_name: String = row.try_get("index_name")?;
                let column_name: String = row.try_get("column_name")?;
                let non_unique: i64 = row.try_get("non_unique")?;

                if index_name == "PRIMARY" {
                    pk_rows.push(PrimaryKeyRow {
                        constraint_name: index_name,
                        column_name,
                    });
                } else {
                    index_rows.push(IndexRow {
                        index_name,
                        column_name,
                        is_unique: non_unique == 0,
                    });
                }
            }
            table.primary_key = primary_key(pk_rows);
            table.indexes = group_indexes(index_rows);

            tables.insert(table_name, table);
        }

        Ok(tables)
    }
}

/// SQLite schema analyzer
struct SqliteAnalyzer<'a> {
    pool: &'a Pool<Sqlite>,
}

#[async_trait]
impl<'a> Analyzer for SqliteAnalyzer<'a> {
    async fn analyze_tables(&self, _schema_name: Option<&str>) -> Result<IndexMap<String, Table>> {
        let mut tables = IndexMap::new();

        let sql = r#"SELECT name AS table_name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'"#;
        let table_rows = sqlx::query_as::<_, TableRow>(sql)
            .fetch_all(self.pool)
            .await?;

        for row in table_rows {
            let table_name = row.table_name;
            let quoted = quote_identifier(&table_name, "sqlite");
            let mut table = Table::new(&table_name);

            let pragma = format!("PRAGMA table_info({})", quoted);
            let mut pk_columns: Vec<(i64, String)> = Vec::new();
            for col in sqlx::query(&pragma).fetch_all(self.pool).await? {
                let name: String = col.try_get("name")?;
                let data_type: String = col.try_get("type")?;
                let notnull: i64 = col.try_get("notnull")?;
                let dflt_value: Option<String> = col.try_get("dflt_value")?;
                let pk: i64 = col.try_get("pk")?;

                if pk > 0 {
                    pk_columns.push((pk, name.clone()));
                }
                table.add_column(Column {
                    name,
                    data_type,
                    nullable: notnull == 0 && pk == 0,
                    default: dflt_value,
                    comment: None,
                    is_unique: false,
                });
            }

            if !pk_columns.is_empty() {
                pk_columns.sort();
                table.set_primary_key(PrimaryKey {
                    name: None,
                    columns: pk_columns.into_iter().map(|(_, name)| name).collect(),
                });
            }

            let pragma = format!("PRAGMA index_list({})", quoted);
            for idx in sqlx::query(&pragma).fetch_all(self.pool).await? {
                let index_name: String = idx.try_get("name")?;
                let unique: i64 = idx.try_get("unique")?;
                let origin: String = idx.try_get("origin")?;
                if origin == "pk" {
                    continue;
                }

                let pragma = format!("PRAGMA index_info({})", quote_identifier(&index_name, "sqlite"));
                let mut columns = Vec::new();
                for info in sqlx::query(&pragma).fetch_all(self.pool).await? {
                    let column: Option<String> = info.try_get("name")?;
                    columns.extend(column);
                }

                // Inline UNIQUE constraints show up as automatic indexes
                if origin == "u" {
                    if let [column] = columns.as_slice() {
                        if let Some(col) = table.columns.iter_mut().find(|c| &c.name == column) {
                            col.is_unique = true;
                        }
                        continue;
                    }
                }

                table.add_index(Index {
                    name: index_name,
                    columns,
                    is_unique: unique != 0,
                });
            }

            tables.insert(table_name, table);
        }

        Ok(tables)
    }
}
