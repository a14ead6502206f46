//! Migration generator
//!
//! This module renders a [`SchemaDiff`] as DDL statements for the configured
//! driver, one statement per change and without a trailing `;`.

use crate::error::{Error, Result};
use crate::schema::diff::SchemaDiff;
use crate::schema::types::{Column, Index, Table};
use crate::utils::naming::quote_identifier;

/// Migration SQL generator
#[derive(Debug, Clone)]
pub struct MigrationGenerator {
    driver: String,
}

impl MigrationGenerator {
    /// Create a new migration generator for a driver (`postgres`, `mysql` or `sqlite`)
    pub fn new(driver: &str) -> Result<Self> {
        match driver {
            "postgres" | "mysql" | "sqlite" => Ok(Self {
                driver: driver.to_string(),
            }),
            _ => Err(Error::MigrationError(format!(
                "Unsupported database type: {}",
                driver
            ))),
        }
    }

    /// Generate migration SQL from a schema diff
    pub fn generate_migration_sql(&self, diff: &SchemaDiff) -> Vec<String> {
        let mut statements = Vec::new();

        for table in &diff.tables_to_create {
            statements.extend(self.create_table_sql(table));
            for index in &table.indexes {
                statements.push(self.create_index_sql(&table.name, index));
            }
        }

        for (table_name, columns) in &diff.columns_to_add {
            for column in columns {
                statements.extend(self.add_column_sql(table_name, column));
            }
        }

        for (table_name, indexes) in &diff.indexes_to_create {
            for index in indexes {
                statements.push(self.create_index_sql(table_name, index));
            }
        }

        statements
    }

    fn quote(&self, name: &str) -> String {
        quote_identifier(name, &self.driver)
    }

    fn quote_list(&self, names: &[String]) -> String {
        names
            .iter()
            .map(|n| self.quote(n))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The single integer primary key column that becomes auto-incrementing
    fn serial_column<'t>(&self, table: &'t Table) -> Option<&'t Column> {
        let pk = table.primary_key.as_ref()?;
        if pk.columns.len() != 1 {
            return None;
        }
        table
            .columns
            .iter()
            .find(|c| c.name == pk.columns[0])
            .filter(|c| is_integer_type(&c.data_type))
    }

    /// Generate SQL to create a table; Postgres comments follow as separate statements
    pub fn create_table_sql(&self, table: &Table) -> Vec<String> {
        let serial = self.serial_column(table).map(|c| c.name.clone());
        let mut definitions = Vec::new();

        for column in &table.columns {
            if serial.as_deref() == Some(column.name.as_str()) {
                definitions.push(self.serial_column_definition(column));
            } else {
                definitions.push(self.column_definition(column, true));
            }
        }

        if serial.is_none() {
            if let Some(pk) = &table.primary_key {
                definitions.push(format!("PRIMARY KEY ({})", self.quote_list(&pk.columns)));
            }
        }

        let mut statements = vec![format!(
            "CREATE TABLE {} ({})",
            self.quote(&table.name),
            definitions.join(",")
        )];
        statements.extend(
            table
                .columns
                .iter()
                .filter_map(|column| self.comment_sql(&table.name, column)),
        );
        statements
    }

    /// Generate SQL to add one column to an existing table
    pub fn add_column_sql(&self, table_name: &str, column: &Column) -> Vec<String> {
        let mut statements = vec![format!(
            "ALTER TABLE {} ADD {}",
            self.quote(table_name),
            self.column_definition(column, false)
        )];
        statements.extend(self.comment_sql(table_name, column));
        statements
    }

    /// Generate SQL to create one index
    pub fn create_index_sql(&self, table_name: &str, index: &Index) -> String {
        format!(
            "CREATE {}INDEX {} ON {}({})",
            if index.is_unique { "UNIQUE " } else { "" },
            self.quote(&index.name),
            self.quote(table_name),
            self.quote_list(&index.columns)
        )
    }

    fn column_definition(&self, column: &Column, inline_unique: bool) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote(&column.name),
            self.translate_data_type(&column.data_type)
        );
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            sql.push_str(&format!(" DEFAULT {}", default));
        }
        if inline_unique && column.is_unique {
            sql.push_str(" UNIQUE");
        }
        if self.driver == "mysql" {
            if let Some(comment) = &column.comment {
                sql.push_str(&format!(" COMMENT '{}'", comment.replace('\'', "''")));
            }
        }
        sql
    }

    fn serial_column_definition(&self, column: &Column) -> String {
        let name = self.quote(&column.name);
        match self.driver.as_str() {
            "sqlite" => format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", name),
            "mysql" => format!(
                "{} {} NOT NULL AUTO_INCREMENT PRIMARY KEY",
                name,
                self.translate_data_type(&column.data_type)
            ),
            _ => {
                let serial = if column.data_type.eq_ignore_ascii_case("bigint") {
                    "BIGSERIAL"
                } else {
                    "SERIAL"
                };
                format!("{} {} PRIMARY KEY", name, serial)
            }
        }
    }

    fn comment_sql(&self, table_name: &str, column: &Column) -> Option<String> {
        if self.driver != "postgres" {
            return None;
        }
        column.comment.as_ref().map(|comment| {
            format!(
                "COMMENT ON COLUMN {}.{} IS '{}'",
                self.quote(table_name),
                self.quote(&column.name),
                comment.replace('\'', "''")
            )
        })
    }

    fn translate_data_type(&self, data_type: &str) -> String {
        match self.driver.as_str() {
            "mysql" => translate_data_type_for_mysql(data_type),
            "sqlite" => translate_data_type_for_sqlite(data_type),
            _ => data_type.to_string(),
        }
    }
}

fn is_integer_type(data_type: &str) -> bool {
    matches!(
        data_type.to_lowercase().as_str(),
        "smallint" | "integer" | "int" | "int4" | "bigint" | "int8"
    )
}

/// Translate a PostgreSQL-flavoured data type to MySQL
fn translate_data_type_for_mysql(data_type: &str) -> String {
    let lower = data_type.to_lowercase();

    match lower.as_str() {
        "integer" | "int4" => "INT".to_string(),
        "int8" => "BIGINT".to_string(),
        "real" | "float4" => "FLOAT".to_string(),
        "double precision" | "float8" => "DOUBLE".to_string(),
        "timestamp with time zone" | "timestamptz" => "TIMESTAMP".to_string(),
        "boolean" | "bool" => "TINYINT(1)".to_string(),
        "bytea" => "BLOB".to_string(),
        "json" | "jsonb" => "JSON".to_string(),
        "uuid" => "CHAR(36)".to_string(),
        t if t.starts_with("numeric") => format!("DECIMAL{}", &t["numeric".len()..]),
        // Use the type as-is if no mapping is found
        _ => data_type.to_string(),
    }
}

/// Translate a data type to SQLite; declared names are kept where affinity rules handle them
fn translate_data_type_for_sqlite(data_type: &str) -> String {
    match data_type.to_lowercase().as_str() {
        "bytea" => "BLOB".to_string(),
        "json" | "jsonb" | "uuid" => "TEXT".to_string(),
        "boolean" | "bool" => "NUMERIC".to_string(),
        _ => data_type.to_string(),
    }
}
