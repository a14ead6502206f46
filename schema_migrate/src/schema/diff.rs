//! Schema difference calculator
//!
//! This module compares the live schema with the target schema. Differences
//! are additive only: tables, columns and indexes that the target declares
//! and the database lacks. Nothing is ever dropped or altered.

use indexmap::IndexMap;

use crate::schema::types::{Column, DatabaseSchema, Index, Table};

/// Changes needed to bring the live schema up to the target schema
#[derive(Debug, Clone, Default)]
pub struct SchemaDiff {
    pub tables_to_create: Vec<Table>,
    /// Columns to add, keyed by table name
    pub columns_to_add: IndexMap<String, Vec<Column>>,
    /// Indexes to create on existing tables, keyed by table name
    pub indexes_to_create: IndexMap<String, Vec<Index>>,
}

impl SchemaDiff {
    /// Generate a schema diff between the current and the target schema
    pub fn generate(current_schema: &DatabaseSchema, target_schema: &DatabaseSchema) -> Self {
        let mut diff = Self::default();

        for (table_name, target_table) in &target_schema.tables {
            let current_table = match current_schema.find_table(table_name) {
                Some(table) => table,
                None => {
                    diff.tables_to_create.push(target_table.clone());
                    continue;
                }
            };

            let add_columns: Vec<Column> = target_table
                .columns
                .iter()
                .filter(|col| !current_table.has_column(&col.name))
                .cloned()
                .collect();

            let mut add_indexes: Vec<Index> = Vec::new();

            // Added unique columns get a separate unique index
            for column in add_columns.iter().filter(|c| c.is_unique) {
                let name = format!("uni_{}_{}", table_name, column.name);
                if !current_table.has_index(&name) {
                    add_indexes.push(Index {
                        name,
                        columns: vec![column.name.clone()],
                        is_unique: true,
                    });
                }
            }

            add_indexes.extend(
                target_table
                    .indexes
                    .iter()
                    .filter(|idx| !current_table.has_index(&idx.name))
                    .cloned(),
            );

            if !add_columns.is_empty() {
                diff.columns_to_add.insert(table_name.clone(), add_columns);
            }
            if !add_indexes.is_empty() {
                diff.indexes_to_create.insert(table_name.clone(), add_indexes);
            }
        }

        diff
    }

    /// Check if the diff is empty (no changes needed)
    pub fn is_empty(&self) -> bool {
        self.tables_to_create.is_empty()
            && self.columns_to_add.is_empty()
            && self.indexes_to_create.is_empty()
    }
}
