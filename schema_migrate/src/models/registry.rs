//! Model registry for schema_migrate
//!
//! This module collects model definitions and converts them into the target
//! database schema the live database is compared against.

use indexmap::IndexMap;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::definition::{FieldDefinition, ModelDefinition, SchemaModel};
use crate::schema::types::{Column, DatabaseSchema, Index, PrimaryKey, Table};
use crate::utils::naming::{get_index_name, get_table_name};

/// Registry of model definitions, kept in registration order
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<ModelDefinition>,
}

impl ModelRegistry {
    /// Create a new model registry
    pub fn new() -> Self {
        Self { models: Vec::new() }
    }

    /// Create a registry from already loaded definitions
    pub fn from_definitions(models: Vec<ModelDefinition>) -> Self {
        Self { models }
    }

    /// Register a model type
    pub fn register<M: SchemaModel>(&mut self) -> &mut Self {
        self.register_definition(M::model_definition())
    }

    /// Register a model definition; a later definition with the same name replaces the earlier one
    pub fn register_definition(&mut self, model: ModelDefinition) -> &mut Self {
        match self.models.iter_mut().find(|m| m.name == model.name) {
            Some(existing) => *existing = model,
            None => self.models.push(model),
        }
        self
    }

    /// Get all registered models
    pub fn models(&self) -> &[ModelDefinition] {
        &self.models
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Resolve the table name of a model
    pub fn table_name(&self, model: &ModelDefinition, config: &Config) -> String {
        model.table_name.clone().unwrap_or_else(|| {
            get_table_name(
                &model.name,
                &config.schema.table_style,
                config.schema.pluralize_tables,
            )
        })
    }

    /// Convert registered models to database schema
    pub fn to_database_schema(&self, config: &Config) -> Result<DatabaseSchema> {
        let mut schema = DatabaseSchema::new(config.database.schema.clone());

        for model in &self.models {
            let table = self.model_to_table(model, config)?;
            if schema.tables.contains_key(&table.name) {
                return Err(Error::ModelRegistrationError(format!(
                    "Table {} is declared by more than one model",
                    table.name
                )));
            }
            schema.add_table(table);
        }

        Ok(schema)
    }

    fn model_to_table(&self, model: &ModelDefinition, config: &Config) -> Result<Table> {
        if model.fields.is_empty() {
            return Err(Error::ModelRegistrationError(format!(
                "Model {} has no fields",
                model.name
            )));
        }

        let table_name = self.table_name(model, config);
        let mut table = Table::new(&table_name);

        for field in &model.fields {
            let data_type = match &field.db_type {
                Some(t) => t.clone(),
                None => self.map_type_to_db_type(field, config)?,
            };

            // Primary keys are never nullable
            let nullable = !field.primary_key
                && field.nullable.unwrap_or(config.schema.default_nullable);

            table.add_column(Column {
                name: field.name.clone(),
                data_type,
                nullable,
                default: field.default.clone(),
                comment: field.comment.clone(),
                is_unique: field.unique,
            });
        }

        let pk_columns: Vec<String> = model
            .fields
            .iter()
            .filter(|f| f.primary_key)
            .map(|f| f.name.clone())
            .collect();

        if !pk_columns.is_empty() {
            table.set_primary_key(PrimaryKey {
                name: Some(format!("pk_{}", table_name)),
                columns: pk_columns,
            });
        }

        for index in self.collect_indexes(model, &table_name, config)? {
            table.add_index(index);
        }

        Ok(table)
    }

    /// Group indexed fields by index name; a shared name makes a composite index
    fn collect_indexes(
        &self,
        model: &ModelDefinition,
        table_name: &str,
        config: &Config,
    ) -> Result<Vec<Index>> {
        let mut indexes: IndexMap<String, Index> = IndexMap::new();

        for field in &model.fields {
            let spec = match &field.index {
                Some(spec) => spec,
                None => continue,
            };

            let name = spec.name.clone().unwrap_or_else(|| {
                get_index_name(
                    &config.schema.index_pattern,
                    table_name,
                    std::slice::from_ref(&field.name),
                )
            });

            let index = indexes.entry(name.clone()).or_insert_with(|| Index {
                name: name.clone(),
                columns: Vec::new(),
                is_unique: spec.unique,
            });

            if index.is_unique != spec.unique {
                return Err(Error::ModelRegistrationError(format!(
                    "Index {} on {} mixes unique and non-unique columns",
                    name, table_name
                )));
            }
            index.columns.push(field.name.clone());
        }

        Ok(indexes.into_values().collect())
    }

    /// Map a field's Rust type to a database type
    pub fn map_type_to_db_type(&self, field: &FieldDefinition, config: &Config) -> Result<String> {
        let rust_type: String = field.rust_type.chars().filter(|c| !c.is_whitespace()).collect();

        if let Some(custom_mappings) = &config.type_mapping.custom {
            for mapping in custom_mappings {
                if mapping.rust_type == rust_type {
                    return Ok(mapping.db_type.clone());
                }
            }
        }

        match rust_type.as_str() {
            "String" | "&str" => Ok(match field.size {
                Some(size) => format!("VARCHAR({})", size),
                None => "VARCHAR(255)".to_string(),
            }),
            "i8" | "i16" => Ok("SMALLINT".to_string()),
            "i32" => Ok("INTEGER".to_string()),
            "i64" | "isize" => Ok("BIGINT".to_string()),
            "u8" | "u16" | "u32" => Ok("INTEGER".to_string()),
            "u64" | "usize" => Ok("BIGINT".to_string()),
            "f32" => Ok("REAL".to_string()),
            "f64" => Ok("DOUBLE PRECISION".to_string()),
            "bool" => Ok("BOOLEAN".to_string()),
            t if t.contains("Vec<u8>") => Ok("BYTEA".to_string()),
            t if t.contains("NaiveDateTime") => Ok("TIMESTAMP".to_string()),
            t if t.contains("NaiveDate") => Ok("DATE".to_string()),
            t if t.contains("DateTime") => Ok("TIMESTAMP WITH TIME ZONE".to_string()),
            t if t.contains("Uuid") => Ok("UUID".to_string()),
            t if t.contains("Decimal") => Ok("NUMERIC(20,6)".to_string()),
            t if t.contains("Json") || t.contains("Value") => Ok("JSONB".to_string()),
            _ => Err(Error::TypeMappingError(format!(
                "No mapping found for Rust type: {} (field {})",
                field.rust_type, field.name
            ))),
        }
    }
}
