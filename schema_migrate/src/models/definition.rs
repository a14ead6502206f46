//! Declarative model definitions

use serde::{Deserialize, Serialize};

/// A model that can be compared against the database.
///
/// Usually implemented with `#[derive(SchemaModel)]`.
pub trait SchemaModel {
    /// Describe the table this model maps to
    fn model_definition() -> ModelDefinition;
}

/// One model: a table and its fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub name: String,
    /// Explicit table name; derived from `name` by the naming convention when absent
    #[serde(default)]
    pub table_name: Option<String>,
    pub fields: Vec<FieldDefinition>,
}

impl ModelDefinition {
    /// Create an empty model with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            table_name: None,
            fields: Vec::new(),
        }
    }

    /// Set the table name
    pub fn table(mut self, table_name: &str) -> Self {
        self.table_name = Some(table_name.to_string());
        self
    }

    /// Append a field
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }
}

/// Represents a field definition from a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Column name
    pub name: String,
    #[serde(default)]
    pub rust_type: String,
    #[serde(default)]
    pub db_type: Option<String>,
    #[serde(default)]
    pub size: Option<u32>,
    /// `None` defers to `schema.default_nullable`
    #[serde(default)]
    pub nullable: Option<bool>,
    #[serde(default)]
    pub primary_key: bool,
    /// Inline UNIQUE constraint on the column
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub index: Option<IndexSpec>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl FieldDefinition {
    /// Create a new field with the given column name and Rust type
    pub fn new(name: &str, rust_type: &str) -> Self {
        Self {
            name: name.to_string(),
            rust_type: rust_type.to_string(),
            db_type: None,
            size: None,
            nullable: None,
            primary_key: false,
            unique: false,
            index: None,
            default: None,
            comment: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn db_type(mut self, db_type: &str) -> Self {
        self.db_type = Some(db_type.to_string());
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn default_value(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    /// Put the column in an index; fields sharing an index name form a composite index
    pub fn index(mut self, name: Option<&str>, unique: bool) -> Self {
        self.index = Some(IndexSpec {
            name: name.map(str::to_string),
            unique,
        });
        self
    }
}

/// Index membership of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name; generated from `schema.index_pattern` when absent
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unique: bool,
}
