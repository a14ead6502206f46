use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

use schema_migrate::config::load_models;
use schema_migrate::models::{FieldDefinition, IndexSpec};
use schema_migrate::{ModelDefinition, ModelRegistry, SchemaModel};

#[allow(dead_code)]
#[derive(SchemaModel)]
#[schema(table = "orders")]
struct Order {
    #[schema(primary_key)]
    id: i64,
    #[schema(size = 32, unique)]
    number: String,
    #[schema(index = "idx_orders_customer_placed")]
    customer_id: i64,
    #[schema(index = "idx_orders_customer_placed", comment = "placement time")]
    placed_at: chrono::NaiveDateTime,
    note: Option<String>,
    #[schema(column = "kind", db_type = "SMALLINT", default = "0", not_null)]
    r#type: i16,
}

#[allow(dead_code)]
#[derive(SchemaModel)]
struct LineItem {
    #[schema(primary_key)]
    id: i32,
}

#[test]
fn test_derived_definition() {
    let model = Order::model_definition();

    assert_eq!(model.name, "Order");
    assert_eq!(model.table_name.as_deref(), Some("orders"));

    let names: Vec<&str> = model.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["id", "number", "customer_id", "placed_at", "note", "kind"]
    );

    assert!(model.fields[0].primary_key);
    assert_eq!(model.fields[1].size, Some(32));
    assert!(model.fields[1].unique);
    assert_eq!(
        model.fields[2].index,
        Some(IndexSpec {
            name: Some("idx_orders_customer_placed".to_string()),
            unique: false,
        })
    );
    assert_eq!(model.fields[3].comment.as_deref(), Some("placement time"));
    assert_eq!(model.fields[4].rust_type, "String");
    assert_eq!(model.fields[4].nullable, Some(true));

    let kind = &model.fields[5];
    assert_eq!(kind.db_type.as_deref(), Some("SMALLINT"));
    assert_eq!(kind.default.as_deref(), Some("0"));
    assert_eq!(kind.nullable, Some(false));
}

#[test]
fn test_table_name_follows_naming_convention() {
    let model = LineItem::model_definition();
    assert_eq!(model.table_name, None);
    assert_eq!(
        model.fields,
        vec![FieldDefinition::new("id", "i32").primary_key()]
    );
}

#[test]
fn test_load_yaml_models() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("models.yaml");
    fs::write(
        &path,
        r#"
models:
  - name: User
    table_name: users
    fields:
      - name: id
        rust_type: u32
        primary_key: true
      - name: student_no
        rust_type: String
        index:
          unique: true
"#,
    )
    .unwrap();

    let models = load_models(path.to_str().unwrap()).unwrap();
    let expected = ModelDefinition::new("User")
        .table("users")
        .field(FieldDefinition::new("id", "u32").primary_key())
        .field(FieldDefinition::new("student_no", "String").index(None, true));
    assert_eq!(models, vec![expected]);

    let registry = ModelRegistry::from_definitions(models);
    assert!(!registry.is_empty());
}
