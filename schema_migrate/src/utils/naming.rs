//! Naming utilities for schema_migrate
//!
//! Naming conventions for tables and indexes, identifier quoting per dialect,
//! and file-name-safe descriptions for migration scripts.

use inflector::Inflector;

/// Apply a naming convention to a string
pub fn apply_naming_convention(name: &str, convention: &str) -> String {
    match convention {
        "snake_case" => name.to_snake_case(),
        "camel_case" => name.to_camel_case(),
        "pascal_case" => name.to_pascal_case(),
        "kebab_case" => name.to_kebab_case(),
        "screaming_snake_case" => name.to_screaming_snake_case(),
        _ => name.to_string(), // Default: keep as is
    }
}

/// Format a name according to a pattern with placeholders
pub fn format_name(pattern: &str, replacements: &[(&str, &str)]) -> String {
    let mut result = pattern.to_string();

    for (placeholder, value) in replacements {
        result = result.replace(&format!("{{{}}}", placeholder), value);
    }

    result
}

/// Get table name from a model name according to convention
pub fn get_table_name(model_name: &str, style: &str, pluralize: bool) -> String {
    let name = apply_naming_convention(model_name, style);

    if !pluralize {
        return name;
    }

    // Irregular plurals the inflector gets wrong
    match name.to_lowercase().as_str() {
        "person" => "people".to_string(),
        "child" => "children".to_string(),
        "mouse" => "mice".to_string(),
        _ => name.to_plural(),
    }
}

/// Get index name from table and columns according to pattern
pub fn get_index_name(pattern: &str, table_name: &str, columns: &[String]) -> String {
    let columns_str = columns.join("_");

    format_name(pattern, &[("table", table_name), ("columns", &columns_str)])
}

/// Quote an identifier for the given driver
pub fn quote_identifier(name: &str, driver: &str) -> String {
    match driver.to_lowercase().as_str() {
        "postgres" => format!("\"{}\"", name),
        "mysql" | "sqlite" => format!("`{}`", name),
        _ => name.to_string(),
    }
}

/// Turn a free-form description into the description part of a script file name.
///
/// The result never contains `.`, which separates the direction and suffix.
pub fn format_file_name(description: &str) -> String {
    let sanitized: String = description
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();

    sanitized.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_naming_convention() {
        assert_eq!(apply_naming_convention("UserProfile", "snake_case"), "user_profile");
        assert_eq!(apply_naming_convention("user_profile", "camel_case"), "userProfile");
        assert_eq!(apply_naming_convention("user_profile", "pascal_case"), "UserProfile");
        assert_eq!(apply_naming_convention("UserProfile", "unknown"), "UserProfile");
    }

    #[test]
    fn test_table_name() {
        assert_eq!(get_table_name("UserProfile", "snake_case", true), "user_profiles");
        assert_eq!(get_table_name("UserProfile", "snake_case", false), "user_profile");
        assert_eq!(get_table_name("Person", "snake_case", true), "people");
        assert_eq!(get_table_name("Category", "snake_case", true), "categories");
    }

    #[test]
    fn test_index_name() {
        assert_eq!(
            get_index_name("idx_{table}_{columns}", "users", &["rank".to_string()]),
            "idx_users_rank"
        );
        assert_eq!(
            get_index_name(
                "ix_{table}_{columns}",
                "orders",
                &["customer_id".to_string(), "order_date".to_string()]
            ),
            "ix_orders_customer_id_order_date"
        );
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users", "postgres"), "\"users\"");
        assert_eq!(quote_identifier("users", "mysql"), "`users`");
        assert_eq!(quote_identifier("users", "sqlite"), "`users`");
    }

    #[test]
    fn test_format_file_name() {
        assert_eq!(format_file_name("Add user.rank"), "add_user_rank");
        assert_eq!(format_file_name("script"), "script");
        assert!(!format_file_name("v1.2.3").contains('.'));
    }
}
