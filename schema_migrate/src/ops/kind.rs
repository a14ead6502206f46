//! Operation kinds

use std::fmt;

/// A DDL statement kind and the kind of statement that undoes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationKind {
    CreateTable,
    AlterTable,
    AddColumn,
    AddIndex,
    CreateUniqueIndex,
    CreateIndex,
}

impl MigrationKind {
    /// Classification order: the first kind whose forward pattern occurs in a
    /// statement wins, so more specific patterns must come first.
    pub const ORDERED: [MigrationKind; 6] = [
        MigrationKind::CreateTable,
        MigrationKind::AlterTable,
        MigrationKind::AddColumn,
        MigrationKind::AddIndex,
        MigrationKind::CreateUniqueIndex,
        MigrationKind::CreateIndex,
    ];

    /// Substring identifying the forward statement
    pub fn forward_substr(&self) -> &'static str {
        match self {
            MigrationKind::CreateTable => "CREATE TABLE",
            MigrationKind::AlterTable => "ALTER TABLE",
            MigrationKind::AddColumn => "ADD COLUMN",
            MigrationKind::AddIndex => "ADD INDEX",
            MigrationKind::CreateUniqueIndex => "CREATE UNIQUE INDEX",
            MigrationKind::CreateIndex => "CREATE INDEX",
        }
    }

    /// Substring naming the statement that reverses it
    pub fn reverse_substr(&self) -> &'static str {
        match self {
            MigrationKind::CreateTable => "DROP TABLE",
            MigrationKind::AlterTable => "ALTER TABLE",
            MigrationKind::AddColumn => "DROP COLUMN",
            MigrationKind::AddIndex | MigrationKind::CreateUniqueIndex | MigrationKind::CreateIndex => {
                "DROP INDEX"
            }
        }
    }

    /// First kind in [`MigrationKind::ORDERED`] whose forward pattern is contained in `sql`.
    ///
    /// Matching is plain case-sensitive substring containment.
    pub fn matching(sql: &str) -> Option<Self> {
        Self::ORDERED
            .iter()
            .copied()
            .find(|kind| sql.contains(kind.forward_substr()))
    }
}

impl fmt::Display for MigrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.forward_substr(), self.reverse_substr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_unique_index_precedes_plain_index() {
        let position = |kind| MigrationKind::ORDERED.iter().position(|k| *k == kind);
        assert!(position(MigrationKind::CreateUniqueIndex) < position(MigrationKind::CreateIndex));
    }

    #[test]
    fn test_table_order() {
        let forward: Vec<&str> = MigrationKind::ORDERED.iter().map(|k| k.forward_substr()).collect();
        assert_eq!(
            forward,
            vec![
                "CREATE TABLE",
                "ALTER TABLE",
                "ADD COLUMN",
                "ADD INDEX",
                "CREATE UNIQUE INDEX",
                "CREATE INDEX",
            ]
        );
    }

    #[rstest]
    #[case("CREATE TABLE `users` (`id` INTEGER)", Some(MigrationKind::CreateTable))]
    #[case("ALTER TABLE `users` ADD `age` bigint", Some(MigrationKind::AlterTable))]
    #[case("ALTER TABLE `users` ADD COLUMN `age` bigint", Some(MigrationKind::AlterTable))]
    #[case("CREATE UNIQUE INDEX `idx_users_code` ON `users`(`code`)", Some(MigrationKind::CreateUniqueIndex))]
    #[case("CREATE INDEX `idx_users_rank` ON `users`(`rank`)", Some(MigrationKind::CreateIndex))]
    #[case("COMMENT ON COLUMN \"users\".\"name\" IS 'x'", None)]
    #[case("create table users (id int)", None)]
    fn test_matching(#[case] sql: &str, #[case] expected: Option<MigrationKind>) {
        assert_eq!(MigrationKind::matching(sql), expected);
    }
}
