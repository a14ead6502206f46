mod common;

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use schema_migrate::ops::{MigrationOp, MigrationOps};
use schema_migrate::scripts::{ScriptNaming, ScriptOptions, VersionType, WriteConfirm};
use schema_migrate::{get_status, next_script_info, Error, ScriptAction};

use common::{write_script, FakeEngine};

struct Decline;

impl WriteConfirm for Decline {
    fn confirm(&self, _path: &Path) -> schema_migrate::Result<bool> {
        Ok(false)
    }
}

fn ops(sqls: &[&str]) -> MigrationOps {
    sqls.iter().filter_map(|sql| MigrationOp::classify(sql)).collect()
}

#[tokio::test]
async fn test_first_script_in_missing_directory() {
    let dir = tempdir().unwrap();
    let options = ScriptOptions::new(dir.path().join("migrations"));
    let naming = ScriptNaming::new(VersionType::Next, "Add Users");

    let info = next_script_info(&FakeEngine::at(None), &options, &naming)
        .await
        .unwrap();
    assert_eq!(info.action, ScriptAction::CreateScript);
    assert_eq!(info.forward_name, "00001_add_users.up.sql");
    assert_eq!(info.reverse_name, "00001_add_users.down.sql");
    assert!(!info.script_exists(&options));

    let ops = ops(&["CREATE TABLE `users` (`id` INTEGER)"]);
    info.write_scripts(&ops, &options).unwrap();

    assert_eq!(
        fs::read_to_string(info.forward_path(&options)).unwrap(),
        "CREATE TABLE `users` (`id` INTEGER);\n"
    );
    assert_eq!(
        fs::read_to_string(info.reverse_path(&options)).unwrap(),
        "-- reverse -- CREATE TABLE `users` (`id` INTEGER);\nSELECT TODO / PANIC / RAISE / THROW; -- DROP TABLE; -- TODO\n"
    );

    // Creating the same pair twice is refused
    let err = info.write_scripts(&ops, &options).unwrap_err();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_update_rewrites_unapplied_pair() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_script(root, "00001_script.up.sql", "CREATE TABLE a (id INTEGER);\n");
    write_script(root, "00001_script.down.sql", "DROP TABLE a;\n");
    write_script(root, "00002_script.up.pgsql", "");
    write_script(root, "00002_script.down.pgsql", "");

    let options = ScriptOptions::new(root);
    let info = next_script_info(&FakeEngine::at(Some((1, false))), &options, &ScriptNaming::default())
        .await
        .unwrap();
    assert_eq!(info.action, ScriptAction::UpdateScript);
    assert_eq!(info.forward_name, "00002_script.up.pgsql");

    info.write_scripts(&ops(&["CREATE INDEX `idx_a_id` ON `a`(`id`)"]), &options)
        .unwrap();
    assert_eq!(
        fs::read_to_string(root.join("00002_script.up.pgsql")).unwrap(),
        "CREATE INDEX `idx_a_id` ON `a`(`id`);\n"
    );

    // The next new pair keeps the suffix of the first up script
    let info = next_script_info(&FakeEngine::at(Some((2, false))), &options, &ScriptNaming::default())
        .await
        .unwrap();
    assert_eq!(info.action, ScriptAction::CreateScript);
    assert_eq!(info.forward_name, "00003_script.up.sql");
}

#[tokio::test]
async fn test_create_with_stray_reverse_writes_nothing() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let options = ScriptOptions::new(root);

    let info = next_script_info(&FakeEngine::at(None), &options, &ScriptNaming::default())
        .await
        .unwrap();
    assert_eq!(info.action, ScriptAction::CreateScript);
    write_script(root, &info.reverse_name, "DROP TABLE t;\n");

    let err = info
        .write_scripts(&ops(&["CREATE TABLE `t` (`id` INTEGER)"]), &options)
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(!info.forward_path(&options).exists());
    assert_eq!(
        fs::read_to_string(info.reverse_path(&options)).unwrap(),
        "DROP TABLE t;\n"
    );
}

#[tokio::test]
async fn test_update_of_removed_pair_is_fatal() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_script(root, "00001_script.up.sql", "");
    write_script(root, "00001_script.down.sql", "");

    let options = ScriptOptions::new(root);
    let info = next_script_info(&FakeEngine::at(None), &options, &ScriptNaming::default())
        .await
        .unwrap();
    assert_eq!(info.action, ScriptAction::UpdateScript);

    fs::remove_file(root.join("00001_script.up.sql")).unwrap();
    let err = info.write_scripts(&MigrationOps::new(), &options).unwrap_err();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_dirty_database_is_fatal() {
    let dir = tempdir().unwrap();
    let options = ScriptOptions::new(dir.path());

    let err = next_script_info(&FakeEngine::at(Some((2, true))), &options, &ScriptNaming::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Dirty { version: 2 }));
}

#[tokio::test]
async fn test_dry_run_and_declined_writes() {
    let dir = tempdir().unwrap();
    let ops = ops(&["CREATE TABLE `t` (`id` INTEGER)"]);

    let mut options = ScriptOptions::new(dir.path().join("dry"));
    options.dry_run = true;
    let info = next_script_info(&FakeEngine::at(None), &options, &ScriptNaming::default())
        .await
        .unwrap();
    info.write_scripts(&ops, &options).unwrap();
    assert!(!options.scripts_root.exists());

    let mut options = ScriptOptions::new(dir.path().join("declined"));
    options.confirm_write = true;
    let info = next_script_info(&FakeEngine::at(None), &options, &ScriptNaming::default())
        .await
        .unwrap();
    info.write_scripts_with(&ops, &options, &Decline).unwrap();
    assert!(!info.script_exists(&options));
}

#[tokio::test]
async fn test_status_counts_pending_scripts() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    for version in ["00001", "00002", "00003"] {
        write_script(root, &format!("{}_script.up.sql", version), "");
        write_script(root, &format!("{}_script.down.sql", version), "");
    }

    let status = get_status(&FakeEngine::at(Some((1, false))), root, None, false)
        .await
        .unwrap();
    assert!(status.has_migrated);
    assert_eq!(status.database_version, 1);
    assert_eq!(status.latest_script_version, 3);
    assert_eq!(status.script_count, 3);
    assert_eq!(status.pending_versions, vec![2, 3]);
    assert!(!status.up_to_date);

    let status = get_status(&FakeEngine::at(None), root, None, false)
        .await
        .unwrap();
    assert!(!status.has_migrated);
    assert_eq!(status.pending_count, 3);

    let status = get_status(&FakeEngine::at(Some((3, true))), root, None, false)
        .await
        .unwrap();
    assert!(status.is_dirty);
    assert!(status.up_to_date);
}

#[tokio::test]
async fn test_status_without_scripts_directory() {
    let dir = tempdir().unwrap();

    let status = get_status(&FakeEngine::at(None), &dir.path().join("absent"), None, false)
        .await
        .unwrap();

    assert_eq!(status.script_count, 0);
    assert_eq!(status.latest_script_version, 0);
    assert!(status.up_to_date);
}
