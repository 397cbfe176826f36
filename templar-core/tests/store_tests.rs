//! Record store error-message, atomic-write-safety, and status update tests.

use assert_fs::prelude::*;
use chrono::Utc;
use predicates::prelude::predicate;
use rstest::rstest;
use std::fs;
use templar_core::{
    store::records_path_at, DeviceType, Environment, FileRecordStore, ProjectName, RecordStore,
    StatusUpdate, StoreError, SyncStatus, TemplateName, TemplateRecord,
};

fn record(name: &str) -> TemplateRecord {
    TemplateRecord {
        name: TemplateName::from(name),
        project_name: ProjectName::from("campus"),
        device_family: vec![DeviceType::new("Switches and Hubs")],
        software_type: "IOS-XE".to_string(),
        in_lab: SyncStatus::NotInRepository,
        in_prod: SyncStatus::NotInRepository,
        in_github: false,
        create_date: Utc::now(),
        update_date: None,
    }
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let path = records_path_at(home.path());
    fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
    fs::write(&path, b": : corrupt : yaml : !!!\n  - broken: [unclosed").expect("write");

    let store = FileRecordStore::open_at(home.path());
    let err = store.list_all().unwrap_err();
    assert!(matches!(err, StoreError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("records.yaml"), "got: {err}");
}

#[test]
fn empty_file_is_an_empty_store() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".templar/records.yaml").write_str("").expect("write");
    let store = FileRecordStore::open_at(home.path());
    assert!(store.list_all().expect("list").is_empty());
}

// ---------------------------------------------------------------------------
// 2. Persistence
// ---------------------------------------------------------------------------

#[test]
fn insert_writes_camel_case_schema() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let mut store = FileRecordStore::open_at(home.path());
    store.insert(record("acl-basic")).expect("insert");

    home.child(".templar/records.yaml")
        .assert(predicate::str::contains("name: acl-basic"))
        .assert(predicate::str::contains("projectName: campus"))
        .assert(predicate::str::contains("inLab: NOT in Github"));
}

#[test]
fn list_all_is_sorted_by_name() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let mut store = FileRecordStore::open_at(home.path());
    for name in ["qos", "acl", "ntp"] {
        store.insert(record(name)).expect("insert");
    }
    let names: Vec<String> = store
        .list_all()
        .expect("list")
        .into_iter()
        .map(|r| r.name.0)
        .collect();
    assert_eq!(names, vec!["acl", "ntp", "qos"]);
}

// ---------------------------------------------------------------------------
// 3. Status updates
// ---------------------------------------------------------------------------

#[rstest]
#[case(Environment::Lab, SyncStatus::InSync)]
#[case(Environment::Lab, SyncStatus::NotFound)]
#[case(Environment::Prod, SyncStatus::OutOfSync)]
#[case(Environment::Prod, SyncStatus::ViewOnProd)]
fn update_status_persists_single_field(#[case] env: Environment, #[case] status: SyncStatus) {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let mut store = FileRecordStore::open_at(home.path());
    store.insert(record("acl-basic")).expect("insert");

    let name = TemplateName::from("acl-basic");
    assert!(store
        .update_status(&name, &StatusUpdate::status(env, status))
        .expect("update"));

    let reloaded = FileRecordStore::open_at(home.path())
        .find_by_name(&name)
        .expect("find")
        .expect("present");
    assert_eq!(reloaded.status(env), status);
    let other = match env {
        Environment::Lab => Environment::Prod,
        Environment::Prod => Environment::Lab,
    };
    assert_eq!(reloaded.status(other), SyncStatus::NotInRepository);
}

#[test]
fn reapplying_the_same_update_is_idempotent() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let mut store = FileRecordStore::open_at(home.path());
    store.insert(record("acl-basic")).expect("insert");
    let name = TemplateName::from("acl-basic");
    let update = StatusUpdate::status(Environment::Lab, SyncStatus::InSync);

    store.update_status(&name, &update).expect("first");
    let first = store.find_by_name(&name).expect("find");
    store.update_status(&name, &update).expect("second");
    let second = store.find_by_name(&name).expect("find");
    assert_eq!(first, second);
}
