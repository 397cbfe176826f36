use std::fs;
use std::path::Path;
use std::process::Command;
use std::thread;

use assert_cmd::prelude::*;
use chrono::Utc;
use predicates::str::contains;
use templar_core::{
    DeviceType, FileRecordStore, ProjectName, RecordStore, TemplateDetail, TemplateName,
    TemplateRecord,
};
use tempfile::TempDir;
use tiny_http::{Response, Server};

fn templar_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("templar"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("TEMPLAR_CONFIG")
        .env_remove("TEMPLAR_TEMPLATES")
        .env_remove("TEMPLAR_REPO_TOKEN")
        .env_remove("TEMPLAR_LAB_PASSWORD")
        .env_remove("TEMPLAR_PROD_PASSWORD")
        .env("RUST_LOG", "warn");
    cmd
}

fn write_config(home: &Path, base_url: &str) {
    let dir = home.join(".templar");
    fs::create_dir_all(&dir).expect("config dir");
    fs::write(
        dir.join("config.yaml"),
        format!(
            "repository:\n  base_url: {base_url}\n  token: ghp_test\n\
             lab:\n  base_url: {base_url}\n  username: admin\n  password: lab-secret\n\
             prod:\n  base_url: {base_url}\n  username: admin\n  password: prod-secret\n\
             http:\n  timeout_secs: 5\n"
        ),
    )
    .expect("write config");
}

fn seed_record(home: &Path, project: &str, name: &str) {
    let detail = TemplateDetail {
        id: "t-9".to_string(),
        name: TemplateName::from(name),
        project: ProjectName::from(project),
        device_types: vec![DeviceType::new("Switches and Hubs")],
        software_type: "IOS-XE".to_string(),
        content: String::new(),
    };
    FileRecordStore::open_at(home)
        .insert(TemplateRecord::discovered(&detail, Utc::now()))
        .expect("seed record");
}

/// Serve a repository and a controller that both hold `campus/acl-basic`
/// with identical content.
fn start_mock_backend() -> String {
    let server = Server::http("127.0.0.1:0").expect("http server");
    let base = format!("http://{}", server.server_addr());
    thread::spawn(move || {
        for req in server.incoming_requests() {
            let url = req.url().to_string();
            let (status, body) = if url.ends_with("/auth/token") {
                (200, r#"{"Token":"tok"}"#)
            } else if url.starts_with("/contents/campus/acl-basic") {
                (200, r#"{"content":"cGVybWl0IGlwIGFueSBhbnk=\n","sha":"abc"}"#)
            } else if url.ends_with("/template-programmer/project") {
                (200, r#"[{"id":"p-1","name":"campus"}]"#)
            } else if url.contains("/template?projectId=p-1") {
                (
                    200,
                    r#"[{"name":"acl-basic","templateId":"t-9","projectName":"campus"}]"#,
                )
            } else if url.ends_with("/template/t-9") {
                (
                    200,
                    r#"{"name":"acl-basic","projectName":"campus","templateContent":"permit ip any any"}"#,
                )
            } else {
                (404, "{}")
            };
            let _ = req.respond(Response::from_string(body).with_status_code(status));
        }
    });
    base
}

#[test]
fn list_json_with_empty_home_prints_empty_array() {
    let home = TempDir::new().expect("home");
    templar_cmd(home.path())
        .args(["list", "--json"])
        .assert()
        .success()
        .stdout(contains("[]"));
}

#[test]
fn list_table_shows_recorded_templates() {
    let home = TempDir::new().expect("home");
    seed_record(home.path(), "campus", "acl-basic");
    templar_cmd(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("acl-basic"))
        .stdout(contains("NOT in Github"));
}

#[test]
fn list_html_writes_listing_file() {
    let home = TempDir::new().expect("home");
    seed_record(home.path(), "campus", "acl-basic");
    let out = home.path().join("listing.html");
    templar_cmd(home.path())
        .args(["list", "--html"])
        .arg(&out)
        .assert()
        .success();
    let html = fs::read_to_string(&out).expect("listing written");
    assert!(html.contains("acl-basic"));
}

#[test]
fn list_html_uses_template_override_directory() {
    let home = TempDir::new().expect("home");
    seed_record(home.path(), "campus", "acl-basic");
    let templates = home.path().join("custom");
    fs::create_dir_all(&templates).expect("template dir");
    fs::write(
        templates.join("listing.html.tera"),
        "custom:{% for t in templates %} {{ t.name }}={{ t.in_lab }}{% endfor %}",
    )
    .expect("write override");
    let out = home.path().join("listing.html");

    templar_cmd(home.path())
        .arg("--templates")
        .arg(&templates)
        .args(["list", "--html"])
        .arg(&out)
        .assert()
        .success();

    let html = fs::read_to_string(&out).expect("listing written");
    assert_eq!(html, "custom: acl-basic=NOT in Github");
}

#[test]
fn list_html_picks_up_overrides_under_home() {
    let home = TempDir::new().expect("home");
    seed_record(home.path(), "campus", "acl-basic");
    let templates = home.path().join(".templar").join("templates");
    fs::create_dir_all(&templates).expect("template dir");
    fs::write(templates.join("listing.html.tera"), "{{ templates | length }} rows")
        .expect("write override");
    let out = home.path().join("listing.html");

    templar_cmd(home.path())
        .args(["list", "--html"])
        .arg(&out)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&out).expect("listing written"), "1 rows");
}

#[test]
fn broken_template_override_fails_the_listing() {
    let home = TempDir::new().expect("home");
    let templates = home.path().join("custom");
    fs::create_dir_all(&templates).expect("template dir");
    fs::write(templates.join("listing.html.tera"), "{% if %}").expect("write override");

    templar_cmd(home.path())
        .arg("--templates")
        .arg(&templates)
        .args(["list", "--html"])
        .arg(home.path().join("listing.html"))
        .assert()
        .failure()
        .stderr(contains("failed to load templates"));
}

#[test]
fn status_without_config_fails_with_hint() {
    let home = TempDir::new().expect("home");
    templar_cmd(home.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(contains("config"));
}

#[test]
fn invalid_config_is_rejected_at_startup() {
    let home = TempDir::new().expect("home");
    let path = home.path().join("bad.yaml");
    fs::write(
        &path,
        "repository: { base_url: 'https://api.github.com/repos/x/y', token: t, base_branch: main, dev_branch: main }\n\
         lab: { base_url: 'https://lab', username: u, password: p }\n\
         prod: { base_url: 'https://prod', username: u, password: p }\n",
    )
    .expect("write");
    templar_cmd(home.path())
        .arg("--config")
        .arg(&path)
        .arg("inventory")
        .assert()
        .failure()
        .stderr(contains("dev_branch"));
}

#[test]
fn push_with_empty_store_asks_for_a_selection_without_remote_calls() {
    let home = TempDir::new().expect("home");
    // Port 9 (discard) is never served; any remote call would fail.
    write_config(home.path(), "http://127.0.0.1:9");
    templar_cmd(home.path())
        .args(["push", "--env", "lab"])
        .assert()
        .success()
        .stdout(contains("Please select templates to update DNA Center"));
}

#[test]
fn push_rejects_unknown_environment() {
    let home = TempDir::new().expect("home");
    templar_cmd(home.path())
        .args(["push", "--env", "staging"])
        .assert()
        .failure();
}

#[test]
fn unknown_template_name_fails_before_contacting_remotes() {
    let home = TempDir::new().expect("home");
    write_config(home.path(), "http://127.0.0.1:9");
    templar_cmd(home.path())
        .args(["status", "ghost"])
        .assert()
        .failure()
        .stderr(contains("ghost"));
}

#[test]
fn status_end_to_end_records_in_sync() {
    let home = TempDir::new().expect("home");
    let base = start_mock_backend();
    write_config(home.path(), &base);
    seed_record(home.path(), "campus", "acl-basic");

    templar_cmd(home.path())
        .args(["status", "acl-basic"])
        .assert()
        .success()
        .stdout(contains("Template status sync update has been completed"))
        .stdout(contains("In Sync"));

    let record = FileRecordStore::open_at(home.path())
        .find_by_name(&TemplateName::from("acl-basic"))
        .expect("read store")
        .expect("record present");
    assert_eq!(record.in_lab.as_str(), "In Sync");
    assert_eq!(record.in_prod.as_str(), "In Sync");
    assert!(record.in_github);
}
