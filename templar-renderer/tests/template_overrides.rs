use std::fs;

use chrono::Utc;
use templar_core::{DeviceType, ProjectName, TemplateDetail, TemplateName, TemplateRecord};
use templar_renderer::Renderer;
use templar_sync::{Action, BatchReport};
use tempfile::TempDir;

fn record(name: &str) -> TemplateRecord {
    let detail = TemplateDetail {
        id: "t-1".to_string(),
        name: TemplateName::from(name),
        project: ProjectName::from("campus"),
        device_types: vec![DeviceType::new("Routers")],
        software_type: "IOS-XE".to_string(),
        content: String::new(),
    };
    TemplateRecord::discovered(&detail, Utc::now())
}

#[test]
fn user_template_overrides_embedded_notification() {
    let dir = TempDir::new().expect("template dir");
    fs::write(
        dir.path().join("notification.md.tera"),
        "[{{ action }}] {{ message }} ({{ failures | length }} failed)",
    )
    .expect("write override");

    let renderer = Renderer::with_template_dir(dir.path()).expect("renderer");
    let report = BatchReport::new(Action::Inventory, Vec::new(), "nothing to add");
    let md = renderer.render_notification(&report).expect("render");
    assert_eq!(md, "[inventory] nothing to add (0 failed)");

    let html = renderer.render_listing(&[record("acl-basic")], None).expect("listing");
    assert!(html.contains("acl-basic"), "embedded listing still used");
}

#[test]
fn missing_override_directory_falls_back_to_embedded() {
    let dir = TempDir::new().expect("tmp");
    let renderer = Renderer::with_template_dir(&dir.path().join("absent")).expect("renderer");
    let report = BatchReport::new(Action::Status, Vec::new(), "done");
    assert_eq!(
        renderer.render_notification(&report).expect("render"),
        "**templar status**: done"
    );
}

#[test]
fn invalid_override_is_a_template_error() {
    let dir = TempDir::new().expect("template dir");
    fs::write(dir.path().join("listing.html.tera"), "{% if %}").expect("write");
    assert!(Renderer::with_template_dir(dir.path()).is_err());
}

#[test]
fn write_listing_creates_parent_directories() {
    let out = TempDir::new().expect("out");
    let path = out.path().join("reports").join("templates.html");
    Renderer::new()
        .expect("renderer")
        .write_listing(&path, &[record("acl-basic"), record("new-qos")], Some("Github is up to date."))
        .expect("write");

    let html = fs::read_to_string(&path).expect("read back");
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Github is up to date."));
    assert!(html.contains("new-qos"));
}

#[test]
fn partial_override_is_used_by_the_embedded_listing() {
    let dir = TempDir::new().expect("template dir");
    fs::create_dir_all(dir.path().join("shared")).expect("shared dir");
    fs::write(dir.path().join("shared").join("_status.tera"), "flag").expect("write partial");
    fs::write(dir.path().join("unrelated.tera"), "{% if %}").expect("write stray file");

    let html = Renderer::with_template_dir(dir.path())
        .expect("stray files are ignored")
        .render_listing(&[record("acl-basic")], None)
        .expect("listing");
    assert!(html.contains(r#"<td class="flag">"#));
}
