//! Tera rendering engine for the template listing and notifications.
//!
//! | Output         | Template                  | Escaping |
//! |----------------|---------------------------|----------|
//! | HTML listing   | `listing.html.tera`       | HTML     |
//! | Notification   | `notification.md.tera`    | none     |

use std::path::{Path, PathBuf};

use chrono::Utc;
use tera::Tera;

use templar_core::{store::templar_root, TemplateRecord};
use templar_sync::BatchReport;

use crate::context::{ListingContext, ReportContext};
use crate::error::{io_err, RenderError};

pub const LISTING_TEMPLATE: &str = "listing.html.tera";
pub const NOTIFICATION_TEMPLATE: &str = "notification.md.tera";

// ---------------------------------------------------------------------------
// Embedded templates: baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("shared/_status.tera", include_str!("templates/_partials/status.tera")),
    (LISTING_TEMPLATE, include_str!("templates/listing.html.tera")),
    (
        NOTIFICATION_TEMPLATE,
        include_str!("templates/notification.md.tera"),
    ),
];

/// `<home>/.templar/templates`: where the CLI looks for overrides by default.
pub fn templates_dir_at(home: &Path) -> PathBuf {
    templar_root(home).join("templates")
}

/// Source for every embedded template. A file at the same relative path
/// under `dir` replaces the embedded text; other files there are ignored.
fn template_sources(dir: Option<&Path>) -> Result<Vec<(&'static str, String)>, RenderError> {
    TPLS.iter()
        .map(|&(name, embedded)| {
            match dir.map(|d| d.join(name)).filter(|p| p.is_file()) {
                Some(path) => {
                    tracing::debug!("using template override {}", path.display());
                    let text = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
                    Ok((name, text))
                }
                None => Ok((name, embedded.to_string())),
            }
        })
        .collect()
}

fn build_tera(dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![".html.tera"]);
    tera.add_raw_templates(template_sources(dir)?)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders listings and batch notifications.
///
/// Embedded templates can be replaced by files of the same relative name in
/// an override directory, e.g. `<dir>/listing.html.tera` or
/// `<dir>/shared/_status.tera`.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Construct a [`Renderer`] with embedded templates only.
    pub fn new() -> Result<Self, RenderError> {
        Ok(Renderer {
            tera: build_tera(None)?,
        })
    }

    /// Construct a [`Renderer`] whose templates may be overridden from `dir`.
    /// A missing directory means no overrides.
    pub fn with_template_dir(dir: &Path) -> Result<Self, RenderError> {
        Ok(Renderer {
            tera: build_tera(Some(dir))?,
        })
    }

    /// HTML page listing every record, optionally headed by an outcome message.
    pub fn render_listing(
        &self,
        records: &[TemplateRecord],
        message: Option<&str>,
    ) -> Result<String, RenderError> {
        let ctx = ListingContext::from_records(records, message, Utc::now());
        Ok(self.tera.render(LISTING_TEMPLATE, &ctx.to_tera_context()?)?)
    }

    /// Markdown message sent to the notifier after an action.
    pub fn render_notification(&self, report: &BatchReport) -> Result<String, RenderError> {
        let ctx = ReportContext::from_report(report);
        let rendered = self
            .tera
            .render(NOTIFICATION_TEMPLATE, &ctx.to_tera_context()?)?;
        Ok(rendered.trim_end().to_string())
    }

    /// Render the listing and write it to `path`.
    pub fn write_listing(
        &self,
        path: &Path,
        records: &[TemplateRecord],
        message: Option<&str>,
    ) -> Result<(), RenderError> {
        let html = self.render_listing(records, message)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        std::fs::write(path, html).map_err(|e| io_err(path, e))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use templar_core::{
        DeviceType, ProjectName, SyncStatus, TemplateDetail, TemplateName,
    };
    use templar_sync::{Action, Change, TemplateFailure, TemplateOutcome};

    fn record(name: &str) -> TemplateRecord {
        let detail = TemplateDetail {
            id: "1".to_string(),
            name: TemplateName::from(name),
            project: ProjectName::from("campus"),
            device_types: vec![DeviceType::new("Routers"), DeviceType::new("Switches and Hubs")],
            software_type: "IOS-XE".to_string(),
            content: String::new(),
        };
        TemplateRecord::discovered(&detail, Utc::now())
    }

    #[test]
    fn renderer_new_succeeds() {
        Renderer::new().expect("embedded templates parse");
    }

    #[test]
    fn listing_shows_every_record_with_status_classes() {
        let mut synced = record("acl-basic");
        synced.in_lab = SyncStatus::InSync;
        synced.in_prod = SyncStatus::NotFound;
        let html = Renderer::new()
            .unwrap()
            .render_listing(&[synced, record("new-qos")], None)
            .unwrap();
        assert!(html.contains("2 template(s)"));
        assert!(html.contains(r#"<td class="ok">In Sync</td>"#));
        assert!(html.contains(r#"<td class="missing">Not Found</td>"#));
        assert!(html.contains("Routers, Switches and Hubs"));
        assert!(html.contains("never"));
    }

    #[test]
    fn listing_escapes_html() {
        let html = Renderer::new()
            .unwrap()
            .render_listing(&[record("<script>")], Some("a & b"))
            .unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &amp; b"));
    }

    #[test]
    fn notification_lists_failures_and_pull_request() {
        let mut report = BatchReport::new(
            Action::Publish,
            vec![
                TemplateOutcome {
                    name: TemplateName::from("acl-basic"),
                    result: Ok(Change::Changed),
                },
                TemplateOutcome {
                    name: TemplateName::from("new-qos"),
                    result: Err(TemplateFailure::NotFound {
                        what: "campus/new-qos on lab".to_string(),
                    }),
                },
            ],
            "Pull Request has been created on Github. Please review the changes.",
        );
        report.pull_request = Some(templar_core::PullRequest {
            number: 7,
            url: "https://github.com/netops/templates/pull/7".to_string(),
        });

        let md = Renderer::new().unwrap().render_notification(&report).unwrap();
        assert!(md.starts_with("**templar publish**: Pull Request has been created"));
        assert!(md.contains("Pull request #7: https://github.com/netops/templates/pull/7"));
        assert!(md.contains("- `acl-basic`: changed"));
        assert!(md.contains("Failed (1):"));
        assert!(md.contains("- `new-qos`: campus/new-qos on lab not found"));
        assert!(!md.contains('\r'));
    }

    #[test]
    fn notification_for_quiet_batch_is_one_line() {
        let report = BatchReport::new(Action::Status, Vec::new(), "done");
        let md = Renderer::new().unwrap().render_notification(&report).unwrap();
        assert_eq!(md, "**templar status**: done");
    }
}
