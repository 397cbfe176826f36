//! # templar-renderer
//!
//! Tera-based rendering of the template listing (HTML) and of batch
//! notifications (markdown).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use templar_core::{FileRecordStore, RecordStore};
//! use templar_renderer::Renderer;
//!
//! fn print_listing(store: &FileRecordStore) {
//!     if let (Ok(renderer), Ok(records)) = (Renderer::new(), store.list_all()) {
//!         if let Ok(html) = renderer.render_listing(&records, None) {
//!             println!("{html}");
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{ListingContext, ReportContext};
pub use engine::{templates_dir_at, Renderer};
pub use error::RenderError;
