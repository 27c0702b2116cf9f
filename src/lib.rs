//! # Sello - Batch Label Rendering Library
//!
//! Sello renders a reusable visual template — a fixed-size canvas of
//! positioned text, QR-code, and image elements — once per row of an
//! imported spreadsheet, producing one PNG per row packaged as a ZIP
//! archive. It provides:
//!
//! - **Template model**: serde-typed elements with column bindings
//! - **Layered rendering**: deterministic bottom-to-top compositing
//! - **Asset caching**: QR bitmaps memoized on their full input tuple
//! - **Batch export**: sequential per-row rendering into a ZIP archive
//!
//! ## Quick Start
//!
//! ```no_run
//! use sello::{
//!     dataset,
//!     export::{self, ExportOptions},
//!     render::Renderer,
//!     template::{Element, ElementKind, QrConfig, Template},
//! };
//!
//! # async fn example() -> Result<(), sello::SelloError> {
//! // Import a spreadsheet
//! let dataset = dataset::import_path("people.xlsx")?;
//!
//! // Build a template: one QR code bound to the "code" column
//! let mut template = Template::new();
//! let mut element = Element::qrcode();
//! if let ElementKind::Qrcode(qr) = &mut element.kind {
//!     qr.column = Some("code".to_string());
//! }
//! template.add(element);
//!
//! // Render every row into a ZIP archive
//! let renderer = Renderer::new();
//! let zip_bytes = export::export_all(
//!     &renderer,
//!     &template,
//!     &dataset,
//!     &QrConfig::default(),
//!     &ExportOptions::default(),
//!     |percent| println!("{}%", percent),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`template`] | Template, element, and QR configuration model |
//! | [`dataset`] | Spreadsheet import and row/column access |
//! | [`render`] | Layered renderer, content resolver, asset caches |
//! | [`export`] | Batch orchestration and ZIP packaging |
//! | [`server`] | JSON API for an external editing UI |
//! | [`error`] | Error types |
//!
//! ## Layering
//!
//! Element index order is paint order — there is no z-index field. See the
//! [`template`] module documentation for the invariant.

pub mod dataset;
pub mod error;
pub mod export;
pub mod render;
pub mod server;
pub mod template;

// Re-exports for convenience
pub use dataset::Dataset;
pub use error::SelloError;
pub use render::Renderer;
pub use template::{QrConfig, Template};
