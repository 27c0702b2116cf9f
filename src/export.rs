//! # Batch Export Orchestrator
//!
//! Drives the renderer once per dataset row and packages the resulting PNGs
//! into a single ZIP archive.
//!
//! Rows are processed strictly sequentially: each row's render (including
//! all asynchronous asset generation) completes before the next row begins.
//! That keeps progress reporting ordered and the asset cache free of write
//! contention, at the cost of row-level parallelism.
//!
//! Failure semantics are all-or-nothing: any row's render or encode failure
//! aborts the whole export, progress resets to 0, and no partial archive is
//! delivered. There are no per-row retries.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::dataset::Dataset;
use crate::error::SelloError;
use crate::render::{Renderer, encode_png};
use crate::template::{QrConfig, Template};

/// Options for a batch export.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Column whose value names each output file. When unset (or not present
    /// in the headers), files are named `qrcode_{row+1}.png`. Two rows
    /// producing the same name silently overwrite one another — accepted,
    /// not deduplicated.
    pub filename_column: Option<String>,
}

/// ZIP archive builder over an in-memory buffer.
pub struct Archive {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    entries: usize,
}

impl Default for Archive {
    fn default() -> Self {
        Self::new()
    }
}

impl Archive {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            entries: 0,
        }
    }

    /// Add a named entry.
    pub fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<(), SelloError> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer
            .start_file(name, options)
            .map_err(|e| SelloError::Export(format!("failed to add {}: {}", name, e)))?;
        self.writer.write_all(bytes)?;
        self.entries += 1;
        Ok(())
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Finalize and return the archive bytes.
    pub fn finish(self) -> Result<Vec<u8>, SelloError> {
        self.writer
            .finish()
            .map(|cursor| cursor.into_inner())
            .map_err(|e| SelloError::Export(format!("failed to finalize archive: {}", e)))
    }
}

/// Render every dataset row and package the images as a ZIP archive.
///
/// `progress` receives whole percentages (`round(100 * done / total)`) after
/// each row, and a final `0` if the export aborts.
pub async fn export_all(
    renderer: &Renderer,
    template: &Template,
    dataset: &Dataset,
    qr_config: &QrConfig,
    options: &ExportOptions,
    mut progress: impl FnMut(u8),
) -> Result<Vec<u8>, SelloError> {
    if template.is_empty() {
        return Err(SelloError::EmptyTemplate);
    }

    let total = dataset.total_rows();
    let mut archive = Archive::new();

    for row_index in 0..total {
        let result = render_entry(renderer, template, dataset, qr_config, options, row_index)
            .await
            .and_then(|(name, png)| archive.add_entry(&name, &png));

        if let Err(e) = result {
            progress(0);
            return Err(e);
        }

        progress((100.0 * (row_index + 1) as f64 / total as f64).round() as u8);
    }

    archive.finish()
}

async fn render_entry(
    renderer: &Renderer,
    template: &Template,
    dataset: &Dataset,
    qr_config: &QrConfig,
    options: &ExportOptions,
    row_index: usize,
) -> Result<(String, Vec<u8>), SelloError> {
    let surface = renderer
        .render_row(template, Some(dataset), row_index, qr_config)
        .await?;
    let png = encode_png(&surface)?;
    let name = format!("{}.png", base_filename(dataset, options, row_index));
    Ok((name, png))
}

/// Base output filename for one row: the filename column's value when the
/// column resolves, else the 1-based row index.
fn base_filename(dataset: &Dataset, options: &ExportOptions, row_index: usize) -> String {
    options
        .filename_column
        .as_deref()
        .filter(|c| !c.is_empty())
        .and_then(|column| dataset.value(row_index, column))
        .unwrap_or_else(|| format!("qrcode_{}", row_index + 1))
}
