//! # Export Tests
//!
//! End-to-end coverage of the render → encode → archive pipeline: entry
//! naming, paint order, determinism, progress reporting, and failure
//! semantics.

use std::io::{Cursor, Read};

use base64::Engine;
use image::{ImageFormat, Rgba, RgbaImage};
use zip::ZipArchive;

use sello::dataset::{CellValue, Dataset};
use sello::export::{self, ExportOptions};
use sello::render::Renderer;
use sello::template::{
    CanvasSize, Element, ElementKind, QrConfig, Template, TextAlign,
};
use sello::SelloError;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn sample_dataset() -> Dataset {
    Dataset::new(
        vec!["name".into(), "code".into()],
        vec![
            vec![
                CellValue::Text("Alice".into()),
                CellValue::Text("A1".into()),
            ],
            vec![CellValue::Text("Bob".into()), CellValue::Text("B2".into())],
        ],
    )
}

/// Template with a single qrcode element bound to the "code" column.
fn qr_template() -> Template {
    let mut template = Template {
        canvas: CanvasSize {
            width: 300,
            height: 300,
        },
        ..Default::default()
    };
    let mut element = Element::qrcode();
    if let ElementKind::Qrcode(qr) = &mut element.kind {
        qr.column = Some("code".into());
    }
    template.add(element);
    template
}

/// Solid-color 1×1 PNG as a data URI.
fn solid_data_uri(color: Rgba<u8>) -> String {
    let image = RgbaImage::from_pixel(1, 1, color);
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&bytes)
    )
}

fn image_element(color: Rgba<u8>, x: u32, y: u32, size: u32) -> Element {
    let mut element = Element::image();
    element.x = x;
    element.y = y;
    element.width = size;
    element.height = size;
    if let ElementKind::Image(img) = &mut element.kind {
        img.image_url = solid_data_uri(color);
    }
    element
}

async fn export_bytes(
    template: &Template,
    dataset: &Dataset,
    options: &ExportOptions,
) -> Result<Vec<u8>, SelloError> {
    let renderer = Renderer::new();
    export::export_all(
        &renderer,
        template,
        dataset,
        &QrConfig::default(),
        options,
        |_| {},
    )
    .await
}

fn entry_names(zip_bytes: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(zip_bytes.to_vec())).unwrap();
    archive.file_names().map(String::from).collect()
}

fn entry_bytes(zip_bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(zip_bytes.to_vec())).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).unwrap();
    bytes
}

// ============================================================================
// ENTRY NAMING
// ============================================================================

#[tokio::test]
async fn export_names_entries_sequentially_by_default() {
    let zip_bytes = export_bytes(&qr_template(), &sample_dataset(), &ExportOptions::default())
        .await
        .unwrap();

    let mut names = entry_names(&zip_bytes);
    names.sort();
    assert_eq!(names, vec!["qrcode_1.png", "qrcode_2.png"]);
}

#[tokio::test]
async fn export_names_entries_from_filename_column() {
    let options = ExportOptions {
        filename_column: Some("name".into()),
    };
    let zip_bytes = export_bytes(&qr_template(), &sample_dataset(), &options)
        .await
        .unwrap();

    let mut names = entry_names(&zip_bytes);
    names.sort();
    assert_eq!(names, vec!["Alice.png", "Bob.png"]);
}

#[tokio::test]
async fn export_produces_one_entry_per_row() {
    let dataset = Dataset::new(
        vec!["code".into()],
        (0..7)
            .map(|i| vec![CellValue::Text(format!("item-{}", i))])
            .collect(),
    );
    let zip_bytes = export_bytes(&qr_template(), &dataset, &ExportOptions::default())
        .await
        .unwrap();
    assert_eq!(entry_names(&zip_bytes).len(), 7);
}

#[tokio::test]
async fn export_entries_are_valid_pngs_with_distinct_content() {
    let zip_bytes = export_bytes(&qr_template(), &sample_dataset(), &ExportOptions::default())
        .await
        .unwrap();

    let first = entry_bytes(&zip_bytes, "qrcode_1.png");
    let second = entry_bytes(&zip_bytes, "qrcode_2.png");

    // PNG signature on both entries.
    assert_eq!(&first[..8], b"\x89PNG\r\n\x1a\n");
    assert_eq!(&second[..8], b"\x89PNG\r\n\x1a\n");
    // Rows encode "A1" vs "B2" — different symbols, different pixels.
    assert_ne!(first, second);

    let image = image::load_from_memory(&first).unwrap();
    assert_eq!(image.width(), 300);
    assert_eq!(image.height(), 300);
}

// ============================================================================
// DETERMINISM & PAINT ORDER
// ============================================================================

#[tokio::test]
async fn export_is_deterministic() {
    let template = qr_template();
    let dataset = sample_dataset();
    let options = ExportOptions::default();

    let a = export_bytes(&template, &dataset, &options).await.unwrap();
    let b = export_bytes(&template, &dataset, &options).await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn later_elements_paint_over_earlier_ones() {
    let red = Rgba([255, 0, 0, 255]);
    let blue = Rgba([0, 0, 255, 255]);

    let mut template = Template {
        canvas: CanvasSize {
            width: 100,
            height: 100,
        },
        ..Default::default()
    };
    // Same box: blue is later in template order, so blue wins.
    template.add(image_element(red, 10, 10, 40));
    template.add(image_element(blue, 10, 10, 40));

    let renderer = Renderer::new();
    let surface = renderer
        .render_row(&template, None, 0, &QrConfig::default())
        .await
        .unwrap();

    assert_eq!(*surface.get_pixel(30, 30), blue);

    // Reorder: move the blue element to the bottom and red wins.
    let blue_id = template.elements[1].id;
    assert!(template.move_to(blue_id, 0));
    let surface = renderer
        .render_row(&template, None, 0, &QrConfig::default())
        .await
        .unwrap();
    assert_eq!(*surface.get_pixel(30, 30), red);
}

#[tokio::test]
async fn centered_text_is_centered_for_any_length() {
    let mut template = Template {
        canvas: CanvasSize {
            width: 300,
            height: 100,
        },
        ..Default::default()
    };
    let mut element = Element::text();
    element.x = 50;
    element.y = 30;
    element.width = 200;
    element.height = 40;
    if let ElementKind::Text(text) = &mut element.kind {
        text.content = "Hello".into();
        text.text_align = TextAlign::Center;
    }
    template.add(element);

    let renderer = Renderer::new();
    for content in ["I", "Hello", "A longer string"] {
        if let ElementKind::Text(text) = &mut template.elements[0].kind {
            text.content = content.into();
        }
        let surface = renderer
            .render_row(&template, None, 0, &QrConfig::default())
            .await
            .unwrap();

        let mut min_x = u32::MAX;
        let mut max_x = 0;
        for (x, _, pixel) in surface.enumerate_pixels() {
            if *pixel != Rgba([255, 255, 255, 255]) {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
            }
        }
        assert!(min_x <= max_x, "no ink for {:?}", content);
        let ink_center = (min_x + max_x) as i64 / 2;
        // Box spans 50..250, midpoint 150.
        assert!(
            (ink_center - 150).abs() <= 8,
            "{:?}: ink center {}",
            content,
            ink_center
        );
    }
}

// ============================================================================
// PROGRESS & FAILURE SEMANTICS
// ============================================================================

#[tokio::test]
async fn progress_is_reported_per_row() {
    let renderer = Renderer::new();
    let mut reports = Vec::new();
    export::export_all(
        &renderer,
        &qr_template(),
        &sample_dataset(),
        &QrConfig::default(),
        &ExportOptions::default(),
        |percent| reports.push(percent),
    )
    .await
    .unwrap();
    assert_eq!(reports, vec![50, 100]);
}

#[tokio::test]
async fn empty_template_fails_before_any_row() {
    let renderer = Renderer::new();
    let mut reports = Vec::new();
    let err = export::export_all(
        &renderer,
        &Template::new(),
        &sample_dataset(),
        &QrConfig::default(),
        &ExportOptions::default(),
        |percent| reports.push(percent),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SelloError::EmptyTemplate));
    assert!(reports.is_empty());
}

#[tokio::test]
async fn row_failure_aborts_whole_export_and_resets_progress() {
    // Row 0 fits version 1; row 1 does not — the export must abort.
    let dataset = Dataset::new(
        vec!["code".into()],
        vec![
            vec![CellValue::Text("ok".into())],
            vec![CellValue::Text("x".repeat(500))],
        ],
    );
    let config = QrConfig {
        version: Some(1),
        ..Default::default()
    };

    let renderer = Renderer::new();
    let mut reports = Vec::new();
    let err = export::export_all(
        &renderer,
        &qr_template(),
        &dataset,
        &config,
        &ExportOptions::default(),
        |percent| reports.push(percent),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SelloError::QrEncode(_)));
    assert_eq!(reports.last(), Some(&0));
}
