//! JSON API handlers for the editing session.
//!
//! The external editing UI owns the template through these endpoints; the
//! rendering core is only reached via the preview and export handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dataset;
use crate::export::{self, ExportOptions};
use crate::template::{CanvasSize, Element, QrConfig, Template};

use super::state::AppState;

type HandlerError = (StatusCode, String);

fn bad_request(msg: impl Into<String>) -> HandlerError {
    (StatusCode::BAD_REQUEST, msg.into())
}

// ============================================================================
// DATASET
// ============================================================================

/// Response from the dataset upload endpoint.
#[derive(Debug, Serialize)]
pub struct DatasetResponse {
    pub headers: Vec<String>,
    pub total_rows: usize,
}

/// POST /api/dataset — upload a spreadsheet file (multipart field "file").
pub async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<DatasetResponse>, HandlerError> {
    let mut file_data: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload.xlsx").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("Failed to read upload: {}", e)))?;
            file_data = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let (filename, bytes) = file_data.ok_or_else(|| bad_request("No file field found"))?;

    let dataset = dataset::import_bytes(&bytes, &filename).map_err(|e| bad_request(e.to_string()))?;
    let response = DatasetResponse {
        headers: dataset.headers.clone(),
        total_rows: dataset.total_rows(),
    };

    let mut session = state.session.write().await;
    session.dataset = Some(dataset);

    Ok(Json(response))
}

// ============================================================================
// TEMPLATE CRUD
// ============================================================================

/// GET /api/template
pub async fn get_template(State(state): State<Arc<AppState>>) -> Json<Template> {
    Json(state.session.read().await.template.clone())
}

/// PUT /api/template — replace the whole template.
pub async fn put_template(
    State(state): State<Arc<AppState>>,
    Json(template): Json<Template>,
) -> Json<Template> {
    let mut session = state.session.write().await;
    session.template = template;
    Json(session.template.clone())
}

/// Request body for adding an element.
#[derive(Debug, Deserialize)]
pub struct AddElementRequest {
    pub kind: AddElementKind,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddElementKind {
    Text,
    Qrcode,
    Image,
}

/// POST /api/template/elements — add an element with per-kind defaults.
pub async fn add_element(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddElementRequest>,
) -> Result<Json<Element>, HandlerError> {
    let element = match request.kind {
        AddElementKind::Text => Element::text(),
        AddElementKind::Qrcode => Element::qrcode(),
        AddElementKind::Image => Element::image(),
    };

    let mut session = state.session.write().await;
    let id = session.template.add(element);
    let added = session
        .template
        .get(id)
        .cloned()
        .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "element vanished".into()))?;
    Ok(Json(added))
}

/// PUT /api/template/elements/:id — replace one element in place.
pub async fn update_element(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(mut element): Json<Element>,
) -> Result<Json<Element>, HandlerError> {
    element.id = id;
    let mut session = state.session.write().await;
    let slot = session
        .template
        .get_mut(id)
        .ok_or((StatusCode::NOT_FOUND, "element not found".to_string()))?;
    *slot = element.clone();
    Ok(Json(element))
}

/// DELETE /api/template/elements/:id
pub async fn delete_element(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    let mut session = state.session.write().await;
    if session.template.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "element not found".to_string()))
    }
}

/// Request body for reordering an element.
#[derive(Debug, Deserialize)]
pub struct MoveElementRequest {
    pub index: usize,
}

/// POST /api/template/elements/:id/move — splice to a new paint-order index.
pub async fn move_element(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<MoveElementRequest>,
) -> Result<Json<Template>, HandlerError> {
    let mut session = state.session.write().await;
    if !session.template.move_to(id, request.index) {
        return Err((StatusCode::NOT_FOUND, "element not found".to_string()));
    }
    Ok(Json(session.template.clone()))
}

/// PUT /api/template/canvas — resize the shared canvas.
pub async fn put_canvas(
    State(state): State<Arc<AppState>>,
    Json(canvas): Json<CanvasSize>,
) -> Json<CanvasSize> {
    let mut session = state.session.write().await;
    session.template.canvas = canvas;
    Json(canvas)
}

/// PUT /api/qr-config — replace the global QR configuration.
pub async fn put_qr_config(
    State(state): State<Arc<AppState>>,
    Json(config): Json<QrConfig>,
) -> Json<QrConfig> {
    let mut session = state.session.write().await;
    session.qr_config = config.clone();
    Json(config)
}

// ============================================================================
// PREVIEW & EXPORT
// ============================================================================

/// GET /api/preview/:row — render one row as PNG for live preview.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Path(row): Path<usize>,
) -> Result<impl IntoResponse, HandlerError> {
    // Snapshot the session so rendering happens without holding the lock.
    let (template, dataset, qr_config) = {
        let session = state.session.read().await;
        (
            session.template.clone(),
            session.dataset.clone(),
            session.qr_config.clone(),
        )
    };

    let png = state
        .renderer
        .render_row_png(&template, dataset.as_ref(), row, &qr_config)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// Request body for a batch export.
#[derive(Debug, Default, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub filename_column: Option<String>,
}

/// POST /api/export — render all rows and return the ZIP archive.
pub async fn export(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExportRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let (template, dataset, qr_config) = {
        let session = state.session.read().await;
        (
            session.template.clone(),
            session.dataset.clone(),
            session.qr_config.clone(),
        )
    };

    let dataset = dataset.ok_or_else(|| bad_request("no dataset loaded"))?;
    let options = ExportOptions {
        filename_column: request.filename_column,
    };

    let total = dataset.total_rows();
    let zip_bytes = export::export_all(
        &state.renderer,
        &template,
        &dataset,
        &qr_config,
        &options,
        |percent| log::debug!("export progress: {}% of {} rows", percent, total),
    )
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"qrcodes.zip\"".to_string(),
            ),
        ],
        zip_bytes,
    ))
}
