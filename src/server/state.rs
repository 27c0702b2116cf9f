//! Server state: the editing session and shared render resources.

use tokio::sync::RwLock;

use crate::dataset::Dataset;
use crate::render::Renderer;
use crate::template::{QrConfig, Template};

/// Cache entries untouched for this long are pruned by the cleanup task.
pub const CACHE_EXPIRATION_SECS: u64 = 600;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
}

/// The mutable editing session owned by the server.
///
/// This is the single mutable copy of the model; the rendering core only
/// ever sees read-only snapshots taken under the lock.
#[derive(Debug, Default)]
pub struct EditSession {
    pub template: Template,
    pub dataset: Option<Dataset>,
    pub qr_config: QrConfig,
}

/// Application state shared across handlers.
pub struct AppState {
    pub session: RwLock<EditSession>,
    pub renderer: Renderer,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            session: RwLock::new(EditSession::default()),
            renderer: Renderer::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
