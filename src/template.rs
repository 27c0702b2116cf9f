//! # Unified Template Model
//!
//! A single type hierarchy that is both the Rust API and the JSON API.
//! `Template` is constructible in Rust and deserializable from JSON, so the
//! same types serve library callers, the HTTP server, and CLI template files.
//!
//! ```ignore
//! use sello::template::*;
//!
//! // Rust construction
//! let mut template = Template::new();
//! template.add(Element::text());
//!
//! // JSON deserialization
//! let template: Template = serde_json::from_str(
//!     r#"{"canvas":{"width":400,"height":400},
//!         "elements":[{"type":"text","content":"Hello","x":50,"y":50,"width":200,"height":40}]}"#,
//! ).unwrap();
//! ```
//!
//! ## Layering invariant
//!
//! Element index order IS paint order: the element at index 0 paints first
//! (bottom), later elements paint over earlier ones. There is no z-index
//! field — [`Template::move_to`] (a list splice) is the sole reordering
//! primitive. Code that touches `elements` must preserve this invariant.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SelloError;

// ============================================================================
// CANVAS
// ============================================================================

/// Output dimensions in pixels, shared by every rendered image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
        }
    }
}

// ============================================================================
// ELEMENT KINDS
// ============================================================================

/// Font weight for text elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Horizontal alignment of text within its element box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

fn default_font_size() -> u32 {
    16
}

fn default_font_color() -> String {
    "#000000".to_string()
}

/// A positioned text run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextElement {
    /// Static content, used when no column is bound (or the binding is stale).
    #[serde(default)]
    pub content: String,
    /// Bound column name. Resolved against the dataset headers at render time.
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    /// Hex color, e.g. `#000000`.
    #[serde(default = "default_font_color")]
    pub font_color: String,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub text_align: TextAlign,
}

impl Default for TextElement {
    fn default() -> Self {
        Self {
            content: String::new(),
            column: None,
            font_size: default_font_size(),
            font_color: default_font_color(),
            font_weight: FontWeight::Normal,
            text_align: TextAlign::Left,
        }
    }
}

/// A positioned QR code. Rendering parameters come from the global
/// [`QrConfig`], not from the element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QrcodeElement {
    /// Static payload fallback, used when no column is bound.
    #[serde(default)]
    pub content: String,
    /// Bound column name.
    #[serde(default)]
    pub column: Option<String>,
}

/// A positioned image. Never binds to a column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageElement {
    /// HTTP(S) URL, `data:` URI, or local file path.
    #[serde(default)]
    pub image_url: String,
}

/// Kind-specific element data, tagged as `"type"` in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Text(TextElement),
    Qrcode(QrcodeElement),
    Image(ImageElement),
}

impl ElementKind {
    /// Human-readable display label, used for default element names.
    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Text(_) => "Text",
            ElementKind::Qrcode(_) => "QR Code",
            ElementKind::Image(_) => "Image",
        }
    }

    fn same_kind(&self, other: &ElementKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

// ============================================================================
// ELEMENT
// ============================================================================

/// One positioned visual unit on the canvas.
///
/// Geometry is in canvas pixel units, non-negative by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: u32,
    #[serde(default)]
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    fn with_defaults(kind: ElementKind, width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            x: 50,
            y: 50,
            width,
            height,
            kind,
        }
    }

    /// New text element with editor defaults (200×40, sample content).
    pub fn text() -> Self {
        Self::with_defaults(
            ElementKind::Text(TextElement {
                content: "Sample text".to_string(),
                ..Default::default()
            }),
            200,
            40,
        )
    }

    /// New QR code element with editor defaults (150×150).
    pub fn qrcode() -> Self {
        Self::with_defaults(ElementKind::Qrcode(QrcodeElement::default()), 150, 150)
    }

    /// New image element with editor defaults (100×100).
    pub fn image() -> Self {
        Self::with_defaults(ElementKind::Image(ImageElement::default()), 100, 100)
    }

    /// Static content fallback for this element. Empty for images.
    pub fn static_content(&self) -> &str {
        match &self.kind {
            ElementKind::Text(t) => &t.content,
            ElementKind::Qrcode(q) => &q.content,
            ElementKind::Image(_) => "",
        }
    }

    /// Bound column name, if set and non-empty. Images never bind.
    pub fn bound_column(&self) -> Option<&str> {
        let column = match &self.kind {
            ElementKind::Text(t) => t.column.as_deref(),
            ElementKind::Qrcode(q) => q.column.as_deref(),
            ElementKind::Image(_) => None,
        };
        column.filter(|c| !c.is_empty())
    }
}

// ============================================================================
// TEMPLATE
// ============================================================================

/// An ordered sequence of elements plus the shared canvas size.
///
/// Created empty; mutated only by the owning editing session. The rendering
/// and export components take `&Template` snapshots and never mutate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub canvas: CanvasSize,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Template {
    /// Create a new empty template with the default 400×400 canvas.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Append an element (top of the paint order).
    ///
    /// Unnamed elements get a per-kind counted display name ("Text 1",
    /// "QR Code 2", …). Returns the element id.
    pub fn add(&mut self, mut element: Element) -> Uuid {
        if element.name.is_empty() {
            let count = self
                .elements
                .iter()
                .filter(|e| e.kind.same_kind(&element.kind))
                .count();
            element.name = format!("{} {}", element.kind.label(), count + 1);
        }
        let id = element.id;
        self.elements.push(element);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Remove an element by id. Returns true if it existed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.elements.len();
        self.elements.retain(|e| e.id != id);
        self.elements.len() != before
    }

    /// Move an element to `index` in the paint order (list splice).
    ///
    /// `index` is clamped to the valid range. Returns false for unknown ids.
    pub fn move_to(&mut self, id: Uuid, index: usize) -> bool {
        let Some(from) = self.elements.iter().position(|e| e.id == id) else {
            return false;
        };
        let element = self.elements.remove(from);
        let index = index.min(self.elements.len());
        self.elements.insert(index, element);
        true
    }

    /// Parse a template from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, SelloError> {
        serde_json::from_str(json)
            .map_err(|e| SelloError::Template(format!("invalid template JSON: {}", e)))
    }

    /// Serialize to pretty JSON (the CLI template file format).
    pub fn to_json(&self) -> Result<String, SelloError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SelloError::Template(format!("failed to serialize template: {}", e)))
    }
}

// ============================================================================
// QR CONFIGURATION
// ============================================================================

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EcLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

fn default_margin() -> u32 {
    4
}

fn default_dark_color() -> String {
    "#000000".to_string()
}

fn default_light_color() -> String {
    "#ffffff".to_string()
}

/// Global QR rendering parameters, shared by all qrcode elements in a render
/// pass. Not configurable per element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrConfig {
    #[serde(default)]
    pub error_correction: EcLevel,
    /// Quiet-zone width in modules.
    #[serde(default = "default_margin")]
    pub margin: u32,
    /// Fixed symbol version (1–40). `None` auto-selects the smallest version
    /// that fits the payload.
    #[serde(default)]
    pub version: Option<u8>,
    #[serde(default = "default_dark_color")]
    pub dark_color: String,
    #[serde(default = "default_light_color")]
    pub light_color: String,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            error_correction: EcLevel::M,
            margin: default_margin(),
            version: None,
            dark_color: default_dark_color(),
            light_color: default_light_color(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_assigns_counted_names_per_kind() {
        let mut template = Template::new();
        template.add(Element::text());
        template.add(Element::qrcode());
        template.add(Element::text());
        let names: Vec<&str> = template.elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Text 1", "QR Code 1", "Text 2"]);
    }

    #[test]
    fn test_default_geometry_per_kind() {
        let text = Element::text();
        assert_eq!((text.width, text.height), (200, 40));
        let qr = Element::qrcode();
        assert_eq!((qr.width, qr.height), (150, 150));
        let image = Element::image();
        assert_eq!((image.width, image.height), (100, 100));
        assert_eq!((text.x, text.y), (50, 50));
    }

    #[test]
    fn test_remove_by_id() {
        let mut template = Template::new();
        let id = template.add(Element::text());
        assert!(template.remove(id));
        assert!(!template.remove(id));
        assert!(template.is_empty());
    }

    #[test]
    fn test_move_to_splices_paint_order() {
        let mut template = Template::new();
        let a = template.add(Element::text());
        let b = template.add(Element::qrcode());
        let c = template.add(Element::image());

        assert!(template.move_to(c, 0));
        let order: Vec<Uuid> = template.elements.iter().map(|e| e.id).collect();
        assert_eq!(order, vec![c, a, b]);

        // Out-of-range index clamps to the end.
        assert!(template.move_to(c, 99));
        let order: Vec<Uuid> = template.elements.iter().map(|e| e.id).collect();
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn test_move_unknown_id() {
        let mut template = Template::new();
        template.add(Element::text());
        assert!(!template.move_to(Uuid::new_v4(), 0));
    }

    #[test]
    fn test_bound_column_ignores_empty_string() {
        let mut element = Element::text();
        if let ElementKind::Text(t) = &mut element.kind {
            t.column = Some(String::new());
        }
        assert_eq!(element.bound_column(), None);

        if let ElementKind::Text(t) = &mut element.kind {
            t.column = Some("name".into());
        }
        assert_eq!(element.bound_column(), Some("name"));
    }

    #[test]
    fn test_image_never_binds() {
        let element = Element::image();
        assert_eq!(element.bound_column(), None);
        assert_eq!(element.static_content(), "");
    }

    #[test]
    fn test_json_round_trip() {
        let mut template = Template::new();
        template.add(Element::qrcode());
        let json = template.to_json().unwrap();
        let parsed = Template::from_json(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(matches!(parsed.elements[0].kind, ElementKind::Qrcode(_)));
    }

    #[test]
    fn test_json_kind_tag() {
        let json = r#"{
            "elements": [
                {"type": "text", "content": "Hi", "x": 0, "y": 0, "width": 100, "height": 20},
                {"type": "qrcode", "column": "code", "width": 150, "height": 150}
            ]
        }"#;
        let template = Template::from_json(json).unwrap();
        assert_eq!(template.canvas, CanvasSize::default());
        assert!(matches!(template.elements[0].kind, ElementKind::Text(_)));
        assert_eq!(template.elements[1].bound_column(), Some("code"));
    }

    #[test]
    fn test_qr_config_defaults() {
        let config = QrConfig::default();
        assert_eq!(config.error_correction, EcLevel::M);
        assert_eq!(config.margin, 4);
        assert_eq!(config.version, None);
        assert_eq!(config.dark_color, "#000000");
        assert_eq!(config.light_color, "#ffffff");
    }

    #[test]
    fn test_qr_config_ec_level_json() {
        let config: QrConfig = serde_json::from_str(r#"{"error_correction": "H"}"#).unwrap();
        assert_eq!(config.error_correction, EcLevel::H);
    }
}
