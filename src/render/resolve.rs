//! Content resolution: bound column value vs. static fallback.
//!
//! Binding is by header *name*, not index — when headers are edited or the
//! dataset is reloaded, bindings re-resolve against the new headers or fall
//! back to the element's static content. A stale binding is not an error.

use crate::dataset::Dataset;
use crate::template::Element;

/// Resolve the effective content of an element for one data row.
///
/// - No bound column (or no dataset): the element's static content.
/// - Bound column present in the headers: that column's display value in
///   `row_index` (empty string for short rows).
/// - Bound column absent from the headers: the static content.
///
/// Pure function; cheap enough that no caching is warranted.
pub fn resolve_content(element: &Element, dataset: Option<&Dataset>, row_index: usize) -> String {
    let fallback = || element.static_content().to_string();
    let Some(column) = element.bound_column() else {
        return fallback();
    };
    let Some(dataset) = dataset else {
        return fallback();
    };
    match dataset.value(row_index, column) {
        Some(value) => value,
        None => fallback(),
    }
}
