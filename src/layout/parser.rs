// SPDX-License-Identifier: GPL-3.0-only

//! Layout parsing entry points for loading JSON layout documents.
//!
//! This module provides functions for parsing keyboard layout documents from
//! JSON files and strings, distinguishing I/O errors from JSON errors and
//! attaching file-path context where available. Geometry resolution lives in
//! [`crate::layout::builder`]; parsing here only produces the raw
//! [`KeyboardSpec`] document.

use std::fs;

use crate::layout::types::{KeyboardSpec, LayoutError};

/// Parses a keyboard layout document from a JSON file.
///
/// Reads the file from the filesystem and parses it, distinguishing between
/// I/O errors (file not found, permission denied) and JSON parsing errors
/// (malformed JSON, type mismatches). Both carry the file path for
/// diagnostics.
///
/// # Example
///
/// ```rust,ignore
/// use softboard::layout::parser::parse_layout_file;
///
/// match parse_layout_file("layouts/qwerty.json") {
///     Ok(spec) => println!("Loaded layout: {}", spec.name),
///     Err(e) => eprintln!("Failed to parse layout: {}", e),
/// }
/// ```
pub fn parse_layout_file(path: &str) -> Result<KeyboardSpec, LayoutError> {
    let json_str =
        fs::read_to_string(path).map_err(|e| LayoutError::io_error_with_path(e, path))?;

    let spec: KeyboardSpec = serde_json::from_str(&json_str)
        .map_err(|e| LayoutError::json_error_with_path(e, path))?;

    tracing::debug!(
        layout = %spec.name,
        rows = spec.rows.len(),
        "parsed layout document from {path}"
    );
    Ok(spec)
}

/// Parses a keyboard layout document from a JSON string.
///
/// Use this when the JSON content is already in memory, or for testing.
/// Errors carry no file-path context.
pub fn parse_layout_from_string(json: &str) -> Result<KeyboardSpec, LayoutError> {
    serde_json::from_str(json).map_err(LayoutError::json_error)
}

// ============================================================================
// Tests
// ============================================================================
