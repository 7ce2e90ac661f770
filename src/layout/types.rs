// SPDX-License-Identifier: GPL-3.0-only

//! Serde data model for keyboard layout documents, plus the loader's error
//! types.
//!
//! A layout document is a JSON object describing keyboard-level sizing
//! defaults, a list of rows of keys, and an optional `popups` map of named
//! alternate-character strings. Dimensions may be literal pixel numbers or
//! percentage strings (`"10%"`) resolved against the available display width.
//! Unknown attributes are ignored so documents stay forward-compatible.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

// ============================================================================
// Error Types
// ============================================================================

/// Severity level for layout validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the layout cannot be built.
    Error,
    /// Non-fatal: the layout builds, but something looks wrong.
    Warning,
}

/// A single problem found while validating a layout document.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// How serious the issue is.
    pub severity: Severity,
    /// Human-readable description of the problem.
    pub message: String,
    /// Dotted path to the offending field, e.g. `rows[2].keys[0].width`.
    pub field_path: String,
    /// Optional hint for fixing the document.
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Creates a new validation issue.
    pub fn new(severity: Severity, message: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            field_path: field_path.into(),
            suggestion: None,
        }
    }

    /// Attaches a fix-it suggestion to the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };
        write!(f, "[{}] {}: {}", tag, self.field_path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

/// Errors produced while loading or building a keyboard layout.
#[derive(Debug)]
pub enum LayoutError {
    /// Reading the layout file failed.
    Io {
        source: std::io::Error,
        file_path: Option<String>,
        suggestion: Option<String>,
    },
    /// The document is not valid JSON or does not match the schema.
    Json {
        source: serde_json::Error,
        file_path: Option<String>,
        line_number: Option<usize>,
        suggestion: Option<String>,
    },
    /// The document parsed but failed semantic validation.
    Validation {
        issues: Vec<ValidationIssue>,
        file_path: Option<String>,
    },
}

impl LayoutError {
    /// Creates an I/O error without file context.
    pub fn io_error(source: std::io::Error) -> Self {
        LayoutError::Io {
            source,
            file_path: None,
            suggestion: None,
        }
    }

    /// Creates an I/O error carrying the path that failed.
    pub fn io_error_with_path(source: std::io::Error, file_path: impl Into<String>) -> Self {
        LayoutError::Io {
            source,
            file_path: Some(file_path.into()),
            suggestion: Some("Check that the layout file exists and is readable".into()),
        }
    }

    /// Creates a JSON error without file context.
    pub fn json_error(source: serde_json::Error) -> Self {
        let line_number = Some(source.line()).filter(|&l| l > 0);
        LayoutError::Json {
            source,
            file_path: None,
            line_number,
            suggestion: None,
        }
    }

    /// Creates a JSON error carrying the path that failed.
    pub fn json_error_with_path(source: serde_json::Error, file_path: impl Into<String>) -> Self {
        let line_number = Some(source.line()).filter(|&l| l > 0);
        LayoutError::Json {
            source,
            file_path: Some(file_path.into()),
            line_number,
            suggestion: Some("Check the JSON syntax of the layout document".into()),
        }
    }

    /// Creates a validation error from collected issues.
    pub fn validation_error(issues: Vec<ValidationIssue>) -> Self {
        LayoutError::Validation {
            issues,
            file_path: None,
        }
    }

    /// Creates a validation error carrying the source path.
    pub fn validation_error_with_path(
        issues: Vec<ValidationIssue>,
        file_path: impl Into<String>,
    ) -> Self {
        LayoutError::Validation {
            issues,
            file_path: Some(file_path.into()),
        }
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Io {
                source,
                file_path,
                suggestion,
            } => {
                write!(f, "failed to read layout")?;
                if let Some(path) = file_path {
                    write!(f, " from '{}'", path)?;
                }
                write!(f, ": {}", source)?;
                if let Some(suggestion) = suggestion {
                    write!(f, "\n  Suggestion: {}", suggestion)?;
                }
                Ok(())
            }
            LayoutError::Json {
                source,
                file_path,
                line_number,
                suggestion,
            } => {
                write!(f, "failed to parse layout")?;
                if let Some(path) = file_path {
                    write!(f, " from '{}'", path)?;
                }
                if let Some(line) = line_number {
                    write!(f, " (line {})", line)?;
                }
                write!(f, ": {}", source)?;
                if let Some(suggestion) = suggestion {
                    write!(f, "\n  Suggestion: {}", suggestion)?;
                }
                Ok(())
            }
            LayoutError::Validation { issues, file_path } => {
                write!(f, "layout validation failed")?;
                if let Some(path) = file_path {
                    write!(f, " for '{}'", path)?;
                }
                write!(f, " with {} issue(s):", issues.len())?;
                for issue in issues {
                    write!(f, "\n  {}", issue)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LayoutError::Io { source, .. } => Some(source),
            LayoutError::Json { source, .. } => Some(source),
            LayoutError::Validation { .. } => None,
        }
    }
}

impl From<std::io::Error> for LayoutError {
    fn from(source: std::io::Error) -> Self {
        LayoutError::io_error(source)
    }
}

impl From<serde_json::Error> for LayoutError {
    fn from(source: serde_json::Error) -> Self {
        LayoutError::json_error(source)
    }
}

// ============================================================================
// Dimensions
// ============================================================================

/// A key dimension: literal pixels or a percentage of the available width.
///
/// In JSON, a number is pixels and a string such as `"10%"` is a fraction of
/// the base dimension it resolves against.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    /// Literal size in pixels.
    Pixels(f32),
    /// Percentage string, e.g. `"10%"`.
    Fraction(String),
}

impl Dimension {
    /// Resolves the dimension against a base size.
    ///
    /// Returns `None` for non-positive pixel values, malformed percentage
    /// strings, and percentages outside `(0, 100]`.
    pub fn resolve(&self, base: f32) -> Option<f32> {
        match self {
            Dimension::Pixels(px) => (*px > 0.0).then_some(*px),
            Dimension::Fraction(text) => {
                let pct: f32 = text.strip_suffix('%')?.trim().parse().ok()?;
                (pct > 0.0 && pct <= 100.0).then(|| base * pct / 100.0)
            }
        }
    }
}

// ============================================================================
// Layout Document
// ============================================================================

/// Edge the key is anchored to for hit-test extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeFlag {
    Left,
    Right,
}

/// One key in a layout document. All fields are optional; sizing defaults
/// inherit from the row, then the keyboard.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct KeySpec {
    /// Key code. Defaults to the first character of `label` when unset.
    pub code: Option<i32>,
    /// Display label.
    #[serde(default)]
    pub label: String,
    /// Secondary glyph shown in the top corner.
    #[serde(default)]
    pub top_small_number: String,
    /// Icon name to display instead of the label.
    pub icon: Option<String>,
    /// Key width; overrides the row/keyboard default.
    pub width: Option<Dimension>,
    /// Gap before this key; overrides the row/keyboard default.
    pub horizontal_gap: Option<Dimension>,
    /// Whether the key repeats when held.
    #[serde(default)]
    pub repeatable: bool,
    /// Inline long-press alternates.
    pub popup_characters: Option<String>,
    /// Name of an entry in the document's `popups` map.
    pub popup_layout: Option<String>,
    /// Edges this key extends its hit area to.
    #[serde(default)]
    pub edge_flags: Vec<EdgeFlag>,
}

/// One row in a layout document.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct RowSpec {
    /// Default key width for this row.
    pub key_width: Option<Dimension>,
    /// Key height for this row.
    pub key_height: Option<Dimension>,
    /// Default gap before each key in this row.
    pub horizontal_gap: Option<Dimension>,
    /// Keys in left-to-right order.
    #[serde(default)]
    pub keys: Vec<KeySpec>,
}

/// The root of a layout document.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct KeyboardSpec {
    /// Layout name, for logging only.
    #[serde(default)]
    pub name: String,
    /// Keyboard-wide default key width.
    pub key_width: Option<Dimension>,
    /// Keyboard-wide default key height.
    pub key_height: Option<Dimension>,
    /// Keyboard-wide default horizontal gap.
    pub horizontal_gap: Option<Dimension>,
    /// Rows in top-to-bottom order.
    #[serde(default)]
    pub rows: Vec<RowSpec>,
    /// Named alternate-character strings referenced by `popup_layout`.
    #[serde(default)]
    pub popups: HashMap<String, String>,
}

// ============================================================================
// Tests
// ============================================================================
