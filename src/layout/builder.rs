// SPDX-License-Identifier: GPL-3.0-only

//! Geometry resolution: turns a parsed [`KeyboardSpec`] into a [`Keyboard`].
//!
//! Sizing defaults inherit keyboard → row → key. Widths and gaps accumulate
//! left to right (each key's gap sits before the key), rows stack top to
//! bottom. Validation issues are collected across the whole document before
//! failing, so one pass reports every problem; a layout with any
//! error-severity issue never produces a partially built keyboard.

use crate::keyboard::{EdgeFlags, EnterKeyKind, Key, Keyboard, RowInfo};
use crate::layout::types::{
    Dimension, EdgeFlag, KeyboardSpec, LayoutError, Severity, ValidationIssue,
};

/// Fallback key height when no level of the document declares one. Matches a
/// comfortable touch target on a 160 dpi display.
const DEFAULT_KEY_HEIGHT: f32 = 54.0;

/// Builds a [`Keyboard`] from a parsed layout document.
///
/// `display_width` is the base against which percentage dimensions resolve.
/// `enter_key_kind` selects the enter-key action icon and is stored on the
/// keyboard for the renderer.
///
/// Fatal issues (missing key width, empty layout, malformed fractions,
/// unresolved `popup_layout` references) return
/// [`LayoutError::Validation`]; row-overflow issues are logged as warnings
/// and do not fail the build.
pub fn build(
    spec: &KeyboardSpec,
    display_width: f32,
    enter_key_kind: EnterKeyKind,
) -> Result<Keyboard, LayoutError> {
    let mut issues: Vec<ValidationIssue> = Vec::new();

    if spec.rows.iter().all(|row| row.keys.is_empty()) {
        issues.push(
            ValidationIssue::new(Severity::Error, "layout contains no keys", "rows")
                .with_suggestion("Add at least one row with at least one key"),
        );
        return Err(LayoutError::validation_error(issues));
    }

    let mut keys: Vec<Key> = Vec::new();
    let mut rows: Vec<RowInfo> = Vec::new();
    let mut y = 0.0_f32;
    let mut min_width = 0.0_f32;

    for (row_index, row_spec) in spec.rows.iter().enumerate() {
        let row_path = format!("rows[{}]", row_index);

        let row_height = resolve_inherited(
            &[&row_spec.key_height, &spec.key_height],
            display_width,
            &format!("{}.key_height", row_path),
            &mut issues,
        )
        .unwrap_or(DEFAULT_KEY_HEIGHT);

        let mut x = 0.0_f32;
        let row_start = keys.len();

        for (key_index, key_spec) in row_spec.keys.iter().enumerate() {
            let key_path = format!("{}.keys[{}]", row_path, key_index);

            let gap = resolve_inherited(
                &[
                    &key_spec.horizontal_gap,
                    &row_spec.horizontal_gap,
                    &spec.horizontal_gap,
                ],
                display_width,
                &format!("{}.horizontal_gap", key_path),
                &mut issues,
            )
            .unwrap_or(0.0);

            let Some(width) = resolve_inherited(
                &[&key_spec.width, &row_spec.key_width, &spec.key_width],
                display_width,
                &format!("{}.width", key_path),
                &mut issues,
            ) else {
                issues.push(
                    ValidationIssue::new(
                        Severity::Error,
                        "key has no width",
                        format!("{}.width", key_path),
                    )
                    .with_suggestion("Set width on the key, or key_width on the row or keyboard"),
                );
                continue;
            };

            let code = match key_spec.code {
                Some(code) => code,
                None => match key_spec.label.chars().next() {
                    Some(ch) => ch as i32,
                    None => {
                        issues.push(
                            ValidationIssue::new(
                                Severity::Error,
                                "key has neither a code nor a label",
                                &key_path,
                            )
                            .with_suggestion("Set a code or a non-empty label"),
                        );
                        continue;
                    }
                },
            };

            let popup_characters = match (&key_spec.popup_characters, &key_spec.popup_layout) {
                (Some(chars), _) => Some(chars.clone()),
                (None, Some(name)) => match spec.popups.get(name) {
                    Some(chars) => Some(chars.clone()),
                    None => {
                        issues.push(
                            ValidationIssue::new(
                                Severity::Error,
                                format!("popup_layout '{}' is not defined in popups", name),
                                format!("{}.popup_layout", key_path),
                            )
                            .with_suggestion("Add the entry to the document's popups map"),
                        );
                        None
                    }
                },
                (None, None) => None,
            };

            let mut key = Key::new(code, key_spec.label.clone(), width, row_height);
            key.top_small_number = key_spec.top_small_number.clone();
            key.icon = key_spec.icon.clone();
            key.gap = gap;
            key.repeatable = key_spec.repeatable;
            key.popup_characters = popup_characters;
            key.edge_flags = EdgeFlags {
                left: key_spec.edge_flags.contains(&EdgeFlag::Left),
                right: key_spec.edge_flags.contains(&EdgeFlag::Right),
            };

            x += gap;
            key.x = x;
            key.y = y;
            x += width;
            keys.push(key);
        }

        if x > display_width + 0.5 {
            issues.push(
                ValidationIssue::new(
                    Severity::Warning,
                    format!(
                        "row width {:.1} exceeds display width {:.1}",
                        x, display_width
                    ),
                    &row_path,
                )
                .with_suggestion("Reduce key widths or gaps so the row fits the display"),
            );
        }

        min_width = min_width.max(x);
        rows.push(RowInfo {
            y,
            height: row_height,
            declared_width: x,
            keys: row_start..keys.len(),
        });
        y += row_height;
    }

    if issues.iter().any(|i| i.severity == Severity::Error) {
        return Err(LayoutError::validation_error(issues));
    }
    for issue in &issues {
        tracing::warn!(layout = %spec.name, "{}", issue);
    }

    tracing::debug!(
        layout = %spec.name,
        keys = keys.len(),
        rows = rows.len(),
        min_width,
        height = y,
        "built keyboard"
    );
    Ok(Keyboard::from_parts(keys, rows, min_width, y, enter_key_kind))
}

/// Resolves the first present dimension in an inheritance chain.
///
/// Returns `None` when the chain is entirely unset. A present but
/// unresolvable dimension (bad fraction, non-positive pixels) records a fatal
/// issue and falls through to the next level.
fn resolve_inherited(
    chain: &[&Option<Dimension>],
    base: f32,
    field_path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<f32> {
    for dimension in chain.iter().filter_map(|d| d.as_ref()) {
        match dimension.resolve(base) {
            Some(value) => return Some(value),
            None => {
                issues.push(
                    ValidationIssue::new(
                        Severity::Error,
                        format!("invalid dimension {:?}", dimension),
                        field_path,
                    )
                    .with_suggestion("Use a positive number or a percentage like \"10%\""),
                );
            }
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::parser::parse_layout_from_string;

    fn build_from(json: &str, display_width: f32) -> Result<Keyboard, LayoutError> {
        let spec = parse_layout_from_string(json).expect("test JSON must parse");
        build(&spec, display_width, EnterKeyKind::Enter)
    }

    /// Keyboard-level defaults inherit into rows and keys; percentage widths
    /// resolve against the display width.
    #[test]
    fn test_inheritance_and_fraction_resolution() {
        let kb = build_from(
            r#"{
                "name": "qwerty-ish",
                "key_width": "10%",
                "key_height": 54.0,
                "rows": [
                    { "keys": [ { "label": "q" }, { "label": "w" } ] },
                    { "key_width": 64.0, "keys": [ { "label": "a" } ] }
                ]
            }"#,
            320.0,
        )
        .expect("layout should build");

        assert_eq!(kb.key_count(), 3);
        assert_eq!(kb.keys()[0].width, 32.0, "10% of 320");
        assert_eq!(kb.keys()[1].x, 32.0);
        assert_eq!(kb.keys()[2].width, 64.0, "row default overrides keyboard");
        assert_eq!(kb.keys()[2].y, 54.0, "second row sits below the first");
        assert_eq!(kb.height, 108.0);
    }

    /// Gaps accumulate before each key and count toward the row width.
    #[test]
    fn test_gap_accumulation() {
        let kb = build_from(
            r#"{
                "key_width": 40.0,
                "key_height": 50.0,
                "horizontal_gap": 4.0,
                "rows": [ { "keys": [ { "label": "a" }, { "label": "b" } ] } ]
            }"#,
            320.0,
        )
        .expect("layout should build");

        assert_eq!(kb.keys()[0].x, 4.0, "gap precedes the first key");
        assert_eq!(kb.keys()[1].x, 48.0);
        assert_eq!(kb.min_width, 88.0);
        assert_eq!(kb.rows()[0].declared_width, 88.0);
    }

    /// A key with no width anywhere in the chain is fatal.
    #[test]
    fn test_missing_width_is_fatal() {
        let err = build_from(
            r#"{
                "key_height": 50.0,
                "rows": [ { "keys": [ { "label": "a" } ] } ]
            }"#,
            320.0,
        )
        .unwrap_err();

        match err {
            LayoutError::Validation { issues, .. } => {
                assert!(
                    issues.iter().any(|i| i.severity == Severity::Error
                        && i.field_path.contains("width")),
                    "expected a width error, got: {:?}",
                    issues
                );
            }
            other => panic!("expected Validation, got: {}", other),
        }
    }

    /// An empty layout is fatal.
    #[test]
    fn test_empty_layout_is_fatal() {
        let err = build_from(r#"{ "rows": [] }"#, 320.0).unwrap_err();
        assert!(matches!(err, LayoutError::Validation { .. }));
    }

    /// A popup_layout reference must exist in the popups map.
    #[test]
    fn test_unknown_popup_reference_is_fatal() {
        let err = build_from(
            r#"{
                "key_width": 40.0,
                "key_height": 50.0,
                "popups": { "a_accents": "áà" },
                "rows": [ { "keys": [ { "label": "e", "popup_layout": "e_accents" } ] } ]
            }"#,
            320.0,
        )
        .unwrap_err();

        match err {
            LayoutError::Validation { issues, .. } => {
                assert!(
                    issues.iter().any(|i| i.message.contains("e_accents")),
                    "issue should name the missing popup: {:?}",
                    issues
                );
            }
            other => panic!("expected Validation, got: {}", other),
        }
    }

    /// A resolvable popup_layout reference lands on the key.
    #[test]
    fn test_popup_reference_resolution() {
        let kb = build_from(
            r#"{
                "key_width": 40.0,
                "key_height": 50.0,
                "popups": { "a_accents": "áà" },
                "rows": [ { "keys": [ { "label": "a", "popup_layout": "a_accents" } ] } ]
            }"#,
            320.0,
        )
        .expect("layout should build");

        assert_eq!(kb.keys()[0].popup_characters.as_deref(), Some("áà"));
    }

    /// Codes default to the label's first character; explicit codes win.
    #[test]
    fn test_code_defaults_from_label() {
        let kb = build_from(
            r#"{
                "key_width": 40.0,
                "key_height": 50.0,
                "rows": [ { "keys": [
                    { "label": "a" },
                    { "code": -5, "icon": "delete", "repeatable": true }
                ] } ]
            }"#,
            320.0,
        )
        .expect("layout should build");

        assert_eq!(kb.keys()[0].code, 'a' as i32);
        assert_eq!(kb.keys()[1].code, -5);
        assert!(kb.keys()[1].repeatable);
    }

    /// Edge flags land on the built keys.
    #[test]
    fn test_edge_flags_applied() {
        let kb = build_from(
            r#"{
                "key_width": 40.0,
                "key_height": 50.0,
                "rows": [ { "keys": [
                    { "label": "q", "edge_flags": ["left"] },
                    { "label": "p", "edge_flags": ["right"] }
                ] } ]
            }"#,
            320.0,
        )
        .expect("layout should build");

        assert!(kb.keys()[0].edge_flags.left);
        assert!(!kb.keys()[0].edge_flags.right);
        assert!(kb.keys()[1].edge_flags.right);
    }

    /// Rows wider than the display build with a warning, not an error.
    #[test]
    fn test_overflowing_row_is_only_a_warning() {
        let kb = build_from(
            r#"{
                "key_width": 200.0,
                "key_height": 50.0,
                "rows": [ { "keys": [ { "label": "a" }, { "label": "b" } ] } ]
            }"#,
            320.0,
        );
        assert!(kb.is_ok(), "overflow should not fail the build");
    }
}
