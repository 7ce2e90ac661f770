// SPDX-License-Identifier: GPL-3.0-only

//! The in-memory keyboard model.
//!
//! A [`Keyboard`] is an ordered collection of rows of [`Key`]s with fully
//! resolved geometry. It is produced by the layout loader (see
//! [`crate::layout`]) and owned exclusively by one gesture engine instance.
//! The model is rebuilt wholesale whenever the layout, language, or device
//! orientation changes — it is never mutated incrementally, apart from the
//! transient per-key `pressed`/`focused` flags and the keyboard shift state.

use std::ops::Range;

// ============================================================================
// Key Codes
// ============================================================================

/// Shift key.
pub const KEYCODE_SHIFT: i32 = -1;
/// Switch between letters and symbols.
pub const KEYCODE_MODE_CHANGE: i32 = -2;
/// Enter / action key.
pub const KEYCODE_ENTER: i32 = -4;
/// Backspace.
pub const KEYCODE_DELETE: i32 = -5;
/// Tab.
pub const KEYCODE_TAB: i32 = -30;
/// Caps lock (toggles shift lock directly).
pub const KEYCODE_CAPS_LOCK: i32 = -50;
/// Move the cursor one position left.
pub const KEYCODE_LEFT_ARROW: i32 = -55;
/// Move the cursor one position right.
pub const KEYCODE_RIGHT_ARROW: i32 = -56;
/// Space. Positive because it is a literal character.
pub const KEYCODE_SPACE: i32 = 32;

/// Maximum number of keys per row in a popup mini keyboard before wrapping.
pub const MAX_KEYS_PER_MINI_ROW: usize = 10;

// ============================================================================
// Shift State and Enter Key Kind
// ============================================================================

/// Shift state of the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftState {
    /// Shift is inactive.
    #[default]
    Off,
    /// Shift applies to the next character only.
    OnOneChar,
    /// Shift is locked (caps lock).
    Locked,
}

impl ShiftState {
    /// Returns `true` if any shift is active.
    pub fn is_shifted(self) -> bool {
        self != ShiftState::Off
    }
}

/// The host action associated with the enter key.
///
/// Drives which icon the renderer substitutes on the enter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnterKeyKind {
    /// Generic enter / newline.
    #[default]
    Enter,
    /// Search action.
    Search,
    /// Move to the next field.
    Next,
    /// Go / navigate action.
    Go,
    /// Send action.
    Send,
    /// Host-specific custom command.
    Command,
}

// ============================================================================
// Edge Flags
// ============================================================================

/// Anchoring of a key to the physical keyboard edges.
///
/// An edge-anchored key extends its hit area to the keyboard boundary so
/// there is no dead zone at the physical edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeFlags {
    /// Key is attached to the left keyboard edge.
    pub left: bool,
    /// Key is attached to the right keyboard edge.
    pub right: bool,
}

// ============================================================================
// Key
// ============================================================================

/// Position and characteristics of a single key in the keyboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    /// Key code this key generates. Negative codes are control actions,
    /// positive codes are Unicode scalar values.
    pub code: i32,
    /// Label to display.
    pub label: String,
    /// Secondary glyph shown in the top corner (long-press number hints).
    pub top_small_number: String,
    /// Icon name to display instead of the label. Icon takes precedence.
    pub icon: Option<String>,
    /// X coordinate of the key in the keyboard layout.
    pub x: f32,
    /// Y coordinate of the key in the keyboard layout.
    pub y: f32,
    /// Width of the key, not including the gap.
    pub width: f32,
    /// Height of the key.
    pub height: f32,
    /// Horizontal gap before this key.
    pub gap: f32,
    /// Current pressed state.
    pub pressed: bool,
    /// Focused state, used for popup alternate selection.
    pub focused: bool,
    /// Whether this key repeats itself when held down.
    pub repeatable: bool,
    /// Popup characters shown after long pressing the key.
    pub popup_characters: Option<String>,
    /// Edge anchoring for hit-test extension.
    pub edge_flags: EdgeFlags,
}

impl Key {
    /// Creates a blank key at the origin with the given geometry.
    pub fn new(code: i32, label: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            code,
            label: label.into(),
            top_small_number: String::new(),
            icon: None,
            x: 0.0,
            y: 0.0,
            width,
            height,
            gap: 0.0,
            pressed: false,
            focused: false,
            repeatable: false,
            popup_characters: None,
            edge_flags: EdgeFlags::default(),
        }
    }

    /// Detects whether a point falls inside this key.
    ///
    /// If the key is attached to an edge, all points between the key and that
    /// edge are considered inside the key.
    pub fn is_inside(&self, x: f32, y: f32) -> bool {
        let left_ok = x >= self.x || (self.edge_flags.left && x <= self.x + self.width);
        let right_ok = x < self.x + self.width || (self.edge_flags.right && x >= self.x);
        left_ok && right_ok && y >= self.y && y < self.y + self.height
    }

    /// Returns the horizontal centre of the key.
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Returns the vertical centre of the key.
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Returns `true` if this key has long-press alternates.
    pub fn has_popup(&self) -> bool {
        self.popup_characters
            .as_deref()
            .is_some_and(|chars| !chars.is_empty())
    }
}

// ============================================================================
// Rows and Keyboard
// ============================================================================

/// Geometry of one keyboard row.
///
/// All keys in a row share the row's `y` coordinate. Keys are stored flat on
/// the [`Keyboard`]; a row addresses its slice by index range.
#[derive(Debug, Clone, PartialEq)]
pub struct RowInfo {
    /// Y coordinate shared by every key in the row.
    pub y: f32,
    /// Row height.
    pub height: f32,
    /// The width the row declared; summed key `(width + gap)` must match it.
    pub declared_width: f32,
    /// Index range of this row's keys in [`Keyboard::keys`].
    pub keys: Range<usize>,
}

/// A complete keyboard with resolved geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyboard {
    keys: Vec<Key>,
    rows: Vec<RowInfo>,
    /// Total width of the keyboard including left side gaps and keys.
    pub min_width: f32,
    /// Total height of the keyboard.
    pub height: f32,
    /// Current shift state.
    pub shift_state: ShiftState,
    /// What action the enter key requests from the host.
    pub enter_key_kind: EnterKeyKind,
}

impl Keyboard {
    /// Assembles a keyboard from already-resolved parts.
    ///
    /// Used by the layout builder; geometry must already be consistent.
    pub(crate) fn from_parts(
        keys: Vec<Key>,
        rows: Vec<RowInfo>,
        min_width: f32,
        height: f32,
        enter_key_kind: EnterKeyKind,
    ) -> Self {
        Self {
            keys,
            rows,
            min_width,
            height,
            shift_state: ShiftState::Off,
            enter_key_kind,
        }
    }

    /// Creates a popup mini keyboard from a character list.
    ///
    /// One key is created per character, laid out left-to-right and wrapping
    /// to a new row after [`MAX_KEYS_PER_MINI_ROW`] keys. `key_width` should
    /// match the long-pressed parent key's width so selection tracking lines
    /// up with the parent keyboard's geometry.
    pub fn from_characters(characters: &str, key_width: f32, key_height: f32) -> Self {
        let mut keys = Vec::new();
        let mut rows = Vec::new();
        let mut x = 0.0_f32;
        let mut y = 0.0_f32;
        let mut min_width = 0.0_f32;
        let mut row_start = 0;

        for (i, ch) in characters.chars().enumerate() {
            if i > 0 && i % MAX_KEYS_PER_MINI_ROW == 0 {
                rows.push(RowInfo {
                    y,
                    height: key_height,
                    declared_width: x,
                    keys: row_start..keys.len(),
                });
                row_start = keys.len();
                x = 0.0;
                y += key_height;
            }

            let mut key = Key::new(ch as i32, ch.to_string(), key_width, key_height);
            key.x = x;
            key.y = y;
            x += key.width + key.gap;
            min_width = min_width.max(x);
            keys.push(key);
        }

        rows.push(RowInfo {
            y,
            height: key_height,
            declared_width: x,
            keys: row_start..keys.len(),
        });

        Self::from_parts(keys, rows, min_width, y + key_height, EnterKeyKind::Enter)
    }

    /// All keys in layout order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Row geometry in top-to-bottom order.
    pub fn rows(&self) -> &[RowInfo] {
        &self.rows
    }

    /// Returns the key at `index`, if any.
    pub fn key(&self, index: usize) -> Option<&Key> {
        self.keys.get(index)
    }

    /// Mutable access to the key at `index`.
    pub fn key_mut(&mut self, index: usize) -> Option<&mut Key> {
        self.keys.get_mut(index)
    }

    /// Number of keys.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Finds the first key containing the given point.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<usize> {
        self.keys.iter().position(|key| key.is_inside(x, y))
    }

    /// Sets the keyboard shift state.
    ///
    /// Returns `true` if the state changed.
    pub fn set_shifted(&mut self, shift_state: ShiftState) -> bool {
        if self.shift_state != shift_state {
            self.shift_state = shift_state;
            true
        } else {
            false
        }
    }

    /// Clears all transient per-key flags (pressed, focused).
    pub fn clear_transient_flags(&mut self) {
        for key in &mut self.keys {
            key.pressed = false;
            key.focused = false;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_key(code: i32, x: f32, width: f32) -> Key {
        let mut key = Key::new(code, "k", width, 50.0);
        key.x = x;
        key
    }

    /// A point inside the key rectangle hits it; a point past the right edge
    /// of a non-edge key misses.
    #[test]
    fn test_is_inside_plain_key() {
        let key = plain_key('a' as i32, 10.0, 40.0);
        assert!(key.is_inside(10.0, 0.0), "left edge is inclusive");
        assert!(key.is_inside(30.0, 25.0), "centre hits");
        assert!(!key.is_inside(50.0, 25.0), "right edge is exclusive");
        assert!(!key.is_inside(9.9, 25.0), "point left of key misses");
        assert!(!key.is_inside(30.0, 50.0), "bottom edge is exclusive");
    }

    /// Edge-anchored keys extend to the keyboard boundary.
    #[test]
    fn test_is_inside_edge_extension() {
        let mut left = plain_key('q' as i32, 5.0, 40.0);
        left.edge_flags.left = true;
        assert!(
            left.is_inside(0.0, 25.0),
            "left-edge key should catch touches left of its x"
        );

        let mut right = plain_key('p' as i32, 100.0, 40.0);
        right.edge_flags.right = true;
        assert!(
            right.is_inside(160.0, 25.0),
            "right-edge key should catch touches right of its bounds"
        );
        assert!(
            !right.is_inside(99.0, 25.0),
            "right-edge key should not extend leftwards"
        );
    }

    /// Mini keyboard wraps after MAX_KEYS_PER_MINI_ROW keys.
    #[test]
    fn test_from_characters_wrapping() {
        let chars: String = ('a'..='l').collect(); // 12 characters
        let kb = Keyboard::from_characters(&chars, 40.0, 50.0);

        assert_eq!(kb.key_count(), 12);
        assert_eq!(kb.rows().len(), 2, "12 keys should wrap into two rows");
        assert_eq!(kb.rows()[0].keys.len(), MAX_KEYS_PER_MINI_ROW);
        assert_eq!(kb.rows()[1].keys.len(), 2);
        assert_eq!(kb.height, 100.0);
        assert_eq!(kb.min_width, 400.0, "widest row determines min_width");

        // Second-row keys sit below the first row.
        let key_10 = kb.key(10).unwrap();
        assert_eq!(key_10.y, 50.0);
        assert_eq!(key_10.x, 0.0);
    }

    /// Two alternates produce exactly two keys on one row.
    #[test]
    fn test_from_characters_two_alternates() {
        let kb = Keyboard::from_characters("áà", 36.0, 48.0);
        assert_eq!(kb.key_count(), 2);
        assert_eq!(kb.rows().len(), 1);
        assert_eq!(kb.key(0).unwrap().code, 'á' as i32);
        assert_eq!(kb.key(1).unwrap().code, 'à' as i32);
        assert_eq!(kb.key(1).unwrap().x, 36.0);
    }

    /// set_shifted reports whether the state actually changed.
    #[test]
    fn test_set_shifted_change_detection() {
        let mut kb = Keyboard::from_characters("ab", 40.0, 50.0);
        assert_eq!(kb.shift_state, ShiftState::Off);
        assert!(kb.set_shifted(ShiftState::OnOneChar));
        assert!(!kb.set_shifted(ShiftState::OnOneChar), "no-op returns false");
        assert!(kb.set_shifted(ShiftState::Locked));
        assert!(kb.set_shifted(ShiftState::Off));
    }

    /// hit_test returns the first containing key.
    #[test]
    fn test_hit_test_exclusive() {
        let kb = Keyboard::from_characters("abc", 40.0, 50.0);
        assert_eq!(kb.hit_test(20.0, 25.0), Some(0));
        assert_eq!(kb.hit_test(60.0, 25.0), Some(1));
        assert_eq!(kb.hit_test(100.0, 25.0), Some(2));
        assert_eq!(kb.hit_test(20.0, 60.0), None, "below keyboard misses");
    }
}
