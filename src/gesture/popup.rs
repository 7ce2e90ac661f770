// SPDX-License-Identifier: GPL-3.0-only

//! Long-press popup alternates.
//!
//! A [`PopupSession`] is a miniature keyboard built from a key's alternate
//! characters, anchored above the long-pressed key. It owns its own renderer
//! so the host can composite it as a separate surface. The gesture engine
//! drives selection tracking and dismissal; the session resolves to at most
//! one key code.

use crate::keyboard::Keyboard;
use crate::render::{DrawCommand, Renderer, VisualState};

/// How far outside the popup bounds the pointer may wander before the popup
/// cancels without emitting, in pixels. Applies on all four sides.
pub const POPUP_MAX_MOVE_DISTANCE: f32 = 64.0;

/// Result of feeding a pointer position to [`PopupSession::track`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupTrack {
    /// Selection unchanged.
    Unchanged,
    /// A different popup key is now selected; repaint needed.
    SelectionChanged,
    /// The pointer moved too far away; the popup must close without emitting.
    Cancelled,
}

/// An open popup of long-press alternates for one parent key.
#[derive(Debug)]
pub struct PopupSession {
    keyboard: Keyboard,
    renderer: Renderer,
    /// Top-left of the popup in parent-keyboard coordinates.
    origin_x: f32,
    origin_y: f32,
    selected: Option<usize>,
    parent_key: usize,
}

impl PopupSession {
    /// Opens a popup for the given parent key.
    ///
    /// One popup key is created per character of the alternates string, in
    /// order; layouts that want the base character reachable include it in
    /// the string. Returns `None` when the key has no alternates.
    pub fn open(
        parent: &Keyboard,
        parent_key: usize,
        touch_x: f32,
        host_width: f32,
    ) -> Option<Self> {
        let key = parent.key(parent_key)?;
        let alternates = key.popup_characters.as_deref().filter(|s| !s.is_empty())?;

        let mut keyboard = Keyboard::from_characters(alternates, key.width, key.height);
        keyboard.shift_state = parent.shift_state;

        let origin_x = key.x.clamp(0.0, (host_width - keyboard.min_width).max(0.0));
        // Top-row keys have no room above; the popup pins to the top edge.
        let origin_y = (key.y - keyboard.height).max(0.0);

        let mut session = Self {
            keyboard,
            renderer: Renderer::new(),
            origin_x,
            origin_y,
            selected: None,
            parent_key,
        };

        // Preselect the popup key under (or nearest to) the original touch.
        let local_x = touch_x - session.origin_x;
        let preselect = session.nearest_key(local_x, session.keyboard.height / 2.0);
        session.set_selected(Some(preselect));

        tracing::debug!(
            parent_key,
            keys = session.keyboard.key_count(),
            origin_x = session.origin_x,
            origin_y = session.origin_y,
            "opened popup"
        );
        Some(session)
    }

    /// The mini keyboard model.
    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    /// Paints the popup's invalidated region in popup-local coordinates.
    pub fn paint(&mut self) -> Vec<DrawCommand> {
        self.renderer
            .paint(&self.keyboard, &VisualState::default())
    }

    /// Index of the long-pressed key on the parent keyboard.
    pub fn parent_key(&self) -> usize {
        self.parent_key
    }

    /// Popup bounds in parent-keyboard coordinates: `(x, y, width, height)`.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        (
            self.origin_x,
            self.origin_y,
            self.keyboard.min_width,
            self.keyboard.height,
        )
    }

    /// Key code of the currently selected popup key, if any.
    pub fn selected_code(&self) -> Option<i32> {
        self.selected
            .and_then(|i| self.keyboard.key(i))
            .map(|k| k.code)
    }

    /// Updates the selection from a pointer position in parent coordinates.
    ///
    /// Within the popup bounds (plus slop) the nearest key is selected; once
    /// the pointer leaves the bounds by more than
    /// [`POPUP_MAX_MOVE_DISTANCE`] on any side the popup cancels.
    pub fn track(&mut self, x: f32, y: f32) -> PopupTrack {
        let local_x = x - self.origin_x;
        let local_y = y - self.origin_y;

        if local_x < -POPUP_MAX_MOVE_DISTANCE
            || local_x > self.keyboard.min_width + POPUP_MAX_MOVE_DISTANCE
            || local_y < -POPUP_MAX_MOVE_DISTANCE
            || local_y > self.keyboard.height + POPUP_MAX_MOVE_DISTANCE
        {
            self.set_selected(None);
            return PopupTrack::Cancelled;
        }

        let nearest = self.nearest_key(local_x, local_y);
        if self.selected == Some(nearest) {
            PopupTrack::Unchanged
        } else {
            self.set_selected(Some(nearest));
            PopupTrack::SelectionChanged
        }
    }

    /// Finds the popup key nearest a local position, clamping into bounds so
    /// slop-zone positions still resolve.
    fn nearest_key(&self, local_x: f32, local_y: f32) -> usize {
        let x = local_x.clamp(0.0, self.keyboard.min_width - 0.5);
        let y = local_y.clamp(0.0, self.keyboard.height - 0.5);
        self.keyboard.hit_test(x, y).unwrap_or(0)
    }

    fn set_selected(&mut self, selected: Option<usize>) {
        if self.selected == selected {
            return;
        }
        if let Some(old) = self.selected.and_then(|i| self.keyboard.key_mut(i)) {
            old.focused = false;
        }
        if let Some(new) = selected.and_then(|i| self.keyboard.key_mut(i)) {
            new.focused = true;
        }
        self.selected = selected;
        self.renderer.invalidate_all();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::Key;
    use crate::keyboard::{EnterKeyKind, RowInfo};

    /// Builds a one-row parent keyboard of lowercase keys at 40x50.
    fn parent_keyboard(labels: &str, popup: Option<&str>, popup_on: usize) -> Keyboard {
        let mut keys = Vec::new();
        let mut x = 0.0;
        for ch in labels.chars() {
            let mut key = Key::new(ch as i32, ch.to_string(), 40.0, 50.0);
            key.x = x;
            key.y = 100.0;
            x += 40.0;
            keys.push(key);
        }
        if let Some(chars) = popup {
            keys[popup_on].popup_characters = Some(chars.to_string());
        }
        let rows = vec![RowInfo {
            y: 100.0,
            height: 50.0,
            declared_width: x,
            keys: 0..keys.len(),
        }];
        Keyboard::from_parts(keys, rows, x, 150.0, EnterKeyKind::Enter)
    }

    /// The popup holds exactly one key per alternate character, in order.
    #[test]
    fn test_one_key_per_alternate() {
        let parent = parent_keyboard("abcdefgh", Some("áà"), 0);
        let popup = PopupSession::open(&parent, 0, 20.0, 360.0).expect("popup opens");

        let codes: Vec<i32> = popup.keyboard().keys().iter().map(|k| k.code).collect();
        assert_eq!(codes, vec!['á' as i32, 'à' as i32]);
    }

    /// Keys without alternates open no popup.
    #[test]
    fn test_no_alternates_no_popup() {
        let parent = parent_keyboard("ab", None, 0);
        assert!(PopupSession::open(&parent, 1, 60.0, 360.0).is_none());
    }

    /// The popup anchors above the parent key and clamps on-screen.
    #[test]
    fn test_anchor_and_clamp() {
        let parent = parent_keyboard("abcdefgh", Some("áàâäãå"), 7);
        let popup = PopupSession::open(&parent, 7, 300.0, 320.0).expect("popup opens");

        let (x, y, width, height) = popup.bounds();
        assert_eq!(y, 50.0, "anchored directly above the 100.0-y parent key");
        assert_eq!(height, 50.0);
        assert_eq!(width, 240.0, "six 40-wide keys");
        assert_eq!(x, 80.0, "clamped so the popup stays inside 320px");
    }

    /// Tracking across the popup changes the selection; the selection maps to
    /// the key under the pointer.
    #[test]
    fn test_track_selection() {
        let parent = parent_keyboard("abcdefgh", Some("áà"), 0);
        let mut popup = PopupSession::open(&parent, 0, 10.0, 360.0).expect("popup opens");
        assert_eq!(popup.selected_code(), Some('á' as i32), "preselects under touch");

        let (x, y, ..) = popup.bounds();
        assert_eq!(
            popup.track(x + 60.0, y + 25.0),
            PopupTrack::SelectionChanged
        );
        assert_eq!(popup.selected_code(), Some('à' as i32));
        assert_eq!(popup.track(x + 60.0, y + 25.0), PopupTrack::Unchanged);
    }

    /// Wandering past the slop distance on any side cancels the popup.
    #[test]
    fn test_track_cancel_on_overshoot() {
        let parent = parent_keyboard("abcdefgh", Some("áà"), 0);
        let (x, y, width, height) = {
            let popup = PopupSession::open(&parent, 0, 10.0, 360.0).expect("popup opens");
            popup.bounds()
        };

        // Each direction independently.
        let probes = [
            (x - POPUP_MAX_MOVE_DISTANCE - 1.0, y + height / 2.0),
            (x + width + POPUP_MAX_MOVE_DISTANCE + 1.0, y + height / 2.0),
            (x + width / 2.0, y - POPUP_MAX_MOVE_DISTANCE - 1.0),
            (x + width / 2.0, y + height + POPUP_MAX_MOVE_DISTANCE + 1.0),
        ];
        for (px, py) in probes {
            let mut popup = PopupSession::open(&parent, 0, 10.0, 360.0).expect("popup opens");
            assert_eq!(
                popup.track(px, py),
                PopupTrack::Cancelled,
                "overshoot at ({px}, {py}) should cancel"
            );
            assert_eq!(popup.selected_code(), None, "cancelled popup emits nothing");
        }

        // Within the slop zone the popup survives.
        let mut popup = PopupSession::open(&parent, 0, 10.0, 360.0).expect("popup opens");
        assert_ne!(
            popup.track(x + width / 2.0, y + height + POPUP_MAX_MOVE_DISTANCE - 1.0),
            PopupTrack::Cancelled,
            "inside the slop zone tracking continues"
        );
    }

    /// A top-row parent pins the popup to the top edge instead of going
    /// off-screen.
    #[test]
    fn test_top_row_pins_to_top_edge() {
        let mut keys = vec![Key::new('a' as i32, "a".to_string(), 40.0, 50.0)];
        keys[0].popup_characters = Some("áà".to_string());
        let rows = vec![RowInfo {
            y: 0.0,
            height: 50.0,
            declared_width: 40.0,
            keys: 0..1,
        }];
        let parent = Keyboard::from_parts(keys, rows, 40.0, 50.0, EnterKeyKind::Enter);

        let popup = PopupSession::open(&parent, 0, 10.0, 360.0).expect("popup opens");
        let (_, y, ..) = popup.bounds();
        assert_eq!(y, 0.0, "no negative anchor for a top-row key");
    }

    /// The popup inherits the parent's shift state for rendering.
    #[test]
    fn test_popup_inherits_shift_state() {
        use crate::keyboard::ShiftState;
        let mut parent = parent_keyboard("abcdefgh", Some("áà"), 0);
        parent.shift_state = ShiftState::OnOneChar;
        let popup = PopupSession::open(&parent, 0, 10.0, 360.0).expect("popup opens");
        assert_eq!(popup.keyboard().shift_state, ShiftState::OnOneChar);
    }
}
