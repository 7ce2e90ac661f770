// SPDX-License-Identifier: GPL-3.0-only

//! Dirty-rectangle keyboard renderer.
//!
//! The [`Renderer`] owns a logical off-screen buffer: it tracks the buffer's
//! size and which region has been invalidated since the last paint. A paint
//! emits [`DrawCommand`]s only for the invalidated region; when the keyboard
//! geometry no longer matches the buffer (layout switch, rotation) the buffer
//! is stale and the next paint redraws everything.
//!
//! Painting is a pure read of the keyboard model plus the engine's
//! [`VisualState`]; it never mutates either.

pub mod command;

pub use command::{Color, DrawCommand, IconGlyph, Rect, Theme};

use crate::keyboard::{
    EnterKeyKind, Key, Keyboard, ShiftState, KEYCODE_CAPS_LOCK, KEYCODE_DELETE, KEYCODE_ENTER,
    KEYCODE_MODE_CHANGE, KEYCODE_SHIFT, KEYCODE_TAB,
};

// ============================================================================
// Paint Constants
// ============================================================================

/// Inset between a key's hit bounds and its painted body.
const KEY_MARGIN: f32 = 4.0;
/// Corner radius of key bodies.
const RECT_RADIUS: f32 = 8.0;
/// Vertical offset of the key drop shadow.
const SHADOW_OFFSET_Y: f32 = 3.0;
/// Label size as a fraction of key height.
const LABEL_SIZE_FACTOR: f32 = 0.4;
/// Corner-hint size as a fraction of key height.
const HINT_SIZE_FACTOR: f32 = 0.22;
/// How much wider than its key the preview bubble is.
const PREVIEW_WIDTH_FACTOR: f32 = 1.3;
/// Gap between a key and its preview bubble.
const PREVIEW_GAP: f32 = 6.0;

// ============================================================================
// Visual State
// ============================================================================

/// Transient, non-model inputs to a paint: the pressed-key preview target and
/// the key currently holding a popup open. Produced by the gesture engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisualState {
    /// Key whose preview bubble is showing.
    pub preview_key: Option<usize>,
    /// Key whose popup is open; painted focused.
    pub popup_parent: Option<usize>,
}

// ============================================================================
// Renderer
// ============================================================================

/// Paints a keyboard into draw commands with dirty-rectangle invalidation.
#[derive(Debug)]
pub struct Renderer {
    theme: Theme,
    buffer_width: f32,
    buffer_height: f32,
    dirty: Option<Rect>,
    stale: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Creates a renderer with the light theme and an empty, stale buffer.
    pub fn new() -> Self {
        Self::with_theme(Theme::light())
    }

    /// Creates a renderer with an explicit theme.
    pub fn with_theme(theme: Theme) -> Self {
        Self {
            theme,
            buffer_width: 0.0,
            buffer_height: 0.0,
            dirty: None,
            stale: true,
        }
    }

    /// Swaps the theme; forces a full repaint.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.stale = true;
    }

    /// Marks one key's bounds dirty.
    pub fn invalidate_key(&mut self, keyboard: &Keyboard, index: usize) {
        if let Some(key) = keyboard.key(index) {
            let rect = key_bounds(key);
            self.dirty = Some(match self.dirty {
                Some(dirty) => dirty.union(&rect),
                None => rect,
            });
        }
    }

    /// Marks the whole buffer stale; the next paint redraws everything.
    pub fn invalidate_all(&mut self) {
        self.stale = true;
    }

    /// Paints the invalidated region of the keyboard.
    ///
    /// Returns an empty list when nothing is dirty. A stale buffer (first
    /// paint, theme change, or keyboard geometry mismatch) produces a
    /// [`DrawCommand::Clear`] followed by every key; otherwise only keys
    /// intersecting the dirty rectangle are re-emitted.
    pub fn paint(&mut self, keyboard: &Keyboard, visual: &VisualState) -> Vec<DrawCommand> {
        let geometry_changed =
            self.buffer_width != keyboard.min_width || self.buffer_height != keyboard.height;
        let full = self.stale || geometry_changed;

        let region = if full {
            self.buffer_width = keyboard.min_width;
            self.buffer_height = keyboard.height;
            Rect::new(0.0, 0.0, keyboard.min_width, keyboard.height)
        } else {
            match self.dirty {
                Some(dirty) => dirty,
                None => return Vec::new(),
            }
        };

        let mut commands = Vec::new();
        if full {
            commands.push(DrawCommand::Clear(self.theme.background));
        }

        for (index, key) in keyboard.keys().iter().enumerate() {
            if !full && !key_bounds(key).intersects(&region) {
                continue;
            }
            let popup_open = visual.popup_parent == Some(index);
            self.paint_key(keyboard, key, popup_open, &mut commands);
        }

        if let Some(preview) = visual.preview_key.and_then(|i| keyboard.key(i)) {
            self.paint_preview(keyboard, preview, &mut commands);
        }

        tracing::trace!(
            commands = commands.len(),
            full,
            "painted {}x{} region at ({}, {})",
            region.width,
            region.height,
            region.x,
            region.y
        );

        self.dirty = None;
        self.stale = false;
        commands
    }

    fn paint_key(
        &self,
        keyboard: &Keyboard,
        key: &Key,
        popup_open: bool,
        commands: &mut Vec<DrawCommand>,
    ) {
        let bounds = key_bounds(key);
        let body = Rect::new(
            bounds.x + KEY_MARGIN / 2.0,
            bounds.y + KEY_MARGIN / 2.0,
            bounds.width - KEY_MARGIN,
            bounds.height - KEY_MARGIN,
        );

        let mut shadow = body;
        shadow.y += SHADOW_OFFSET_Y;
        commands.push(DrawCommand::RoundRect {
            rect: shadow,
            radius: RECT_RADIUS,
            color: self.theme.shadow,
        });

        commands.push(DrawCommand::RoundRect {
            rect: body,
            radius: RECT_RADIUS,
            color: self.key_color(keyboard, key, popup_open),
        });

        if let Some(glyph) = self.key_glyph(keyboard, key) {
            let side = (body.width.min(body.height) * 0.5).max(1.0);
            commands.push(DrawCommand::Icon {
                glyph,
                rect: Rect::new(
                    body.x + (body.width - side) / 2.0,
                    body.y + (body.height - side) / 2.0,
                    side,
                    side,
                ),
                color: self.theme.label,
            });
        } else if !key.label.is_empty() {
            commands.push(DrawCommand::Label {
                text: adjust_case(&key.label, keyboard.shift_state),
                x: key.center_x(),
                y: key.center_y(),
                size: key.height * LABEL_SIZE_FACTOR,
                color: self.theme.label,
            });
        }

        if !key.top_small_number.is_empty() {
            commands.push(DrawCommand::Label {
                text: key.top_small_number.clone(),
                x: body.x + body.width * 0.82,
                y: body.y + body.height * 0.22,
                size: key.height * HINT_SIZE_FACTOR,
                color: self.theme.label,
            });
        }
    }

    fn paint_preview(&self, _keyboard: &Keyboard, key: &Key, commands: &mut Vec<DrawCommand>) {
        let width = key.width * PREVIEW_WIDTH_FACTOR;
        let height = key.height;
        let rect = Rect::new(
            key.center_x() - width / 2.0,
            key.y - height - PREVIEW_GAP,
            width,
            height,
        );
        commands.push(DrawCommand::PreviewBubble {
            rect,
            text: key.label.clone(),
            background: self.theme.key_focused,
            label: self.theme.label,
        });
    }

    /// Background colour priority:
    /// focused > pressed > shift-lock (shift key) > special category > default.
    fn key_color(&self, keyboard: &Keyboard, key: &Key, popup_open: bool) -> Color {
        if key.focused || popup_open {
            self.theme.key_focused
        } else if key.pressed {
            self.theme.key_pressed
        } else if matches!(key.code, KEYCODE_SHIFT | KEYCODE_CAPS_LOCK)
            && keyboard.shift_state == ShiftState::Locked
        {
            self.theme.shift_locked
        } else if is_special(key.code) {
            self.theme.special_key
        } else {
            self.theme.key
        }
    }

    /// Picks the icon for a key: shift and enter icons are dynamic, other
    /// icons resolve by name. Unknown icon names fall back to the label.
    fn key_glyph(&self, keyboard: &Keyboard, key: &Key) -> Option<IconGlyph> {
        match key.code {
            KEYCODE_SHIFT | KEYCODE_CAPS_LOCK => Some(match keyboard.shift_state {
                ShiftState::Off => IconGlyph::ShiftOutline,
                ShiftState::OnOneChar => IconGlyph::ShiftFilled,
                ShiftState::Locked => IconGlyph::ShiftLocked,
            }),
            KEYCODE_ENTER => Some(match keyboard.enter_key_kind {
                EnterKeyKind::Enter => IconGlyph::Enter,
                EnterKeyKind::Search => IconGlyph::Search,
                EnterKeyKind::Next | EnterKeyKind::Go => IconGlyph::ArrowRight,
                EnterKeyKind::Send => IconGlyph::Send,
                EnterKeyKind::Command => IconGlyph::Command,
            }),
            _ => {
                let name = key.icon.as_deref()?;
                let glyph = icon_glyph(name);
                if glyph.is_none() {
                    tracing::trace!(icon = name, "unknown icon name, using label");
                }
                glyph
            }
        }
    }
}

/// Hit bounds of a key, gap excluded.
fn key_bounds(key: &Key) -> Rect {
    Rect::new(key.x, key.y, key.width, key.height)
}

fn is_special(code: i32) -> bool {
    matches!(
        code,
        KEYCODE_SHIFT
            | KEYCODE_CAPS_LOCK
            | KEYCODE_DELETE
            | KEYCODE_MODE_CHANGE
            | KEYCODE_ENTER
            | KEYCODE_TAB
    )
}

/// Resolves an icon name from the layout document.
fn icon_glyph(name: &str) -> Option<IconGlyph> {
    Some(match name {
        "shift" => IconGlyph::ShiftOutline,
        "delete" => IconGlyph::Delete,
        "enter" => IconGlyph::Enter,
        "search" => IconGlyph::Search,
        "arrow_right" => IconGlyph::ArrowRight,
        "send" => IconGlyph::Send,
        "command" => IconGlyph::Command,
        "mode_change" => IconGlyph::ModeChange,
        "tab" => IconGlyph::Tab,
        _ => return None,
    })
}

/// Upper-cases a label while shift is active. Labels longer than two
/// characters (mode-switch captions like "123") keep their case.
fn adjust_case(label: &str, shift_state: ShiftState) -> String {
    if shift_state.is_shifted() && label.chars().count() < 3 {
        label.to_uppercase()
    } else {
        label.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn keyboard() -> Keyboard {
        Keyboard::from_characters("abc", 40.0, 50.0)
    }

    fn body_rects(commands: &[DrawCommand]) -> Vec<Rect> {
        // Every key paints shadow then body; bodies are the even-odd pairs'
        // second rect. Filter by shadow colour instead, which is unique.
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::RoundRect { rect, color, .. }
                    if *color != Theme::light().shadow =>
                {
                    Some(*rect)
                }
                _ => None,
            })
            .collect()
    }

    /// The first paint is full: clear plus every key.
    #[test]
    fn test_first_paint_is_full() {
        let kb = keyboard();
        let mut renderer = Renderer::new();
        let commands = renderer.paint(&kb, &VisualState::default());

        assert!(
            matches!(commands.first(), Some(DrawCommand::Clear(_))),
            "full paint starts with a clear"
        );
        assert_eq!(body_rects(&commands).len(), 3, "one body per key");
    }

    /// Nothing dirty paints nothing.
    #[test]
    fn test_clean_paint_is_empty() {
        let kb = keyboard();
        let mut renderer = Renderer::new();
        renderer.paint(&kb, &VisualState::default());

        let commands = renderer.paint(&kb, &VisualState::default());
        assert!(commands.is_empty(), "no invalidation, no commands");
    }

    /// Invalidating one key repaints only that key.
    #[test]
    fn test_dirty_rect_limits_repaint() {
        let kb = keyboard();
        let mut renderer = Renderer::new();
        renderer.paint(&kb, &VisualState::default());

        renderer.invalidate_key(&kb, 1);
        let commands = renderer.paint(&kb, &VisualState::default());

        assert!(
            !matches!(commands.first(), Some(DrawCommand::Clear(_))),
            "partial paint has no clear"
        );
        let bodies = body_rects(&commands);
        assert_eq!(bodies.len(), 1, "only the invalidated key repaints");
        let key = kb.key(1).unwrap();
        assert!(
            bodies[0].x >= key.x && bodies[0].x < key.x + key.width,
            "repainted body lies inside key 1"
        );
    }

    /// A keyboard geometry change makes the buffer stale.
    #[test]
    fn test_geometry_change_forces_full_repaint() {
        let mut renderer = Renderer::new();
        renderer.paint(&keyboard(), &VisualState::default());

        let wider = Keyboard::from_characters("abcd", 40.0, 50.0);
        let commands = renderer.paint(&wider, &VisualState::default());
        assert!(
            matches!(commands.first(), Some(DrawCommand::Clear(_))),
            "size mismatch triggers a full repaint"
        );
        assert_eq!(body_rects(&commands).len(), 4);
    }

    /// Shifted keyboards upper-case short labels but not captions.
    #[test]
    fn test_adjust_case() {
        assert_eq!(adjust_case("a", ShiftState::OnOneChar), "A");
        assert_eq!(adjust_case("a", ShiftState::Locked), "A");
        assert_eq!(adjust_case("a", ShiftState::Off), "a");
        assert_eq!(
            adjust_case("123", ShiftState::Locked),
            "123",
            "long captions keep their case"
        );
    }

    /// The shift key's icon tracks the shift state.
    #[test]
    fn test_shift_icon_tracks_state() {
        let mut kb = Keyboard::from_characters("a", 40.0, 50.0);
        if let Some(key) = kb.key_mut(0) {
            key.code = KEYCODE_SHIFT;
            key.label.clear();
        }
        let mut renderer = Renderer::new();

        for (state, expected) in [
            (ShiftState::Off, IconGlyph::ShiftOutline),
            (ShiftState::OnOneChar, IconGlyph::ShiftFilled),
            (ShiftState::Locked, IconGlyph::ShiftLocked),
        ] {
            kb.shift_state = state;
            renderer.invalidate_all();
            let commands = renderer.paint(&kb, &VisualState::default());
            let icon = commands.iter().find_map(|c| match c {
                DrawCommand::Icon { glyph, .. } => Some(*glyph),
                _ => None,
            });
            assert_eq!(icon, Some(expected), "shift icon for {:?}", state);
        }
    }

    /// An unknown icon name falls back to the label.
    #[test]
    fn test_missing_icon_falls_back_to_label() {
        let mut kb = Keyboard::from_characters("a", 40.0, 50.0);
        if let Some(key) = kb.key_mut(0) {
            key.icon = Some("no_such_icon".into());
        }
        let mut renderer = Renderer::new();
        let commands = renderer.paint(&kb, &VisualState::default());

        assert!(
            commands
                .iter()
                .all(|c| !matches!(c, DrawCommand::Icon { .. })),
            "unknown icon emits no icon command"
        );
        assert!(
            commands
                .iter()
                .any(|c| matches!(c, DrawCommand::Label { text, .. } if text == "a")),
            "label is painted instead"
        );
    }

    /// A preview target adds a bubble above its key.
    #[test]
    fn test_preview_bubble() {
        let kb = keyboard();
        let mut renderer = Renderer::new();
        let visual = VisualState {
            preview_key: Some(2),
            popup_parent: None,
        };
        let commands = renderer.paint(&kb, &visual);

        let bubble = commands.iter().find_map(|c| match c {
            DrawCommand::PreviewBubble { rect, text, .. } => Some((*rect, text.clone())),
            _ => None,
        });
        let (rect, text) = bubble.expect("preview bubble painted");
        assert_eq!(text, "c");
        assert!(rect.y < kb.key(2).unwrap().y, "bubble sits above the key");
    }

    /// Pressed keys use the pressed colour.
    #[test]
    fn test_pressed_color_priority() {
        let mut kb = keyboard();
        if let Some(key) = kb.key_mut(0) {
            key.pressed = true;
        }
        let mut renderer = Renderer::new();
        let commands = renderer.paint(&kb, &VisualState::default());
        let bodies = body_rects(&commands);
        assert_eq!(bodies.len(), 3);

        let pressed = commands.iter().any(|c| {
            matches!(c, DrawCommand::RoundRect { color, .. } if *color == Theme::light().key_pressed)
        });
        assert!(pressed, "pressed key painted with the pressed colour");
    }
}
