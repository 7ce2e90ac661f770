// SPDX-License-Identifier: GPL-3.0-only

//! The draw-command contract between the renderer and host surfaces.
//!
//! The renderer never touches a rendering technology. It emits a flat list of
//! [`DrawCommand`]s in paint order; host adapters translate them to whatever
//! surface they composite (software canvas, GPU quads, SVG for tests).

/// An axis-aligned rectangle in keyboard coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Whether the two rectangles overlap.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// An RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Vector icons the host is expected to supply glyphs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconGlyph {
    /// Shift, inactive.
    ShiftOutline,
    /// Shift, active for one character.
    ShiftFilled,
    /// Shift locked (caps).
    ShiftLocked,
    /// Backspace.
    Delete,
    /// Plain enter / newline.
    Enter,
    /// Enter acting as search.
    Search,
    /// Enter acting as go / next field.
    ArrowRight,
    /// Enter acting as send.
    Send,
    /// Enter acting as a host command.
    Command,
    /// Letters/symbols mode switch.
    ModeChange,
    /// Tab.
    Tab,
}

/// Colour roles for painting the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub background: Color,
    pub key: Color,
    pub key_pressed: Color,
    pub key_focused: Color,
    /// Modifier/action keys (shift, delete, mode change, enter).
    pub special_key: Color,
    /// Shift key while shift is locked.
    pub shift_locked: Color,
    pub label: Color,
    pub shadow: Color,
}

impl Theme {
    /// Light theme. Key tint matches a slightly blue-grey surface.
    pub const fn light() -> Self {
        Theme {
            background: Color::rgb(255, 255, 255),
            key: Color::rgb(174, 179, 190),
            key_pressed: Color::rgb(140, 145, 156),
            key_focused: Color::rgb(120, 144, 200),
            special_key: Color::rgb(156, 161, 172),
            shift_locked: Color::rgb(96, 120, 176),
            label: Color::rgb(24, 24, 24),
            shadow: Color::rgba(0, 0, 0, 64),
        }
    }

    /// Dark theme.
    pub const fn dark() -> Self {
        Theme {
            background: Color::rgb(18, 18, 18),
            key: Color::rgb(46, 46, 46),
            key_pressed: Color::rgb(72, 72, 72),
            key_focused: Color::rgb(70, 94, 150),
            special_key: Color::rgb(34, 34, 34),
            shift_locked: Color::rgb(64, 88, 144),
            label: Color::rgb(235, 235, 235),
            shadow: Color::rgba(0, 0, 0, 96),
        }
    }
}

/// One painting instruction, in paint order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole buffer.
    Clear(Color),
    /// A filled rounded rectangle.
    RoundRect {
        rect: Rect,
        radius: f32,
        color: Color,
    },
    /// Centred text.
    Label {
        text: String,
        /// Centre of the text baseline box.
        x: f32,
        y: f32,
        size: f32,
        color: Color,
    },
    /// A vector icon fitted into `rect`.
    Icon {
        glyph: IconGlyph,
        rect: Rect,
        color: Color,
    },
    /// The enlarged key preview above a pressed key.
    PreviewBubble {
        rect: Rect,
        text: String,
        background: Color,
        label: Color,
    },
}

// ============================================================================
// Tests
// ============================================================================
