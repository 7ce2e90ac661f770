// SPDX-License-Identifier: GPL-3.0-only

//! Softboard - an on-screen keyboard rendering and dispatch engine.
//!
//! This crate turns a declarative JSON keyboard layout into key events and
//! draw commands. It is a pure, host-agnostic library: a host adapter feeds
//! raw pointer events in and composites draw commands out; the crate never
//! touches an input-method framework or a rendering surface.
//!
//! # Pipeline
//!
//! 1. A layout document is parsed and resolved into a [`keyboard::Keyboard`]
//!    (see [`layout`]).
//! 2. A [`gesture::GestureEngine`] owns the keyboard and consumes
//!    [`gesture::PointerEvent`]s, producing [`gesture::KeyEvent`]s. It
//!    handles debouncing, key repeat, long-press popups, space-bar cursor
//!    drag, the double-tap period shortcut, and shift cycling.
//! 3. A [`render::Renderer`] paints the keyboard (and any open popup) into
//!    [`render::DrawCommand`]s using dirty-rectangle invalidation.
//!
//! # Modules
//!
//! - `keyboard`: the in-memory keyboard model with resolved geometry
//! - `layout`: JSON layout parsing, inheritance resolution, and validation
//! - `gesture`: the touch state machine, timer queue, and popup subsystem
//! - `render`: the dirty-rectangle renderer and draw-command contract

pub mod gesture;
pub mod keyboard;
pub mod layout;
pub mod render;

pub use gesture::{GestureEngine, HostQuery, KeyEvent, PointerEvent, PointerEventKind};
pub use keyboard::{EnterKeyKind, Keyboard, ShiftState};
pub use layout::{LayoutError, build, parse_layout_file, parse_layout_from_string};
pub use render::{DrawCommand, Renderer, VisualState};

// ============================================================================
// Integration Tests
// ============================================================================
