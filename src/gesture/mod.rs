// SPDX-License-Identifier: GPL-3.0-only

//! The touch gesture state machine.
//!
//! A [`GestureEngine`] owns one [`Keyboard`] and turns a raw pointer-event
//! stream into committed key events. It handles key debouncing, key repeat,
//! long-press popups, drag-to-move-cursor on the space key, the double-tap
//! space period shortcut, and shift/caps-lock cycling.
//!
//! All timing derives from event timestamps, never wall clock, so a given
//! event sequence always produces the same output. Timers are queued
//! deadlines ([`timer::TimerQueue`]); the engine fires every due timer at the
//! start of each incoming event, and hosts can additionally pump
//! [`GestureEngine::fire_due_timers`] between events using
//! [`GestureEngine::next_timer_deadline`].

pub mod popup;
pub mod timer;

pub use popup::{POPUP_MAX_MOVE_DISTANCE, PopupSession, PopupTrack};
pub use timer::{TimerKind, TimerQueue};

use crate::keyboard::{
    KEYCODE_CAPS_LOCK, KEYCODE_LEFT_ARROW, KEYCODE_RIGHT_ARROW, KEYCODE_SHIFT, KEYCODE_SPACE,
    Keyboard, ShiftState,
};
use crate::render::{DrawCommand, Renderer, VisualState};

// ============================================================================
// Timing and Distance Constants
// ============================================================================

/// Dwell below this on a key at release resolves back to the previous key.
pub const DEBOUNCE_TIME_MS: u64 = 70;
/// Hold duration before the popup opens.
pub const LONG_PRESS_TIMEOUT_MS: u64 = 500;
/// Hold duration before a repeatable key starts repeating.
pub const REPEAT_START_DELAY_MS: u64 = 400;
/// Interval between repeat emissions.
pub const REPEAT_INTERVAL_MS: u64 = 50;
/// Window for the double-tap space period shortcut.
pub const DOUBLE_TAP_DELAY_MS: u64 = 300;
/// Window in which a second shift tap locks shift.
pub const SHIFT_LOCK_TAP_WINDOW_MS: u64 = 500;
/// Horizontal travel on the space key per cursor step.
pub const SPACE_MOVE_THRESHOLD: f32 = 16.0;
/// Delay before the key preview bubble disappears after release.
pub const REMOVE_PREVIEW_DELAY_MS: u64 = 100;

// ============================================================================
// Events
// ============================================================================

/// The kind of a raw pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    /// First pointer touched down.
    Down,
    /// Pointer moved.
    Move,
    /// A pointer lifted.
    Up,
    /// The touch was taken away (focus loss, palm rejection).
    Cancel,
    /// A second pointer touched down while the first is held.
    PointerDown,
}

/// A raw pointer event in keyboard coordinates.
///
/// For [`PointerEventKind::PointerDown`] the coordinates are the new
/// pointer's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub x: f32,
    pub y: f32,
    pub timestamp_ms: u64,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self {
            kind,
            x,
            y,
            timestamp_ms,
        }
    }
}

/// A committed output event for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    /// A key went down; for feedback (sound, haptics) only.
    Press(i32),
    /// A control key code was committed.
    Key(i32),
    /// Literal text was committed.
    Text(String),
    /// The touch interaction ended.
    ActionUp,
    /// Move the host cursor one position left.
    MoveCursorLeft,
    /// Move the host cursor one position right.
    MoveCursorRight,
    /// Replace the just-typed double space with ". ".
    CommitPeriodAfterSpace,
}

/// Host-side text queries the engine needs for the double-tap space shortcut.
pub trait HostQuery {
    /// Whether any text precedes the cursor.
    fn has_text_before_cursor(&self) -> bool;
    /// Up to `n` characters immediately before the cursor.
    fn text_before_cursor(&self, n: usize) -> String;
}

// ============================================================================
// Gesture Engine
// ============================================================================

/// One touch interaction's worth of gesture state plus the cross-session
/// double-tap bookkeeping.
#[derive(Debug)]
pub struct GestureEngine {
    keyboard: Keyboard,
    renderer: Renderer,
    timers: TimerQueue,
    /// Bumped when a session ends; queued timer fires from older sessions
    /// are dropped.
    generation: u64,

    // Per-touch session state.
    touch_active: bool,
    down_time: u64,
    current_key: Option<usize>,
    /// Accumulated dwell on `current_key`, in ms.
    current_key_time: u64,
    last_key: Option<usize>,
    /// Dwell the pointer spent on `last_key` before leaving it.
    last_key_time: u64,
    last_move_time: u64,
    last_x: f32,
    /// Set once a repeatable key starts emitting; suppresses the UP commit.
    repeat_key: Option<usize>,
    cursor_drag: bool,
    space_anchor_x: f32,
    /// Popup cancelled or keyboard swapped mid-touch; UP releases silently.
    aborted: bool,
    popup: Option<PopupSession>,
    preview_key: Option<usize>,

    // Cross-session state.
    last_space_tap_ms: Option<u64>,
    last_shift_press_ms: Option<u64>,
}

impl GestureEngine {
    /// Creates an engine owning the given keyboard.
    pub fn new(keyboard: Keyboard) -> Self {
        Self {
            keyboard,
            renderer: Renderer::new(),
            timers: TimerQueue::new(),
            generation: 0,
            touch_active: false,
            down_time: 0,
            current_key: None,
            current_key_time: 0,
            last_key: None,
            last_key_time: 0,
            last_move_time: 0,
            last_x: 0.0,
            repeat_key: None,
            cursor_drag: false,
            space_anchor_x: 0.0,
            aborted: false,
            popup: None,
            preview_key: None,
            last_space_tap_ms: None,
            last_shift_press_ms: None,
        }
    }

    /// The keyboard model.
    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    /// Replaces the keyboard model (layout, language, or orientation change).
    ///
    /// Any touch in progress is aborted; the engine swallows events until the
    /// next DOWN.
    pub fn set_keyboard(&mut self, keyboard: Keyboard) {
        let mid_touch = self.touch_active;
        self.keyboard = keyboard;
        self.reset_session();
        self.preview_key = None;
        self.aborted = mid_touch;
        self.touch_active = mid_touch;
        self.renderer.invalidate_all();
        tracing::debug!(mid_touch, "keyboard replaced");
    }

    /// Transient rendering inputs for [`Renderer::paint`].
    pub fn visual_state(&self) -> VisualState {
        VisualState {
            preview_key: self.preview_key,
            popup_parent: self.popup.as_ref().map(PopupSession::parent_key),
        }
    }

    /// Paints the main keyboard's invalidated region.
    pub fn paint(&mut self) -> Vec<DrawCommand> {
        let visual = self.visual_state();
        self.renderer.paint(&self.keyboard, &visual)
    }

    /// Paints the open popup, if any. The commands are in popup-local
    /// coordinates; [`PopupSession::bounds`] via [`GestureEngine::popup`]
    /// gives the placement.
    pub fn paint_popup(&mut self) -> Option<Vec<DrawCommand>> {
        self.popup.as_mut().map(PopupSession::paint)
    }

    /// The open popup session, if any.
    pub fn popup(&self) -> Option<&PopupSession> {
        self.popup.as_ref()
    }

    /// Earliest pending timer deadline in event-timestamp milliseconds.
    pub fn next_timer_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Number of pending timers.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Whether no touch interaction is in progress.
    pub fn is_idle(&self) -> bool {
        !self.touch_active && self.popup.is_none()
    }

    /// Fires every timer due at or before `now_ms` and returns the events
    /// that produced. Stale fires from ended sessions are dropped.
    pub fn fire_due_timers(&mut self, now_ms: u64, host: &dyn HostQuery) -> Vec<KeyEvent> {
        let mut out = Vec::new();
        self.fire_due_timers_into(now_ms, host, &mut out);
        out
    }

    /// Feeds one pointer event through the state machine.
    ///
    /// Due timers fire first, at the event's timestamp, so a burst of delayed
    /// events still repeats and long-presses deterministically.
    pub fn handle_pointer_event(
        &mut self,
        event: PointerEvent,
        host: &dyn HostQuery,
    ) -> Vec<KeyEvent> {
        let mut out = Vec::new();
        self.fire_due_timers_into(event.timestamp_ms, host, &mut out);

        match event.kind {
            PointerEventKind::Down => self.on_down(event, &mut out),
            PointerEventKind::Move => self.on_move(event, &mut out),
            PointerEventKind::Up => self.on_up(event, host, &mut out),
            PointerEventKind::Cancel => self.on_cancel(),
            PointerEventKind::PointerDown => self.on_pointer_down(event, host, &mut out),
        }

        self.last_x = event.x;
        out
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn on_down(&mut self, event: PointerEvent, out: &mut Vec<KeyEvent>) {
        if self.touch_active {
            // A DOWN without a preceding UP; drop the stuck session.
            self.reset_session();
        }
        self.aborted = false;
        self.touch_active = true;
        self.down_time = event.timestamp_ms;
        self.last_move_time = event.timestamp_ms;

        let hit = self.keyboard.hit_test(event.x, event.y);
        self.current_key = hit;
        self.current_key_time = 0;
        self.last_key = None;
        self.last_key_time = 0;

        let Some(index) = hit else {
            tracing::trace!(x = event.x, y = event.y, "down outside any key");
            return;
        };
        let (code, repeatable, has_popup) = {
            let key = &self.keyboard.keys()[index];
            (key.code, key.repeatable, key.has_popup())
        };
        tracing::trace!(index, code, "key down");

        out.push(KeyEvent::Press(code));
        self.set_pressed(index, true);

        if code == KEYCODE_SPACE {
            self.space_anchor_x = event.x;
        }

        if repeatable {
            self.repeat_key = Some(index);
            if code != KEYCODE_SPACE {
                // Repeatable keys commit immediately and again on each
                // repeat fire; the UP commit is suppressed.
                self.commit_code(code, event.timestamp_ms, &NoHost, out);
            }
            self.timers.schedule(
                TimerKind::Repeat,
                event.timestamp_ms + REPEAT_START_DELAY_MS,
                Some(index),
                self.generation,
            );
        }

        if has_popup {
            self.timers.schedule(
                TimerKind::LongPress,
                event.timestamp_ms + LONG_PRESS_TIMEOUT_MS,
                Some(index),
                self.generation,
            );
        }

        self.show_preview(index);
    }

    fn on_move(&mut self, event: PointerEvent, out: &mut Vec<KeyEvent>) {
        if self.aborted || !self.touch_active {
            return;
        }

        if self.popup.is_some() {
            let track = self
                .popup
                .as_mut()
                .map(|p| p.track(event.x, event.y))
                .unwrap_or(PopupTrack::Unchanged);
            if track == PopupTrack::Cancelled {
                self.popup = None;
                self.aborted = true;
                self.renderer.invalidate_all();
                tracing::debug!("popup cancelled by overshoot");
            }
            return;
        }

        // Space drag: horizontal travel steps the host cursor.
        let on_space = self
            .current_key
            .and_then(|i| self.keyboard.key(i))
            .is_some_and(|k| k.code == KEYCODE_SPACE);
        if on_space || self.cursor_drag {
            let dx = event.x - self.space_anchor_x;
            if dx > SPACE_MOVE_THRESHOLD {
                self.cursor_drag = true;
                self.space_anchor_x = event.x;
                out.push(KeyEvent::MoveCursorRight);
            } else if dx < -SPACE_MOVE_THRESHOLD {
                self.cursor_drag = true;
                self.space_anchor_x = event.x;
                out.push(KeyEvent::MoveCursorLeft);
            }
            self.last_move_time = event.timestamp_ms;
            return;
        }

        let hit = self.keyboard.hit_test(event.x, event.y);
        if hit == self.current_key {
            self.current_key_time += event.timestamp_ms.saturating_sub(self.last_move_time);
        } else if self.current_key.is_none() {
            self.current_key = hit;
            self.current_key_time = 0;
            if let Some(index) = hit {
                if self.keyboard.keys()[index].code == KEYCODE_SPACE {
                    self.space_anchor_x = event.x;
                }
            }
        } else {
            // Crossing to another key: remember the old one for debounce.
            self.last_key = self.current_key;
            self.last_key_time = self.current_key_time
                + event.timestamp_ms.saturating_sub(self.last_move_time);
            if let Some(old) = self.current_key {
                self.set_pressed(old, false);
            }
            self.current_key = hit;
            self.current_key_time = 0;

            // Repeat stops once the pointer leaves the repeating key.
            if self.repeat_key.is_some() && self.repeat_key != hit {
                self.repeat_key = None;
                self.timers.cancel_kind(TimerKind::Repeat);
            }

            self.timers.cancel_kind(TimerKind::LongPress);
            if let Some(index) = hit {
                self.set_pressed(index, true);
                self.show_preview(index);
                if self.keyboard.keys()[index].code == KEYCODE_SPACE {
                    // Drag distance counts from where space was entered.
                    self.space_anchor_x = event.x;
                }
                if self.keyboard.keys()[index].has_popup() {
                    self.timers.schedule(
                        TimerKind::LongPress,
                        event.timestamp_ms + LONG_PRESS_TIMEOUT_MS,
                        Some(index),
                        self.generation,
                    );
                }
            }
        }
        self.last_move_time = event.timestamp_ms;
    }

    fn on_up(&mut self, event: PointerEvent, host: &dyn HostQuery, out: &mut Vec<KeyEvent>) {
        let t = event.timestamp_ms;
        self.timers.cancel_kind(TimerKind::Repeat);
        self.timers.cancel_kind(TimerKind::LongPress);

        if !self.touch_active {
            // Trailing UP of a chord or a stray release.
            out.push(KeyEvent::ActionUp);
            return;
        }

        if let Some(popup) = self.popup.take() {
            if let Some(code) = popup.selected_code() {
                self.commit_code(code, t, host, out);
            }
            out.push(KeyEvent::ActionUp);
            self.end_session(t);
            return;
        }

        if self.aborted || self.cursor_drag {
            out.push(KeyEvent::ActionUp);
            self.end_session(t);
            return;
        }

        // Close out the dwell accounting, then resolve a too-short stay on
        // the release key back to the previous key.
        self.current_key_time += t.saturating_sub(self.last_move_time);
        if self.last_key.is_some()
            && self.current_key_time < self.last_key_time
            && self.current_key_time < DEBOUNCE_TIME_MS
        {
            tracing::trace!(
                dwell = self.current_key_time,
                "debounce resolved release to previous key"
            );
            self.current_key = self.last_key;
        }

        if let Some(index) = self.current_key {
            if self.repeat_key == Some(index) {
                // Already committed at down and on each repeat fire.
            } else {
                let code = self.keyboard.keys()[index].code;
                self.commit_code(code, t, host, out);
            }
        }
        out.push(KeyEvent::ActionUp);
        self.end_session(t);
    }

    fn on_cancel(&mut self) {
        tracing::debug!("touch cancelled");
        self.reset_session();
        self.preview_key = None;
        self.renderer.invalidate_all();
    }

    fn on_pointer_down(
        &mut self,
        event: PointerEvent,
        host: &dyn HostQuery,
        out: &mut Vec<KeyEvent>,
    ) {
        if !self.touch_active || self.aborted || self.popup.is_some() {
            return;
        }
        // Chorded second finger: its key presses and commits on its own;
        // the first finger's tracking continues undisturbed and commits at
        // its own release.
        if let Some(index) = self.keyboard.hit_test(event.x, event.y) {
            let code = self.keyboard.keys()[index].code;
            out.push(KeyEvent::Press(code));
            self.commit_code(code, event.timestamp_ms, host, out);
            tracing::trace!(index, code, "chorded second pointer");
        }
    }

    // ------------------------------------------------------------------
    // Timer fires
    // ------------------------------------------------------------------

    fn fire_due_timers_into(&mut self, now_ms: u64, host: &dyn HostQuery, out: &mut Vec<KeyEvent>) {
        while let Some(fired) = self.timers.pop_due(now_ms) {
            if fired.generation != self.generation {
                continue;
            }
            match fired.kind {
                TimerKind::Repeat => {
                    if !self.touch_active || fired.key != self.repeat_key {
                        continue;
                    }
                    let Some(index) = fired.key else { continue };
                    let code = self.keyboard.keys()[index].code;
                    if code == KEYCODE_SPACE {
                        // Holding space switches to cursor-drag mode instead
                        // of emitting spaces.
                        self.cursor_drag = true;
                        self.space_anchor_x = self.last_x;
                    } else {
                        self.commit_code(code, fired.deadline_ms, host, out);
                    }
                    // Rescheduling from the previous deadline keeps the
                    // cadence exact regardless of event batching.
                    self.timers.schedule(
                        TimerKind::Repeat,
                        fired.deadline_ms + REPEAT_INTERVAL_MS,
                        Some(index),
                        self.generation,
                    );
                }
                TimerKind::LongPress => {
                    if !self.touch_active
                        || self.popup.is_some()
                        || self.cursor_drag
                        || fired.key != self.current_key
                    {
                        continue;
                    }
                    let Some(index) = fired.key else { continue };
                    let host_width = self.keyboard.min_width;
                    if let Some(session) =
                        PopupSession::open(&self.keyboard, index, self.last_x, host_width)
                    {
                        self.popup = Some(session);
                        self.preview_key = None;
                        self.repeat_key = None;
                        self.timers.cancel_kind(TimerKind::Repeat);
                        self.renderer.invalidate_all();
                    }
                }
                TimerKind::RemovePreview => {
                    if self.preview_key.take().is_some() {
                        self.renderer.invalidate_all();
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Commit logic
    // ------------------------------------------------------------------

    /// Commits one resolved key code, applying shift semantics.
    fn commit_code(&mut self, code: i32, t: u64, host: &dyn HostQuery, out: &mut Vec<KeyEvent>) {
        match code {
            KEYCODE_SHIFT => {
                let next = match self.keyboard.shift_state {
                    ShiftState::Locked => ShiftState::Off,
                    _ if self
                        .last_shift_press_ms
                        .is_some_and(|last| t.saturating_sub(last) < SHIFT_LOCK_TAP_WINDOW_MS) =>
                    {
                        ShiftState::Locked
                    }
                    ShiftState::OnOneChar => ShiftState::Off,
                    _ => ShiftState::OnOneChar,
                };
                self.last_shift_press_ms = Some(t);
                if self.keyboard.set_shifted(next) {
                    self.renderer.invalidate_all();
                }
                tracing::trace!(state = ?next, "shift cycled");
            }
            KEYCODE_CAPS_LOCK => {
                let next = match self.keyboard.shift_state {
                    ShiftState::Locked => ShiftState::Off,
                    _ => ShiftState::Locked,
                };
                self.last_shift_press_ms = None;
                if self.keyboard.set_shifted(next) {
                    self.renderer.invalidate_all();
                }
            }
            KEYCODE_LEFT_ARROW => {
                self.last_shift_press_ms = None;
                out.push(KeyEvent::MoveCursorLeft);
            }
            KEYCODE_RIGHT_ARROW => {
                self.last_shift_press_ms = None;
                out.push(KeyEvent::MoveCursorRight);
            }
            KEYCODE_SPACE => {
                self.last_shift_press_ms = None;
                let double_tap = self
                    .last_space_tap_ms
                    .is_some_and(|last| t.saturating_sub(last) < DOUBLE_TAP_DELAY_MS);
                if double_tap && period_eligible(host) {
                    out.push(KeyEvent::CommitPeriodAfterSpace);
                    self.last_space_tap_ms = None;
                } else {
                    out.push(KeyEvent::Text(" ".to_string()));
                    self.last_space_tap_ms = Some(t);
                }
            }
            code if code < 0 => {
                self.last_shift_press_ms = None;
                out.push(KeyEvent::Key(code));
            }
            code => {
                self.last_shift_press_ms = None;
                let text = match u32::try_from(code).ok().and_then(char::from_u32) {
                    Some(ch) if self.keyboard.shift_state.is_shifted() => {
                        ch.to_uppercase().collect()
                    }
                    Some(ch) => ch.to_string(),
                    None => return,
                };
                out.push(KeyEvent::Text(text));
                // One-shot shift is spent by the first literal.
                if self.keyboard.shift_state == ShiftState::OnOneChar {
                    self.keyboard.set_shifted(ShiftState::Off);
                    self.renderer.invalidate_all();
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Session bookkeeping
    // ------------------------------------------------------------------

    fn show_preview(&mut self, index: usize) {
        let key = &self.keyboard.keys()[index];
        if key.code > KEYCODE_SPACE && !key.label.is_empty() {
            self.timers.cancel_kind(TimerKind::RemovePreview);
            self.preview_key = Some(index);
            self.renderer.invalidate_key(&self.keyboard, index);
        }
    }

    fn set_pressed(&mut self, index: usize, pressed: bool) {
        if let Some(key) = self.keyboard.key_mut(index) {
            if key.pressed != pressed {
                key.pressed = pressed;
                self.renderer.invalidate_key(&self.keyboard, index);
            }
        }
    }

    /// Ends the touch session normally: the preview lingers briefly.
    fn end_session(&mut self, t: u64) {
        tracing::trace!(duration_ms = t.saturating_sub(self.down_time), "touch ended");
        self.reset_session();
        if self.preview_key.is_some() {
            self.timers.schedule(
                TimerKind::RemovePreview,
                t + REMOVE_PREVIEW_DELAY_MS,
                None,
                self.generation,
            );
        }
    }

    /// Returns the engine to idle. Pending timers die with the old
    /// generation; pressed flags clear.
    fn reset_session(&mut self) {
        self.generation += 1;
        self.timers.clear();
        self.touch_active = false;
        self.current_key = None;
        self.current_key_time = 0;
        self.last_key = None;
        self.last_key_time = 0;
        self.repeat_key = None;
        self.cursor_drag = false;
        self.space_anchor_x = 0.0;
        self.aborted = false;
        self.popup = None;
        self.keyboard.clear_transient_flags();
        self.renderer.invalidate_all();
    }
}

/// True when the text before the cursor can take the double-tap period: some
/// text exists and it does not already end in sentence punctuation.
fn period_eligible(host: &dyn HostQuery) -> bool {
    if !host.has_text_before_cursor() {
        return false;
    }
    let before = host.text_before_cursor(2);
    !matches!(
        before.trim_end().chars().last(),
        Some('.') | Some('?') | Some('!')
    )
}

/// Host stub for internal commits that can never reach the space double-tap
/// path (repeatable keys are never the space key when committed at down).
struct NoHost;

impl HostQuery for NoHost {
    fn has_text_before_cursor(&self) -> bool {
        false
    }

    fn text_before_cursor(&self, _n: usize) -> String {
        String::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
