//! Pointer and keyboard input in view-local pixels.

use kurbo::Point;
use serde::{Deserialize, Serialize};

// Use web_time for WASM compatibility
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    /// Space held; pans under any tool.
    pub space: bool,
}

impl Modifiers {
    /// Ctrl on Linux/Windows, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event in view-local pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Move {
        position: Point,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    DoubleClick {
        position: Point,
    },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position, .. }
            | PointerEvent::DoubleClick { position } => position,
        }
    }

    /// Left-button press without modifiers.
    pub fn left_down(position: Point) -> Self {
        PointerEvent::Down { position, button: MouseButton::Left, modifiers: Modifiers::default() }
    }

    pub fn left_up(position: Point) -> Self {
        PointerEvent::Up { position, button: MouseButton::Left }
    }
}

/// Keys the editor binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Enter,
    Escape,
    Z,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    pub key: Key,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn plain(key: Key) -> Self {
        Self { key, modifiers: Modifiers::default() }
    }

    pub fn command(key: Key) -> Self {
        Self { key, modifiers: Modifiers { ctrl: true, ..Modifiers::default() } }
    }
}

/// Editor shortcut a key press resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shortcut {
    Commit,
    Cancel,
    UndoVertex,
}

impl Shortcut {
    pub fn from_key(input: KeyInput) -> Option<Self> {
        match input.key {
            Key::Enter => Some(Shortcut::Commit),
            Key::Escape => Some(Shortcut::Cancel),
            Key::Z if input.modifiers.command() && !input.modifiers.shift => Some(Shortcut::UndoVertex),
            _ => None,
        }
    }
}

/// Double-click detection constants.
const DOUBLE_CLICK_TIME_MS: u128 = 500;
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Synthesizes [`PointerEvent::DoubleClick`] for hosts that only report
/// presses.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last_click_time: Option<Instant>,
    last_click_position: Option<Point>,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw event; returns it together with a synthesized double-click
    /// when a left press lands close enough in time and space to the previous one.
    pub fn track(&mut self, event: PointerEvent) -> (PointerEvent, Option<PointerEvent>) {
        let PointerEvent::Down { position, button: MouseButton::Left, .. } = event else {
            return (event, None);
        };
        let now = Instant::now();
        let is_double = match (self.last_click_time, self.last_click_position) {
            (Some(t), Some(p)) => {
                now.duration_since(t).as_millis() < DOUBLE_CLICK_TIME_MS
                    && p.distance(position) < DOUBLE_CLICK_DISTANCE
            }
            _ => false,
        };
        if is_double {
            // Reset so a third click starts a new pair.
            self.last_click_time = None;
            self.last_click_position = None;
            (event, Some(PointerEvent::DoubleClick { position }))
        } else {
            self.last_click_time = Some(now);
            self.last_click_position = Some(position);
            (event, None)
        }
    }
}
