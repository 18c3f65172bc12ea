//! Touch gesture recognition.
//!
//! Raw touch events go in, navigation commands come out. The controller knows
//! nothing about sheets or layout; the session applies the commands.

mod controller;

pub use controller::{GestureController, GestureSettings, GestureState, VELOCITY_WINDOW_MS};

use serde::{Deserialize, Serialize};

/// Phase of a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TouchKind {
    Start,
    Move,
    End,
    Cancel,
}

/// One contact, in screen pixels relative to the viewport's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub const fn new(id: u32, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }

    pub fn distance_to(&self, other: &TouchPoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: &TouchPoint) -> (f32, f32) {
        ((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// A touch event. `touches` lists the contacts that changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchEvent {
    pub kind: TouchKind,
    #[serde(default)]
    pub touches: Vec<TouchPoint>,
    pub timestamp_ms: f64,
}

impl TouchEvent {
    pub fn new(kind: TouchKind, touches: Vec<TouchPoint>, timestamp_ms: f64) -> Self {
        Self {
            kind,
            touches,
            timestamp_ms,
        }
    }

    pub fn start(id: u32, x: f32, y: f32, timestamp_ms: f64) -> Self {
        Self::new(TouchKind::Start, vec![TouchPoint::new(id, x, y)], timestamp_ms)
    }

    pub fn moved(id: u32, x: f32, y: f32, timestamp_ms: f64) -> Self {
        Self::new(TouchKind::Move, vec![TouchPoint::new(id, x, y)], timestamp_ms)
    }

    pub fn end(id: u32, x: f32, y: f32, timestamp_ms: f64) -> Self {
        Self::new(TouchKind::End, vec![TouchPoint::new(id, x, y)], timestamp_ms)
    }

    pub fn cancel(timestamp_ms: f64) -> Self {
        Self::new(TouchKind::Cancel, Vec::new(), timestamp_ms)
    }
}

/// Direction of a sheet switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SheetDirection {
    Next,
    Previous,
}

/// Navigation intent recognized from a touch stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GestureCommand {
    /// Finger movement in screen pixels; content follows the finger.
    Pan { dx: f32, dy: f32 },
    /// Scale `factor` times the scale the current pinch began at, around a
    /// screen-space focus point.
    #[serde(rename_all = "camelCase")]
    Zoom {
        factor: f32,
        focus_x: f32,
        focus_y: f32,
    },
    /// A press released inside the dead zone.
    Tap { x: f32, y: f32 },
    /// A horizontal fling.
    SwitchSheet { direction: SheetDirection },
}
