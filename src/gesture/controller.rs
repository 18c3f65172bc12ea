//! Gesture state machine.

use std::collections::VecDeque;

use super::{GestureCommand, SheetDirection, TouchEvent, TouchKind, TouchPoint};
use crate::config::PreviewConfig;

/// Release velocity is measured over this trailing window.
pub const VELOCITY_WINDOW_MS: f64 = 100.0;

/// Thresholds the controller works with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSettings {
    /// Screen pixels a contact must travel before a press becomes a pan
    pub dead_zone: f32,
    /// Horizontal release speed (px/ms) that turns a pan into a sheet switch
    pub fling_velocity: f32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self::from(&PreviewConfig::default())
    }
}

impl From<&PreviewConfig> for GestureSettings {
    fn from(config: &PreviewConfig) -> Self {
        Self {
            dead_zone: config.pan_dead_zone,
            fling_velocity: config.fling_velocity,
        }
    }
}

/// Observable state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Pressed,
    Panning,
    Pinching,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Pressed { origin: TouchPoint, last: TouchPoint },
    Panning { last: TouchPoint },
    /// `initial` is the contact distance when the pinch began.
    Pinching {
        a: TouchPoint,
        b: TouchPoint,
        initial: f32,
    },
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    t: f64,
    x: f32,
    y: f32,
}

/// Turns touch events into [`GestureCommand`]s.
#[derive(Debug, Clone)]
pub struct GestureController {
    settings: GestureSettings,
    phase: Phase,
    /// Recent positions of the single tracked contact
    samples: VecDeque<Sample>,
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new(GestureSettings::default())
    }
}

impl GestureController {
    pub fn new(settings: GestureSettings) -> Self {
        Self {
            settings,
            phase: Phase::Idle,
            samples: VecDeque::new(),
        }
    }

    pub fn state(&self) -> GestureState {
        match self.phase {
            Phase::Idle => GestureState::Idle,
            Phase::Pressed { .. } => GestureState::Pressed,
            Phase::Panning { .. } => GestureState::Panning,
            Phase::Pinching { .. } => GestureState::Pinching,
        }
    }

    /// Drop any gesture in progress without emitting anything.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.samples.clear();
    }

    /// Feed one event; returns the commands it produced, in order.
    pub fn handle(&mut self, event: &TouchEvent) -> Vec<GestureCommand> {
        let outcome = match event.kind {
            TouchKind::Start => self.on_start(event),
            TouchKind::Move => self.on_move(event),
            TouchKind::End => self.on_end(event),
            TouchKind::Cancel => {
                self.reset();
                Ok(Vec::new())
            }
        };
        outcome.unwrap_or_else(|reason| {
            tracing::debug!(
                kind = ?event.kind,
                touches = event.touches.len(),
                state = ?self.state(),
                reason,
                "inconsistent touch stream, resetting gesture"
            );
            self.reset();
            Vec::new()
        })
    }

    fn tracks(&self, id: u32) -> bool {
        match self.phase {
            Phase::Idle => false,
            Phase::Pressed { last, .. } | Phase::Panning { last } => last.id == id,
            Phase::Pinching { a, b, .. } => a.id == id || b.id == id,
        }
    }

    fn on_start(&mut self, event: &TouchEvent) -> Result<Vec<GestureCommand>, &'static str> {
        if event.touches.iter().any(|t| self.tracks(t.id)) {
            return Err("start for a contact already down");
        }
        let mut new_touches = event.touches.iter().copied();

        self.phase = match self.phase {
            Phase::Idle => match (new_touches.next(), new_touches.next()) {
                (Some(a), Some(b)) => pinch(a, b),
                (Some(touch), None) => {
                    self.samples.clear();
                    self.record(event.timestamp_ms, touch);
                    Phase::Pressed {
                        origin: touch,
                        last: touch,
                    }
                }
                (None, _) => Phase::Idle,
            },
            Phase::Pressed { last, .. } | Phase::Panning { last } => match new_touches.next() {
                Some(b) => pinch(last, b),
                None => self.phase,
            },
            // Extra fingers during a pinch are ignored.
            Phase::Pinching { .. } => self.phase,
        };
        Ok(Vec::new())
    }

    fn on_move(&mut self, event: &TouchEvent) -> Result<Vec<GestureCommand>, &'static str> {
        if event.touches.iter().any(|t| !self.tracks(t.id)) {
            return Err("move for an untracked contact");
        }
        let Some(&touch) = event.touches.first() else {
            return Ok(Vec::new());
        };

        let mut commands = Vec::new();
        match self.phase {
            Phase::Idle => {}
            Phase::Pressed { origin, .. } => {
                self.record(event.timestamp_ms, touch);
                if touch.distance_to(&origin) > self.settings.dead_zone {
                    // Catch up on the travel inside the dead zone.
                    push_pan(&mut commands, touch.x - origin.x, touch.y - origin.y);
                    self.phase = Phase::Panning { last: touch };
                } else {
                    self.phase = Phase::Pressed {
                        origin,
                        last: touch,
                    };
                }
            }
            Phase::Panning { last } => {
                self.record(event.timestamp_ms, touch);
                push_pan(&mut commands, touch.x - last.x, touch.y - last.y);
                self.phase = Phase::Panning { last: touch };
            }
            Phase::Pinching { a, b, initial } => {
                let (mut next_a, mut next_b) = (a, b);
                for t in &event.touches {
                    if t.id == a.id {
                        next_a = *t;
                    } else {
                        next_b = *t;
                    }
                }

                let (mx0, my0) = a.midpoint(&b);
                let (mx1, my1) = next_a.midpoint(&next_b);
                push_pan(&mut commands, mx1 - mx0, my1 - my0);

                let before = a.distance_to(&b);
                let after = next_a.distance_to(&next_b);
                // Contacts that start on one spot measure from their first spread.
                let initial = if initial > 0.0 { initial } else { after };
                if initial > 0.0 && (after - before).abs() > f32::EPSILON {
                    let factor = after / initial;
                    if factor.is_finite() && factor > 0.0 {
                        commands.push(GestureCommand::Zoom {
                            factor,
                            focus_x: mx1,
                            focus_y: my1,
                        });
                    }
                }
                self.phase = Phase::Pinching {
                    a: next_a,
                    b: next_b,
                    initial,
                };
            }
        }
        Ok(commands)
    }

    fn on_end(&mut self, event: &TouchEvent) -> Result<Vec<GestureCommand>, &'static str> {
        if event.touches.iter().any(|t| !self.tracks(t.id)) {
            return Err("end for an untracked contact");
        }
        let Some(&touch) = event.touches.first() else {
            return Ok(Vec::new());
        };

        let mut commands = Vec::new();
        match self.phase {
            Phase::Idle => {}
            Phase::Pressed { .. } => {
                commands.push(GestureCommand::Tap {
                    x: touch.x,
                    y: touch.y,
                });
                self.reset();
            }
            Phase::Panning { last } => {
                push_pan(&mut commands, touch.x - last.x, touch.y - last.y);
                self.record(event.timestamp_ms, touch);
                if let Some(direction) = self.fling_direction() {
                    commands.push(GestureCommand::SwitchSheet { direction });
                }
                self.reset();
            }
            Phase::Pinching { a, b, .. } => {
                let ended_a = event.touches.iter().any(|t| t.id == a.id);
                let ended_b = event.touches.iter().any(|t| t.id == b.id);
                match (ended_a, ended_b) {
                    (true, true) => self.reset(),
                    (true, false) | (false, true) => {
                        let remaining = if ended_a { b } else { a };
                        self.samples.clear();
                        self.record(event.timestamp_ms, remaining);
                        self.phase = Phase::Panning { last: remaining };
                    }
                    (false, false) => {}
                }
            }
        }
        Ok(commands)
    }

    fn record(&mut self, t: f64, touch: TouchPoint) {
        self.samples.push_back(Sample {
            t,
            x: touch.x,
            y: touch.y,
        });
        while self
            .samples
            .front()
            .is_some_and(|s| t - s.t > VELOCITY_WINDOW_MS)
        {
            self.samples.pop_front();
        }
    }

    /// Release velocity in px/ms over the trailing window.
    fn velocity(&self) -> (f32, f32) {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return (0.0, 0.0);
        };
        let dt = last.t - first.t;
        if !(dt > 0.0) {
            return (0.0, 0.0);
        }
        #[allow(clippy::cast_possible_truncation)]
        let dt = dt as f32;
        ((last.x - first.x) / dt, (last.y - first.y) / dt)
    }

    fn fling_direction(&self) -> Option<SheetDirection> {
        let (vx, vy) = self.velocity();
        if vx.abs() <= self.settings.fling_velocity || vx.abs() <= vy.abs() {
            return None;
        }
        // Swiping left reveals the next sheet.
        Some(if vx < 0.0 {
            SheetDirection::Next
        } else {
            SheetDirection::Previous
        })
    }
}

fn pinch(a: TouchPoint, b: TouchPoint) -> Phase {
    Phase::Pinching {
        a,
        b,
        initial: a.distance_to(&b),
    }
}

fn push_pan(commands: &mut Vec<GestureCommand>, dx: f32, dy: f32) {
    if dx != 0.0 || dy != 0.0 {
        commands.push(GestureCommand::Pan { dx, dy });
    }
}
