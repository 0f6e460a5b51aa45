//! Physics: drag objects onto the target
//!
//! A drag grabs the nearest non-target body within `GRAB_RADIUS` of the palm.
//! The grab is sticky: the body follows the palm on every drag event until
//! the drag stops or the hand leaves the frame.

use serde::Serialize;
use serde_json::{json, Value};

use crate::core::{ChallengePicker, GameSession, PlayerAction, SessionCore};
use crate::types::{EngineError, GestureKind, InteractionEvent, OutcomeKind, Phase, Point, SideEffect, Subject};
use crate::{Millis, CANVAS_HEIGHT, CANVAS_WIDTH, GRAB_RADIUS, PHYSICS_POINTS, TARGET_HIT_RADIUS};

/// Target positions for later rounds, in canvas pixels
const TARGET_POSITIONS: [(f64, f64); 3] = [(600.0, 300.0), (700.0, 200.0), (650.0, 450.0)];

/// A draggable object or the target, positioned in canvas pixels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Body {
    pub id: u32,
    pub name: &'static str,
    pub position: Point,
    pub mass: f64,
    pub is_target: bool,
}

impl Body {
    fn new(id: u32, name: &'static str, x: f64, y: f64, mass: f64, is_target: bool) -> Self {
        Self {
            id,
            name,
            position: Point::new(x, y),
            mass,
            is_target,
        }
    }
}

#[derive(Debug)]
pub struct PhysicsGame {
    core: SessionCore,
    bodies: Vec<Body>,
    grabbed: Option<u32>,
}

impl PhysicsGame {
    pub fn new(picker: ChallengePicker) -> Self {
        let mut game = Self {
            core: SessionCore::new(picker),
            bodies: Vec::new(),
            grabbed: None,
        };
        game.next_challenge();
        game
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, id: u32) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn target(&self) -> Option<&Body> {
        self.bodies.iter().find(|b| b.is_target)
    }

    pub fn grabbed(&self) -> Option<u32> {
        self.grabbed
    }

    fn nearest_within(&self, palm: Point, radius: f64) -> Option<u32> {
        self.bodies
            .iter()
            .filter(|b| !b.is_target)
            .map(|b| (b.id, b.position.distance(&palm)))
            .filter(|(_, d)| *d < radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    fn release(&mut self) {
        self.grabbed = None;
    }
}

impl GameSession for PhysicsGame {
    fn subject(&self) -> Subject {
        Subject::Physics
    }

    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn reduce(&mut self, event: &InteractionEvent, now: Millis) -> Vec<SideEffect> {
        let palm = match event.primary_palm() {
            Some(p) => p.scaled(CANVAS_WIDTH, CANVAS_HEIGHT),
            None => {
                self.release();
                self.core.set_phase(Phase::Idle);
                return Vec::new();
            }
        };

        if event.first_of(GestureKind::Drag).is_none() {
            self.release();
            self.core.set_phase(Phase::Selecting);
            return Vec::new();
        }

        if self.grabbed.is_none() {
            self.grabbed = self.nearest_within(palm, GRAB_RADIUS);
        }
        let Some(id) = self.grabbed else {
            self.core.set_phase(Phase::Selecting);
            return Vec::new();
        };
        self.core.set_phase(Phase::Interacting);

        let Some(body) = self.bodies.iter_mut().find(|b| b.id == id) else {
            self.release();
            return Vec::new();
        };
        body.position = palm;
        let name = body.name;

        let hit = self
            .target()
            .map(|t| t.position.distance(&palm) < TARGET_HIT_RADIUS)
            .unwrap_or(false);
        if hit {
            self.release();
            return self.core.complete(
                OutcomeKind::TargetHit,
                PHYSICS_POINTS,
                json!({ "object": name }),
                now,
            );
        }
        Vec::new()
    }

    fn handle_action(
        &mut self,
        action: &PlayerAction,
        _now: Millis,
    ) -> Result<Vec<SideEffect>, EngineError> {
        Err(EngineError::invalid_state(format!(
            "physics has no use for {:?}",
            action
        )))
    }

    fn next_challenge(&mut self) {
        let (tx, ty) = TARGET_POSITIONS[self.core.pick(TARGET_POSITIONS.len())];
        self.bodies = vec![
            Body::new(1, "ball", 100.0, 100.0, 1.0, false),
            Body::new(2, "block", 400.0, 200.0, 2.0, false),
            Body::new(3, "target", tx, ty, 0.0, true),
        ];
        self.grabbed = None;
    }

    fn selection(&self) -> Option<String> {
        self.grabbed
            .and_then(|id| self.body(id))
            .map(|b| b.name.to_string())
    }

    fn entities(&self) -> Value {
        json!({
            "bodies": self.bodies,
            "grabbed": self.grabbed,
        })
    }
}
