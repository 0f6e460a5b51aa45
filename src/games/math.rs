//! Mathematics: draw the shape a geometry problem is about
//!
//! A stroke starts on a draw gesture with the index tip above the bottom
//! band of the frame, grows while draw continues and is classified when it
//! stops (draw gesture gone or hand lost).

use serde::Serialize;
use serde_json::{json, Value};
use std::f64::consts::PI;
use tracing::warn;

use crate::core::{
    ChallengePicker, ClassifierChoice, GameSession, PlayerAction, SessionCore, ShapeClassifier,
    ShapeKind,
};
use crate::types::{EngineError, Finger, GestureKind, InteractionEvent, OutcomeKind, Phase, Point, SideEffect, Subject};
use crate::{Millis, CANVAS_HEIGHT, CANVAS_WIDTH, DRAW_START_MAX_Y, MATH_POINTS};

/// Geometry problem whose figure the player draws
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    TriangleArea { base: f64, height: f64 },
    SquarePerimeter { side: f64 },
    CircleArea { radius: f64 },
}

const PROBLEMS: [Problem; 3] = [
    Problem::TriangleArea { base: 8.0, height: 6.0 },
    Problem::SquarePerimeter { side: 5.0 },
    Problem::CircleArea { radius: 4.0 },
];

impl Problem {
    /// Shape the player has to draw
    pub fn shape(&self) -> ShapeKind {
        match self {
            Self::TriangleArea { .. } => ShapeKind::Triangle,
            Self::SquarePerimeter { .. } => ShapeKind::Square,
            Self::CircleArea { .. } => ShapeKind::Circle,
        }
    }

    pub fn answer(&self) -> f64 {
        match *self {
            Self::TriangleArea { base, height } => 0.5 * base * height,
            Self::SquarePerimeter { side } => 4.0 * side,
            Self::CircleArea { radius } => PI * radius * radius,
        }
    }

    pub fn question(&self) -> String {
        match *self {
            Self::TriangleArea { base, height } => {
                format!("Area of a triangle with base {} and height {}", base, height)
            }
            Self::SquarePerimeter { side } => format!("Perimeter of a square with side {}", side),
            Self::CircleArea { radius } => format!("Area of a circle with radius {}", radius),
        }
    }
}

#[derive(Debug)]
pub struct MathGame {
    core: SessionCore,
    problem: Option<Problem>,
    classifier: Box<dyn ShapeClassifier>,
    stroke: Vec<Point>,
    drawing: bool,
    last_shape: Option<ShapeKind>,
}

impl MathGame {
    pub fn new(picker: ChallengePicker, classifier: ClassifierChoice) -> Self {
        let mut game = Self {
            core: SessionCore::new(picker),
            problem: None,
            classifier: classifier.build(),
            stroke: Vec::new(),
            drawing: false,
            last_shape: None,
        };
        game.next_challenge();
        game
    }

    pub fn problem(&self) -> Option<&Problem> {
        self.problem.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Stroke collected so far, in canvas pixels
    pub fn stroke(&self) -> &[Point] {
        &self.stroke
    }

    /// Label of the most recently finished stroke
    pub fn last_shape(&self) -> Option<ShapeKind> {
        self.last_shape
    }

    fn finish_stroke(&mut self, now: Millis) -> Vec<SideEffect> {
        self.drawing = false;
        let stroke = std::mem::take(&mut self.stroke);
        let shape = self.classifier.classify(&stroke);
        self.last_shape = Some(shape);

        let Some(problem) = self.problem else {
            let err = EngineError::invalid_state("stroke finished without a problem");
            warn!(code = err.code(), "{}", err);
            return Vec::new();
        };
        let detail = json!({
            "shape": shape,
            "expected": problem.shape(),
            "points": stroke.len(),
        });
        if shape == problem.shape() {
            self.core.complete(OutcomeKind::ShapeDrawn, MATH_POINTS, detail, now)
        } else {
            self.core.fail(OutcomeKind::ShapeDrawn, detail, now)
        }
    }
}

impl GameSession for MathGame {
    fn subject(&self) -> Subject {
        Subject::Mathematics
    }

    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn reduce(&mut self, event: &InteractionEvent, now: Millis) -> Vec<SideEffect> {
        let tip = event
            .first_of(GestureKind::Draw)
            .and(event.fingertip(Finger::Index));

        match tip {
            Some(tip) if self.drawing => {
                self.stroke.push(tip.scaled(CANVAS_WIDTH, CANVAS_HEIGHT));
                Vec::new()
            }
            Some(tip) if tip.y < DRAW_START_MAX_Y => {
                self.drawing = true;
                self.stroke = vec![tip.scaled(CANVAS_WIDTH, CANVAS_HEIGHT)];
                self.core.set_phase(Phase::Interacting);
                Vec::new()
            }
            _ if self.drawing => self.finish_stroke(now),
            _ => {
                let phase = if event.has_hands() { Phase::Selecting } else { Phase::Idle };
                self.core.set_phase(phase);
                Vec::new()
            }
        }
    }

    fn handle_action(
        &mut self,
        action: &PlayerAction,
        _now: Millis,
    ) -> Result<Vec<SideEffect>, EngineError> {
        Err(EngineError::invalid_state(format!(
            "mathematics has no use for {:?}",
            action
        )))
    }

    fn next_challenge(&mut self) {
        self.problem = Some(PROBLEMS[self.core.pick(PROBLEMS.len())]);
        self.stroke.clear();
        self.drawing = false;
        self.last_shape = None;
    }

    fn selection(&self) -> Option<String> {
        self.drawing.then(|| "stroke".to_string())
    }

    fn entities(&self) -> Value {
        json!({
            "problem": self.problem,
            "question": self.problem.map(|p| p.question()),
            "answer": self.problem.map(|p| p.answer()),
            "drawing": self.drawing,
            "stroke_points": self.stroke.len(),
            "last_shape": self.last_shape,
        })
    }
}
