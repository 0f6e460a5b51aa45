//! Coding: assemble a block program by dragging between zones
//!
//! Zones on the 800x600 canvas:
//! - palette: `y < 200 && x < 400`, a drag copies the block under the palm to the program
//! - program: `y > 300 && x < 400`, a drag removes the block under the palm
//!
//! Each grab moves at most one block; the next move needs the drag to stop first.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::{ChallengePicker, GameSession, PlayerAction, SessionCore};
use crate::types::{EngineError, GestureKind, InteractionEvent, OutcomeKind, Phase, SideEffect, Subject};
use crate::{
    Millis, BLOCK_AREA_WIDTH, CANVAS_HEIGHT, CANVAS_WIDTH, CODING_POINTS, PALETTE_MAX_Y,
    PROGRAM_MIN_Y,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    MoveForward,
    TurnRight,
    TurnLeft,
    Repeat,
}

impl Block {
    pub const PALETTE: [Block; 4] = [Self::MoveForward, Self::TurnRight, Self::TurnLeft, Self::Repeat];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MoveForward => "move_forward",
            Self::TurnRight => "turn_right",
            Self::TurnLeft => "turn_left",
            Self::Repeat => "repeat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodingChallenge {
    pub id: u32,
    pub title: String,
    pub solution: Vec<Block>,
    pub palette: Vec<Block>,
}

impl CodingChallenge {
    /// The built-in challenges: draw a square, draw a triangle
    pub fn builtin() -> Vec<CodingChallenge> {
        use Block::*;
        vec![
            CodingChallenge {
                id: 1,
                title: "Create a Square".into(),
                solution: vec![
                    MoveForward, TurnRight, MoveForward, TurnRight, MoveForward, TurnRight,
                    MoveForward,
                ],
                palette: Block::PALETTE.to_vec(),
            },
            CodingChallenge {
                id: 2,
                title: "Create a Triangle".into(),
                solution: vec![MoveForward, TurnLeft, MoveForward, TurnLeft, MoveForward],
                palette: Block::PALETTE.to_vec(),
            },
        ]
    }
}

/// Slot under `x` when `count` blocks share the block area width
fn slot(x: f64, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let width = BLOCK_AREA_WIDTH / count as f64;
    let index = (x / width).floor() as usize;
    (index < count).then_some(index)
}

#[derive(Debug)]
pub struct CodingGame {
    core: SessionCore,
    challenges: Vec<CodingChallenge>,
    challenge: Option<CodingChallenge>,
    program: Vec<Block>,
    holding: bool,
    last_moved: Option<Block>,
}

impl CodingGame {
    pub fn new(picker: ChallengePicker) -> Self {
        Self::with_challenges(picker, CodingChallenge::builtin())
    }

    /// Session drawing its challenges from a custom list
    pub fn with_challenges(picker: ChallengePicker, challenges: Vec<CodingChallenge>) -> Self {
        let mut game = Self {
            core: SessionCore::new(picker),
            challenges,
            challenge: None,
            program: Vec::new(),
            holding: false,
            last_moved: None,
        };
        game.next_challenge();
        game
    }

    pub fn challenge(&self) -> Option<&CodingChallenge> {
        self.challenge.as_ref()
    }

    pub fn program(&self) -> &[Block] {
        &self.program
    }

    fn palette(&self) -> &[Block] {
        self.challenge.as_ref().map(|c| c.palette.as_slice()).unwrap_or(&[])
    }

    fn active_challenge(&self) -> Result<&CodingChallenge, EngineError> {
        self.challenge
            .as_ref()
            .ok_or_else(|| EngineError::invalid_state("no coding challenge"))
    }

    fn run(&mut self, now: Millis) -> Result<Vec<SideEffect>, EngineError> {
        let challenge = self.active_challenge()?;
        if self.program.is_empty() {
            return Err(EngineError::invalid_state("program is empty"));
        }
        let solved = self.program == challenge.solution;
        let detail = json!({
            "challenge": challenge.id,
            "program": self.program,
        });
        if solved {
            Ok(self.core.complete(OutcomeKind::ProgramRun, CODING_POINTS, detail, now))
        } else {
            Ok(self.core.fail(OutcomeKind::ProgramRun, detail, now))
        }
    }
}

impl GameSession for CodingGame {
    fn subject(&self) -> Subject {
        Subject::Coding
    }

    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn reduce(&mut self, event: &InteractionEvent, _now: Millis) -> Vec<SideEffect> {
        let Some(palm) = event.primary_palm() else {
            self.holding = false;
            self.core.set_phase(Phase::Idle);
            return Vec::new();
        };
        if event.first_of(GestureKind::Drag).is_none() {
            self.holding = false;
            self.core.set_phase(Phase::Selecting);
            return Vec::new();
        }
        if self.holding {
            return Vec::new();
        }

        let p = palm.scaled(CANVAS_WIDTH, CANVAS_HEIGHT);
        if p.x >= BLOCK_AREA_WIDTH {
            return Vec::new();
        }
        if p.y < PALETTE_MAX_Y {
            if let Some(block) = slot(p.x, self.palette().len()).map(|i| self.palette()[i]) {
                self.program.push(block);
                self.last_moved = Some(block);
                self.holding = true;
            }
        } else if p.y > PROGRAM_MIN_Y {
            if let Some(i) = slot(p.x, self.program.len()) {
                self.last_moved = Some(self.program.remove(i));
                self.holding = true;
            }
        }
        if self.holding {
            self.core.set_phase(Phase::Interacting);
        }
        Vec::new()
    }

    fn handle_action(
        &mut self,
        action: &PlayerAction,
        now: Millis,
    ) -> Result<Vec<SideEffect>, EngineError> {
        match action {
            PlayerAction::RunProgram => self.run(now),
            PlayerAction::ClearProgram => {
                self.active_challenge()?;
                self.program.clear();
                Ok(Vec::new())
            }
            PlayerAction::AppendBlock { block } => {
                if !self.active_challenge()?.palette.contains(block) {
                    return Err(EngineError::invalid_state(format!(
                        "{:?} is not in the palette",
                        block
                    )));
                }
                self.program.push(*block);
                Ok(Vec::new())
            }
            other => Err(EngineError::invalid_state(format!(
                "coding has no use for {:?}",
                other
            ))),
        }
    }

    fn next_challenge(&mut self) {
        let index = self.core.pick(self.challenges.len());
        self.challenge = self.challenges.get(index).cloned();
        self.program.clear();
        self.holding = false;
        self.last_moved = None;
    }

    fn selection(&self) -> Option<String> {
        self.last_moved
            .filter(|_| self.holding)
            .map(|b| b.as_str().to_string())
    }

    fn entities(&self) -> Value {
        json!({
            "challenge": self.challenge,
            "program": self.program,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Gesture, Point};

    fn drag_at(x: f64, y: f64) -> InteractionEvent {
        InteractionEvent::hand(
            Point::new(x / CANVAS_WIDTH, y / CANVAS_HEIGHT),
            vec![Gesture::new(GestureKind::Drag, 0.9)],
        )
    }

    fn open_hand() -> InteractionEvent {
        InteractionEvent::hand(Point::new(0.5, 0.5), vec![])
    }

    #[test]
    fn test_first_challenge_is_square() {
        let game = CodingGame::new(ChallengePicker::new(5));
        assert_eq!(game.challenge().map(|c| c.id), Some(1));
    }

    #[test]
    fn test_palette_drag_copies_one_block_per_grab() {
        let mut game = CodingGame::new(ChallengePicker::new(5));
        game.apply_event(&drag_at(50.0, 100.0), 0);
        game.apply_event(&drag_at(50.0, 100.0), 100);
        assert_eq!(game.program(), &[Block::MoveForward]);

        game.apply_event(&open_hand(), 200);
        game.apply_event(&drag_at(150.0, 100.0), 300);
        assert_eq!(game.program(), &[Block::MoveForward, Block::TurnRight]);
        assert_eq!(game.selection().as_deref(), Some("turn_right"));
    }

    #[test]
    fn test_program_drag_removes_block() {
        let mut game = CodingGame::new(ChallengePicker::new(5));
        game.perform(&PlayerAction::AppendBlock { block: Block::MoveForward }, 0).unwrap();
        game.perform(&PlayerAction::AppendBlock { block: Block::TurnLeft }, 0).unwrap();

        game.apply_event(&drag_at(300.0, 400.0), 100);
        assert_eq!(game.program(), &[Block::MoveForward]);
    }

    #[test]
    fn test_outside_zones_does_nothing() {
        let mut game = CodingGame::new(ChallengePicker::new(5));
        game.apply_event(&drag_at(600.0, 100.0), 0);
        game.apply_event(&InteractionEvent::empty(), 50);
        game.apply_event(&drag_at(200.0, 250.0), 100);
        assert!(game.program().is_empty());
    }

    #[test]
    fn test_run_empty_program_rejected() {
        let mut game = CodingGame::new(ChallengePicker::new(5));
        let err = game.perform(&PlayerAction::RunProgram, 0).unwrap_err();
        assert_eq!(err.code(), "INVALID_CHALLENGE_STATE");
    }

    #[test]
    fn test_square_solution_scores() {
        let mut game = CodingGame::new(ChallengePicker::new(5));
        let solution = game.challenge().unwrap().solution.clone();
        for block in solution {
            game.perform(&PlayerAction::AppendBlock { block }, 0).unwrap();
        }
        let effects = game.perform(&PlayerAction::RunProgram, 10).unwrap();
        assert!(effects.iter().any(SideEffect::is_score));
        assert_eq!(game.core().score(), CODING_POINTS);
    }
}
