//! GameRegistry: subject → session implementation

use tracing::info;

use crate::core::{ChallengePicker, ClassifierChoice, GameSession};
use crate::games::{BiologyGame, ChemistryGame, CodingGame, MathGame, PhysicsGame};
use crate::types::Subject;

/// Creates fresh sessions for a subject
#[derive(Debug, Clone, Copy, Default)]
pub struct GameRegistry {
    classifier: ClassifierChoice,
}

impl GameRegistry {
    pub fn new(classifier: ClassifierChoice) -> Self {
        Self { classifier }
    }

    pub fn subjects(&self) -> &'static [Subject] {
        &Subject::ALL
    }

    /// New session with a clock-derived seed
    pub fn create(&self, subject: Subject) -> Box<dyn GameSession> {
        self.create_seeded(subject, ChallengePicker::from_clock())
    }

    /// New session with an explicit seed (replays, tests)
    pub fn create_seeded(&self, subject: Subject, picker: ChallengePicker) -> Box<dyn GameSession> {
        info!(%subject, "starting session");
        match subject {
            Subject::Physics => Box::new(PhysicsGame::new(picker)),
            Subject::Mathematics => Box::new(MathGame::new(picker, self.classifier)),
            Subject::Chemistry => Box::new(ChemistryGame::new(picker)),
            Subject::Biology => Box::new(BiologyGame::new(picker)),
            Subject::Coding => Box::new(CodingGame::new(picker)),
        }
    }
}
