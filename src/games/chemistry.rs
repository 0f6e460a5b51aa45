//! Chemistry: pour between beakers and trigger reactions
//!
//! Palm x picks the current beaker by equal-width bands. A pour gesture moves
//! one quantum from the beaker selected before this event to its left or right
//! neighbour; selection is then updated from the same event.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::core::{ChallengePicker, GameSession, PlayerAction, SessionCore};
use crate::types::{
    Cue, Direction, EngineError, GestureKind, InteractionEvent, OutcomeKind, Phase, SideEffect,
    Subject,
};
use crate::{
    Millis, BEAKER_CAPACITY, BEAKER_COUNT, CANVAS_WIDTH, CHEMISTRY_POINTS, INITIAL_FILL,
    POUR_QUANTUM,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chemical {
    Acid,
    Base,
    Water,
    /// Neutralization product; cannot be added directly
    Salt,
}

impl Chemical {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acid => "acid",
            Self::Base => "base",
            Self::Water => "water",
            Self::Salt => "salt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Beaker {
    pub chemical: Option<Chemical>,
    pub volume: u32,
}

impl Beaker {
    pub fn filled(chemical: Chemical, volume: u32) -> Self {
        Self {
            chemical: Some(chemical),
            volume,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.volume == 0 || self.chemical.is_none()
    }
}

/// What pouring `incoming` into a beaker holding `resident` produces
enum Mix {
    Neutralization,
    Caution(Chemical),
    Settled(Chemical),
}

fn mix(incoming: Chemical, resident: Option<Chemical>) -> Mix {
    use Chemical::*;
    match (incoming, resident) {
        (Acid, Some(Base)) | (Base, Some(Acid)) => Mix::Neutralization,
        (Base, Some(_)) => Mix::Caution(Base),
        (chemical, None) => Mix::Settled(chemical),
        (Acid, Some(_)) => Mix::Settled(Acid),
        (Water | Salt, Some(resident)) => Mix::Settled(resident),
    }
}

/// Starting fills for later rounds; round 0 starts with empty beakers
const LAYOUTS: [[Option<Chemical>; BEAKER_COUNT]; 3] = [
    [None, None, None],
    [Some(Chemical::Acid), None, Some(Chemical::Base)],
    [Some(Chemical::Base), Some(Chemical::Water), Some(Chemical::Acid)],
];

#[derive(Debug)]
pub struct ChemistryGame {
    core: SessionCore,
    beakers: [Beaker; BEAKER_COUNT],
    selected: Option<usize>,
}

impl ChemistryGame {
    pub fn new(picker: ChallengePicker) -> Self {
        let mut game = Self {
            core: SessionCore::new(picker),
            beakers: [Beaker::default(); BEAKER_COUNT],
            selected: None,
        };
        game.next_challenge();
        game
    }

    pub fn beakers(&self) -> &[Beaker] {
        &self.beakers
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Beaker index under a normalized palm x
    fn band(x: f64) -> usize {
        let width = CANVAS_WIDTH / BEAKER_COUNT as f64;
        ((x * CANVAS_WIDTH / width).floor() as usize).min(BEAKER_COUNT - 1)
    }

    fn pour(&mut self, from: usize, direction: Direction, now: Millis) -> Vec<SideEffect> {
        let to = match direction {
            Direction::Left => from.checked_sub(1),
            Direction::Right => Some(from + 1).filter(|i| *i < BEAKER_COUNT),
        };
        let Some(to) = to else {
            return Vec::new();
        };
        let source = self.beakers[from];
        let Some(incoming) = source.chemical.filter(|_| source.volume > 0) else {
            return Vec::new();
        };
        let amount = POUR_QUANTUM
            .min(source.volume)
            .min(BEAKER_CAPACITY - self.beakers[to].volume);
        if amount == 0 {
            return Vec::new();
        }

        let resident = self.beakers[to].chemical.filter(|_| self.beakers[to].volume > 0);
        self.beakers[from].volume -= amount;
        if self.beakers[from].volume == 0 {
            self.beakers[from].chemical = None;
        }
        self.beakers[to].volume += amount;
        debug!(from, to, amount, chemical = incoming.as_str(), "poured");

        match mix(incoming, resident) {
            Mix::Neutralization => {
                self.beakers[to].chemical = Some(Chemical::Salt);
                self.core.complete(
                    OutcomeKind::Reaction,
                    CHEMISTRY_POINTS,
                    json!({
                        "chemicals": [Chemical::Acid, Chemical::Base],
                        "product": Chemical::Salt,
                        "beaker": to,
                    }),
                    now,
                )
            }
            Mix::Caution(result) => {
                self.beakers[to].chemical = Some(result);
                self.core.warn(
                    Cue::BaseCaution,
                    json!({ "chemical": incoming, "beaker": to }),
                    now,
                )
            }
            Mix::Settled(result) => {
                self.beakers[to].chemical = Some(result);
                Vec::new()
            }
        }
    }
}

impl GameSession for ChemistryGame {
    fn subject(&self) -> Subject {
        Subject::Chemistry
    }

    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn reduce(&mut self, event: &InteractionEvent, now: Millis) -> Vec<SideEffect> {
        let Some(palm) = event.primary_palm() else {
            self.core.set_phase(Phase::Idle);
            return Vec::new();
        };

        let mut effects = Vec::new();
        let pour = event.first_of(GestureKind::Pour).and_then(|g| g.direction);
        if let (Some(direction), Some(from)) = (pour, self.selected) {
            effects = self.pour(from, direction, now);
        }

        self.selected = Some(Self::band(palm.x));
        self.core.set_phase(Phase::Interacting);
        effects
    }

    fn handle_action(
        &mut self,
        action: &PlayerAction,
        _now: Millis,
    ) -> Result<Vec<SideEffect>, EngineError> {
        match action {
            PlayerAction::AddChemical { chemical } => {
                if *chemical == Chemical::Salt {
                    return Err(EngineError::invalid_state("salt is only produced by reactions"));
                }
                let index = self
                    .selected
                    .ok_or_else(|| EngineError::invalid_state("no beaker selected"))?;
                self.beakers[index] = Beaker::filled(*chemical, INITIAL_FILL);
                Ok(Vec::new())
            }
            other => Err(EngineError::invalid_state(format!(
                "chemistry has no use for {:?}",
                other
            ))),
        }
    }

    fn next_challenge(&mut self) {
        let layout = LAYOUTS[self.core.pick(LAYOUTS.len())];
        for (beaker, chemical) in self.beakers.iter_mut().zip(layout) {
            *beaker = match chemical {
                Some(c) => Beaker::filled(c, INITIAL_FILL),
                None => Beaker::default(),
            };
        }
        self.selected = None;
    }

    fn selection(&self) -> Option<String> {
        self.selected.map(|i| format!("beaker {}", i + 1))
    }

    fn entities(&self) -> Value {
        json!({
            "beakers": self.beakers,
            "selected": self.selected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Gesture, Point};

    fn palm_in(band: usize) -> InteractionEvent {
        let x = (band as f64 + 0.5) / BEAKER_COUNT as f64;
        InteractionEvent::hand(Point::new(x, 0.5), vec![])
    }

    fn pour_from(band: usize, direction: Direction) -> InteractionEvent {
        let mut event = palm_in(band);
        event.gestures.push(Gesture::pour(direction));
        event
    }

    #[test]
    fn test_band_selection() {
        assert_eq!(ChemistryGame::band(0.0), 0);
        assert_eq!(ChemistryGame::band(0.5), 1);
        assert_eq!(ChemistryGame::band(1.0), 2);
    }

    #[test]
    fn test_add_chemical_needs_selection() {
        let mut game = ChemistryGame::new(ChallengePicker::new(9));
        let err = game
            .perform(&PlayerAction::AddChemical { chemical: Chemical::Acid }, 0)
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_CHALLENGE_STATE");
        assert!(game.beakers().iter().all(Beaker::is_empty));
    }

    #[test]
    fn test_neutralization_scores_once() {
        let mut game = ChemistryGame::new(ChallengePicker::new(9));
        game.apply_event(&palm_in(0), 0);
        game.perform(&PlayerAction::AddChemical { chemical: Chemical::Acid }, 10).unwrap();
        game.apply_event(&palm_in(1), 20);
        game.perform(&PlayerAction::AddChemical { chemical: Chemical::Base }, 30).unwrap();
        game.apply_event(&palm_in(0), 40);

        let effects = game.apply_event(&pour_from(0, Direction::Right), 50);
        assert_eq!(effects.len(), 1);
        assert_eq!(game.beakers()[1].chemical, Some(Chemical::Salt));
        assert_eq!(game.beakers()[1].volume, 70);
        assert_eq!(game.core().score(), CHEMISTRY_POINTS);

        let again = game.apply_event(&pour_from(0, Direction::Right), 60);
        assert!(again.is_empty());
        assert_eq!(game.core().score(), CHEMISTRY_POINTS);
    }

    #[test]
    fn test_base_into_water_warns() {
        let mut game = ChemistryGame::new(ChallengePicker::new(9));
        game.apply_event(&palm_in(2), 0);
        game.perform(&PlayerAction::AddChemical { chemical: Chemical::Water }, 10).unwrap();
        game.apply_event(&palm_in(1), 20);
        game.perform(&PlayerAction::AddChemical { chemical: Chemical::Base }, 30).unwrap();

        let effects = game.apply_event(&pour_from(1, Direction::Right), 40);
        assert!(matches!(
            effects.as_slice(),
            [SideEffect::Warning { cue: Cue::BaseCaution, .. }]
        ));
        assert_eq!(game.core().score(), 0);
        assert_eq!(game.core().pending().map(|p| p.cue), Some(Cue::BaseCaution));
    }

    #[test]
    fn test_pour_off_the_edge_is_ignored() {
        let mut game = ChemistryGame::new(ChallengePicker::new(9));
        game.apply_event(&palm_in(0), 0);
        game.perform(&PlayerAction::AddChemical { chemical: Chemical::Acid }, 10).unwrap();
        game.apply_event(&pour_from(0, Direction::Left), 20);
        assert_eq!(game.beakers()[0].volume, INITIAL_FILL);
    }

    #[test]
    fn test_capacity_limits_transfer() {
        let mut game = ChemistryGame::new(ChallengePicker::new(9));
        game.apply_event(&palm_in(1), 0);
        game.perform(&PlayerAction::AddChemical { chemical: Chemical::Acid }, 10).unwrap();
        game.apply_event(&palm_in(0), 20);
        game.perform(&PlayerAction::AddChemical { chemical: Chemical::Acid }, 30).unwrap();

        for t in 0..5 {
            game.apply_event(&pour_from(0, Direction::Right), 40 + t);
        }
        assert_eq!(game.beakers()[1].volume, BEAKER_CAPACITY);
        assert_eq!(game.beakers()[0].volume, 0);
        assert_eq!(game.beakers()[0].chemical, None);
    }
}
