//! Biology: rotate, zoom and identify body parts

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::{ChallengePicker, GameSession, PlayerAction, SessionCore};
use crate::types::{
    EngineError, Finger, GestureKind, InteractionEvent, OutcomeKind, Phase, SideEffect, Subject,
};
use crate::{Millis, BIOLOGY_POINTS, ROTATION_RANGE_DEG, ZOOM_MAX, ZOOM_MIN, ZOOM_STEP};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Organism {
    #[default]
    Human,
    Frog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodySystem {
    #[default]
    Skeletal,
    Digestive,
    Nervous,
}

impl BodySystem {
    pub const ALL: [BodySystem; 3] = [Self::Skeletal, Self::Digestive, Self::Nervous];
}

/// Vertical band of the model the index fingertip points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Head,
    Torso,
    Limbs,
}

impl Region {
    /// Band for a normalized fingertip y
    pub fn from_height(y: f64) -> Self {
        if y < 0.3 {
            Self::Head
        } else if y < 0.6 {
            Self::Torso
        } else {
            Self::Limbs
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Torso => "torso",
            Self::Limbs => "limbs",
        }
    }

    /// Region a named part belongs to
    pub fn of_part(part: &str) -> Option<Self> {
        match part {
            "skull" | "brain" | "mouth" => Some(Self::Head),
            "spine" | "ribs" | "backbone" | "stomach" | "intestines" | "liver"
            | "spinal-cord" => Some(Self::Torso),
            "arms" | "legs" | "limbs" | "nerves" => Some(Self::Limbs),
            _ => None,
        }
    }
}

/// Parts shown for an organism's system, in display order
pub fn parts(organism: Organism, system: BodySystem) -> &'static [&'static str] {
    match (organism, system) {
        (Organism::Human, BodySystem::Skeletal) => &["skull", "spine", "ribs", "arms", "legs"],
        (Organism::Human, BodySystem::Digestive) => &["mouth", "stomach", "intestines", "liver"],
        (Organism::Human, BodySystem::Nervous) => &["brain", "nerves", "spinal-cord"],
        (Organism::Frog, BodySystem::Skeletal) => &["skull", "backbone", "limbs"],
        (Organism::Frog, BodySystem::Digestive) => &["mouth", "stomach", "intestines"],
        (Organism::Frog, BodySystem::Nervous) => &["brain", "nerves"],
    }
}

/// Model orientation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug)]
pub struct BiologyGame {
    core: SessionCore,
    organism: Organism,
    system: BodySystem,
    rotation: Rotation,
    zoom: f64,
    highlighted: Option<Region>,
    target: Option<&'static str>,
}

impl BiologyGame {
    pub fn new(picker: ChallengePicker) -> Self {
        let mut game = Self {
            core: SessionCore::new(picker),
            organism: Organism::default(),
            system: BodySystem::default(),
            rotation: Rotation::default(),
            zoom: 1.0,
            highlighted: None,
            target: None,
        };
        game.next_challenge();
        game
    }

    pub fn organism(&self) -> Organism {
        self.organism
    }

    pub fn system(&self) -> BodySystem {
        self.system
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn highlighted(&self) -> Option<Region> {
        self.highlighted
    }

    /// Part the player is asked to identify
    pub fn target(&self) -> Option<&'static str> {
        self.target
    }

    fn visible_parts(&self) -> &'static [&'static str] {
        parts(self.organism, self.system)
    }

    fn pick_target(&mut self) {
        let parts = self.visible_parts();
        self.target = parts.get(self.core.pick(parts.len())).copied();
    }

    fn identify(&mut self, part: &str, now: Millis) -> Result<Vec<SideEffect>, EngineError> {
        let target = self
            .target
            .ok_or_else(|| EngineError::invalid_state("no part to identify"))?;
        if !self.visible_parts().iter().any(|p| *p == part) {
            return Err(EngineError::invalid_state(format!(
                "{} is not part of the {:?} {:?} system",
                part, self.organism, self.system
            )));
        }
        let detail = json!({
            "part": part,
            "system": self.system,
            "organism": self.organism,
        });
        if part == target {
            Ok(self.core.complete(OutcomeKind::PartPicked, BIOLOGY_POINTS, detail, now))
        } else {
            Ok(self.core.fail(OutcomeKind::PartPicked, detail, now))
        }
    }
}

impl GameSession for BiologyGame {
    fn subject(&self) -> Subject {
        Subject::Biology
    }

    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn reduce(&mut self, event: &InteractionEvent, _now: Millis) -> Vec<SideEffect> {
        if !event.has_hands() {
            self.core.set_phase(Phase::Idle);
            return Vec::new();
        }

        if let (Some(_), Some(palm)) = (event.first_of(GestureKind::Rotate), event.primary_palm()) {
            self.rotation = Rotation {
                x: (palm.y - 0.5) * ROTATION_RANGE_DEG,
                y: (palm.x - 0.5) * ROTATION_RANGE_DEG,
            };
        }

        if let Some(scale) = event.first_of(GestureKind::Zoom).and_then(|g| g.scale) {
            self.zoom = (self.zoom + (scale - 0.5) * ZOOM_STEP).clamp(ZOOM_MIN, ZOOM_MAX);
        }

        if let Some(tip) = event.fingertip(Finger::Index) {
            self.highlighted = Some(Region::from_height(tip.y));
        }

        let phase = if self.highlighted.is_some() {
            Phase::Interacting
        } else {
            Phase::Selecting
        };
        self.core.set_phase(phase);
        Vec::new()
    }

    fn handle_action(
        &mut self,
        action: &PlayerAction,
        now: Millis,
    ) -> Result<Vec<SideEffect>, EngineError> {
        match action {
            PlayerAction::SelectPart { part } => self.identify(part.trim(), now),
            PlayerAction::ConfirmRegion => {
                let region = self
                    .highlighted
                    .ok_or_else(|| EngineError::invalid_state("no region highlighted"))?;
                // The band may hold several parts; the one being asked for wins
                let part = self
                    .target
                    .filter(|t| Region::of_part(t) == Some(region))
                    .or_else(|| {
                        self.visible_parts()
                            .iter()
                            .copied()
                            .find(|p| Region::of_part(p) == Some(region))
                    })
                    .ok_or_else(|| {
                        EngineError::invalid_state(format!("nothing to pick in the {}", region.as_str()))
                    })?;
                self.identify(part, now)
            }
            PlayerAction::ChooseOrganism { organism } => {
                if *organism != self.organism {
                    self.organism = *organism;
                    self.pick_target();
                }
                Ok(Vec::new())
            }
            PlayerAction::ChooseSystem { system } => {
                if *system != self.system {
                    self.system = *system;
                    self.pick_target();
                }
                Ok(Vec::new())
            }
            other => Err(EngineError::invalid_state(format!(
                "biology has no use for {:?}",
                other
            ))),
        }
    }

    fn next_challenge(&mut self) {
        self.system = BodySystem::ALL[self.core.pick(BodySystem::ALL.len())];
        self.rotation = Rotation::default();
        self.zoom = 1.0;
        self.highlighted = None;
        self.pick_target();
    }

    fn selection(&self) -> Option<String> {
        self.highlighted.map(|r| r.as_str().to_string())
    }

    fn entities(&self) -> Value {
        json!({
            "organism": self.organism,
            "system": self.system,
            "parts": self.visible_parts(),
            "target": self.target,
            "rotation": self.rotation,
            "zoom": self.zoom,
            "highlighted": self.highlighted,
        })
    }
}
