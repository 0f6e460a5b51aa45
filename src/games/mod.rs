//! The five subject reducers

mod biology;
mod chemistry;
mod coding;
mod math;
mod physics;

pub use biology::{parts, BiologyGame, BodySystem, Organism, Region};
pub use chemistry::{Beaker, ChemistryGame, Chemical};
pub use coding::{Block, CodingChallenge, CodingGame};
pub use math::{MathGame, Problem};
pub use physics::{Body, PhysicsGame};
