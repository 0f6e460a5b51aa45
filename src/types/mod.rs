//! Core types for Gesture Quest

mod error;
mod event;
mod progress;
mod session;
mod subject;

pub use error::EngineError;
pub use event::{Direction, Finger, Fingertips, Gesture, GestureKind, InteractionEvent, Point};
pub use progress::{GestureTally, ProgressRecord};
pub use session::{Cue, OutcomeKind, PendingResult, Phase, SessionSnapshot, SideEffect, Tone};
pub use subject::{GameDescriptor, Language, Subject};
