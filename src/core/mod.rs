//! Core modules for Gesture Quest

pub mod api;
pub mod catalog;
pub mod client;
pub mod feedback;
pub mod locale;
pub mod normalizer;
pub mod registry;
pub mod runtime;
pub mod sampler;
pub mod session;
pub mod shapes;

pub use api::{create_router, run_server, ActivePlay, AppState, PlayUpdate};
pub use catalog::{builtin_catalog, find_game, CatalogClient};
pub use client::{GestureClient, Recognizer};
pub use feedback::{
    Announcer, FeedbackChannel, FileProgressSink, HttpProgressSink, MemoryProgressSink, Overlay,
    ProgressContext, ProgressSink, SilentAnnouncer, TerminalAnnouncer,
};
pub use locale::phrase;
pub use normalizer::GestureNormalizer;
pub use registry::GameRegistry;
pub use runtime::{PlayLoop, SessionClock, StepOutcome};
pub use sampler::{DirectorySource, Frame, FrameSampler, FrameSource, StopHandle};
pub use session::{ChallengePicker, GameSession, PlayerAction, SessionCore};
pub use shapes::{
    ClassifierChoice, GeometricClassifier, PointCountClassifier, ShapeClassifier, ShapeKind,
};
