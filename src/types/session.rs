//! Session phases, side effects and snapshots

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Subject;
use crate::Millis;

/// Per-session play phase, shared by every subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Nothing in hand
    #[default]
    Idle,
    /// Hand present, nothing selected yet
    Selecting,
    /// An entity is selected or a stroke is in progress
    Interacting,
    /// Challenge solved, cooling down before fresh content
    Completed,
    /// Attempt evaluated and rejected; returns to Idle on the next tick
    FailedAttempt,
}

impl Phase {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            Phase::Idle => "\x1b[90m",          // Gray
            Phase::Selecting => "\x1b[36m",     // Cyan
            Phase::Interacting => "\x1b[33m",   // Yellow
            Phase::Completed => "\x1b[32m",     // Green
            Phase::FailedAttempt => "\x1b[31m", // Red
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Phase::Idle => "⏳",
            Phase::Selecting => "✋",
            Phase::Interacting => "👉",
            Phase::Completed => "🏆",
            Phase::FailedAttempt => "🔁",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Idle => "IDLE",
            Phase::Selecting => "SELECTING",
            Phase::Interacting => "INTERACTING",
            Phase::Completed => "COMPLETED",
            Phase::FailedAttempt => "FAILED_ATTEMPT",
        };
        write!(f, "{}", name)
    }
}

/// Phrase keys the feedback channel localizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    CameraStarted,
    CameraStopped,
    GestureDetected,
    TargetHit,
    ShapeCorrect,
    Neutralization,
    BaseCaution,
    PartIdentified,
    ProgramCorrect,
    TryAgain,
    NewChallenge,
}

/// What a scoring or failed attempt was about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    TargetHit,
    ShapeDrawn,
    Reaction,
    PartPicked,
    ProgramRun,
}

impl OutcomeKind {
    /// Stable code (for logging and persistence)
    pub fn code(&self) -> &'static str {
        match self {
            Self::TargetHit => "target_hit",
            Self::ShapeDrawn => "shape_drawn",
            Self::Reaction => "reaction",
            Self::PartPicked => "part_picked",
            Self::ProgramRun => "program_run",
        }
    }

    /// Cue announced when an attempt of this kind scores
    pub fn cue(&self) -> Cue {
        match self {
            Self::TargetHit => Cue::TargetHit,
            Self::ShapeDrawn => Cue::ShapeCorrect,
            Self::Reaction => Cue::Neutralization,
            Self::PartPicked => Cue::PartIdentified,
            Self::ProgramRun => Cue::ProgramCorrect,
        }
    }
}

/// Externally observable consequence of a transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SideEffect {
    /// Challenge completed; forwarded to persistence
    Scored {
        outcome: OutcomeKind,
        points: u32,
        total: u32,
        detail: Value,
    },
    /// Attempt evaluated and rejected; score unchanged
    AttemptFailed { outcome: OutcomeKind, detail: Value },
    /// Something the player should be cautious about
    Warning { cue: Cue, detail: Value },
    /// Fresh content after the cool-down
    ChallengeStarted { round: u32 },
}

impl SideEffect {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::Scored { outcome, .. } => outcome.code(),
            Self::AttemptFailed { .. } => "attempt_failed",
            Self::Warning { .. } => "warning",
            Self::ChallengeStarted { .. } => "challenge_started",
        }
    }

    pub fn cue(&self) -> Cue {
        match self {
            Self::Scored { outcome, .. } => outcome.cue(),
            Self::AttemptFailed { .. } => Cue::TryAgain,
            Self::Warning { cue, .. } => *cue,
            Self::ChallengeStarted { .. } => Cue::NewChallenge,
        }
    }

    pub fn is_score(&self) -> bool {
        matches!(self, Self::Scored { .. })
    }

    pub fn outcome(&self) -> Option<OutcomeKind> {
        match self {
            Self::Scored { outcome, .. } | Self::AttemptFailed { outcome, .. } => Some(*outcome),
            _ => None,
        }
    }
}

/// Tone of a transient on-screen message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Warning,
    Retry,
}

/// Transient result message that clears itself at `expires_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingResult {
    pub cue: Cue,
    pub tone: Tone,
    pub expires_at: Millis,
}

/// Read-only view of a session's state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub subject: Subject,
    pub score: u32,
    pub phase: Phase,
    pub round: u32,
    pub selection: Option<String>,
    pub pending: Option<PendingResult>,
    /// Subject-specific entities and challenge data
    pub entities: Value,
}
