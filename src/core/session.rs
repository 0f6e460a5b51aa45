//! GameSession: the capability every subject game implements
//!
//! Phase machine (all subjects):
//! - IDLE → SELECTING: hand in frame, nothing selected
//! - SELECTING → INTERACTING: entity selected / stroke started
//! - INTERACTING → COMPLETED: challenge solved (score side effect)
//! - INTERACTING → FAILED_ATTEMPT: attempt evaluated and rejected
//! - COMPLETED → IDLE: after the cool-down, with fresh content
//! - FAILED_ATTEMPT → IDLE: on the next tick

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::games::{Block, BodySystem, Chemical, Organism};
use crate::types::{
    Cue, EngineError, InteractionEvent, OutcomeKind, PendingResult, Phase, SessionSnapshot,
    SideEffect, Subject, Tone,
};
use crate::{Millis, COOLDOWN_MS, RESULT_DISPLAY_MS};

/// Non-gesture input routed to the active session (buttons, clicks)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlayerAction {
    /// Chemistry: fill the selected beaker
    AddChemical { chemical: Chemical },
    /// Biology: click a named part
    SelectPart { part: String },
    /// Biology: click on the highlighted region
    ConfirmRegion,
    ChooseOrganism { organism: Organism },
    ChooseSystem { system: BodySystem },
    /// Coding: evaluate the assembled program
    RunProgram,
    ClearProgram,
    /// Coding: tap a palette block without a drag
    AppendBlock { block: Block },
}

/// Deterministic challenge selection from a session seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengePicker {
    seed: u64,
}

impl ChallengePicker {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from the wall clock
    pub fn from_clock() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(nanos)
    }

    /// Index in `0..len` for the given round (0 when `len` is 0)
    pub fn pick(&self, round: u32, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(round.to_le_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[0..8]);
        (u64::from_le_bytes(head) % len as u64) as usize
    }
}

/// State every subject shares: score, phase, transient message, cool-down
#[derive(Debug, Clone)]
pub struct SessionCore {
    score: u32,
    phase: Phase,
    pending: Option<PendingResult>,
    cooldown_until: Option<Millis>,
    round: u32,
    picker: ChallengePicker,
}

impl SessionCore {
    pub fn new(picker: ChallengePicker) -> Self {
        Self {
            score: 0,
            phase: Phase::Idle,
            pending: None,
            cooldown_until: None,
            round: 0,
            picker,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn pending(&self) -> Option<&PendingResult> {
        self.pending.as_ref()
    }

    pub fn picker(&self) -> ChallengePicker {
        self.picker
    }

    /// Index into a content list for the current round; round 0 gets the first entry
    pub fn pick(&self, len: usize) -> usize {
        if self.round == 0 {
            return 0;
        }
        self.picker.pick(self.round, len)
    }

    /// Move between the non-terminal phases
    ///
    /// Completed and FailedAttempt are only entered through `complete`/`fail`
    /// and only left through `tick`.
    pub fn set_phase(&mut self, phase: Phase) {
        if matches!(self.phase, Phase::Completed) {
            return;
        }
        if matches!(phase, Phase::Completed | Phase::FailedAttempt) {
            return;
        }
        self.phase = phase;
    }

    pub fn is_cooling_down(&self, now: Millis) -> bool {
        self.cooldown_until.map(|until| now < until).unwrap_or(false)
    }

    /// Award points for a solved challenge
    ///
    /// At most one award per challenge: a session already in COMPLETED emits nothing.
    pub fn complete(
        &mut self,
        outcome: OutcomeKind,
        points: u32,
        detail: Value,
        now: Millis,
    ) -> Vec<SideEffect> {
        if self.phase == Phase::Completed {
            return Vec::new();
        }
        self.score = self.score.saturating_add(points);
        self.phase = Phase::Completed;
        self.cooldown_until = Some(now + COOLDOWN_MS);
        self.show(outcome.cue(), Tone::Success, now);
        debug!(outcome = outcome.code(), points, total = self.score, "challenge completed");
        vec![SideEffect::Scored {
            outcome,
            points,
            total: self.score,
            detail,
        }]
    }

    /// Record a rejected attempt; score and content stay as they are
    pub fn fail(&mut self, outcome: OutcomeKind, detail: Value, now: Millis) -> Vec<SideEffect> {
        if self.phase == Phase::Completed {
            return Vec::new();
        }
        self.phase = Phase::FailedAttempt;
        self.show(Cue::TryAgain, Tone::Retry, now);
        vec![SideEffect::AttemptFailed { outcome, detail }]
    }

    pub fn warn(&mut self, cue: Cue, detail: Value, now: Millis) -> Vec<SideEffect> {
        self.show(cue, Tone::Warning, now);
        vec![SideEffect::Warning { cue, detail }]
    }

    fn show(&mut self, cue: Cue, tone: Tone, now: Millis) {
        self.pending = Some(PendingResult {
            cue,
            tone,
            expires_at: now + RESULT_DISPLAY_MS,
        });
    }

    /// Advance timers; returns true when the cool-down just ended
    fn advance(&mut self, now: Millis) -> bool {
        if self.pending.as_ref().map(|p| now >= p.expires_at).unwrap_or(false) {
            self.pending = None;
        }
        if self.phase == Phase::FailedAttempt {
            self.phase = Phase::Idle;
        }
        match self.cooldown_until {
            Some(until) if now >= until => {
                self.cooldown_until = None;
                self.round += 1;
                self.phase = Phase::Idle;
                true
            }
            _ => false,
        }
    }

    fn restart(&mut self) {
        *self = Self::new(self.picker);
    }
}

/// One active subject game
///
/// Implementors provide the subject-specific reducer (`reduce`), action
/// handling and content generation; the provided methods add the shared
/// timing rules around them.
pub trait GameSession: Send {
    fn subject(&self) -> Subject;

    fn core(&self) -> &SessionCore;

    fn core_mut(&mut self) -> &mut SessionCore;

    /// Subject reducer for one event, called outside the cool-down only
    fn reduce(&mut self, event: &InteractionEvent, now: Millis) -> Vec<SideEffect>;

    /// Subject handling of a player action, called outside the cool-down only
    fn handle_action(
        &mut self,
        action: &PlayerAction,
        now: Millis,
    ) -> Result<Vec<SideEffect>, EngineError>;

    /// Replace entities and challenge with fresh content for `core().round()`
    fn next_challenge(&mut self);

    /// Currently selected entity, rendered for display
    fn selection(&self) -> Option<String>;

    /// Entities and challenge data for snapshots
    fn entities(&self) -> Value;

    /// Apply one interaction event (capture order, no coalescing)
    fn apply_event(&mut self, event: &InteractionEvent, now: Millis) -> Vec<SideEffect> {
        let mut effects = self.tick(now);
        if self.core().is_cooling_down(now) {
            return effects;
        }
        effects.extend(self.reduce(event, now));
        effects
    }

    /// Apply a player action; rejected actions leave the session unchanged
    fn perform(
        &mut self,
        action: &PlayerAction,
        now: Millis,
    ) -> Result<Vec<SideEffect>, EngineError> {
        let mut effects = self.tick(now);
        if self.core().is_cooling_down(now) {
            return Ok(effects);
        }
        effects.extend(self.handle_action(action, now)?);
        Ok(effects)
    }

    /// Expire messages and finish the cool-down
    fn tick(&mut self, now: Millis) -> Vec<SideEffect> {
        if self.core_mut().advance(now) {
            self.next_challenge();
            let round = self.core().round();
            debug!(subject = %self.subject(), round, "fresh challenge");
            return vec![SideEffect::ChallengeStarted { round }];
        }
        Vec::new()
    }

    fn current_state(&self) -> SessionSnapshot {
        let core = self.core();
        SessionSnapshot {
            subject: self.subject(),
            score: core.score(),
            phase: core.phase(),
            round: core.round(),
            selection: self.selection(),
            pending: core.pending().cloned(),
            entities: self.entities(),
        }
    }

    /// Restart from scratch: score zero, round zero, fresh content
    fn reset(&mut self) {
        self.core_mut().restart();
        self.next_challenge();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_picker_is_deterministic() {
        let a = ChallengePicker::new(42);
        let b = ChallengePicker::new(42);
        for round in 0..10 {
            assert_eq!(a.pick(round, 7), b.pick(round, 7));
            assert!(a.pick(round, 7) < 7);
        }
        assert_eq!(a.pick(3, 0), 0);
    }

    #[test]
    fn test_complete_awards_once() {
        let mut core = SessionCore::new(ChallengePicker::new(1));
        let first = core.complete(OutcomeKind::TargetHit, 10, json!({}), 0);
        let second = core.complete(OutcomeKind::TargetHit, 10, json!({}), 5);
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(core.score(), 10);
        assert!(core.is_cooling_down(COOLDOWN_MS - 1));
        assert!(!core.is_cooling_down(COOLDOWN_MS));
    }

    #[test]
    fn test_cooldown_ends_into_next_round() {
        let mut core = SessionCore::new(ChallengePicker::new(1));
        core.complete(OutcomeKind::ShapeDrawn, 20, json!({}), 100);
        assert!(!core.advance(100 + COOLDOWN_MS - 1));
        assert!(core.advance(100 + COOLDOWN_MS));
        assert_eq!(core.round(), 1);
        assert_eq!(core.phase(), Phase::Idle);
    }

    #[test]
    fn test_failed_attempt_returns_to_idle() {
        let mut core = SessionCore::new(ChallengePicker::new(1));
        core.fail(OutcomeKind::ProgramRun, json!({}), 0);
        assert_eq!(core.phase(), Phase::FailedAttempt);
        assert_eq!(core.score(), 0);
        core.advance(1);
        assert_eq!(core.phase(), Phase::Idle);
    }

    #[test]
    fn test_pending_message_expires() {
        let mut core = SessionCore::new(ChallengePicker::new(1));
        core.warn(Cue::BaseCaution, json!({}), 0);
        assert!(core.pending().is_some());
        core.advance(RESULT_DISPLAY_MS - 1);
        assert!(core.pending().is_some());
        core.advance(RESULT_DISPLAY_MS);
        assert!(core.pending().is_none());
    }

    #[test]
    fn test_set_phase_cannot_leave_completed() {
        let mut core = SessionCore::new(ChallengePicker::new(1));
        core.complete(OutcomeKind::Reaction, 15, json!({}), 0);
        core.set_phase(Phase::Selecting);
        assert_eq!(core.phase(), Phase::Completed);
    }
}
