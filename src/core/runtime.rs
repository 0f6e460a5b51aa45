//! PlayLoop: sampler → recognizer → normalizer → session → feedback
//!
//! Single cooperative task. Each step captures one frame, awaits its
//! classification (bounded by a timeout) and applies the resulting event
//! before the next capture, so events reach the session in capture order.

use std::time::Duration;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::core::{
    FeedbackChannel, FrameSampler, FrameSource, GameSession, GestureNormalizer, PlayerAction,
    ProgressContext, Recognizer, StopHandle,
};
use crate::types::{Cue, EngineError, GestureTally, InteractionEvent, SideEffect};
use crate::{Millis, FRAME_INTERVAL_MS, RECOGNITION_TIMEOUT_MS};

/// Play time that only runs while the loop is active
#[derive(Debug, Clone, Default)]
pub struct SessionClock {
    banked: Millis,
    running_since: Option<Instant>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resume(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.banked += since.elapsed().as_millis() as Millis;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Milliseconds of active play
    pub fn now(&self) -> Millis {
        self.banked
            + self
                .running_since
                .map(|since| since.elapsed().as_millis() as Millis)
                .unwrap_or(0)
    }
}

/// Result of one loop iteration
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Event applied to the session
    Applied {
        event: InteractionEvent,
        effects: Vec<SideEffect>,
    },
    /// Response arrived after stop and was dropped
    Discarded,
    /// Sampler inactive or source exhausted
    Ended,
}

pub struct PlayLoop<S: FrameSource, R: Recognizer> {
    sampler: FrameSampler<S>,
    recognizer: R,
    normalizer: GestureNormalizer,
    session: Box<dyn GameSession>,
    feedback: FeedbackChannel,
    tally: GestureTally,
    clock: SessionClock,
    frame_interval: Duration,
    request_timeout: Duration,
}

impl<S: FrameSource, R: Recognizer> PlayLoop<S, R> {
    pub fn new(
        sampler: FrameSampler<S>,
        recognizer: R,
        session: Box<dyn GameSession>,
        feedback: FeedbackChannel,
    ) -> Self {
        Self {
            sampler,
            recognizer,
            normalizer: GestureNormalizer::default(),
            session,
            feedback,
            tally: GestureTally::new(),
            clock: SessionClock::new(),
            frame_interval: Duration::from_millis(FRAME_INTERVAL_MS),
            request_timeout: Duration::from_millis(RECOGNITION_TIMEOUT_MS),
        }
    }

    pub fn with_timing(mut self, frame_interval: Duration, request_timeout: Duration) -> Self {
        self.frame_interval = frame_interval;
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_normalizer(mut self, normalizer: GestureNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn session(&self) -> &dyn GameSession {
        self.session.as_ref()
    }

    pub fn tally(&self) -> &GestureTally {
        &self.tally
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn feedback_mut(&mut self) -> &mut FeedbackChannel {
        &mut self.feedback
    }

    pub fn is_active(&self) -> bool {
        self.sampler.is_active()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.sampler.stop_handle()
    }

    /// Acquire the frame source and start the session clock
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.sampler.start()?;
        self.clock.resume();
        self.feedback.cue(Cue::CameraStarted);
        Ok(())
    }

    /// Release the frame source and freeze the session clock; idempotent
    pub fn stop(&mut self) {
        let was_running = self.clock.is_running();
        self.sampler.stop();
        self.clock.pause();
        if was_running {
            self.feedback.cue(Cue::CameraStopped);
            info!(
                score = self.session.core().score(),
                frames = self.tally.frames,
                "play loop stopped"
            );
        }
    }

    /// One capture → classify → apply round trip
    pub async fn step(&mut self) -> StepOutcome {
        if !self.sampler.is_active() {
            self.stop();
            return StepOutcome::Ended;
        }

        let frame = match self.sampler.capture() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.stop();
                return StepOutcome::Ended;
            }
            Err(e) => {
                warn!(code = e.code(), "{}", e);
                self.stop();
                return StepOutcome::Ended;
            }
        };

        let report = match timeout(self.request_timeout, self.recognizer.classify(&frame)).await {
            Ok(Ok(report)) => Some(report),
            Ok(Err(e)) => {
                warn!(code = e.code(), sequence = frame.sequence, "{}", e);
                None
            }
            Err(_) => {
                warn!(
                    code = "RECOGNITION_ERROR",
                    sequence = frame.sequence,
                    "recognizer timed out after {:?}",
                    self.request_timeout
                );
                None
            }
        };

        if !self.sampler.is_active() {
            debug!(sequence = frame.sequence, "discarding response that arrived after stop");
            self.stop();
            return StepOutcome::Discarded;
        }

        let event = report
            .map(|raw| self.normalizer.normalize(&raw))
            .unwrap_or_else(InteractionEvent::empty);
        let effects = self.apply(&event);
        StepOutcome::Applied { event, effects }
    }

    /// Apply an already normalized event at the current session time
    pub fn apply(&mut self, event: &InteractionEvent) -> Vec<SideEffect> {
        self.tally.record(event);
        let now = self.clock.now();
        let effects = self.session.apply_event(event, now);
        self.dispatch(&effects, now);
        effects
    }

    /// Route a player action to the session
    pub fn perform(&mut self, action: &PlayerAction) -> Result<Vec<SideEffect>, EngineError> {
        let now = self.clock.now();
        let effects = self.session.perform(action, now).map_err(|e| {
            warn!(code = e.code(), "{}", e);
            e
        })?;
        self.dispatch(&effects, now);
        Ok(effects)
    }

    fn dispatch(&mut self, effects: &[SideEffect], now: Millis) {
        if effects.is_empty() {
            return;
        }
        let context = ProgressContext {
            time_spent_secs: now / 1000,
            gestures_used: self.tally.to_value(),
        };
        for effect in effects {
            debug!(code = effect.code(), "side effect");
            self.feedback.dispatch(effect, &context, now);
        }
    }

    /// Poll at the frame interval until stopped, exhausted or `max_frames` steps ran
    ///
    /// `on_step` sees every outcome, including the final `Ended`/`Discarded`.
    pub async fn run<F>(&mut self, max_frames: Option<u64>, mut on_step: F) -> Result<u64, EngineError>
    where
        F: FnMut(&StepOutcome),
    {
        if !self.sampler.is_active() {
            self.start()?;
        }
        let mut ticker = interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut applied = 0u64;
        loop {
            if max_frames.map(|max| applied >= max).unwrap_or(false) {
                self.stop();
                break;
            }
            ticker.tick().await;
            let outcome = self.step().await;
            on_step(&outcome);
            match outcome {
                StepOutcome::Applied { .. } => applied += 1,
                StepOutcome::Discarded | StepOutcome::Ended => break,
            }
        }
        Ok(applied)
    }
}
