//! Records produced for the progress persistence service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::{GestureKind, InteractionEvent};

/// Per-kind count of gestures seen during a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureTally {
    pub counts: BTreeMap<GestureKind, u32>,
    pub frames: u32,
    pub frames_with_hands: u32,
}

impl GestureTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &InteractionEvent) {
        self.frames += 1;
        if event.has_hands() {
            self.frames_with_hands += 1;
        }
        for gesture in &event.gestures {
            *self.counts.entry(gesture.kind).or_insert(0) += 1;
        }
    }

    pub fn count(&self, kind: GestureKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// One scoring event as the persistence service expects it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: u32,
    pub game_id: u32,
    pub score: u32,
    /// Whole seconds of active play
    pub time_spent: u64,
    pub completed: bool,
    pub gestures_used: Value,
    pub game_specific_data: Option<Value>,
    /// Local bookkeeping; the service ignores unknown fields
    pub recorded_at: DateTime<Utc>,
}
