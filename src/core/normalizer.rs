//! Gesture normalizer: raw recognizer report → InteractionEvent
//!
//! The report is untrusted. Missing or malformed fields default to empty/zero,
//! unknown gesture types are skipped, and the surviving gestures keep their
//! original order (reducers pick the first match of a kind).

use serde_json::Value;

use crate::types::{
    Direction, EngineError, Finger, Fingertips, Gesture, GestureKind, InteractionEvent, Point,
};
use crate::{FRAME_HEIGHT, FRAME_WIDTH};

/// Pure mapping from recognizer payloads to canonical events
#[derive(Debug, Clone)]
pub struct GestureNormalizer {
    frame_width: f64,
    frame_height: f64,
}

impl Default for GestureNormalizer {
    fn default() -> Self {
        Self::new(FRAME_WIDTH, FRAME_HEIGHT)
    }
}

impl GestureNormalizer {
    /// Create a normalizer for frames of the given pixel geometry
    pub fn new(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width: frame_width.max(1) as f64,
            frame_height: frame_height.max(1) as f64,
        }
    }

    /// Parse and normalize a JSON report
    pub fn normalize_str(&self, text: &str) -> Result<InteractionEvent, EngineError> {
        let raw: Value = serde_json::from_str(text)
            .map_err(|e| EngineError::Recognition(format!("malformed report: {}", e)))?;
        Ok(self.normalize(&raw))
    }

    /// Normalize a decoded report
    pub fn normalize(&self, raw: &Value) -> InteractionEvent {
        let declared = raw
            .get("hands_detected")
            .and_then(as_count)
            .unwrap_or(0);

        let mut palms: Vec<Point> = array_field(raw, "palm_center")
            .iter()
            .filter_map(|v| self.point(v))
            .collect();

        let hands = declared.min(palms.len());
        if hands == 0 {
            return InteractionEvent::empty();
        }
        palms.truncate(hands);

        let gestures = array_field(raw, "gestures")
            .iter()
            .filter_map(gesture)
            .collect();

        let mut fingertips: Vec<Fingertips> = array_field(raw, "fingertip_positions")
            .iter()
            .map(|hand| self.fingertips(hand))
            .collect();
        fingertips.truncate(hands);

        InteractionEvent {
            hands_detected: hands as u32,
            gestures,
            palm_centers: palms,
            fingertips,
        }
    }

    /// Bring a coordinate pair into [0,1]×[0,1]
    ///
    /// Pairs with a component above 1 are taken as pixel coordinates of the
    /// source frame.
    fn point(&self, value: &Value) -> Option<Point> {
        let (x, y) = match value {
            Value::Array(items) if items.len() >= 2 => (items[0].as_f64()?, items[1].as_f64()?),
            Value::Object(map) => (map.get("x")?.as_f64()?, map.get("y")?.as_f64()?),
            _ => return None,
        };
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let (x, y) = if x > 1.0 || y > 1.0 {
            (x / self.frame_width, y / self.frame_height)
        } else {
            (x, y)
        };
        Some(Point::new(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)))
    }

    fn fingertips(&self, hand: &Value) -> Fingertips {
        let mut tips = Fingertips::new();
        if let Value::Object(map) = hand {
            for (label, value) in map {
                if let (Some(finger), Some(point)) = (Finger::parse(label), self.point(value)) {
                    tips.insert(finger, point);
                }
            }
        }
        tips
    }
}

fn array_field<'a>(raw: &'a Value, key: &str) -> &'a [Value] {
    raw.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn as_count(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return Some(n as usize);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && *f > 0.0)
        .map(|f| f.floor() as usize)
}

fn gesture(value: &Value) -> Option<Gesture> {
    let kind = GestureKind::parse(value.get("type")?.as_str()?)?;
    let confidence = value
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|c| c.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);
    let direction = value
        .get("direction")
        .and_then(Value::as_str)
        .and_then(Direction::parse);
    let scale = value
        .get("scale")
        .and_then(Value::as_f64)
        .filter(|s| s.is_finite())
        .map(|s| s.clamp(0.0, 1.0));

    Some(Gesture {
        kind,
        confidence,
        direction: if kind == GestureKind::Pour { direction } else { None },
        scale: if kind == GestureKind::Zoom { scale } else { None },
    })
}
