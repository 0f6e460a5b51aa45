//! Canonical interaction event produced once per processed frame

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point in normalized image space, both axes in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scale onto a logical canvas of the given size
    pub fn scaled(&self, width: f64, height: f64) -> Point {
        Point::new(self.x * width, self.y * height)
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// The shared gesture vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureKind {
    Drag,
    Pour,
    Rotate,
    Zoom,
    Draw,
}

impl GestureKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "drag" => Some(Self::Drag),
            "pour" => Some(Self::Pour),
            "rotate" => Some(Self::Rotate),
            "zoom" => Some(Self::Zoom),
            "draw" => Some(Self::Draw),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drag => "drag",
            Self::Pour => "pour",
            Self::Rotate => "rotate",
            Self::Zoom => "zoom",
            Self::Draw => "draw",
        }
    }
}

impl std::fmt::Display for GestureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tilt direction of a pour gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// One classified gesture with its kind-specific attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gesture {
    pub kind: GestureKind,
    /// Recognizer confidence, clamped to [0, 1]
    pub confidence: f64,
    /// Pour only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Zoom only, [0, 1] with 0.5 meaning "no change"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

impl Gesture {
    pub fn new(kind: GestureKind, confidence: f64) -> Self {
        Self {
            kind,
            confidence,
            direction: None,
            scale: None,
        }
    }

    pub fn pour(direction: Direction) -> Self {
        Self {
            direction: Some(direction),
            ..Self::new(GestureKind::Pour, 0.8)
        }
    }

    pub fn zoom(scale: f64) -> Self {
        Self {
            scale: Some(scale),
            ..Self::new(GestureKind::Zoom, 0.8)
        }
    }
}

/// Fingertip labels reported per hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "thumb" => Some(Self::Thumb),
            "index" => Some(Self::Index),
            "middle" => Some(Self::Middle),
            "ring" => Some(Self::Ring),
            "pinky" => Some(Self::Pinky),
            _ => None,
        }
    }
}

/// Labeled fingertip points of a single hand
pub type Fingertips = BTreeMap<Finger, Point>;

/// One normalized snapshot of detected-gesture state for a single frame
///
/// Invariants: `palm_centers.len() == hands_detected` and
/// `fingertips.len() <= hands_detected`. With no hands every sequence is empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub hands_detected: u32,
    pub gestures: Vec<Gesture>,
    pub palm_centers: Vec<Point>,
    pub fingertips: Vec<Fingertips>,
}

impl InteractionEvent {
    /// The "hand left frame" event
    pub fn empty() -> Self {
        Self::default()
    }

    /// Single-hand event with a palm and the given gestures
    pub fn hand(palm: Point, gestures: Vec<Gesture>) -> Self {
        Self {
            hands_detected: 1,
            gestures,
            palm_centers: vec![palm],
            fingertips: Vec::new(),
        }
    }

    /// Attach an index fingertip to the first hand
    pub fn with_index_tip(mut self, tip: Point) -> Self {
        if self.hands_detected == 0 {
            return self;
        }
        if self.fingertips.is_empty() {
            self.fingertips.push(Fingertips::new());
        }
        self.fingertips[0].insert(Finger::Index, tip);
        self
    }

    pub fn has_hands(&self) -> bool {
        self.hands_detected > 0
    }

    /// First gesture of the given kind (first match wins)
    pub fn first_of(&self, kind: GestureKind) -> Option<&Gesture> {
        self.gestures.iter().find(|g| g.kind == kind)
    }

    /// Palm of the first detected hand
    pub fn primary_palm(&self) -> Option<Point> {
        self.palm_centers.first().copied()
    }

    /// A labeled fingertip of the first hand that reported fingertips
    pub fn fingertip(&self, finger: Finger) -> Option<Point> {
        self.fingertips.first().and_then(|tips| tips.get(&finger).copied())
    }

    /// True when the event satisfies the hand-count invariants
    pub fn is_consistent(&self) -> bool {
        let counts_ok = self.palm_centers.len() == self.hands_detected as usize
            && self.fingertips.len() <= self.hands_detected as usize;
        let empty_ok = self.hands_detected > 0 || self.gestures.is_empty();
        counts_ok && empty_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_event_is_consistent() {
        let event = InteractionEvent::empty();
        assert!(event.is_consistent());
        assert!(!event.has_hands());
        assert!(event.primary_palm().is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let event = InteractionEvent::hand(
            Point::new(0.5, 0.5),
            vec![
                Gesture::pour(Direction::Left),
                Gesture::new(GestureKind::Drag, 0.9),
                Gesture::pour(Direction::Right),
            ],
        );
        assert_eq!(
            event.first_of(GestureKind::Pour).and_then(|g| g.direction),
            Some(Direction::Left)
        );
    }

    #[test]
    fn test_index_tip_ignored_without_hands() {
        let event = InteractionEvent::empty().with_index_tip(Point::new(0.1, 0.1));
        assert!(event.fingertips.is_empty());
        assert!(event.is_consistent());
    }

    #[test]
    fn test_scaled_point() {
        let p = Point::new(0.5, 0.25).scaled(800.0, 600.0);
        assert_eq!(p, Point::new(400.0, 150.0));
    }
}
