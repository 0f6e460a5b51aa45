//! Integration tests for the gesture normalizer
//!
//! Raw recognizer reports in, canonical events out

use gesture_quest::core::GestureNormalizer;
use gesture_quest::types::{Finger, GestureKind, InteractionEvent, Point};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_pixel_coordinates_are_normalized() {
    let raw = json!({
        "hands_detected": 1,
        "gestures": [{"type": "drag", "confidence": 0.9}],
        "palm_center": [[320, 240, 0]],
        "fingertip_positions": [{"index": {"x": 160, "y": 120}}]
    });

    let event = GestureNormalizer::new(640, 480).normalize(&raw);
    assert_eq!(event.palm_centers, vec![Point::new(0.5, 0.5)]);
    assert_eq!(event.fingertip(Finger::Index), Some(Point::new(0.25, 0.25)));
}

#[test]
fn test_declared_hands_capped_by_palms() {
    let raw = json!({
        "hands_detected": 2,
        "gestures": [{"type": "rotate", "confidence": 0.7}],
        "palm_center": [[0.4, 0.4]],
        "fingertip_positions": [{"index": [0.4, 0.3]}, {"index": [0.6, 0.3]}]
    });

    let event = GestureNormalizer::default().normalize(&raw);
    assert_eq!(event.hands_detected, 1);
    assert_eq!(event.fingertips.len(), 1);
    assert!(event.is_consistent());
}

#[test]
fn test_no_hands_means_nothing_else() {
    let raw = json!({
        "hands_detected": 0,
        "gestures": [{"type": "drag", "confidence": 0.9}],
        "palm_center": [[0.5, 0.5]]
    });

    let event = GestureNormalizer::default().normalize(&raw);
    assert_eq!(event, InteractionEvent::empty());
}

#[test]
fn test_garbage_report_is_empty_event() {
    let normalizer = GestureNormalizer::default();
    for raw in [json!(null), json!([]), json!("hands"), json!({"hands_detected": "two"})] {
        let event = normalizer.normalize(&raw);
        assert!(!event.has_hands(), "{}", raw);
        assert!(event.is_consistent());
    }
}

#[test]
fn test_malformed_text_is_recognition_error() {
    let err = GestureNormalizer::default()
        .normalize_str("{\"hands_detected\": 1,")
        .unwrap_err();
    assert_eq!(err.code(), "RECOGNITION_ERROR");
}

#[test]
fn test_pour_and_zoom_attributes() {
    let text = r#"{
        "hands_detected": 1,
        "gestures": [
            {"type": "pour", "confidence": 0.8, "direction": "right", "scale": 0.9},
            {"type": "zoom", "confidence": 0.8, "scale": 4.0, "direction": "left"}
        ],
        "palm_center": [[0.5, 0.5]]
    }"#;

    let event = GestureNormalizer::default().normalize_str(text).unwrap();
    let pour = event.first_of(GestureKind::Pour).unwrap();
    assert!(pour.direction.is_some());
    assert_eq!(pour.scale, None);

    let zoom = event.first_of(GestureKind::Zoom).unwrap();
    assert_eq!(zoom.scale, Some(1.0));
    assert_eq!(zoom.direction, None);
}
