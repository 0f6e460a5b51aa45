//! Integration tests for the five subject games
//!
//! Tests full event sequences through the GameSession capability

use gesture_quest::core::{ChallengePicker, GameRegistry, GameSession, PlayerAction};
use gesture_quest::games::{
    parts, BiologyGame, Block, Chemical, ChemistryGame, CodingChallenge, CodingGame, PhysicsGame,
    Region,
};
use gesture_quest::types::{
    Direction, Gesture, GestureKind, InteractionEvent, OutcomeKind, Phase, Point, SideEffect,
    Subject,
};
use gesture_quest::{CANVAS_HEIGHT, CANVAS_WIDTH, COOLDOWN_MS, TARGET_HIT_RADIUS};
use pretty_assertions::assert_eq;

fn drag_at(x: f64, y: f64) -> InteractionEvent {
    InteractionEvent::hand(Point::new(x, y), vec![Gesture::new(GestureKind::Drag, 0.9)])
}

fn palm_at(x: f64, y: f64) -> InteractionEvent {
    InteractionEvent::hand(Point::new(x, y), vec![])
}

fn scores(effects: &[SideEffect]) -> usize {
    effects.iter().filter(|e| e.is_score()).count()
}

// ============================================================================
// PHYSICS
// ============================================================================

#[test]
fn test_drag_ball_onto_target_scores_once() {
    let mut game = PhysicsGame::new(ChallengePicker::new(11));
    let target = game.target().unwrap().position;
    assert_eq!((target.x, target.y), (600.0, 300.0));

    let (sx, sy) = (100.0 / CANVAS_WIDTH, 100.0 / CANVAS_HEIGHT);
    let (tx, ty) = (target.x / CANVAS_WIDTH, target.y / CANVAS_HEIGHT);
    let steps = 50;

    let mut hit_at = Vec::new();
    let mut expected = None;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let event = drag_at(sx + (tx - sx) * t, sy + (ty - sy) * t);
        let palm = event.primary_palm().unwrap().scaled(CANVAS_WIDTH, CANVAS_HEIGHT);
        if expected.is_none() && palm.distance(&target) < TARGET_HIT_RADIUS {
            expected = Some(i);
        }

        let effects = game.apply_event(&event, i as u64 * 10);
        if effects
            .iter()
            .any(|e| e.outcome() == Some(OutcomeKind::TargetHit) && e.is_score())
        {
            hit_at.push(i);
        }
    }

    assert_eq!(hit_at, vec![expected.unwrap()]);
    assert_eq!(game.core().score(), 10);
    assert_eq!(game.core().phase(), Phase::Completed);
}

#[test]
fn test_next_round_after_cooldown() {
    let mut game = PhysicsGame::new(ChallengePicker::new(11));
    let target = game.target().unwrap().position;
    game.apply_event(&drag_at(100.0 / CANVAS_WIDTH, 100.0 / CANVAS_HEIGHT), 0);
    let effects = game.apply_event(&drag_at(target.x / CANVAS_WIDTH, target.y / CANVAS_HEIGHT), 100);
    assert_eq!(scores(&effects), 1);

    let effects = game.apply_event(&InteractionEvent::empty(), 100 + COOLDOWN_MS);
    assert!(effects.contains(&SideEffect::ChallengeStarted { round: 1 }));
    assert_eq!(game.core().round(), 1);
    assert_eq!(game.core().phase(), Phase::Idle);
    assert_eq!(game.core().score(), 10);
    assert!(game.grabbed().is_none());
}

// ============================================================================
// CHEMISTRY
// ============================================================================

#[test]
fn test_pour_moves_one_quantum_per_event() {
    let mut game = ChemistryGame::new(ChallengePicker::new(5));
    game.apply_event(&palm_at(0.1, 0.5), 0);
    game.perform(&PlayerAction::AddChemical { chemical: Chemical::Acid }, 10)
        .unwrap();
    assert_eq!(game.beakers()[0].volume, 50);

    let mut pour = palm_at(0.1, 0.5);
    pour.gestures.push(Gesture::pour(Direction::Right));

    game.apply_event(&pour, 100);
    assert_eq!(game.beakers()[0].volume, 30);
    assert_eq!(game.beakers()[1].volume, 20);
    assert_eq!(game.beakers()[1].chemical, Some(Chemical::Acid));

    game.apply_event(&pour, 200);
    assert_eq!(game.beakers()[0].volume, 10);
    assert_eq!(game.beakers()[1].volume, 40);

    let total: u32 = game.beakers().iter().map(|b| b.volume).sum();
    assert_eq!(total, 50);
    assert_eq!(game.core().score(), 0);
}

#[test]
fn test_pour_off_the_edge_is_ignored() {
    let mut game = ChemistryGame::new(ChallengePicker::new(5));
    game.apply_event(&palm_at(0.1, 0.5), 0);
    game.perform(&PlayerAction::AddChemical { chemical: Chemical::Water }, 10)
        .unwrap();

    let mut pour = palm_at(0.1, 0.5);
    pour.gestures.push(Gesture::pour(Direction::Left));
    let effects = game.apply_event(&pour, 100);

    assert!(effects.is_empty());
    assert_eq!(game.beakers()[0].volume, 50);
}

#[test]
fn test_base_into_water_warns() {
    let mut game = ChemistryGame::new(ChallengePicker::new(5));
    game.apply_event(&palm_at(0.5, 0.5), 0);
    game.perform(&PlayerAction::AddChemical { chemical: Chemical::Water }, 10)
        .unwrap();
    game.apply_event(&palm_at(0.1, 0.5), 20);
    game.perform(&PlayerAction::AddChemical { chemical: Chemical::Base }, 30)
        .unwrap();

    let mut pour = palm_at(0.1, 0.5);
    pour.gestures.push(Gesture::pour(Direction::Right));
    let effects = game.apply_event(&pour, 100);

    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].code(), "warning");
    assert_eq!(game.beakers()[1].chemical, Some(Chemical::Base));
    assert_eq!(game.core().score(), 0);
}

// ============================================================================
// CODING
// ============================================================================

fn three_block_game() -> CodingGame {
    CodingGame::with_challenges(
        ChallengePicker::new(2),
        vec![CodingChallenge {
            id: 7,
            title: "Zig".into(),
            solution: vec![Block::MoveForward, Block::TurnRight, Block::TurnLeft],
            palette: Block::PALETTE.to_vec(),
        }],
    )
}

fn append_all(game: &mut CodingGame, blocks: &[Block]) {
    for block in blocks {
        game.perform(&PlayerAction::AppendBlock { block: *block }, 0)
            .unwrap();
    }
}

#[test]
fn test_matching_program_completes() {
    let mut game = three_block_game();
    append_all(&mut game, &[Block::MoveForward, Block::TurnRight, Block::TurnLeft]);

    let effects = game.perform(&PlayerAction::RunProgram, 100).unwrap();
    assert_eq!(scores(&effects), 1);
    assert_eq!(game.core().score(), 25);
    assert_eq!(game.core().phase(), Phase::Completed);
}

#[test]
fn test_wrong_order_fails_without_reset() {
    let mut game = three_block_game();
    let attempt = [Block::MoveForward, Block::TurnLeft, Block::TurnRight];
    append_all(&mut game, &attempt);

    let effects = game.perform(&PlayerAction::RunProgram, 100).unwrap();
    assert_eq!(scores(&effects), 0);
    assert_eq!(effects[0].code(), "attempt_failed");
    assert_eq!(effects[0].outcome(), Some(OutcomeKind::ProgramRun));
    assert_eq!(serde_json::to_value(&effects[0]).unwrap()["outcome"], "program_run");
    assert_eq!(game.core().score(), 0);
    assert_eq!(game.core().phase(), Phase::FailedAttempt);
    assert_eq!(game.program(), &attempt);
}

#[test]
fn test_empty_program_is_rejected() {
    let mut game = three_block_game();
    let err = game.perform(&PlayerAction::RunProgram, 0).unwrap_err();
    assert_eq!(err.code(), "INVALID_CHALLENGE_STATE");
}

#[test]
fn test_palette_drag_adds_one_block_per_grab() {
    let mut game = three_block_game();
    // First palette slot spans x in [0, 100) px, y < 200 px
    let grab = drag_at(50.0 / CANVAS_WIDTH, 100.0 / CANVAS_HEIGHT);
    game.apply_event(&grab, 0);
    game.apply_event(&grab, 100);
    assert_eq!(game.program(), &[Block::MoveForward]);

    game.apply_event(&palm_at(0.5, 0.5), 200);
    game.apply_event(&grab, 300);
    assert_eq!(game.program(), &[Block::MoveForward, Block::MoveForward]);
}

// ============================================================================
// ALL SUBJECTS
// ============================================================================

#[test]
fn test_zero_hands_never_scores() {
    let registry = GameRegistry::default();
    for subject in Subject::ALL {
        let mut session = registry.create_seeded(subject, ChallengePicker::new(42));
        session.apply_event(&drag_at(0.3, 0.3), 0);
        let before = session.core().score();

        for i in 1..20 {
            let effects = session.apply_event(&InteractionEvent::empty(), i * 100);
            assert_eq!(scores(&effects), 0, "{}", subject);
        }
        assert_eq!(session.core().score(), before, "{}", subject);
        assert_eq!(session.core().phase(), Phase::Idle, "{}", subject);
    }
}

#[test]
fn test_repeated_palm_event_is_idempotent() {
    let registry = GameRegistry::default();
    let event = palm_at(0.6, 0.7);
    for subject in Subject::ALL {
        let mut once = registry.create_seeded(subject, ChallengePicker::new(8));
        let mut twice = registry.create_seeded(subject, ChallengePicker::new(8));

        once.apply_event(&event, 100);
        twice.apply_event(&event, 100);
        twice.apply_event(&event, 100);

        assert_eq!(once.current_state(), twice.current_state(), "{}", subject);
    }
}

#[test]
fn test_actions_for_other_subjects_are_rejected() {
    let registry = GameRegistry::default();
    let mut physics = registry.create_seeded(Subject::Physics, ChallengePicker::new(1));
    let err = physics.perform(&PlayerAction::RunProgram, 0).unwrap_err();
    assert_eq!(err.code(), "INVALID_CHALLENGE_STATE");
    assert_eq!(physics.core().score(), 0);
}

#[test]
fn test_biology_identify_first_target() {
    let registry = GameRegistry::default();
    let mut biology = registry.create_seeded(Subject::Biology, ChallengePicker::new(1));

    let wrong = biology
        .perform(&PlayerAction::SelectPart { part: "ribs".into() }, 0)
        .unwrap();
    assert_eq!(wrong[0].code(), "attempt_failed");

    let right = biology
        .perform(&PlayerAction::SelectPart { part: "skull".into() }, 100)
        .unwrap();
    assert_eq!(scores(&right), 1);
    assert_eq!(biology.core().score(), 5);
}

fn band_height(region: Region) -> f64 {
    match region {
        Region::Head => 0.1,
        Region::Torso => 0.45,
        Region::Limbs => 0.8,
    }
}

#[test]
fn test_biology_later_rounds_solvable_by_pointing() {
    let mut behind_first = 0;
    for seed in 0..32 {
        let mut game = BiologyGame::new(ChallengePicker::new(seed));
        let first = game.target().unwrap();
        game.perform(&PlayerAction::SelectPart { part: first.into() }, 0)
            .unwrap();
        let effects = game.apply_event(&InteractionEvent::empty(), COOLDOWN_MS);
        assert!(effects.contains(&SideEffect::ChallengeStarted { round: 1 }));

        let target = game.target().unwrap();
        let region = Region::of_part(target).unwrap();
        let leader = parts(game.organism(), game.system())
            .iter()
            .find(|p| Region::of_part(p) == Some(region))
            .copied();
        if leader != Some(target) {
            behind_first += 1;
        }

        let point = palm_at(0.5, 0.5).with_index_tip(Point::new(0.5, band_height(region)));
        game.apply_event(&point, COOLDOWN_MS + 100);
        let effects = game.perform(&PlayerAction::ConfirmRegion, COOLDOWN_MS + 200).unwrap();
        assert_eq!(scores(&effects), 1, "seed {} target {}", seed, target);
        assert_eq!(game.core().score(), 10, "seed {}", seed);
    }
    assert!(behind_first > 0);
}

#[test]
fn test_zero_hands_keeps_selection_and_entities() {
    let registry = GameRegistry::default();
    for subject in [Subject::Chemistry, Subject::Biology] {
        let mut session = registry.create_seeded(subject, ChallengePicker::new(3));
        let event = palm_at(0.5, 0.5).with_index_tip(Point::new(0.5, 0.1));
        session.apply_event(&event, 0);
        let before = session.current_state();
        assert!(before.selection.is_some(), "{}", subject);

        session.apply_event(&InteractionEvent::empty(), 100);
        let after = session.current_state();
        assert_eq!(after.selection, before.selection, "{}", subject);
        assert_eq!(after.entities, before.entities, "{}", subject);
    }
}
