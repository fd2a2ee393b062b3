mod helpers;

use std::sync::Arc;

use db::models::attendance_record::Entity as RecordEntity;
use db::models::subject::Model as SubjectModel;
use db::test_utils::{setup_file_test_db, setup_test_db};
use helpers::{at, seed};
use sea_orm::EntityTrait;
use services::gate_access_service::TapOutcome;

#[tokio::test]
async fn token_is_stable_across_calls() {
    let fx = seed(setup_test_db().await).await;
    let gate = fx.gate();

    let first = gate.get_or_create_token(&fx.alice, at(2024, 5, 1, 7, 0)).await.unwrap();
    assert_eq!(first.session_id.len(), 43);
    assert!(first.qr_code.starts_with("data:image/png;base64,"));
    assert_eq!(first.expires_at, at(2025, 5, 1, 7, 0));

    for minute in 1..4 {
        let again = gate
            .get_or_create_token(&fx.alice, at(2024, 5, 1, 7, minute))
            .await
            .unwrap();
        assert_eq!(again.session_id, first.session_id);
        assert_eq!(again.token_id, first.token_id);
    }

    let other = gate.get_or_create_token(&fx.bob, at(2024, 5, 1, 7, 0)).await.unwrap();
    assert_ne!(other.session_id, first.session_id);
}

#[tokio::test]
async fn concurrent_first_calls_share_one_token() {
    let dir = tempfile::tempdir().unwrap();
    let fx = seed(setup_file_test_db(dir.path()).await).await;
    let gate = Arc::new(fx.gate());

    let now = at(2024, 5, 1, 7, 0);
    let (a, b) = tokio::join!(
        gate.get_or_create_token(&fx.alice, now),
        gate.get_or_create_token(&fx.alice, now),
    );
    assert_eq!(a.unwrap().session_id, b.unwrap().session_id);
}

/// Gate cycle across a working day and the following morning.
#[tokio::test]
async fn gate_cycle_follows_the_tap_window() {
    let fx = seed(setup_test_db().await).await;
    let gate = fx.gate();
    let token = gate.get_or_create_token(&fx.alice, at(2024, 5, 1, 7, 0)).await.unwrap();

    let steps = [
        (at(2024, 5, 1, 8, 0), TapOutcome::TapIn),
        (at(2024, 5, 1, 16, 0), TapOutcome::TapOut),
        (at(2024, 5, 1, 16, 5), TapOutcome::TapIn),
        (at(2024, 5, 2, 4, 0), TapOutcome::TapIn),
    ];
    for (when, expected) in steps {
        let result = gate.validate_at_gate(&token.session_id, when).await.unwrap();
        assert!(result.valid, "denied at {when}");
        assert_eq!(result.tap_outcome, expected, "at {when}");
        assert_eq!(result.subject_id, Some(fx.alice.id));
    }
}

#[tokio::test]
async fn window_elapsed_starts_a_new_cycle() {
    let fx = seed(setup_test_db().await).await;
    let gate = fx.gate();
    let token = gate.get_or_create_token(&fx.alice, at(2024, 5, 1, 6, 0)).await.unwrap();

    let first = gate.validate_at_gate(&token.session_id, at(2024, 5, 1, 6, 0)).await.unwrap();
    assert_eq!(first.tap_outcome, TapOutcome::TapIn);
    let late = gate.validate_at_gate(&token.session_id, at(2024, 5, 1, 18, 30)).await.unwrap();
    assert_eq!(late.tap_outcome, TapOutcome::TapIn);
    let out = gate.validate_at_gate(&token.session_id, at(2024, 5, 1, 19, 0)).await.unwrap();
    assert_eq!(out.tap_outcome, TapOutcome::TapOut);
}

#[tokio::test]
async fn unknown_or_inactive_tokens_are_denied() {
    let fx = seed(setup_test_db().await).await;
    let gate = fx.gate();

    let unknown = gate.validate_at_gate("no-such-token", at(2024, 5, 1, 8, 0)).await.unwrap();
    assert!(!unknown.valid);
    assert_eq!(unknown.tap_outcome, TapOutcome::Denied);

    let token = gate.get_or_create_token(&fx.bob, at(2024, 5, 1, 7, 0)).await.unwrap();
    SubjectModel::set_active(&fx.db, fx.bob.id, false).await.unwrap();
    let inactive = gate.validate_at_gate(&token.session_id, at(2024, 5, 1, 8, 0)).await.unwrap();
    assert_eq!(inactive.tap_outcome, TapOutcome::Denied);
    assert_eq!(inactive.subject_id, None);
}

#[tokio::test]
async fn gate_taps_open_and_close_the_campus_record() {
    let fx = seed(setup_test_db().await).await;
    let gate = fx.gate();
    let token = gate.get_or_create_token(&fx.alice, at(2024, 5, 1, 7, 0)).await.unwrap();

    gate.validate_at_gate(&token.session_id, at(2024, 5, 1, 8, 0)).await.unwrap();
    let records = RecordEntity::find().all(&fx.db).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].check_out_time.is_none());

    gate.validate_at_gate(&token.session_id, at(2024, 5, 1, 15, 0)).await.unwrap();
    let records = RecordEntity::find().all(&fx.db).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].check_out_time, Some(at(2024, 5, 1, 15, 0)));
}

/// Concurrent validators inside an open window: exactly one closes it.
#[tokio::test]
async fn concurrent_validators_observe_one_tap_out() {
    let dir = tempfile::tempdir().unwrap();
    let fx = seed(setup_file_test_db(dir.path()).await).await;
    let gate = Arc::new(fx.gate());
    let token = gate.get_or_create_token(&fx.alice, at(2024, 5, 1, 7, 0)).await.unwrap();

    for round in 0..3u32 {
        let tapped_in = at(2024, 5, 1, 8 + round * 2, 0);
        let opened = gate.validate_at_gate(&token.session_id, tapped_in).await.unwrap();
        assert_eq!(opened.tap_outcome, TapOutcome::TapIn);

        let now = at(2024, 5, 1, 9 + round * 2, 0);
        let (a, b) = tokio::join!(
            gate.validate_at_gate(&token.session_id, now),
            gate.validate_at_gate(&token.session_id, now),
        );
        let outcomes = [a.unwrap().tap_outcome, b.unwrap().tap_outcome];
        assert_eq!(
            outcomes.iter().filter(|o| **o == TapOutcome::TapOut).count(),
            1,
            "round {round}: {outcomes:?}"
        );

        // Leave the token tapped out before the next round.
        if outcomes.contains(&TapOutcome::TapIn) {
            let closed = gate
                .validate_at_gate(&token.session_id, at(2024, 5, 1, 9 + round * 2, 30))
                .await
                .unwrap();
            assert_eq!(closed.tap_outcome, TapOutcome::TapOut);
        }
    }
}
