mod utils;

use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

use geoprogress::{
    config::ProgressConfig, identity::Identity, GameResultPayload, SyncPhase, WriteDiscipline,
};
use utils::{
    eventually, FailingDocumentStore, FailingWriteStore, FlakyWriteStore, RecordingDocumentStore,
    SlowDocumentStore, TestSetupBuilder,
};

fn ada() -> Identity {
    Identity::new("uid-ada")
        .with_display_name("Ada")
        .with_email("ada@example.com")
}

// ============================================================================
// Guest play
// ============================================================================

#[tokio::test]
async fn test_guest_capital_quiz_scenario() {
    let setup = TestSetupBuilder::new().build();

    let outcome = setup.controller.record_game_result(
        &GameResultPayload::new("capital-quiz", 520).with_answers(["1", "2"], ["3"]),
    );

    let profile = setup.controller.profile();
    assert_eq!(outcome.points_awarded, 563);
    assert_eq!(profile.loyalty_points, 563);
    assert_eq!(profile.tier, "Traveler");
    assert_eq!(profile.stats.games["capital-quiz"].plays, 1);
    assert!(profile.has_achievement("capital-quiz-500"));
    assert_eq!(profile.stats.by_region["Europe"].correct, 2);
    assert_eq!(profile.stats.by_region["Asia"].wrong, 1);

    // guest play never reaches the remote store
    assert_eq!(setup.documents.len().await, 0);
    assert!(setup.local.contains("guest_profile"));
}

#[tokio::test]
async fn test_guest_progress_survives_restart() {
    let setup = TestSetupBuilder::new().build();
    setup
        .controller
        .record_game_result(&GameResultPayload::new("flag-frenzy", 410));

    let restarted = TestSetupBuilder::new()
        .with_shared(setup.documents.clone(), setup.local.clone())
        .build();

    assert_eq!(restarted.controller.profile(), setup.controller.profile());
}

#[tokio::test]
async fn test_country_insights_need_two_attempts() {
    let setup = TestSetupBuilder::new().build();

    setup
        .controller
        .record_game_result(&GameResultPayload::new("map-dash", 10).with_answers(["12"], Vec::<String>::new()));
    let insights = setup.controller.insights();
    assert!(insights.country_strengths.is_empty());
    assert!(insights.country_weaknesses.is_empty());

    setup
        .controller
        .record_game_result(&GameResultPayload::new("map-dash", 10).with_answers(Vec::<String>::new(), ["12"]));
    let insights = setup.controller.insights();

    let strength = &insights.country_strengths[0];
    assert_eq!(strength.country_id, "12");
    assert_eq!(strength.score, 0.5);
    assert_eq!(insights.country_weaknesses[0].country_id, "12");
}

#[tokio::test]
async fn test_retried_submission_is_applied_once() {
    let setup = TestSetupBuilder::new().build();
    let payload = GameResultPayload::new("capital-quiz", 300)
        .with_answers(["1"], Vec::<String>::new())
        .with_event_id("round-77");

    let first = setup.controller.record_game_result(&payload);
    let retry = setup.controller.record_game_result(&payload);

    assert!(!first.duplicate);
    assert!(retry.duplicate);
    assert_eq!(retry.points_awarded, 0);
    let profile = setup.controller.profile();
    assert_eq!(profile.stats.games["capital-quiz"].plays, 1);
    assert_eq!(profile.loyalty_points, first.profile.loyalty_points);
}

#[tokio::test]
async fn test_concurrent_results_are_all_counted() {
    let setup = TestSetupBuilder::new().build();

    let tasks = (0..16).map(|round| {
        let controller = setup.controller.clone();
        tokio::spawn(async move {
            let game = if round % 2 == 0 { "map-dash" } else { "flag-frenzy" };
            controller.record_game_result(
                &GameResultPayload::new(game, 20)
                    .with_answers(["1"], ["3"])
                    .with_duration(30.0),
            );
        })
    });
    for joined in join_all(tasks).await {
        joined.unwrap();
    }

    let stats = setup.controller.profile().stats;
    assert_eq!(stats.total_plays(), 16);
    assert_eq!(stats.total_correct, 16);
    assert_eq!(
        stats.total_correct,
        stats.games.values().map(|g| g.total_correct).sum::<u64>()
    );
    assert_eq!(
        stats.total_time_seconds,
        stats.games.values().map(|g| g.total_time_seconds).sum::<u64>()
    );
}

// ============================================================================
// Sign-in and merge
// ============================================================================

#[tokio::test]
async fn test_new_identity_is_seeded_from_guest() {
    let setup = TestSetupBuilder::new()
        .with_guest_record(json!({ "loyaltyPoints": 300, "achievements": [] }))
        .build();

    let status = setup.controller.on_identity_changed(Some(ada()), false).await;

    assert_eq!(status.phase, SyncPhase::AuthenticatedActive);
    let profile = setup.controller.profile();
    assert_eq!(profile.id, "uid-ada");
    assert_eq!(profile.name, "Ada");
    assert_eq!(profile.loyalty_points, 300);
    assert_eq!(profile.tier, "Explorer");

    let stored = setup.remote_document("uid-ada").await.unwrap();
    assert_eq!(stored["loyaltyPoints"], 300);
    assert!(!setup.local.contains("guest_profile"));
}

#[tokio::test]
async fn test_stale_guest_merge_is_capped() {
    let setup = TestSetupBuilder::new()
        .with_remote_profile("uid-ada", json!({ "name": "Ada", "loyaltyPoints": 50 }))
        .with_guest_record(json!({ "loyaltyPoints": 20000 }))
        .build();

    setup.controller.on_identity_changed(Some(ada()), false).await;

    let profile = setup.controller.profile();
    assert_eq!(profile.loyalty_points, 10_050);
    assert_eq!(profile.tier, "Cartographer");
    assert_eq!(
        setup.remote_document("uid-ada").await.unwrap()["loyaltyPoints"],
        10_050
    );
    assert!(!setup.local.contains("guest_profile"));
}

#[tokio::test]
async fn test_merge_carries_guest_achievements_and_totals() {
    let setup = TestSetupBuilder::new()
        .with_remote_profile(
            "uid-ada",
            json!({
                "loyaltyPoints": 900,
                "stats": { "totalCorrect": 10, "totalWrong": 5, "totalTimeSeconds": 100 },
                "achievements": [{ "id": "first-game", "title": "First Steps" }]
            }),
        )
        .with_guest_record(json!({
            "loyaltyPoints": 40,
            "stats": { "totalCorrect": 3, "totalWrong": 1, "totalTimeSeconds": 90000 },
            "achievements": [
                { "id": "first-game", "title": "First Steps" },
                { "id": "flag-frenzy-400", "title": "Flag Fanatic" }
            ]
        }))
        .build();

    setup.controller.on_identity_changed(Some(ada()), false).await;

    let profile = setup.controller.profile();
    assert_eq!(profile.loyalty_points, 940);
    assert_eq!(profile.stats.total_correct, 13);
    assert_eq!(profile.stats.total_wrong, 6);
    assert_eq!(profile.stats.total_time_seconds, 36_100);
    let ids: Vec<_> = profile.achievements.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["first-game", "flag-frenzy-400"]);
}

#[tokio::test]
async fn test_remote_profile_is_clamped_on_load() {
    let setup = TestSetupBuilder::new()
        .with_remote_profile("uid-ada", json!({ "loyaltyPoints": 2_000_000, "tier": "Explorer" }))
        .build();

    setup.controller.on_identity_changed(Some(ada()), false).await;

    let profile = setup.controller.profile();
    assert_eq!(profile.loyalty_points, 150_000);
    assert_eq!(profile.tier, "Grandmaster");
}

#[tokio::test]
async fn test_second_sign_in_does_not_merge_again() {
    let setup = TestSetupBuilder::new()
        .with_guest_record(json!({ "loyaltyPoints": 300 }))
        .build();

    setup.controller.on_identity_changed(Some(ada()), false).await;
    setup.controller.on_identity_changed(None, false).await;
    setup.controller.on_identity_changed(Some(ada()), false).await;

    assert_eq!(setup.controller.phase(), SyncPhase::AuthenticatedActive);
    assert_eq!(setup.controller.profile().loyalty_points, 300);
}

#[tokio::test]
async fn test_sign_out_returns_to_guest_profile() {
    let setup = TestSetupBuilder::new()
        .with_guest_record(json!({ "loyaltyPoints": 700 }))
        .build();
    assert_eq!(setup.controller.profile().loyalty_points, 700);

    setup.controller.on_identity_changed(Some(ada()), false).await;
    let status = setup.controller.on_identity_changed(None, false).await;

    assert_eq!(status.phase, SyncPhase::GuestActive);
    assert!(status.identity_id.is_none());
    let profile = setup.controller.profile();
    assert!(profile.is_guest());
    // the guest record was consumed by the merge
    assert_eq!(profile.loyalty_points, 0);
}

#[tokio::test]
async fn test_new_profile_name_falls_back_to_email() {
    let setup = TestSetupBuilder::new().build();

    setup
        .controller
        .on_identity_changed(Some(Identity::new("uid-grace").with_email("grace@navy.mil")), false)
        .await;

    assert_eq!(setup.controller.profile().name, "grace");
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_failed_merge_keeps_guest_record_for_retry() {
    let setup = TestSetupBuilder::new()
        .with_remote_profile("uid-ada", json!({ "loyaltyPoints": 50 }))
        .with_guest_record(json!({ "loyaltyPoints": 500 }))
        .with_remote(|documents| Arc::new(FailingWriteStore::new(documents)))
        .build();

    let status = setup.controller.on_identity_changed(Some(ada()), false).await;

    assert_eq!(status.phase, SyncPhase::GuestActive);
    assert!(setup.controller.profile().is_guest());
    assert!(setup.local.contains("guest_profile"));
    assert_eq!(
        setup.remote_document("uid-ada").await.unwrap()["loyaltyPoints"],
        50
    );

    // a later sign-in with a healthy store completes the merge
    let retry = TestSetupBuilder::new()
        .with_shared(setup.documents.clone(), setup.local.clone())
        .build();
    retry.controller.on_identity_changed(Some(ada()), false).await;

    assert_eq!(retry.controller.profile().loyalty_points, 550);
    assert!(!retry.local.contains("guest_profile"));
}

#[tokio::test]
async fn test_unreachable_store_leaves_guest_usable() {
    let setup = TestSetupBuilder::new()
        .with_guest_record(json!({ "loyaltyPoints": 120 }))
        .with_remote(|_| Arc::new(FailingDocumentStore))
        .build();

    let status = setup.controller.on_identity_changed(Some(ada()), false).await;
    assert_eq!(status.phase, SyncPhase::GuestActive);

    setup
        .controller
        .record_game_result(&GameResultPayload::new("map-dash", 100));

    let profile = setup.controller.profile();
    assert!(profile.is_guest());
    assert_eq!(profile.loyalty_points, 230);
}

#[tokio::test]
async fn test_failsafe_releases_caller_and_late_sync_lands() {
    let config = ProgressConfig {
        failsafe_timeout: Duration::from_millis(50),
        ..ProgressConfig::default()
    };
    let setup = TestSetupBuilder::new()
        .with_remote_profile("uid-ada", json!({ "loyaltyPoints": 2600 }))
        .with_remote(|documents| {
            Arc::new(SlowDocumentStore::new(documents, Duration::from_millis(300)))
        })
        .with_config(config)
        .build();

    let started = Instant::now();
    let status = setup.controller.on_identity_changed(Some(ada()), false).await;

    assert!(started.elapsed() < Duration::from_millis(250));
    assert_eq!(status.phase, SyncPhase::GuestActive);
    assert!(setup.controller.profile().is_guest());

    let controller = setup.controller.clone();
    assert!(eventually(|| {
        let controller = controller.clone();
        async move { controller.phase() == SyncPhase::AuthenticatedActive }
    })
    .await);
    assert_eq!(setup.controller.profile().loyalty_points, 2600);
    assert_eq!(setup.controller.profile().tier, "Navigator");
}

#[tokio::test]
async fn test_guest_play_during_late_sync_is_kept() {
    let config = ProgressConfig {
        failsafe_timeout: Duration::from_millis(50),
        ..ProgressConfig::default()
    };
    let setup = TestSetupBuilder::new()
        .with_remote_profile("uid-ada", json!({ "loyaltyPoints": 100 }))
        .with_guest_record(json!({ "loyaltyPoints": 40 }))
        .with_remote(|documents| {
            Arc::new(RecordingDocumentStore::new(documents, Duration::from_millis(300)))
        })
        .with_config(config)
        .build();

    let status = setup.controller.on_identity_changed(Some(ada()), false).await;
    assert_eq!(status.phase, SyncPhase::GuestActive);

    // the merge write is still in flight while the guest keeps playing
    setup
        .controller
        .record_game_result(&GameResultPayload::new("map-dash", 900));
    assert_eq!(setup.controller.profile().loyalty_points, 950);
    assert!(setup.local.contains("guest_profile"));

    let controller = setup.controller.clone();
    assert!(eventually(|| {
        let controller = controller.clone();
        async move { controller.phase() == SyncPhase::AuthenticatedActive }
    })
    .await);

    let profile = setup.controller.profile();
    assert_eq!(profile.id, "uid-ada");
    assert_eq!(profile.loyalty_points, 1_050);
    assert!(profile.has_achievement("map-dash-800"));
    assert!(!setup.local.contains("guest_profile"));

    let documents = setup.documents.clone();
    assert!(eventually(|| {
        let documents = documents.clone();
        async move {
            documents
                .document("users", "uid-ada")
                .await
                .is_some_and(|doc| doc["loyaltyPoints"] == 1_050)
        }
    })
    .await);
}

#[tokio::test]
async fn test_late_sync_is_dropped_after_sign_out() {
    let config = ProgressConfig {
        failsafe_timeout: Duration::from_millis(30),
        ..ProgressConfig::default()
    };
    let setup = TestSetupBuilder::new()
        .with_remote_profile("uid-ada", json!({ "loyaltyPoints": 2600 }))
        .with_remote(|documents| {
            Arc::new(SlowDocumentStore::new(documents, Duration::from_millis(150)))
        })
        .with_config(config)
        .build();

    setup.controller.on_identity_changed(Some(ada()), false).await;
    setup.controller.on_identity_changed(None, false).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(setup.controller.phase(), SyncPhase::GuestActive);
    assert!(setup.controller.profile().is_guest());
    assert!(setup.controller.identity().is_none());
}

// ============================================================================
// Remote writes
// ============================================================================

#[tokio::test]
async fn test_authenticated_results_are_written_remotely() {
    let setup = TestSetupBuilder::new().build();
    setup.controller.on_identity_changed(Some(ada()), false).await;

    setup
        .controller
        .record_game_result(&GameResultPayload::new("map-dash", 820));
    let expected = setup.controller.profile().loyalty_points;

    let documents = setup.documents.clone();
    assert!(eventually(|| {
        let documents = documents.clone();
        async move {
            documents
                .document("users", "uid-ada")
                .await
                .is_some_and(|doc| doc["loyaltyPoints"] == expected)
        }
    })
    .await);

    let stored = setup.remote_document("uid-ada").await.unwrap();
    assert_eq!(stored["achievements"].as_array().unwrap().len(), 2);
    assert!(!setup.local.contains("guest_profile"));
}

#[tokio::test]
async fn test_failed_remote_write_keeps_local_state() {
    let setup = TestSetupBuilder::new()
        .with_remote(|documents| Arc::new(FlakyWriteStore::new(documents, 1)))
        .build();
    setup.controller.on_identity_changed(Some(ada()), false).await;
    assert_eq!(setup.controller.phase(), SyncPhase::AuthenticatedActive);

    setup
        .controller
        .record_game_result(&GameResultPayload::new("map-dash", 120));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let profile = setup.controller.profile();
    assert_eq!(profile.loyalty_points, 130);
    assert_eq!(setup.controller.phase(), SyncPhase::AuthenticatedActive);
    assert_eq!(
        setup.remote_document("uid-ada").await.unwrap()["loyaltyPoints"],
        0
    );
}

#[tokio::test]
async fn test_display_name_is_patched_remotely() {
    let setup = TestSetupBuilder::new().build();
    setup.controller.on_identity_changed(Some(ada()), false).await;

    setup.controller.update_display_name("Countess Lovelace");

    let documents = setup.documents.clone();
    assert!(eventually(|| {
        let documents = documents.clone();
        async move {
            documents
                .document("users", "uid-ada")
                .await
                .is_some_and(|doc| doc["name"] == "Countess Lovelace")
        }
    })
    .await);
}

#[tokio::test]
async fn test_serialized_writes_never_regress() {
    let config = ProgressConfig {
        write_discipline: WriteDiscipline::Serialized,
        ..ProgressConfig::default()
    };
    let recording = RecordingDocumentStore::new(Default::default(), Duration::from_millis(20));
    let setup = TestSetupBuilder::new()
        .with_shared(recording.inner.clone(), Arc::new(Default::default()))
        .with_remote({
            let recording = recording.clone();
            move |_| Arc::new(recording)
        })
        .with_config(config)
        .build();

    setup.controller.on_identity_changed(Some(ada()), false).await;
    for score in [100, 200, 300, 400, 500, 600] {
        setup
            .controller
            .record_game_result(&GameResultPayload::new("capital-quiz", score));
    }
    let expected = setup.controller.profile().loyalty_points;

    let recorded = recording.clone();
    assert!(eventually(|| {
        let recorded = recorded.clone();
        async move { recorded.completed_points().await.last() == Some(&expected) }
    })
    .await);

    let completed = recording.completed_points().await;
    assert!(completed.windows(2).all(|pair| pair[0] <= pair[1]));
    // initial document plus at most one write per result, fewer once coalesced
    assert!(completed.len() <= 7);
    assert_eq!(
        setup.remote_document("uid-ada").await.unwrap()["loyaltyPoints"],
        expected
    );
}

#[tokio::test]
async fn test_bulk_stats_import_rechecks_achievements() {
    let setup = TestSetupBuilder::new().build();
    let stats = geoprogress::profile::normalize_stats(&json!({
        "totalCorrect": 18,
        "totalWrong": 2,
        "games": { "map-dash": { "plays": 3, "totalCorrect": 18, "totalWrong": 2 } },
        "byRegion": { "Southern Europe": { "correct": 18, "wrong": 2 } }
    }));

    let profile = setup.controller.update_stats(stats);

    assert!(profile.has_achievement("first-game"));
    assert!(profile.has_achievement("region-master-southern-europe"));
    assert_eq!(profile.loyalty_points, 0);
}
