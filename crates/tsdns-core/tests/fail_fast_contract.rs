//! Contract Test: Fail Fast, No Rollback
//!
//! Verifies the failure semantics of a run.
//!
//! Constraints verified:
//! - The first failing create/update/delete stops the run
//! - Changes applied before the failure stay applied and are reported
//! - No provider call is retried
//! - Roster, zone lookup and listing failures happen before any mutation

mod common;

use common::*;
use std::sync::atomic::Ordering;
use tsdns_core::traits::Peer;
use tsdns_core::{Error, RunError, SyncEngine, ZoneDescriptor};

fn three_peers() -> Vec<Peer> {
    vec![
        Peer::new("alpha", vec![ip("100.64.0.2")]),
        Peer::new("bravo", vec![ip("100.64.0.3")]),
        Peer::new("charlie", vec![ip("100.64.0.4")]),
    ]
}

#[tokio::test]
async fn create_failure_stops_remaining_creates() {
    // gateway, alpha, bravo, charlie -> fail on the 3rd create (bravo)
    let provider = RecordingProvider::new().failing_on_mutation(3);
    let engine = SyncEngine::new(
        Box::new(StaticPeerSource::new(roster(three_peers()))),
        Box::new(provider.clone()),
        config(),
    )
    .expect("engine construction succeeds");

    let err = engine.run().await.expect_err("run must fail");

    // Attempted: gateway, alpha, bravo. Never attempted: charlie.
    assert_eq!(provider.mutations().len(), 3);
    assert!(matches!(err, RunError::Apply(_)));

    let applied: Vec<&str> = err.applied().iter().map(|a| a.name()).collect();
    assert_eq!(
        applied,
        vec!["gateway.wg.example.com", "alpha.wg.example.com"]
    );

    // Nothing rolled back
    assert_eq!(provider.records().await.len(), 2);

    let msg = err.to_string();
    assert!(msg.contains("bravo.wg.example.com"), "error lacks context: {}", msg);
    assert!(msg.contains("100.64.0.3"), "error lacks context: {}", msg);
}

#[tokio::test]
async fn update_failure_is_fatal() {
    let provider = RecordingProvider::seeded(vec![a("7", "gateway.wg.example.com", "100.64.0.1")])
        .await
        .failing_on_mutation(1);
    let engine = SyncEngine::new(
        Box::new(StaticPeerSource::new(roster(three_peers()))),
        Box::new(provider.clone()),
        config(),
    )
    .unwrap();

    let err = engine.run().await.unwrap_err();

    assert!(err.applied().is_empty());
    assert_eq!(provider.mutations().len(), 1);
    assert!(err.to_string().contains("unable to update"));
}

#[tokio::test]
async fn prune_delete_failure_aborts_remaining_deletes() {
    let provider = RecordingProvider::seeded(vec![
        a("1", "old1.wg.example.com", "10.0.0.1"),
        a("2", "old2.wg.example.com", "10.0.0.2"),
        a("3", "old3.wg.example.com", "10.0.0.3"),
    ])
    .await
    // 1st mutation: gateway create; 2nd: delete old1; 3rd: delete old2
    .failing_on_mutation(3);
    let engine = SyncEngine::new(
        Box::new(StaticPeerSource::new(roster(vec![]))),
        Box::new(provider.clone()),
        config().with_remove_orphans(true),
    )
    .unwrap();

    let err = engine.run().await.unwrap_err();

    let verbs: Vec<&str> = err.applied().iter().map(|a| a.verb()).collect();
    assert_eq!(verbs, vec!["created", "removed"]);
    assert_eq!(provider.mutations().len(), 3);

    let left: Vec<String> = provider.records().await.into_iter().map(|r| r.name).collect();
    assert!(left.contains(&"old2.wg.example.com".to_string()));
    assert!(left.contains(&"old3.wg.example.com".to_string()));
}

#[tokio::test]
async fn remove_all_delete_failure_is_fatal() {
    let provider = RecordingProvider::seeded(vec![
        a("1", "a.wg.example.com", "10.0.0.1"),
        a("2", "b.wg.example.com", "10.0.0.2"),
    ])
    .await
    .failing_on_mutation(1);
    let engine = SyncEngine::new(
        Box::new(StaticPeerSource::new(roster(vec![]))),
        Box::new(provider.clone()),
        config().with_remove_all(true),
    )
    .unwrap();

    let err = engine.run().await.unwrap_err();

    assert_eq!(provider.mutations(), vec![Call::Delete("1".to_string())]);
    assert!(err.to_string().contains("a.wg.example.com"));
    assert_eq!(provider.records().await.len(), 2);
}

#[tokio::test]
async fn roster_failure_happens_before_any_provider_call() {
    let provider = RecordingProvider::new();
    let engine = SyncEngine::new(
        Box::new(StaticPeerSource::unavailable()),
        Box::new(provider.clone()),
        config(),
    )
    .unwrap();

    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, RunError::Setup(Error::PeerSource(_))));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn unknown_zone_aborts_before_mutation() {
    let provider = RecordingProvider::new();
    let source = StaticPeerSource::new(roster(three_peers()));
    let reads = source.reads();
    let engine = SyncEngine::new(
        Box::new(source),
        Box::new(provider.clone()),
        tsdns_core::SyncConfig::new(ZoneDescriptor::new("other.org")),
    )
    .unwrap();

    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, RunError::Setup(Error::NotFound(_))));
    assert!(err.to_string().contains("other.org"));
    assert_eq!(reads.load(Ordering::SeqCst), 1);
    assert!(provider.mutations().is_empty());
}

#[tokio::test]
async fn listing_failure_aborts_before_mutation() {
    let provider = RecordingProvider::new().failing_listing();
    let engine = SyncEngine::new(
        Box::new(StaticPeerSource::new(roster(three_peers()))),
        Box::new(provider.clone()),
        config(),
    )
    .unwrap();

    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, RunError::Setup(Error::Provider { .. })));
    assert!(err.applied().is_empty());
    assert_eq!(
        provider.calls(),
        vec![
            Call::ZoneId(ZONE.to_string()),
            Call::List(ZONE_ID.to_string())
        ]
    );
}

#[tokio::test]
async fn invalid_config_is_rejected_at_construction() {
    let result = SyncEngine::new(
        Box::new(StaticPeerSource::new(roster(vec![]))),
        Box::new(RecordingProvider::new()),
        tsdns_core::SyncConfig::new(ZoneDescriptor::new("")),
    );

    assert!(matches!(result, Err(Error::Config(_))));
}
