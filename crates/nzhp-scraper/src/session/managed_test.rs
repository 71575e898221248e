use std::sync::atomic::Ordering;
use std::time::Duration;

use super::*;
use crate::session::fake::FakeFactory;

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
        backoff_factor: 2.0,
    }
}

// ---------------------------------------------------------------------------
// creation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_use_creates_session() {
    let mut managed = ManagedSession::new(FakeFactory::new(), fast_policy(3), Duration::from_secs(1));
    assert!(!managed.is_open());
    managed.session().await.unwrap();
    assert!(managed.is_open());
    assert_eq!(managed.factory.created_count(), 1);
}

#[tokio::test]
async fn healthy_session_is_reused() {
    let mut managed = ManagedSession::new(FakeFactory::new(), fast_policy(3), Duration::from_secs(1));
    managed.session().await.unwrap();
    managed.session().await.unwrap();
    managed.session().await.unwrap();
    assert_eq!(managed.factory.created_count(), 1);
}

#[tokio::test]
async fn transient_creation_failures_are_retried() {
    let factory = FakeFactory::new().failing_creations(2);
    let mut managed = ManagedSession::new(factory, fast_policy(3), Duration::from_secs(1));
    managed.session().await.unwrap();
    assert_eq!(managed.factory.created_count(), 3);
}

#[tokio::test]
async fn creation_gives_up_after_policy_attempts() {
    let factory = FakeFactory::new().failing_creations(5);
    let mut managed = ManagedSession::new(factory, fast_policy(3), Duration::from_secs(1));
    let err = managed.session().await.err().unwrap();
    assert!(matches!(err, SessionError::Navigation { .. }));
    assert_eq!(managed.factory.created_count(), 3);
    assert!(!managed.is_open());
}

#[tokio::test]
async fn unsupported_environment_is_not_retried() {
    let mut managed =
        ManagedSession::new(FakeFactory::unsupported(), fast_policy(5), Duration::from_secs(1));
    let err = managed.session().await.err().unwrap();
    assert!(matches!(err, SessionError::UnsupportedEnvironment(_)));
    assert_eq!(managed.factory.created_count(), 1);
}

// ---------------------------------------------------------------------------
// health checks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dead_session_is_replaced() {
    let mut managed = ManagedSession::new(FakeFactory::new(), fast_policy(3), Duration::from_secs(1));
    managed
        .session()
        .await
        .unwrap()
        .dead
        .store(true, Ordering::SeqCst);

    let fresh = managed.session().await.unwrap();
    assert!(!fresh.dead.load(Ordering::SeqCst));
    assert_eq!(managed.factory.created_count(), 2);
}

#[tokio::test]
async fn closed_session_is_replaced() {
    let mut managed = ManagedSession::new(FakeFactory::new(), fast_policy(3), Duration::from_secs(1));
    managed.session().await.unwrap().close().await.unwrap();
    managed.session().await.unwrap();
    assert_eq!(managed.factory.created_count(), 2);
}

#[tokio::test]
async fn close_releases_session() {
    let mut managed = ManagedSession::new(FakeFactory::new(), fast_policy(3), Duration::from_secs(1));
    managed.session().await.unwrap();
    managed.close().await.unwrap();
    assert!(!managed.is_open());
    managed.close().await.unwrap();
}
