//! Backoff, endpoint rotation and the terminal failed state, driven on paused time.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Outcome, RecordingHooks, ScriptedTransport, settle};
use pretty_assertions::assert_eq;
use skyhook_health::HealthRegistry;
use skyhook_stream::{ConnectionState, ConnectionSupervisor, StreamConfig, StreamError};
use tokio::time::Instant;

fn config(endpoints: &[&str]) -> StreamConfig {
    StreamConfig::new(endpoints.iter().copied())
        .with_reconnect_interval_ms(5_000)
        .with_backoff_factor(1.5)
        .with_max_reconnect_delay_ms(30_000)
}

#[tokio::test(start_paused = true)]
async fn two_endpoints_fail_over_once_then_give_up() {
    let registry = Arc::new(HealthRegistry::default());
    let (transport, _accepted) = ScriptedTransport::refusing();
    let config = config(&["ws://a", "ws://b"])
        .with_max_reconnect_attempts(2)
        .with_max_service_cycles(1);

    let supervisor = ConnectionSupervisor::new(
        &config,
        transport.clone(),
        RecordingHooks::new(),
        Arc::clone(&registry),
    )
    .unwrap();
    supervisor.start();

    let outcome = tokio::time::timeout(Duration::from_secs(60), supervisor.wait_until_stopped())
        .await
        .expect("supervisor should give up");
    assert!(matches!(
        outcome,
        Err(StreamError::EndpointsExhausted {
            endpoints: 2,
            cycles: 1
        })
    ));

    assert_eq!(
        transport.dialled(),
        vec!["ws://a", "ws://a", "ws://b", "ws://b", "ws://a", "ws://a"]
    );
    assert_eq!(
        transport.gaps(),
        vec![
            Duration::from_millis(5_000),
            Duration::ZERO,
            Duration::from_millis(5_000),
            Duration::ZERO,
            Duration::from_millis(5_000),
        ]
    );
    assert_eq!(supervisor.state(), ConnectionState::Failed);
    assert_eq!(supervisor.service_cycles(), 1);
    assert_eq!(supervisor.current_endpoint(), "ws://a");

    // Terminal: nothing else is dialled, however long we wait.
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(transport.attempt_count(), 6);

    supervisor.start();
    settle().await;
    assert_eq!(transport.attempt_count(), 6);
    assert_eq!(supervisor.state(), ConnectionState::Failed);
}

#[tokio::test(start_paused = true)]
async fn retry_delays_grow_geometrically() {
    let registry = Arc::new(HealthRegistry::default());
    let (transport, _accepted) = ScriptedTransport::refusing();
    let config = config(&["ws://only"])
        .with_max_reconnect_attempts(4)
        .with_max_service_cycles(0);

    let supervisor =
        ConnectionSupervisor::new(&config, transport.clone(), RecordingHooks::new(), registry)
            .unwrap();
    supervisor.start();
    let _ = supervisor.wait_until_stopped().await;

    assert_eq!(
        transport.gaps(),
        vec![
            Duration::from_millis(5_000),
            Duration::from_millis(7_500),
            Duration::from_millis(11_250),
        ]
    );
    assert_eq!(supervisor.state(), ConnectionState::Failed);
}

#[tokio::test(start_paused = true)]
async fn single_endpoint_rotates_onto_itself() {
    let registry = Arc::new(HealthRegistry::default());
    let (transport, _accepted) = ScriptedTransport::refusing();
    let config = config(&["ws://only"])
        .with_max_reconnect_attempts(1)
        .with_max_service_cycles(2);

    let supervisor =
        ConnectionSupervisor::new(&config, transport.clone(), RecordingHooks::new(), registry)
            .unwrap();
    supervisor.start();
    let _ = supervisor.wait_until_stopped().await;

    // Initial attempt plus one immediate retry per cycle.
    assert_eq!(transport.attempt_count(), 3);
    assert_eq!(transport.gaps(), vec![Duration::ZERO, Duration::ZERO]);
    assert_eq!(supervisor.service_cycles(), 2);
}

#[tokio::test(start_paused = true)]
async fn successful_open_resets_backoff() {
    let registry = Arc::new(HealthRegistry::default());
    let (transport, mut accepted) = ScriptedTransport::new([
        Outcome::Refuse,
        Outcome::Refuse,
        Outcome::Refuse,
        Outcome::Accept,
    ]);
    let config = config(&["ws://a"]).with_max_reconnect_attempts(5);

    let supervisor = ConnectionSupervisor::new(
        &config,
        transport.clone(),
        RecordingHooks::new(),
        Arc::clone(&registry),
    )
    .unwrap();
    let (_, attempts_metric) = supervisor.metric_names();
    supervisor.start();

    tokio::time::sleep(Duration::from_millis(12_600)).await;
    assert_eq!(supervisor.reconnect_attempts(), 3);
    assert!((registry.metric(&attempts_metric) - 3.0).abs() < f64::EPSILON);

    let remote = accepted.recv().await.unwrap();
    settle().await;
    assert_eq!(supervisor.state(), ConnectionState::Connected);
    assert_eq!(supervisor.reconnect_attempts(), 0);
    assert!(registry.metric(&attempts_metric).abs() < f64::EPSILON);

    let closed_at = Instant::now();
    remote.close(1001, "server restart").await;
    tokio::time::sleep(Duration::from_millis(4_000)).await;
    assert_eq!(supervisor.state(), ConnectionState::Disconnected);
    assert_eq!(supervisor.reconnect_attempts(), 1);

    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(
        transport.last_attempt_at().unwrap() - closed_at,
        Duration::from_millis(5_000)
    );
}

#[tokio::test(start_paused = true)]
async fn open_clears_service_cycles() {
    let registry = Arc::new(HealthRegistry::default());
    let (transport, mut accepted) =
        ScriptedTransport::new([Outcome::Refuse, Outcome::Refuse, Outcome::Accept]);
    let config = config(&["ws://a", "ws://b"])
        .with_max_reconnect_attempts(1)
        .with_max_service_cycles(3);

    let supervisor =
        ConnectionSupervisor::new(&config, transport.clone(), RecordingHooks::new(), registry)
            .unwrap();
    supervisor.start();

    let _remote = accepted.recv().await.unwrap();
    settle().await;
    // a -> b -> a wraps once before the third attempt succeeds.
    assert_eq!(transport.dialled(), vec!["ws://a", "ws://b", "ws://a"]);
    assert_eq!(supervisor.state(), ConnectionState::Connected);
    assert_eq!(supervisor.service_cycles(), 0);
    assert_eq!(supervisor.endpoint_index(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_state_is_observable_through_subscription() {
    let registry = Arc::new(HealthRegistry::default());
    let (transport, _accepted) = ScriptedTransport::refusing();
    let config = config(&["ws://a"])
        .with_max_reconnect_attempts(1)
        .with_max_service_cycles(0);

    let supervisor = ConnectionSupervisor::new(
        &config,
        transport,
        RecordingHooks::new(),
        Arc::clone(&registry),
    )
    .unwrap();
    let mut status = supervisor.subscribe();
    supervisor.start();

    let failed = status
        .wait_for(|status| status.state == ConnectionState::Failed)
        .await
        .unwrap()
        .clone();
    assert_eq!(failed.reconnect_attempts, 1);

    // Probe stays registered and reports unhealthy until close().
    let health = registry.status().await;
    assert!(!health.healthy);
    assert_eq!(health.checks.get(supervisor.probe_name()), Some(&false));

    supervisor.close().await;
    assert_eq!(supervisor.state(), ConnectionState::Failed);
    assert!(!registry.is_registered(supervisor.probe_name()));
}
