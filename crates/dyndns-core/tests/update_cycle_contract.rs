//! Contract Test: Update Cycle
//!
//! Verifies the check → compare → update flow.
//!
//! Constraints verified:
//! - A missing or stale last check triggers an immediate check at startup
//! - A recent last check waits for the poll timer
//! - An unchanged IP produces no update request
//! - A changed IP produces exactly one update request with the new address
//! - Echo failures are retried by the next tick, not immediately
//! - Echo failures never replace or clear the known IP

mod common;

use chrono::Duration;
use common::*;
use dyndns_core::{CheckState, Severity, UpdaterState};

#[tokio::test]
async fn startup_without_history_checks_immediately() {
    let h = Harness::new();
    h.fetcher.push_echo_ip("203.0.113.9");
    h.fetcher.push_update("good 203.0.113.9");

    let mut updater = h.updater().await;
    assert_eq!(updater.pending_requests(), 1, "startup issues one echo request");
    assert_eq!(updater.last_check(), Some(start_time()));

    drain(&mut updater).await;

    assert_eq!(h.fetcher.echo_count(), 1);
    let updates = h.fetcher.update_urls();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].host_str(), Some("members.dyndns.org"));
    assert_eq!(updates[0].path(), "/nic/update");
    assert_eq!(updates[0].username(), "alice");
    assert_eq!(updates[0].password(), Some("s3cret"));
    assert_eq!(
        updates[0].query(),
        Some("hostname=home.example.com&myip=203.0.113.9")
    );

    assert_eq!(updater.state(), UpdaterState::Ok);
    assert_eq!(updater.last_ip(), Some(ip("203.0.113.9")));
    assert!(updater.is_timer_active());
    assert_eq!(
        h.log.messages(),
        vec![(
            "Your dynamic DNS was successfully updated.".to_string(),
            Severity::Info
        )]
    );
}

#[tokio::test]
async fn requests_carry_configured_user_agent() {
    let h = Harness::new();
    h.fetcher.push_echo_ip("203.0.113.9");
    h.fetcher.push_update("good");

    let mut updater = h.updater().await;
    drain(&mut updater).await;

    let expected = Harness::config().user_agent;
    assert!(expected.starts_with("dyndns/"));
    for request in h.fetcher.requests() {
        assert_eq!(request.user_agent, expected);
    }
}

#[tokio::test]
async fn recent_check_waits_for_timer() {
    let h = Harness::with_check_state(CheckState {
        last_check: Some(start_time() - Duration::minutes(5)),
        last_ip: Some(ip("203.0.113.9")),
    });

    let mut updater = h.updater().await;
    assert_eq!(updater.pending_requests(), 0, "recent check is not repeated");

    h.clock.advance(Duration::minutes(10));
    updater.poll_timers().await;
    assert_eq!(updater.pending_requests(), 0, "timer not yet due");

    h.advance_interval();
    h.fetcher.push_echo_ip("203.0.113.9");
    updater.poll_timers().await;
    assert_eq!(updater.pending_requests(), 1, "tick issues a check");

    drain(&mut updater).await;
    assert_eq!(h.fetcher.echo_count(), 1);
    assert!(h.fetcher.update_urls().is_empty(), "same IP, no update");
}

#[tokio::test]
async fn stale_check_runs_at_startup() {
    let h = Harness::with_check_state(CheckState {
        last_check: Some(start_time() - Duration::hours(2)),
        last_ip: Some(ip("203.0.113.9")),
    });

    let updater = h.updater().await;
    assert_eq!(updater.pending_requests(), 1);
}

#[tokio::test]
async fn unchanged_ip_does_not_update() {
    let h = Harness::with_check_state(CheckState {
        last_check: None,
        last_ip: Some(ip("198.51.100.7")),
    });
    h.fetcher.push_echo_ip("198.51.100.7");

    let mut updater = h.updater().await;
    drain(&mut updater).await;

    assert!(h.fetcher.update_urls().is_empty());
    assert_eq!(updater.last_ip(), Some(ip("198.51.100.7")));
    assert!(h.log.messages().is_empty());
}

#[tokio::test]
async fn changed_ip_is_submitted_on_next_tick() {
    let h = Harness::new();
    h.fetcher.push_echo_ip("203.0.113.9");
    h.fetcher.push_update("good");

    let mut updater = h.updater().await;
    drain(&mut updater).await;

    h.advance_interval();
    h.fetcher.push_echo_ip("2001:db8::42");
    h.fetcher.push_update("good");
    updater.poll_timers().await;
    drain(&mut updater).await;

    let updates = h.fetcher.update_urls();
    assert_eq!(updates.len(), 2);
    assert!(updates[1].query().unwrap().ends_with("myip=2001%3Adb8%3A%3A42"));
    assert_eq!(updater.last_ip(), Some(ip("2001:db8::42")));
}

#[tokio::test]
async fn echo_failures_leave_state_untouched() {
    let h = Harness::new();
    h.fetcher.push_echo(Err("connection refused".to_string()));

    let mut updater = h.updater().await;
    drain(&mut updater).await;

    h.advance_interval();
    h.fetcher.push_echo(Ok("<html><body>maintenance</body></html>".to_string()));
    updater.poll_timers().await;
    drain(&mut updater).await;

    h.advance_interval();
    h.fetcher.push_echo_ip("not-an-address");
    updater.poll_timers().await;
    drain(&mut updater).await;

    assert_eq!(h.fetcher.echo_count(), 3);
    assert!(h.fetcher.update_urls().is_empty());
    assert_eq!(updater.state(), UpdaterState::Ok);
    assert_eq!(updater.last_ip(), None);
    assert!(updater.is_timer_active());
    assert!(h.log.messages().is_empty(), "echo failures are diagnostics only");
}

#[tokio::test]
async fn echo_failures_keep_known_ip() {
    let h = Harness::with_check_state(CheckState {
        last_check: None,
        last_ip: Some(ip("198.51.100.7")),
    });
    h.fetcher.push_echo(Err("connection refused".to_string()));

    let mut updater = h.updater().await;
    drain(&mut updater).await;

    h.advance_interval();
    h.fetcher.push_echo(Ok("<html><body>maintenance</body></html>".to_string()));
    updater.poll_timers().await;
    drain(&mut updater).await;

    h.advance_interval();
    h.fetcher.push_echo_ip("999.1.1.1");
    updater.poll_timers().await;
    drain(&mut updater).await;

    assert_eq!(h.fetcher.echo_count(), 3);
    assert!(h.fetcher.update_urls().is_empty());
    assert_eq!(updater.state(), UpdaterState::Ok);
    assert_eq!(updater.last_ip(), Some(ip("198.51.100.7")));
    assert!(updater.is_timer_active());
}

#[tokio::test]
async fn update_transport_failure_keeps_new_ip() {
    let h = Harness::new();
    h.fetcher.push_echo_ip("203.0.113.9");
    h.fetcher.push_update_failure("timed out");

    let mut updater = h.updater().await;
    drain(&mut updater).await;

    assert_eq!(h.fetcher.update_urls().len(), 1);
    assert_eq!(updater.state(), UpdaterState::Ok);
    assert_eq!(updater.last_ip(), Some(ip("203.0.113.9")));
    assert!(h.log.messages().is_empty());
}
