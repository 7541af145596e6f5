//! Contract Test: Credential Validation
//!
//! Verifies that settings are validated at startup and whenever they change.
//!
//! Constraints verified:
//! - Invalid settings at startup disable polling and issue no request
//! - The violated rule is reported to the log sink
//! - Invalid edits while running clear the IP and stop polling
//! - A stale echo reply is ignored once updates are suspended

mod common;

use common::*;
use dyndns_core::{DnsSettings, MemorySettingsStore, ProviderId, UpdaterState};

#[tokio::test]
async fn invalid_settings_at_startup() {
    let cases = [
        (
            DnsSettings::new(ProviderId::DynDns, "-bad.com", "alice", "s3cret"),
            "domain",
        ),
        (
            DnsSettings::new(ProviderId::DynDns, "home.example.com", "bob", "s3cret"),
            "username",
        ),
        (
            DnsSettings::new(ProviderId::DynDns, "home.example.com", "alice", "abc"),
            "password",
        ),
        (
            DnsSettings::new(ProviderId::None, "home.example.com", "alice", "s3cret"),
            "service",
        ),
    ];

    for (settings, rule) in cases {
        let h = Harness::with_store(MemorySettingsStore::new(settings));
        let updater = h.updater().await;

        assert_eq!(updater.state(), UpdaterState::InvalidCredentials, "{}", rule);
        assert!(!updater.is_timer_active());
        assert_eq!(updater.pending_requests(), 0);

        let critical = h.log.critical();
        assert_eq!(critical.len(), 1);
        assert!(critical[0].contains(rule), "{:?} names {}", critical, rule);
    }
}

#[tokio::test]
async fn minimum_credential_length_is_accepted() {
    let h = Harness::with_store(MemorySettingsStore::new(DnsSettings::new(
        ProviderId::NoIp,
        "a.io",
        "abcd",
        "wxyz",
    )));
    let updater = h.updater().await;

    assert_eq!(updater.state(), UpdaterState::Ok);
    assert!(updater.is_timer_active());
}

#[tokio::test]
async fn invalid_edit_while_running() {
    let h = Harness::new();
    h.fetcher.push_echo_ip("203.0.113.9");
    h.fetcher.push_update("good");

    let mut updater = h.updater().await;
    drain(&mut updater).await;
    assert_eq!(updater.last_ip(), Some(ip("203.0.113.9")));

    h.store
        .set_settings(DnsSettings::new(
            ProviderId::DynDns,
            "home.example.com",
            "alice",
            "no",
        ))
        .await;
    updater.refresh_settings().await;

    assert_eq!(updater.state(), UpdaterState::InvalidCredentials);
    assert_eq!(updater.last_ip(), None);
    assert!(!updater.is_timer_active());
    assert!(h.log.critical()[0].contains("password"));
}

#[tokio::test]
async fn unchanged_settings_are_not_revalidated() {
    let h = Harness::with_store(MemorySettingsStore::new(DnsSettings::new(
        ProviderId::DynDns,
        "home.example.com",
        "bob",
        "s3cret",
    )));
    let mut updater = h.updater().await;
    assert_eq!(h.log.critical().len(), 1);

    updater.refresh_settings().await;
    updater.refresh_settings().await;
    assert_eq!(h.log.critical().len(), 1, "no repeated reports");
}

#[tokio::test]
async fn repair_from_startup_failure() {
    let h = Harness::with_store(MemorySettingsStore::new(DnsSettings::new(
        ProviderId::DynDns,
        "home.example.com",
        "bob",
        "s3cret",
    )));
    let mut updater = h.updater().await;
    assert_eq!(updater.state(), UpdaterState::InvalidCredentials);

    h.store.set_settings(valid_settings()).await;
    h.fetcher.push_echo_ip("203.0.113.9");
    h.fetcher.push_update("good");
    updater.refresh_settings().await;

    assert_eq!(updater.state(), UpdaterState::Ok);
    assert!(updater.is_timer_active());
    drain(&mut updater).await;
    assert_eq!(h.fetcher.update_urls().len(), 1);
}

#[tokio::test]
async fn echo_reply_ignored_after_suspension() {
    let h = Harness::new();
    h.fetcher.push_echo_ip("203.0.113.9");

    let mut updater = h.updater().await;
    assert_eq!(updater.pending_requests(), 1);

    // Settings become invalid while the echo request is in flight
    updater.apply_settings(DnsSettings::new(
        ProviderId::DynDns,
        "home.example.com",
        "x",
        "s3cret",
    ));
    drain(&mut updater).await;

    assert_eq!(h.fetcher.echo_count(), 1);
    assert!(h.fetcher.update_urls().is_empty());
    assert_eq!(updater.last_ip(), None);
}
