//! Configuration parsing and validation tests.

use std::time::Duration;

use driftframe::config::Configuration;

fn parse(yaml: &str) -> Configuration {
    serde_yaml::from_str(yaml).expect("valid configuration yaml")
}

#[test]
fn minimal_config_applies_defaults() {
    let cfg = parse(
        r#"
library-path: /var/lib/driftframe/media
remote:
  base-url: "https://frames.example.com"
  folder: "Showcase"
"#,
    )
    .validated()
    .expect("valid configuration");

    assert_eq!(cfg.sync_interval, Duration::from_secs(300));
    assert_eq!(cfg.simulated_video_duration, Duration::from_secs(30));
    assert!(cfg.remote.token.is_none());
}

#[test]
fn durations_accept_humantime_strings() {
    let cfg = parse(
        r#"
library-path: /tmp/media
remote:
  base-url: "http://localhost:8090"
  token: "secret"
  folder: "Showcase"
sync-interval: 90s
simulated-video-duration: 2m
"#,
    );

    assert_eq!(cfg.sync_interval, Duration::from_secs(90));
    assert_eq!(cfg.simulated_video_duration, Duration::from_secs(120));
    assert_eq!(cfg.remote.token.as_deref(), Some("secret"));
}

#[test]
fn unknown_keys_are_rejected() {
    let err = serde_yaml::from_str::<Configuration>(
        r#"
library-path: /tmp/media
media-path: /tmp/media
remote:
  base-url: "http://localhost:8090"
  folder: "Showcase"
"#,
    );
    assert!(err.is_err(), "unknown top-level key should be rejected");
}

#[test]
fn zero_sync_interval_fails_validation() {
    let err = parse(
        r#"
library-path: /tmp/media
remote:
  base-url: "http://localhost:8090"
  folder: "Showcase"
sync-interval: 0s
"#,
    )
    .validated();

    let message = format!("{:#}", err.expect_err("zero interval must be rejected"));
    assert!(message.contains("sync-interval"), "unexpected error: {message}");
}

#[test]
fn blank_remote_folder_fails_validation() {
    let err = parse(
        r#"
library-path: /tmp/media
remote:
  base-url: "http://localhost:8090"
  folder: "  "
"#,
    )
    .validated();

    assert!(err.is_err(), "blank folder name must be rejected");
}
