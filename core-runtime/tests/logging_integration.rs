//! Integration tests for logging helpers and the process-wide subscriber

use bridge_traits::LogLevel;
use core_runtime::logging::{
    init_logging, redact_if_sensitive, redact_url, strip_path, LogFormat, LoggingConfig,
};

#[test]
fn test_pii_redaction_credentials() {
    assert_eq!(redact_if_sensitive("access_token", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "Bearer x"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("password", "hunter2"), "[REDACTED]");
}

#[test]
fn test_pii_redaction_emails() {
    let redacted = redact_if_sensitive("email", "user@example.com");

    assert!(redacted.starts_with('u'));
    assert!(redacted.contains("[REDACTED]"));
    assert!(!redacted.contains("example.com"));
}

#[test]
fn test_signed_download_urls_lose_their_query() {
    let url = "https://cdn.example.com/lessons/1.mp4?X-Amz-Signature=deadbeef";
    let redacted = redact_if_sensitive("source_url", url);

    assert_eq!(redacted, "https://cdn.example.com/lessons/1.mp4?[REDACTED]");
    assert_eq!(redact_url("https://cdn.example.com/"), "https://cdn.example.com/");
}

#[test]
fn test_normal_values_pass_through() {
    assert_eq!(redact_if_sensitive("asset_id", "lesson-1"), "lesson-1");
    assert_eq!(redact_if_sensitive("bytes", "1024"), "1024");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/data/offline-lessons/lessons/lesson-1.mp4"), "lesson-1.mp4");
    assert_eq!(strip_path("C:\\Users\\Ana\\lessons\\lesson-1.mp4"), "lesson-1.mp4");
    assert_eq!(strip_path("lesson-1.mp4"), "lesson-1.mp4");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_init_logging_once_per_process() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_spans(false);

    init_logging(config.clone()).expect("first initialization succeeds");
    tracing::debug!(asset_id = "lesson-1", "logging initialized");

    // A global subscriber is already installed
    assert!(init_logging(config).is_err());
}

#[test]
fn test_invalid_filter_is_rejected() {
    let config = LoggingConfig::default().with_filter("core_offline=notalevel[");
    assert!(init_logging(config).is_err());
}
