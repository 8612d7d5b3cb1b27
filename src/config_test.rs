use std::collections::HashMap;
use super::config::{ArchiverConfig, MIN_PART_SIZE};
use crate::error::ArchiveError;

fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
  let map: HashMap<String, String> = vars.iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
  move |name: &str| map.get(name).cloned()
}

#[test]
fn config_defaults() {
  let config = ArchiverConfig::from_lookup(lookup_from(&[("TARGET_BUCKET", "archive")])).unwrap();
  assert_eq!(config.bucket, "archive");
  assert_eq!(config.media_prefix, "liked_media/");
  assert_eq!(config.chunk_size, 8 * 1024 * 1024);
  assert_eq!(config.platform.hosts, vec!["twitter.com", "x.com"]);
  assert_eq!(config.secret_arn, None);
}

#[test]
fn config_requires_bucket() {
  let result = ArchiverConfig::from_lookup(lookup_from(&[]));
  assert!(matches!(result, Err(ArchiveError::Config(_))));
}

#[test]
fn config_chunk_size_never_below_floor() {
  let config = ArchiverConfig::from_lookup(lookup_from(&[
    ("TARGET_BUCKET", "archive"),
    ("CHUNK_SIZE_MB", "1"),
  ])).unwrap();
  assert_eq!(config.chunk_size, MIN_PART_SIZE);
}

#[test]
fn config_overrides() {
  let config = ArchiverConfig::from_lookup(lookup_from(&[
    ("TARGET_BUCKET", "archive"),
    ("API_URL", "http://localhost:9000/"),
    ("LINK_FANOUT", "2"),
    ("PLATFORM_HOSTS", "platform.example, other.example"),
  ])).unwrap();
  assert_eq!(config.api_url, "http://localhost:9000");
  assert_eq!(config.link_fanout, 2);
  assert_eq!(config.platform.hosts, vec!["platform.example", "other.example"]);
}

#[test]
fn config_rejects_bad_numbers() {
  let result = ArchiverConfig::from_lookup(lookup_from(&[
    ("TARGET_BUCKET", "archive"),
    ("MEDIA_CONCURRENCY", "lots"),
  ]));
  assert!(matches!(result, Err(ArchiveError::Config(_))));
}

#[test]
fn config_secret_arn() {
  let arn = "arn:aws:secretsmanager:us-east-1:123456789012:secret:tweet-token";
  let config = ArchiverConfig::from_lookup(lookup_from(&[
    ("TARGET_BUCKET", "archive"),
    ("SECRET_ARN", arn),
  ])).unwrap();
  assert_eq!(config.secret_arn.as_deref(), Some(arn));

  let blank = ArchiverConfig::from_lookup(lookup_from(&[
    ("TARGET_BUCKET", "archive"),
    ("SECRET_ARN", " "),
  ])).unwrap();
  assert_eq!(blank.secret_arn, None);
}
