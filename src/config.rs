use std::time::Duration;

use tracing::debug;

use crate::error::ArchiveError;

/// multipart object stores reject parts smaller than this (except the last)
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

const DEFAULT_API_URL: &str = "https://api.twitter.com";
const DEFAULT_SECRET_VAR: &str = "TWEET_ARCHIVER_SECRET";
const DEFAULT_MEDIA_PREFIX: &str = "liked_media/";
const DEFAULT_CHUNK_SIZE_MB: usize = 8;

/// what counts as "the same platform" when looking at links
#[derive(Debug, Clone)]
pub struct Platform {
  /// hosts whose `/{user}/status/{id}` urls are tweets. `www.` and `mobile.`
  /// prefixes are accepted on top of these
  pub hosts: Vec<String>,
  /// display urls starting with one of these are attached media, not links
  pub photo_shortener_prefixes: Vec<String>,
  /// used to build a record's direct link
  pub status_base: String,
}

impl Default for Platform {
  fn default() -> Self {
    Self {
      hosts: vec!["twitter.com".to_string(), "x.com".to_string()],
      photo_shortener_prefixes: vec!["pic.twitter.com".to_string(), "pic.x.com".to_string()],
      status_base: "https://twitter.com".to_string(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct ArchiverConfig {
  pub bucket: String,
  /// secrets manager secret holding the api credential. when unset the
  /// secret is read from `token_secret_var` instead
  pub secret_arn: Option<String>,
  /// env var holding the api credential secret
  pub token_secret_var: String,
  pub api_url: String,
  /// namespace media objects are written under
  pub media_prefix: String,
  /// multipart chunk size in bytes, never below `MIN_PART_SIZE`
  pub chunk_size: usize,
  /// max linked tweets hydrated at once
  pub link_fanout: usize,
  /// max media transfers at once within a pass
  pub media_concurrency: usize,
  pub http_timeout: Duration,
  pub api_max_retries: u32,
  pub platform: Platform,
}

impl ArchiverConfig {
  pub fn new(bucket: impl Into<String>) -> Self {
    Self {
      bucket: bucket.into(),
      secret_arn: None,
      token_secret_var: DEFAULT_SECRET_VAR.to_string(),
      api_url: DEFAULT_API_URL.to_string(),
      media_prefix: DEFAULT_MEDIA_PREFIX.to_string(),
      chunk_size: DEFAULT_CHUNK_SIZE_MB * 1024 * 1024,
      link_fanout: 4,
      media_concurrency: 4,
      http_timeout: Duration::from_secs(30),
      api_max_retries: 3,
      platform: Platform::default(),
    }
  }

  /// build the config from the process environment
  pub fn from_env() -> Result<Self, ArchiveError> {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// same as `from_env()`, but reading variables through `lookup`
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ArchiveError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let bucket = lookup("TARGET_BUCKET")
      .filter(|b| !b.trim().is_empty())
      .ok_or_else(|| ArchiveError::Config("TARGET_BUCKET is not set".to_string()))?;
    let mut config = Self::new(bucket);

    config.secret_arn = lookup("SECRET_ARN").filter(|arn| !arn.trim().is_empty());
    if let Some(var) = lookup("TOKEN_SECRET_VAR") {
      config.token_secret_var = var;
    }
    if let Some(url) = lookup("API_URL") {
      config.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(prefix) = lookup("MEDIA_PREFIX") {
      config.media_prefix = prefix;
    }
    if let Some(mb) = parse_number::<usize>(&lookup, "CHUNK_SIZE_MB")? {
      config.chunk_size = mb.saturating_mul(1024 * 1024);
    }
    if let Some(fanout) = parse_number::<usize>(&lookup, "LINK_FANOUT")? {
      config.link_fanout = fanout.max(1);
    }
    if let Some(concurrency) = parse_number::<usize>(&lookup, "MEDIA_CONCURRENCY")? {
      config.media_concurrency = concurrency.max(1);
    }
    if let Some(secs) = parse_number::<u64>(&lookup, "HTTP_TIMEOUT_SECS")? {
      config.http_timeout = Duration::from_secs(secs);
    }
    if let Some(retries) = parse_number::<u32>(&lookup, "API_MAX_RETRIES")? {
      config.api_max_retries = retries;
    }
    if let Some(hosts) = lookup("PLATFORM_HOSTS") {
      config.platform.hosts = split_list(&hosts);
    }
    if let Some(prefixes) = lookup("PHOTO_SHORTENER_PREFIXES") {
      config.platform.photo_shortener_prefixes = split_list(&prefixes);
    }

    config.chunk_size = config.chunk_size.max(MIN_PART_SIZE);
    debug!(
      bucket = %config.bucket,
      media_prefix = %config.media_prefix,
      chunk_size = config.chunk_size,
      link_fanout = config.link_fanout,
      "loaded archiver config"
    );
    Ok(config)
  }
}

fn parse_number<T: std::str::FromStr>(
  lookup: &impl Fn(&str) -> Option<String>,
  name: &str,
) -> Result<Option<T>, ArchiveError> {
  match lookup(name) {
    Some(raw) => raw.trim().parse::<T>()
      .map(Some)
      .map_err(|_| ArchiveError::Config(format!("{} is not a valid number: {:?}", name, raw))),
    None => Ok(None),
  }
}

fn split_list(raw: &str) -> Vec<String> {
  raw.split(',')
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
    .collect()
}
