use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use tracing::{debug, instrument, warn};

use crate::{
  config::ArchiverConfig,
  error::ArchiveError,
  fetch_types::{LookupResponse, TweetLookup},
};

/// expansions needed to get the author, mentioned users and attached media
pub const EXPANSIONS: &str = "author_id,entities.mentions.username,attachments.media_keys";
pub const TWEET_FIELDS: &str = "author_id,created_at,entities";
pub const USER_FIELDS: &str = "username,verified,protected,description,name,profile_image_url";
pub const MEDIA_FIELDS: &str = "alt_text,url,variants";

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(500);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(8);

/// the remote api tweets are hydrated from
#[async_trait]
pub trait SocialGraph: Send + Sync {
  /// look up one tweet with its author, mentioned users and media
  async fn get_tweet(&self, token: &str, tweet_id: &str) -> Result<TweetLookup, ArchiveError>;
}

/// v2 api over https
#[derive(Debug, Clone)]
pub struct HttpSocialGraph {
  client: reqwest::Client,
  api_url: String,
  max_retries: u32,
}

impl HttpSocialGraph {
  pub fn new(config: &ArchiverConfig) -> Result<Self, ArchiveError> {
    let client = reqwest::Client::builder()
      .gzip(true).deflate(true).brotli(true)
      .timeout(config.http_timeout)
      .user_agent(concat!("tweet-archiver/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self {
      client,
      api_url: config.api_url.trim_end_matches('/').to_string(),
      max_retries: config.api_max_retries,
    })
  }

  fn lookup_url(&self, tweet_id: &str) -> Result<Url, ArchiveError> {
    let url = format!("{}/2/tweets/{}", self.api_url, tweet_id);
    Url::parse_with_params(&url, &[
      ("expansions", EXPANSIONS),
      ("tweet.fields", TWEET_FIELDS),
      ("user.fields", USER_FIELDS),
      ("media.fields", MEDIA_FIELDS),
    ]).map_err(|e| ArchiveError::Config(format!("bad api url {}: {}", url, e)))
  }
}

#[async_trait]
impl SocialGraph for HttpSocialGraph {
  #[instrument(skip(self, token))]
  async fn get_tweet(&self, token: &str, tweet_id: &str) -> Result<TweetLookup, ArchiveError> {
    let url = self.lookup_url(tweet_id)?;
    let mut delay = INITIAL_RETRY_DELAY;
    let mut attempt: u32 = 0;

    loop {
      attempt += 1;
      debug!(attempt, "requesting tweet");
      let response = self.client.get(url.clone())
        .bearer_auth(token)
        .send().await?;
      let status = response.status();

      // rate limits and server hiccups are worth another go
      if (status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error())
        && attempt <= self.max_retries {
        warn!(attempt, status = status.as_u16(), delay_ms = delay.as_millis() as u64, "retrying tweet lookup");
        tokio::time::sleep(delay).await;
        delay = std::cmp::min(delay * 2, MAX_RETRY_DELAY);
        continue;
      }

      let bytes = response.bytes().await?;

      if status == StatusCode::NOT_FOUND {
        return Ok(TweetLookup::NotFound(format!("tweet {} not found", tweet_id)));
      }
      if !status.is_success() {
        let message = serde_json::from_slice::<LookupResponse>(&bytes).ok()
          .and_then(|r| r.errors.first().map(|e| e.describe()))
          .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
        return Err(ArchiveError::Api { status: status.as_u16(), message });
      }

      let parsed: LookupResponse = serde_json::from_slice(&bytes)?;
      return Ok(parsed.into_lookup(tweet_id));
    }
  }
}
