//! fakes for the archiver's collaborators

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;

use crate::{
  archiver::{FetchedMedia, MediaSource, MediaStream},
  error::{ArchiveError, MediaError},
  fetch::SocialGraph,
  fetch_types::{ApiEntities, ApiMedia, ApiTweet, ApiUrl, ApiUser, TweetBundle, TweetLookup},
};

/// size of the pieces `MemoryMediaSource::stream()` hands out
pub const STREAM_PIECE: usize = 1024 * 1024;

/// counts calls in progress and remembers the most seen at once
#[derive(Default)]
pub struct InFlight {
  now: AtomicUsize,
  peak: AtomicUsize,
}

impl InFlight {
  /// hold `delay` while counted as in flight
  async fn hold(&self, delay: Option<Duration>) {
    let now = self.now.fetch_add(1, Ordering::SeqCst) + 1;
    self.peak.fetch_max(now, Ordering::SeqCst);
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    self.now.fetch_sub(1, Ordering::SeqCst);
  }

  pub fn peak(&self) -> usize {
    self.peak.load(Ordering::SeqCst)
  }
}

#[derive(Default)]
pub struct MemoryMediaSource {
  bodies: Mutex<HashMap<String, Bytes>>,
  /// stream these urls up to n bytes, then fail
  fail_after: Mutex<HashMap<String, usize>>,
  requests: Mutex<Vec<String>>,
  delay: Option<Duration>,
  fetches: InFlight,
}

impl MemoryMediaSource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(self, url: &str, body: impl Into<Bytes>) -> Self {
    self.bodies.lock().insert(url.to_string(), body.into());
    self
  }

  pub fn failing_after(self, url: &str, bytes: usize) -> Self {
    self.fail_after.lock().insert(url.to_string(), bytes);
    self
  }

  /// every fetch takes `delay`
  pub fn delayed(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  pub fn requests(&self) -> Vec<String> {
    self.requests.lock().clone()
  }

  /// most `fetch()` calls seen running at once
  pub fn peak_fetches(&self) -> usize {
    self.fetches.peak()
  }

  fn body(&self, url: &str) -> Result<Bytes, MediaError> {
    self.requests.lock().push(url.to_string());
    self.bodies.lock().get(url).cloned()
      .ok_or_else(|| MediaError::SourceFetch { url: url.to_string(), message: "404".to_string() })
  }
}

#[async_trait]
impl MediaSource for MemoryMediaSource {
  async fn fetch(&self, url: &str) -> Result<FetchedMedia, MediaError> {
    self.fetches.hold(self.delay).await;
    Ok(FetchedMedia { content_type: None, body: self.body(url)? })
  }

  async fn stream(&self, url: &str) -> Result<MediaStream, MediaError> {
    let body = self.body(url)?;
    let fail_after = self.fail_after.lock().get(url).copied();

    let mut pieces: Vec<Result<Bytes, MediaError>> = Vec::new();
    let mut offset = 0;
    while offset < body.len() {
      if let Some(limit) = fail_after {
        if offset >= limit {
          break;
        }
      }
      let end = (offset + STREAM_PIECE).min(body.len());
      pieces.push(Ok(body.slice(offset..end)));
      offset = end;
    }
    if fail_after.is_some() {
      pieces.push(Err(MediaError::SourceFetch { url: url.to_string(), message: "connection reset".to_string() }));
    }
    Ok(MediaStream { content_type: None, body: stream::iter(pieces).boxed() })
  }
}

/// answers tweet lookups from a fixed table
#[derive(Default)]
pub struct ScriptedGraph {
  tweets: Mutex<HashMap<String, TweetLookup>>,
  requests: Mutex<Vec<String>>,
  delays: HashMap<String, Duration>,
  default_delay: Option<Duration>,
  lookups: InFlight,
}

impl ScriptedGraph {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(self, tweet_id: &str, lookup: TweetLookup) -> Self {
    self.tweets.lock().insert(tweet_id.to_string(), lookup);
    self
  }

  /// every lookup takes `delay`, unless set per tweet with `slow()`
  pub fn delayed(mut self, delay: Duration) -> Self {
    self.default_delay = Some(delay);
    self
  }

  pub fn slow(mut self, tweet_id: &str, delay: Duration) -> Self {
    self.delays.insert(tweet_id.to_string(), delay);
    self
  }

  /// most `get_tweet()` calls seen running at once
  pub fn peak_lookups(&self) -> usize {
    self.lookups.peak()
  }

  pub fn requests(&self) -> Vec<String> {
    let mut requests = self.requests.lock().clone();
    requests.sort();
    requests
  }
}

#[async_trait]
impl SocialGraph for ScriptedGraph {
  async fn get_tweet(&self, _token: &str, tweet_id: &str) -> Result<TweetLookup, ArchiveError> {
    self.requests.lock().push(tweet_id.to_string());
    let delay = self.delays.get(tweet_id).copied().or(self.default_delay);
    self.lookups.hold(delay).await;
    self.tweets.lock().get(tweet_id).cloned()
      .ok_or_else(|| ArchiveError::Api { status: 500, message: format!("no script for {}", tweet_id) })
  }
}

/* --------------------------------- builders --------------------------------- */

pub fn api_user(id: &str, username: &str) -> ApiUser {
  ApiUser {
    id: id.to_string(),
    username: username.to_string(),
    name: username.to_string(),
    description: None,
    protected: Some(false),
    verified: Some(false),
    profile_image_url: Some(format!("https://pbs.twimg.com/profile_images/{}/{}_normal.jpg", id, username)),
  }
}

pub fn api_photo(media_key: &str, url: &str) -> ApiMedia {
  ApiMedia {
    media_key: media_key.to_string(),
    kind: "photo".to_string(),
    url: Some(url.to_string()),
    alt_text: None,
    variants: None,
  }
}

pub fn api_link(expanded_url: &str) -> ApiUrl {
  let display = expanded_url.trim_start_matches("https://").to_string();
  ApiUrl {
    url: "https://t.co/abc".to_string(),
    expanded_url: Some(expanded_url.to_string()),
    display_url: Some(display),
    title: None,
  }
}

/// a found tweet by user 42, with the given links and media
pub fn found(tweet_id: &str, links: Vec<ApiUrl>, media: Vec<ApiMedia>) -> TweetLookup {
  let entities = if links.is_empty() {
    None
  } else {
    Some(ApiEntities { urls: Some(links) })
  };
  TweetLookup::Found(TweetBundle {
    tweet: ApiTweet {
      id: tweet_id.to_string(),
      text: format!("tweet {}", tweet_id),
      author_id: Some("42".to_string()),
      created_at: Some("2022-11-01T10:00:00.000Z".to_string()),
      entities,
    },
    users: vec![api_user("42", "someone")],
    media,
  })
}
