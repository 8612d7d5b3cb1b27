use std::sync::Arc;

use bytes::Bytes;
use futures::{
  future::BoxFuture,
  stream::{self, StreamExt},
  FutureExt,
};
use tracing::{debug, info, warn};

use crate::{
  archiver::{MediaArchiver, MediaSource},
  config::{ArchiverConfig, Platform},
  credentials::TokenProvider,
  error::ArchiveError,
  fetch::SocialGraph,
  fetch_types::TweetLookup,
  links::LINK_DEPTH,
  request::decode_request,
  store::ObjectStore,
  tweets::parsing::normalize_tweet,
  types::{ArchivalOutcome, MediaRecord, PassKind, PassState, SkipReason, TweetRecord},
};

/// a pass that ended in `PassState::Failed`
#[derive(Debug)]
pub struct PassFailure {
  pub tweet_id: String,
  pub pass: PassKind,
  /// the step that was running when the error hit
  pub at: PassState,
  pub error: ArchiveError,
}

impl PassFailure {
  pub fn into_outcome(self) -> ArchivalOutcome {
    ArchivalOutcome::failed(&self.tweet_id, self.pass, self.at, self.error.to_string())
  }
}

/// tracks where one hydration pass is
struct HydrationPass<'a> {
  tweet_id: &'a str,
  kind: PassKind,
  state: PassState,
}

impl<'a> HydrationPass<'a> {
  fn new(tweet_id: &'a str, kind: PassKind) -> Self {
    Self { tweet_id, kind, state: PassState::Fetching }
  }

  fn advance(&mut self, next: PassState) {
    debug!(tweet_id = self.tweet_id, pass = ?self.kind, from = ?self.state, to = ?next, "pass state");
    self.state = next;
  }

  fn fail(&self, error: ArchiveError) -> PassFailure {
    warn!(tweet_id = self.tweet_id, pass = ?self.kind, at = ?self.state, error = %error, "pass failed");
    PassFailure {
      tweet_id: self.tweet_id.to_string(),
      pass: self.kind,
      at: self.state,
      error,
    }
  }
}

/// runs hydration passes: fetch a tweet, normalize it, archive its media,
/// persist the record, then hydrate the tweets it links to
pub struct Archiver {
  graph: Arc<dyn SocialGraph>,
  tokens: Arc<dyn TokenProvider>,
  store: Arc<dyn ObjectStore>,
  media: MediaArchiver,
  platform: Platform,
  link_fanout: usize,
  media_concurrency: usize,
}

impl Archiver {
  pub fn new(
    config: &ArchiverConfig,
    graph: Arc<dyn SocialGraph>,
    tokens: Arc<dyn TokenProvider>,
    store: Arc<dyn ObjectStore>,
    source: Arc<dyn MediaSource>,
  ) -> Self {
    let media = MediaArchiver::new(store.clone(), source, config.media_prefix.clone(), config.chunk_size);
    Self {
      graph,
      tokens,
      store,
      media,
      platform: config.platform.clone(),
      link_fanout: config.link_fanout.max(1),
      media_concurrency: config.media_concurrency.max(1),
    }
  }

  pub fn platform(&self) -> &Platform {
    &self.platform
  }

  pub(crate) fn link_fanout(&self) -> usize {
    self.link_fanout
  }

  /// decode a trigger payload and archive the tweet it names
  pub async fn handle_request(&self, payload: &str) -> Result<ArchivalOutcome, ArchiveError> {
    let tweet_id = decode_request(payload)?;
    info!(tweet_id = %tweet_id, "archive requested");
    Ok(self.archive_tweet(&tweet_id).await)
  }

  /// run the primary pass for a tweet, and one level of linked tweets
  pub async fn archive_tweet(&self, tweet_id: &str) -> ArchivalOutcome {
    match self.hydrate(tweet_id, PassKind::Primary, LINK_DEPTH).await {
      Ok(outcome) => outcome,
      Err(failure) => failure.into_outcome(),
    }
  }

  /// one hydration pass. links are only expanded while `depth` is above
  /// zero, and linked passes get `depth - 1`
  pub fn hydrate<'a>(
    &'a self,
    tweet_id: &'a str,
    kind: PassKind,
    depth: u8,
  ) -> BoxFuture<'a, Result<ArchivalOutcome, PassFailure>> {
    async move {
      let mut pass = HydrationPass::new(tweet_id, kind);

      /* -------------------------------- fetch -------------------------------- */
      let token = self.tokens.get_token().await.map_err(|e| pass.fail(e))?;
      let bundle = match self.graph.get_tweet(&token, tweet_id).await {
        Ok(TweetLookup::Found(bundle)) => bundle,
        Ok(TweetLookup::NotFound(detail)) => {
          // deleted or locked away, nothing to archive
          info!(tweet_id, pass = ?kind, detail = %detail, "tweet unavailable, skipping");
          pass.advance(PassState::Done);
          return Ok(ArchivalOutcome::skipped(tweet_id, kind, SkipReason::Unavailable(detail)));
        },
        Err(e) => return Err(pass.fail(e)),
      };

      /* ------------------------------ normalize ------------------------------ */
      pass.advance(PassState::Normalizing);
      let record = normalize_tweet(&bundle, &self.platform).map_err(|e| pass.fail(e))?;

      /* ---------------------------- archive media ---------------------------- */
      pass.advance(PassState::ArchivingMedia);
      let (record, media_failures) = self.archive_media(record, kind).await;

      /* ------------------------------- persist ------------------------------- */
      pass.advance(PassState::Persisting);
      let record_key = kind.record_key(tweet_id);
      self.persist(&record, &record_key).await.map_err(|e| pass.fail(e))?;
      info!(tweet_id, key = %record_key, media = record.media.len(), media_failures, "tweet archived");

      let mut outcome = ArchivalOutcome::archived(tweet_id, kind, record_key, media_failures);

      /* ----------------------------- expand links ----------------------------- */
      if depth > 0 {
        pass.advance(PassState::ExpandingLinks);
        outcome.linked = self.expand_links(&record, depth - 1).await;
      }

      pass.advance(PassState::Done);
      Ok(outcome)
    }.boxed()
  }

  /// archive every media item, plus the author's profile image on primary
  /// passes. failures are counted and logged, they never fail the pass
  async fn archive_media(&self, record: TweetRecord, kind: PassKind) -> (TweetRecord, usize) {
    let transfers = record.media.iter()
      .map(|media| self.archive_one(&record.id, media))
      .collect::<Vec<_>>();
    let archived = stream::iter(transfers)
      .buffer_unordered(self.media_concurrency)
      .collect::<Vec<bool>>()
      .await;
    let failures = archived.iter().filter(|ok| !**ok).count();

    if kind != PassKind::Primary {
      return (record, failures);
    }
    let profile_image_url = match record.author.profile_image_url.clone() {
      Some(url) => url,
      None => return (record, failures),
    };
    match self.media.archive_profile_image(&record.author.id, &profile_image_url).await {
      Ok(key) => (record.with_profile_image_key(key), failures),
      Err(e) => {
        warn!(tweet_id = %record.id, author_id = %record.author.id, error = %e, "profile image not archived");
        (record, failures + 1)
      },
    }
  }

  /// false if the item could not be archived
  async fn archive_one(&self, tweet_id: &str, media: &MediaRecord) -> bool {
    match self.media.archive_media(media).await {
      Ok(_) => true,
      Err(e) => {
        warn!(tweet_id, media_key = %media.media_key, error = %e, "media not archived");
        false
      },
    }
  }

  async fn persist(&self, record: &TweetRecord, key: &str) -> Result<(), ArchiveError> {
    let body = serde_json::to_vec(record)?;
    self.store.put(key, Bytes::from(body), "application/json").await
      .map_err(|source| ArchiveError::Persist { key: key.to_string(), source })
  }
}
