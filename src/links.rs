use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::{
  config::Platform,
  error::ArchiveError,
  pipeline::Archiver,
  tweets::url::status_id,
  types::{ArchivalOutcome, LinkRecord, PassKind, TweetRecord},
};

/// how many levels of links a primary pass follows
pub const LINK_DEPTH: u8 = 1;

/// ids of the tweets a record links to, in link order. repeats and links
/// back to the tweet itself are dropped
pub fn linked_tweet_ids(links: &[LinkRecord], self_id: &str, platform: &Platform) -> Vec<String> {
  let mut ids: Vec<String> = Vec::new();
  for link in links {
    let id = match status_id(&link.expanded_url, platform) {
      Some(id) => id,
      None => continue,
    };
    if id == self_id || ids.contains(&id) {
      continue;
    }
    ids.push(id);
  }
  ids
}

impl Archiver {
  /// hydrate every tweet `record` links to as a linked pass, at most
  /// `link_fanout` at once. outcomes come back in link order. a linked pass
  /// failing is logged and reported in its outcome, it never fails the
  /// pass that found the link
  pub(crate) async fn expand_links(&self, record: &TweetRecord, depth: u8) -> Vec<ArchivalOutcome> {
    let ids = linked_tweet_ids(&record.external_links, &record.id, self.platform());
    if ids.is_empty() {
      return Vec::new();
    }
    debug!(tweet_id = %record.id, linked = ids.len(), depth, "expanding links");

    let passes = ids.into_iter()
      .map(|id| self.linked_pass(&record.id, id, depth))
      .collect::<Vec<_>>();
    stream::iter(passes)
      .buffered(self.link_fanout())
      .collect()
      .await
  }

  async fn linked_pass(&self, parent_id: &str, tweet_id: String, depth: u8) -> ArchivalOutcome {
    match self.hydrate(&tweet_id, PassKind::Linked, depth).await {
      Ok(outcome) => outcome,
      Err(failure) => {
        let at = failure.at;
        let error = ArchiveError::LinkedExpansion { tweet_id: tweet_id.clone(), source: Box::new(failure.error) };
        warn!(tweet_id = parent_id, error = %error, "linked tweet not archived");
        ArchivalOutcome::failed(&tweet_id, PassKind::Linked, at, error.to_string())
      },
    }
  }
}
