use std::collections::HashSet;

use super::{
  media::resolve_media,
  url::{direct_link, is_photo_shortener},
};
use crate::{
  config::Platform,
  error::ArchiveError,
  fetch_types::{ApiUrl, ApiUser, TweetBundle},
  types::{AuthorRef, LinkRecord, TweetRecord, UserRef},
};

/// convert a looked-up tweet into its archival record. the author's profile
/// image archive key is left empty, it is only known after archival
pub fn normalize_tweet(bundle: &TweetBundle, platform: &Platform) -> Result<TweetRecord, ArchiveError> {
  let tweet = &bundle.tweet;

  let author_id = tweet.author_id.as_deref()
    .ok_or_else(|| ArchiveError::MissingField { tweet_id: tweet.id.clone(), field: "author_id" })?;
  let timestamp = tweet.created_at.clone()
    .ok_or_else(|| ArchiveError::MissingField { tweet_id: tweet.id.clone(), field: "created_at" })?;

  let author = find_author(author_id, &bundle.users)
    .ok_or_else(|| ArchiveError::MissingAuthor {
      tweet_id: tweet.id.clone(),
      author_id: author_id.to_string(),
    })?;

  // a tweet with no urls, hashtags, mentions... has no `entities` at all
  let external_links = match tweet.entities.as_ref().and_then(|e| e.urls.as_deref()) {
    Some(urls) => parse_links(urls, platform),
    None => Vec::new(),
  };

  Ok(TweetRecord {
    id: tweet.id.clone(),
    text: tweet.text.clone(),
    timestamp,
    direct_link: direct_link(platform, &author.username, &tweet.id),
    author: author_ref(author),
    media: resolve_media(&bundle.media, &tweet.id),
    external_links,
    mentions: mentions(author_id, &bundle.users),
  })
}

pub fn find_author<'a>(author_id: &str, users: &'a [ApiUser]) -> Option<&'a ApiUser> {
  users.iter().find(|u| u.id == author_id)
}

fn author_ref(user: &ApiUser) -> AuthorRef {
  AuthorRef {
    id: user.id.clone(),
    username: user.username.clone(),
    display_name: user.name.clone(),
    description: user.description.clone().unwrap_or_default(),
    protected: user.protected.unwrap_or(false),
    verified: user.verified.unwrap_or(false),
    profile_image_url: user.profile_image_url.clone(),
    profile_image_archive_key: String::new(),
  }
}

/// everyone included alongside the tweet except its author, once each
pub fn mentions(author_id: &str, users: &[ApiUser]) -> Vec<UserRef> {
  // only the author was included
  if users.len() < 2 {
    return Vec::new();
  }

  let mut seen: HashSet<&str> = HashSet::new();
  users.iter()
    .filter(|u| u.id != author_id)
    .filter(|u| seen.insert(u.id.as_str()))
    .map(|u| UserRef {
      user_id: u.id.clone(),
      username: u.username.clone(),
      protected: u.protected.unwrap_or(false),
      verified: u.verified.unwrap_or(false),
    })
    .collect()
}

/// url entities minus the ones that only stand for attached photos
pub fn parse_links(urls: &[ApiUrl], platform: &Platform) -> Vec<LinkRecord> {
  urls.iter()
    .filter_map(|url| {
      let display_url = url.display_url.clone().unwrap_or_else(|| url.url.clone());
      if is_photo_shortener(&display_url, platform) {
        return None;
      }
      Some(LinkRecord {
        display_url,
        expanded_url: url.expanded_url.clone().unwrap_or_else(|| url.url.clone()),
        title: url.title.clone().unwrap_or_default(),
      })
    })
    .collect()
}
