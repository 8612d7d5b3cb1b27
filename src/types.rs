use serde::{Deserialize, Serialize};

/// the archived form of one tweet. written to the store once per pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetRecord {
  /// id number of tweet (last part of url)
  pub id: String,
  /// the raw text of the tweet
  pub text: String,
  /// creation time, ISO-8601
  pub timestamp: String,
  /// `https://twitter.com/{username}/status/{id}`
  pub direct_link: String,
  pub author: AuthorRef,
  /// in the order the api returned them
  pub media: Vec<MediaRecord>,
  pub external_links: Vec<LinkRecord>,
  /// every included user except the author
  pub mentions: Vec<UserRef>,
}

impl TweetRecord {
  /// fill in where the author's profile image was archived to
  pub fn with_profile_image_key(mut self, key: String) -> Self {
    self.author.profile_image_archive_key = key;
    self
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorRef {
  pub id: String,
  pub username: String,
  pub display_name: String,
  pub description: String,
  pub protected: bool,
  pub verified: bool,
  pub profile_image_url: Option<String>,
  /// empty when archival was skipped or failed
  pub profile_image_archive_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
  pub user_id: String,
  pub username: String,
  pub protected: bool,
  pub verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
  Photo,
  Video,
  AnimatedGif,
}

impl MediaKind {
  /// map the api's `type` string. unknown kinds are not archived
  pub fn from_api(kind: &str) -> Option<Self> {
    match kind {
      "photo" => Some(MediaKind::Photo),
      "video" => Some(MediaKind::Video),
      "animated_gif" => Some(MediaKind::AnimatedGif),
      _ => None,
    }
  }

  /// videos and gifs go through multipart upload, photos through a single put
  pub fn is_streamed(&self) -> bool {
    !matches!(self, MediaKind::Photo)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
  pub media_key: String,
  #[serde(rename = "type")]
  pub kind: MediaKind,
  pub alt_text: Option<String>,
  /// the one rendition chosen for archival
  pub source_url: String,
  /// `{tweet_id}-{filename}`, relative to the media namespace
  pub archive_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
  pub display_url: String,
  pub expanded_url: String,
  /// empty string when the api gave no title
  pub title: String,
}

/* ------------------------------ pass outcome ------------------------------ */

/// whether a pass archives the tweet that was asked for, or one it linked to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
  Primary,
  Linked,
}

impl PassKind {
  /// object store key of the record written by a pass of this kind
  pub fn record_key(&self, tweet_id: &str) -> String {
    match self {
      PassKind::Primary => format!("primary/{}.json", tweet_id),
      PassKind::Linked => format!("linked/{}.json", tweet_id),
    }
  }
}

/// steps of a hydration pass, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassState {
  Fetching,
  Normalizing,
  ArchivingMedia,
  Persisting,
  ExpandingLinks,
  Done,
  Failed,
}

/// why a pass finished without archiving anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
  /// deleted, protected, suspended, or otherwise not visible to the caller
  Unavailable(String),
}

impl std::fmt::Display for SkipReason {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SkipReason::Unavailable(detail) => write!(f, "tweet unavailable: {}", detail),
    }
  }
}

/// result of one hydration pass. not persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivalOutcome {
  pub tweet_id: String,
  pub pass: PassKind,
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub skipped_reason: Option<SkipReason>,
  /// error that ended the pass
  #[serde(skip_serializing_if = "Option::is_none")]
  pub failure: Option<String>,
  /// step the pass was in when it failed
  #[serde(skip_serializing_if = "Option::is_none")]
  pub failed_at: Option<PassState>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub record_key: Option<String>,
  /// media items (including the profile image) that could not be archived
  pub media_failures: usize,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub linked: Vec<ArchivalOutcome>,
}

impl ArchivalOutcome {
  pub fn archived(tweet_id: &str, pass: PassKind, record_key: String, media_failures: usize) -> Self {
    Self {
      tweet_id: tweet_id.to_string(),
      pass,
      success: true,
      skipped_reason: None,
      failure: None,
      failed_at: None,
      record_key: Some(record_key),
      media_failures,
      linked: Vec::new(),
    }
  }

  pub fn skipped(tweet_id: &str, pass: PassKind, reason: SkipReason) -> Self {
    Self {
      tweet_id: tweet_id.to_string(),
      pass,
      success: false,
      skipped_reason: Some(reason),
      failure: None,
      failed_at: None,
      record_key: None,
      media_failures: 0,
      linked: Vec::new(),
    }
  }

  pub fn failed(tweet_id: &str, pass: PassKind, at: PassState, failure: String) -> Self {
    Self {
      tweet_id: tweet_id.to_string(),
      pass,
      success: false,
      skipped_reason: None,
      failure: Some(failure),
      failed_at: Some(at),
      record_key: None,
      media_failures: 0,
      linked: Vec::new(),
    }
  }
}
