use thiserror::Error;

/// errors that end a hydration pass
#[derive(Error, Debug)]
pub enum ArchiveError {
  /// the api token could not be retrieved or decoded
  #[error("credential unavailable: {0}")]
  CredentialUnavailable(String),

  /// the trigger payload did not decode to a tweet reference
  #[error("malformed request: {0}")]
  MalformedRequest(String),

  /// the tweet's author was not among the included users
  #[error("author {author_id} of tweet {tweet_id} missing from included users")]
  MissingAuthor { tweet_id: String, author_id: String },

  /// a field requested from the api was absent from the response
  #[error("tweet {tweet_id} is missing required field `{field}`")]
  MissingField { tweet_id: String, field: &'static str },

  /// the social graph api answered with a non-success status
  #[error("api error {status}: {message}")]
  Api { status: u16, message: String },

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// writing the tweet record itself failed
  #[error("failed to persist {key}: {source}")]
  Persist { key: String, source: StoreError },

  /// a linked tweet's pass failed; never escalated past the link expander
  #[error("linked tweet {tweet_id} failed: {source}")]
  LinkedExpansion { tweet_id: String, source: Box<ArchiveError> },

  #[error("configuration error: {0}")]
  Config(String),
}

/// errors scoped to a single media item. these never fail the pass
#[derive(Error, Debug)]
pub enum MediaError {
  /// reading the media url failed
  #[error("failed to fetch {url}: {message}")]
  SourceFetch { url: String, message: String },

  /// a put, part upload or completion call failed
  #[error("failed to store {key}: {source}")]
  StoreWrite { key: String, source: StoreError },

  /// aborting a multipart session failed after an earlier error
  #[error("failed to abort upload of {key}: {source}")]
  Abort { key: String, source: StoreError },
}

/// a failed object store call
#[derive(Error, Debug, Clone)]
#[error("{op} {key}: {message}")]
pub struct StoreError {
  /// the store operation, e.g. `put` or `upload_part`
  pub op: &'static str,
  pub key: String,
  pub message: String,
}

impl StoreError {
  pub fn new(op: &'static str, key: impl Into<String>, message: impl ToString) -> Self {
    Self {
      op,
      key: key.into(),
      message: message.to_string(),
    }
  }
}
