//! typed shapes of the v2 tweet lookup response. fields we ask for via
//! `tweet.fields`/`user.fields`/`media.fields` are still `Option` here, the
//! normalizer decides which absences are errors

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupResponse {
  #[serde(default)]
  pub data: Option<ApiTweet>,
  #[serde(default)]
  pub includes: Option<ApiIncludes>,
  /// partial errors. a missing tweet shows up here instead of in `data`
  #[serde(default)]
  pub errors: Vec<ApiProblem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiIncludes {
  #[serde(default)]
  pub users: Vec<ApiUser>,
  #[serde(default)]
  pub media: Vec<ApiMedia>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiProblem {
  #[serde(default)]
  pub title: Option<String>,
  #[serde(default)]
  pub detail: Option<String>,
  #[serde(default, rename = "type")]
  pub problem_type: Option<String>,
  #[serde(default)]
  pub resource_id: Option<String>,
}

impl ApiProblem {
  pub fn describe(&self) -> String {
    self.detail.clone()
      .or_else(|| self.title.clone())
      .unwrap_or_else(|| "no detail given".to_string())
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiTweet {
  pub id: String,
  pub text: String,
  #[serde(default)]
  pub author_id: Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
  /// absent entirely on tweets without urls, mentions, hashtags...
  #[serde(default)]
  pub entities: Option<ApiEntities>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEntities {
  #[serde(default)]
  pub urls: Option<Vec<ApiUrl>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiUrl {
  /// the t.co url as it appears in the text
  pub url: String,
  #[serde(default)]
  pub expanded_url: Option<String>,
  #[serde(default)]
  pub display_url: Option<String>,
  #[serde(default)]
  pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiUser {
  pub id: String,
  pub username: String,
  /// display name
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub protected: Option<bool>,
  #[serde(default)]
  pub verified: Option<bool>,
  #[serde(default)]
  pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiMedia {
  pub media_key: String,
  /// `photo` or `video` or `animated_gif`
  #[serde(rename = "type")]
  pub kind: String,
  /// only photos carry this
  #[serde(default)]
  pub url: Option<String>,
  #[serde(default)]
  pub alt_text: Option<String>,
  /// renditions of videos and gifs
  #[serde(default)]
  pub variants: Option<Vec<ApiVariant>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiVariant {
  pub content_type: String,
  pub url: String,
  #[serde(default)]
  pub bit_rate: Option<u64>,
}

/// a tweet plus everything the expansions pulled in with it
#[derive(Debug, Clone, Default)]
pub struct TweetBundle {
  pub tweet: ApiTweet,
  pub users: Vec<ApiUser>,
  pub media: Vec<ApiMedia>,
}

#[derive(Debug, Clone)]
pub enum TweetLookup {
  Found(TweetBundle),
  /// deleted, protected, suspended... carries the api's explanation
  NotFound(String),
}

impl LookupResponse {
  pub fn into_lookup(self, tweet_id: &str) -> TweetLookup {
    match self.data {
      Some(tweet) => {
        let includes = self.includes.unwrap_or_default();
        TweetLookup::Found(TweetBundle {
          tweet,
          users: includes.users,
          media: includes.media,
        })
      },
      None => {
        let reason = self.errors.iter()
          .find(|e| e.resource_id.as_deref() == Some(tweet_id))
          .or(self.errors.first())
          .map(|e| e.describe())
          .unwrap_or_else(|| format!("no data returned for tweet {}", tweet_id));
        TweetLookup::NotFound(reason)
      },
    }
  }
}
