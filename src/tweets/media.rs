use tracing::warn;

use super::url::filename;
use crate::{
  fetch_types::{ApiMedia, ApiVariant},
  types::{MediaKind, MediaRecord},
};

/// the only rendition format worth archiving
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// resolution tags looked for in rendition urls, in order of preference
const PREFERRED_RESOLUTIONS: [&str; 2] = ["640", "480"];

/// turn the included media of a tweet into records, one per item, keeping
/// the api's order. items with no usable url are dropped
pub fn resolve_media(media: &[ApiMedia], tweet_id: &str) -> Vec<MediaRecord> {
  media.iter()
    .filter_map(|item| {
      let record = resolve_item(item, tweet_id);
      if record.is_none() {
        warn!(tweet_id, media_key = %item.media_key, kind = %item.kind, "media item has no usable url, skipping");
      }
      record
    })
    .collect()
}

fn resolve_item(item: &ApiMedia, tweet_id: &str) -> Option<MediaRecord> {
  let kind = MediaKind::from_api(&item.kind)?;

  let source_url = match item.variants.as_deref() {
    Some(variants) if !variants.is_empty() => select_variant(variants)?.url.clone(),
    _ => item.url.clone()?,
  };

  Some(MediaRecord {
    media_key: item.media_key.clone(),
    kind,
    alt_text: item.alt_text.clone(),
    archive_key: archive_key(tweet_id, &source_url),
    source_url,
  })
}

/// pick one rendition of a video. a single rendition is taken as is.
/// otherwise, among the mp4 renditions the first whose url carries a 640 or
/// 480 resolution tag wins; failing that, the first rendition as listed
pub fn select_variant(variants: &[ApiVariant]) -> Option<&ApiVariant> {
  if variants.len() <= 1 {
    return variants.first();
  }

  // first match on either tag wins, even if a later rendition has the
  // higher-priority tag
  let tagged = variants.iter()
    .filter(|v| v.content_type == VIDEO_CONTENT_TYPE)
    .find(|v| PREFERRED_RESOLUTIONS.iter().any(|res| v.url.contains(res)));

  tagged.or_else(|| variants.first())
}

/// `{tweet_id}-{filename}`, the filename without any query string
pub fn archive_key(tweet_id: &str, source_url: &str) -> String {
  format!("{}-{}", tweet_id, filename(source_url))
}

/// `profile_images/{author_id}-{filename}`
pub fn profile_image_key(author_id: &str, profile_image_url: &str) -> String {
  format!("profile_images/{}-{}", author_id, filename(profile_image_url))
}
