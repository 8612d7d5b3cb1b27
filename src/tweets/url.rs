use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

use crate::config::Platform;

// "/{user}/status/{id}", optionally followed by e.g. "/photo/1"
static STATUS_PATH: Lazy<Option<Regex>> = Lazy::new(|| {
  Regex::new(r"^/(?:[A-Za-z0-9_]+|i(?:/web)?)/status(?:es)?/(\d+)(?:/.*)?$").ok()
});

/// if `url` points at a tweet on the platform, return the tweet id
pub fn status_id(url: &str, platform: &Platform) -> Option<String> {
  let parsed = Url::parse(url.trim()).ok()?;
  let host = parsed.host_str()?;
  let host = host.strip_prefix("www.")
    .or_else(|| host.strip_prefix("mobile."))
    .unwrap_or(host);
  if !platform.hosts.iter().any(|h| h.eq_ignore_ascii_case(host)) {
    return None;
  }
  status_id_from_path(parsed.path())
}

/// the id in a `/{user}/status/{id}` path, whatever the host
pub fn status_id_from_path(path: &str) -> Option<String> {
  let regex = STATUS_PATH.as_ref()?;
  regex.captures(path)
    .and_then(|c| c.get(1))
    .map(|m| m.as_str().to_string())
}

/// last path segment of a url with any query string or fragment dropped,
/// e.g. `https://video.twimg.com/vid/640x360/abc.mp4?tag=12` -> `abc.mp4`
pub fn filename(url: &str) -> String {
  if let Ok(parsed) = Url::parse(url) {
    if let Some(last) = parsed.path_segments().and_then(|s| s.filter(|s| !s.is_empty()).last()) {
      return last.to_string();
    }
  }
  // not an absolute url, do it by hand
  let without_query = url.split(|c| c == '?' || c == '#').next().unwrap_or(url);
  without_query.trim_end_matches('/')
    .rsplit('/')
    .next()
    .unwrap_or(without_query)
    .to_string()
}

/// `{base}/{username}/status/{id}`
pub fn direct_link(platform: &Platform, username: &str, tweet_id: &str) -> String {
  format!("{}/{}/status/{}", platform.status_base.trim_end_matches('/'), username, tweet_id)
}

/// display urls like `pic.twitter.com/AbC123` stand for attached media
pub fn is_photo_shortener(display_url: &str, platform: &Platform) -> bool {
  platform.photo_shortener_prefixes.iter().any(|p| display_url.starts_with(p.as_str()))
}
