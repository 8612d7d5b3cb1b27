use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Url;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{error::ArchiveError, tweets::url::{filename, status_id_from_path}};

/// work out which tweet a trigger payload asks for. the payload is the
/// request body, or an envelope whose `body` field holds it. bodies are
/// tried as raw json, then base64 json, then json encoded twice. a payload
/// that is none of those may still be a bare tweet id or status url
pub fn decode_request(payload: &str) -> Result<String, ArchiveError> {
  match decode_body(payload) {
    Some(body) => tweet_id_from_body(&body),
    None => tweet_id_from_reference(payload).ok_or_else(|| {
      ArchiveError::MalformedRequest("payload is not a tweet reference or a json object in any known encoding".to_string())
    }),
  }
}

fn decode_body(raw: &str) -> Option<Map<String, Value>> {
  let raw = raw.trim();

  if let Ok(Value::Object(body)) = serde_json::from_str::<Value>(raw) {
    debug!("request body is raw json");
    return unwrap_envelope(body);
  }

  if let Ok(decoded) = STANDARD.decode(raw) {
    if let Ok(Value::Object(body)) = serde_json::from_slice::<Value>(&decoded) {
      debug!("request body is base64 json");
      return unwrap_envelope(body);
    }
  }

  if let Ok(Value::String(inner)) = serde_json::from_str::<Value>(raw) {
    if let Ok(Value::Object(body)) = serde_json::from_str::<Value>(&inner) {
      debug!("request body is double-encoded json");
      return unwrap_envelope(body);
    }
  }

  None
}

fn unwrap_envelope(object: Map<String, Value>) -> Option<Map<String, Value>> {
  if object.contains_key("tweet_link") || object.contains_key("tweet_id") {
    return Some(object);
  }
  match object.get("body") {
    Some(Value::Object(inner)) => unwrap_envelope(inner.clone()),
    Some(Value::String(inner)) => decode_body(inner),
    _ => Some(object),
  }
}

fn tweet_id_from_body(body: &Map<String, Value>) -> Result<String, ArchiveError> {
  let reference = match (body.get("tweet_id"), body.get("tweet_link")) {
    (Some(Value::String(id)), _) => id.clone(),
    (Some(Value::Number(id)), _) => id.to_string(),
    (_, Some(Value::String(link))) => link.clone(),
    _ => return Err(ArchiveError::MalformedRequest("request has no `tweet_link` or `tweet_id`".to_string())),
  };
  tweet_id_from_reference(&reference)
    .ok_or_else(|| ArchiveError::MalformedRequest(format!("no tweet id in {:?}", reference)))
}

/// a bare id, or the id out of a status url
pub fn tweet_id_from_reference(reference: &str) -> Option<String> {
  let reference = reference.trim();
  if is_tweet_id(reference) {
    return Some(reference.to_string());
  }
  if let Ok(url) = Url::parse(reference) {
    if let Some(id) = status_id_from_path(url.path()) {
      return Some(id);
    }
  }
  // e.g. "twitter.com/someone/status/123?s=20" without a scheme
  let last = filename(reference);
  is_tweet_id(&last).then_some(last)
}

fn is_tweet_id(s: &str) -> bool {
  !s.is_empty() && s.len() <= 20 && s.chars().all(|c| c.is_ascii_digit())
}
