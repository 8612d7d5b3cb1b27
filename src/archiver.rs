use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::{
  config::MIN_PART_SIZE,
  error::{MediaError, StoreError},
  store::{CompletedPart, ObjectStore},
  tweets::{media::profile_image_key, url::filename},
  types::MediaRecord,
};

pub type MediaByteStream = BoxStream<'static, Result<Bytes, MediaError>>;

/// a media body read fully into memory
#[derive(Debug, Clone)]
pub struct FetchedMedia {
  pub content_type: Option<String>,
  pub body: Bytes,
}

/// a media body to be read chunk by chunk
pub struct MediaStream {
  pub content_type: Option<String>,
  pub body: MediaByteStream,
}

/// where media bytes come from
#[async_trait]
pub trait MediaSource: Send + Sync {
  async fn fetch(&self, url: &str) -> Result<FetchedMedia, MediaError>;

  async fn stream(&self, url: &str) -> Result<MediaStream, MediaError>;
}

/// reads media over http
#[derive(Debug, Clone)]
pub struct HttpMediaSource {
  client: reqwest::Client,
}

impl HttpMediaSource {
  pub fn new(client: reqwest::Client) -> Self {
    Self { client }
  }

  async fn get(&self, url: &str) -> Result<reqwest::Response, MediaError> {
    self.client.get(url)
      .send().await
      .and_then(|r| r.error_for_status())
      .map_err(|e| source_error(url, e))
  }
}

fn source_error(url: &str, err: impl ToString) -> MediaError {
  MediaError::SourceFetch { url: url.to_string(), message: err.to_string() }
}

fn header_content_type(response: &reqwest::Response) -> Option<String> {
  response.headers()
    .get(reqwest::header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .map(|v| v.to_string())
}

#[async_trait]
impl MediaSource for HttpMediaSource {
  async fn fetch(&self, url: &str) -> Result<FetchedMedia, MediaError> {
    let response = self.get(url).await?;
    let content_type = header_content_type(&response);
    let body = response.bytes().await.map_err(|e| source_error(url, e))?;
    Ok(FetchedMedia { content_type, body })
  }

  async fn stream(&self, url: &str) -> Result<MediaStream, MediaError> {
    let response = self.get(url).await?;
    let content_type = header_content_type(&response);
    let owned_url = url.to_string();
    let body = response.bytes_stream()
      .map(move |chunk| chunk.map_err(|e| source_error(&owned_url, e)))
      .boxed();
    Ok(MediaStream { content_type, body })
  }
}

/// content type from a file extension, for sources that don't send one
pub fn guess_content_type(file: &str) -> &'static str {
  let ext = file.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
  match ext.as_str() {
    "jpg" | "jpeg" => "image/jpeg",
    "png" => "image/png",
    "gif" => "image/gif",
    "webp" => "image/webp",
    "mp4" => "video/mp4",
    "m3u8" => "application/x-mpegURL",
    _ => "application/octet-stream",
  }
}

/// what a finished multipart upload looked like
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartSummary {
  pub parts: usize,
  pub bytes: u64,
}

/// copies media from its source url into the object store
#[derive(Clone)]
pub struct MediaArchiver {
  store: Arc<dyn ObjectStore>,
  source: Arc<dyn MediaSource>,
  media_prefix: String,
  chunk_size: usize,
}

impl MediaArchiver {
  /// `chunk_size` is raised to the multipart floor if below it
  pub fn new(
    store: Arc<dyn ObjectStore>,
    source: Arc<dyn MediaSource>,
    media_prefix: impl Into<String>,
    chunk_size: usize,
  ) -> Self {
    Self {
      store,
      source,
      media_prefix: media_prefix.into(),
      chunk_size: chunk_size.max(MIN_PART_SIZE),
    }
  }

  pub fn chunk_size(&self) -> usize {
    self.chunk_size
  }

  /// full store key of a media record's archive key
  pub fn media_object_key(&self, archive_key: &str) -> String {
    format!("{}{}", self.media_prefix, archive_key)
  }

  /// archive one media item of a tweet, returning the key it was written to
  pub async fn archive_media(&self, media: &MediaRecord) -> Result<String, MediaError> {
    let key = self.media_object_key(&media.archive_key);
    if media.kind.is_streamed() {
      let summary = self.put_multipart(&media.source_url, &key).await?;
      info!(key = %key, parts = summary.parts, bytes = summary.bytes, "archived video");
    } else {
      self.put_small(&media.source_url, &key).await?;
      info!(key = %key, "archived photo");
    }
    Ok(key)
  }

  /// archive an author's profile image unless it is already in the store
  pub async fn archive_profile_image(&self, author_id: &str, url: &str) -> Result<String, MediaError> {
    let key = profile_image_key(author_id, url);
    match self.store.exists(&key).await {
      Ok(true) => {
        debug!(key = %key, "profile image already archived");
        return Ok(key);
      },
      Ok(false) => {},
      // can't tell, so write it again
      Err(e) => warn!(key = %key, error = %e, "profile image existence check failed"),
    }
    self.put_small(url, &key).await?;
    info!(key = %key, "archived profile image");
    Ok(key)
  }

  /// read the whole body, then write it with one put
  pub async fn put_small(&self, url: &str, key: &str) -> Result<(), MediaError> {
    let fetched = self.source.fetch(url).await?;
    let content_type = fetched.content_type
      .unwrap_or_else(|| guess_content_type(&filename(url)).to_string());
    self.store.put(key, fetched.body, &content_type).await
      .map_err(|source| MediaError::StoreWrite { key: key.to_string(), source })
  }

  /// stream the body into a multipart upload, one part per chunk. any failure
  /// after the session is opened aborts it
  pub async fn put_multipart(&self, url: &str, key: &str) -> Result<MultipartSummary, MediaError> {
    let MediaStream { content_type, mut body } = self.source.stream(url).await?;
    let content_type = content_type
      .unwrap_or_else(|| guess_content_type(&filename(url)).to_string());

    let session_id = self.store.init_multipart(key, &content_type).await
      .map_err(|source| MediaError::StoreWrite { key: key.to_string(), source })?;
    debug!(key, session_id = %session_id, chunk_size = self.chunk_size, "started multipart upload");

    let parts = match self.upload_parts(&session_id, key, &mut body).await {
      Ok(parts) => parts,
      Err(e) => {
        self.abort(&session_id, key).await;
        return Err(e);
      },
    };

    // an empty body has no parts to complete with
    if parts.is_empty() {
      self.abort(&session_id, key).await;
      self.store.put(key, Bytes::new(), &content_type).await
        .map_err(|source| MediaError::StoreWrite { key: key.to_string(), source })?;
      return Ok(MultipartSummary { parts: 0, bytes: 0 });
    }

    let completed = parts.iter().map(|(part, _)| part.clone()).collect::<Vec<_>>();
    if let Err(source) = self.store.complete_multipart(&session_id, key, &completed).await {
      self.abort(&session_id, key).await;
      return Err(MediaError::StoreWrite { key: key.to_string(), source });
    }

    Ok(MultipartSummary {
      parts: parts.len(),
      bytes: parts.iter().map(|(_, size)| *size as u64).sum(),
    })
  }

  /// upload chunks as they fill up. parts are numbered 1.. in stream order
  async fn upload_parts(
    &self,
    session_id: &str,
    key: &str,
    body: &mut MediaByteStream,
  ) -> Result<Vec<(CompletedPart, usize)>, MediaError> {
    let mut parts: Vec<(CompletedPart, usize)> = Vec::new();
    let mut buffer = BytesMut::with_capacity(self.chunk_size);

    while let Some(chunk) = body.next().await {
      buffer.extend_from_slice(&chunk?);
      while buffer.len() >= self.chunk_size {
        let part = buffer.split_to(self.chunk_size).freeze();
        parts.push(self.upload_part(session_id, key, parts.len() as i32 + 1, part).await?);
      }
    }
    if !buffer.is_empty() {
      parts.push(self.upload_part(session_id, key, parts.len() as i32 + 1, buffer.freeze()).await?);
    }
    Ok(parts)
  }

  async fn upload_part(
    &self,
    session_id: &str,
    key: &str,
    part_number: i32,
    body: Bytes,
  ) -> Result<(CompletedPart, usize), MediaError> {
    let size = body.len();
    let tag = self.store.upload_part(session_id, key, part_number, body).await
      .map_err(|source| MediaError::StoreWrite { key: key.to_string(), source })?;
    Ok((CompletedPart { part_number, tag }, size))
  }

  /// free the session server-side. a failure here is only logged, whatever
  /// caused the abort is what gets reported
  async fn abort(&self, session_id: &str, key: &str) {
    if let Err(source) = self.store.abort_multipart(session_id, key).await {
      let err = abort_error(key, source);
      error!(session_id, error = %err, "multipart upload left open");
    }
  }
}

fn abort_error(key: &str, source: StoreError) -> MediaError {
  MediaError::Abort { key: key.to_string(), source }
}
