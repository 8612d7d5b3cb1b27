//! durable key/blob storage the archive is written to

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

mod memory;
mod s3;

pub use memory::{MemoryObjectStore, StoreCall};
pub use s3::S3ObjectStore;

/// one uploaded part of a multipart session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
  /// contiguous, starting at 1
  pub part_number: i32,
  /// integrity tag (etag) the store returned for the part
  pub tag: String,
}

/// object store operations the archiver needs. implementations must be safe
/// to share between concurrent media transfers
#[async_trait]
pub trait ObjectStore: Send + Sync {
  async fn exists(&self, key: &str) -> Result<bool, StoreError>;

  async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError>;

  /// start a multipart upload, returning its session id
  async fn init_multipart(&self, key: &str, content_type: &str) -> Result<String, StoreError>;

  /// upload one part, returning its integrity tag
  async fn upload_part(
    &self,
    session_id: &str,
    key: &str,
    part_number: i32,
    body: Bytes,
  ) -> Result<String, StoreError>;

  /// `parts` must be in ascending part number order
  async fn complete_multipart(
    &self,
    session_id: &str,
    key: &str,
    parts: &[CompletedPart],
  ) -> Result<(), StoreError>;

  async fn abort_multipart(&self, session_id: &str, key: &str) -> Result<(), StoreError>;
}
