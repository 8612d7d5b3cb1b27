use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
  primitives::ByteStream,
  types::{CompletedMultipartUpload, CompletedPart as S3CompletedPart},
  Client as S3Client,
};
use bytes::Bytes;
use tracing::debug;

use super::{CompletedPart, ObjectStore};
use crate::error::StoreError;

/// `ObjectStore` backed by one s3 bucket
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
  client: S3Client,
  bucket: String,
}

impl S3ObjectStore {
  /// build a client from the default aws credential/region chain
  pub async fn from_env(bucket: impl Into<String>) -> Self {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    Self::from_client(S3Client::new(&sdk_config), bucket)
  }

  pub fn from_client(client: S3Client, bucket: impl Into<String>) -> Self {
    Self {
      client,
      bucket: bucket.into(),
    }
  }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
  async fn exists(&self, key: &str) -> Result<bool, StoreError> {
    match self.client.head_object().bucket(&self.bucket).key(key).send().await {
      Ok(_) => Ok(true),
      Err(err) => {
        let service_err = err.into_service_error();
        if service_err.is_not_found() {
          Ok(false)
        } else {
          Err(StoreError::new("head_object", key, service_err))
        }
      },
    }
  }

  async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError> {
    debug!(bucket = %self.bucket, key, size = body.len(), "put_object");
    self.client.put_object()
      .bucket(&self.bucket)
      .key(key)
      .content_type(content_type)
      .body(ByteStream::from(body))
      .send().await
      .map_err(|e| StoreError::new("put_object", key, e.into_service_error()))?;
    Ok(())
  }

  async fn init_multipart(&self, key: &str, content_type: &str) -> Result<String, StoreError> {
    let output = self.client.create_multipart_upload()
      .bucket(&self.bucket)
      .key(key)
      .content_type(content_type)
      .send().await
      .map_err(|e| StoreError::new("create_multipart_upload", key, e.into_service_error()))?;
    output.upload_id()
      .map(|id| id.to_string())
      .ok_or_else(|| StoreError::new("create_multipart_upload", key, "no upload id returned"))
  }

  async fn upload_part(
    &self,
    session_id: &str,
    key: &str,
    part_number: i32,
    body: Bytes,
  ) -> Result<String, StoreError> {
    debug!(key, part_number, size = body.len(), "upload_part");
    let output = self.client.upload_part()
      .bucket(&self.bucket)
      .key(key)
      .upload_id(session_id)
      .part_number(part_number)
      .body(ByteStream::from(body))
      .send().await
      .map_err(|e| StoreError::new("upload_part", key, e.into_service_error()))?;
    output.e_tag()
      .map(|tag| tag.to_string())
      .ok_or_else(|| StoreError::new("upload_part", key, format!("no etag for part {}", part_number)))
  }

  async fn complete_multipart(
    &self,
    session_id: &str,
    key: &str,
    parts: &[CompletedPart],
  ) -> Result<(), StoreError> {
    let parts = parts.iter()
      .map(|p| S3CompletedPart::builder().part_number(p.part_number).e_tag(&p.tag).build())
      .collect::<Vec<_>>();
    self.client.complete_multipart_upload()
      .bucket(&self.bucket)
      .key(key)
      .upload_id(session_id)
      .multipart_upload(CompletedMultipartUpload::builder().set_parts(Some(parts)).build())
      .send().await
      .map_err(|e| StoreError::new("complete_multipart_upload", key, e.into_service_error()))?;
    Ok(())
  }

  async fn abort_multipart(&self, session_id: &str, key: &str) -> Result<(), StoreError> {
    self.client.abort_multipart_upload()
      .bucket(&self.bucket)
      .key(key)
      .upload_id(session_id)
      .send().await
      .map_err(|e| StoreError::new("abort_multipart_upload", key, e.into_service_error()))?;
    Ok(())
  }
}
