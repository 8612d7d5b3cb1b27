use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;

use super::{CompletedPart, ObjectStore};
use crate::error::StoreError;

/// every call made against a `MemoryObjectStore`, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
  Exists(String),
  Put { key: String, size: usize },
  InitMultipart(String),
  UploadPart { key: String, part_number: i32, size: usize },
  CompleteMultipart { key: String, parts: Vec<CompletedPart> },
  AbortMultipart(String),
}

impl StoreCall {
  /// calls that leave something behind in the store
  pub fn is_write(&self) -> bool {
    matches!(self, StoreCall::Put { .. } | StoreCall::CompleteMultipart { .. })
  }
}

#[derive(Debug, Clone)]
struct Failure {
  op: &'static str,
  key_prefix: String,
  part_number: Option<i32>,
}

#[derive(Debug, Default)]
struct Session {
  key: String,
  content_type: String,
  parts: BTreeMap<i32, Bytes>,
}

/// in-process store. keeps objects in a map and records every call, with
/// optional injected failures
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
  objects: Mutex<HashMap<String, (Bytes, String)>>,
  sessions: Mutex<HashMap<String, Session>>,
  calls: Mutex<Vec<StoreCall>>,
  failures: Mutex<Vec<Failure>>,
  next_session: AtomicU64,
}

impl MemoryObjectStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// seed an object without recording a call
  pub fn insert(&self, key: &str, body: impl Into<Bytes>, content_type: &str) {
    self.objects.lock().insert(key.to_string(), (body.into(), content_type.to_string()));
  }

  /// make `op` (`exists`, `put`, `init_multipart`, `upload_part`,
  /// `complete_multipart`, `abort_multipart`) fail for keys with this prefix
  pub fn fail_on(&self, op: &'static str, key_prefix: &str) {
    self.failures.lock().push(Failure { op, key_prefix: key_prefix.to_string(), part_number: None });
  }

  /// make uploading part `part_number` of keys with this prefix fail
  pub fn fail_part(&self, key_prefix: &str, part_number: i32) {
    self.failures.lock().push(Failure {
      op: "upload_part",
      key_prefix: key_prefix.to_string(),
      part_number: Some(part_number),
    });
  }

  pub fn object(&self, key: &str) -> Option<Bytes> {
    self.objects.lock().get(key).map(|(body, _)| body.clone())
  }

  pub fn content_type(&self, key: &str) -> Option<String> {
    self.objects.lock().get(key).map(|(_, ct)| ct.clone())
  }

  pub fn keys(&self) -> Vec<String> {
    let mut keys = self.objects.lock().keys().cloned().collect::<Vec<_>>();
    keys.sort();
    keys
  }

  pub fn calls(&self) -> Vec<StoreCall> {
    self.calls.lock().clone()
  }

  /// multipart sessions neither completed nor aborted
  pub fn open_sessions(&self) -> usize {
    self.sessions.lock().len()
  }

  fn record(&self, call: StoreCall) {
    self.calls.lock().push(call);
  }

  fn check(&self, op: &'static str, key: &str, part_number: Option<i32>) -> Result<(), StoreError> {
    let failing = self.failures.lock().iter().any(|f| {
      f.op == op
        && key.starts_with(&f.key_prefix)
        && (f.part_number.is_none() || f.part_number == part_number)
    });
    if failing {
      return Err(StoreError::new(op, key, "injected failure"));
    }
    Ok(())
  }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
  async fn exists(&self, key: &str) -> Result<bool, StoreError> {
    self.record(StoreCall::Exists(key.to_string()));
    self.check("exists", key, None)?;
    Ok(self.objects.lock().contains_key(key))
  }

  async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError> {
    self.record(StoreCall::Put { key: key.to_string(), size: body.len() });
    self.check("put", key, None)?;
    self.objects.lock().insert(key.to_string(), (body, content_type.to_string()));
    Ok(())
  }

  async fn init_multipart(&self, key: &str, content_type: &str) -> Result<String, StoreError> {
    self.record(StoreCall::InitMultipart(key.to_string()));
    self.check("init_multipart", key, None)?;
    let id = format!("session-{}", self.next_session.fetch_add(1, Ordering::SeqCst));
    self.sessions.lock().insert(id.clone(), Session {
      key: key.to_string(),
      content_type: content_type.to_string(),
      parts: BTreeMap::new(),
    });
    Ok(id)
  }

  async fn upload_part(
    &self,
    session_id: &str,
    key: &str,
    part_number: i32,
    body: Bytes,
  ) -> Result<String, StoreError> {
    self.record(StoreCall::UploadPart { key: key.to_string(), part_number, size: body.len() });
    self.check("upload_part", key, Some(part_number))?;
    let mut sessions = self.sessions.lock();
    let session = sessions.get_mut(session_id)
      .filter(|s| s.key == key)
      .ok_or_else(|| StoreError::new("upload_part", key, format!("no such session {}", session_id)))?;
    session.parts.insert(part_number, body);
    Ok(format!("\"{}-{}\"", session_id, part_number))
  }

  async fn complete_multipart(
    &self,
    session_id: &str,
    key: &str,
    parts: &[CompletedPart],
  ) -> Result<(), StoreError> {
    self.record(StoreCall::CompleteMultipart { key: key.to_string(), parts: parts.to_vec() });
    self.check("complete_multipart", key, None)?;
    let session = self.sessions.lock().remove(session_id)
      .ok_or_else(|| StoreError::new("complete_multipart", key, format!("no such session {}", session_id)))?;

    let mut body = BytesMut::new();
    for (expected, part) in (1..).zip(parts) {
      if part.part_number != expected {
        return Err(StoreError::new("complete_multipart", key, "parts out of order"));
      }
      let data = session.parts.get(&part.part_number)
        .ok_or_else(|| StoreError::new("complete_multipart", key, format!("part {} never uploaded", part.part_number)))?;
      body.extend_from_slice(data);
    }
    self.objects.lock().insert(session.key, (body.freeze(), session.content_type));
    Ok(())
  }

  async fn abort_multipart(&self, session_id: &str, key: &str) -> Result<(), StoreError> {
    self.record(StoreCall::AbortMultipart(key.to_string()));
    self.check("abort_multipart", key, None)?;
    self.sessions.lock().remove(session_id);
    Ok(())
  }
}
