//! hydrate tweets through the v2 api and archive them, with their media and
//! the tweets they link to, into an object store

pub mod archiver;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fetch;
pub mod fetch_types;
pub mod links;
pub mod pipeline;
pub mod request;
pub mod store;
pub mod tweets;
pub mod types;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod config_test;
#[cfg(test)]
mod credentials_test;

pub use archiver::{HttpMediaSource, MediaArchiver, MediaSource};
pub use config::{ArchiverConfig, Platform};
pub use credentials::{EnvSecretToken, SecretsManagerToken, StaticToken, TokenProvider};
pub use error::{ArchiveError, MediaError, StoreError};
pub use fetch::{HttpSocialGraph, SocialGraph};
pub use pipeline::{Archiver, PassFailure};
pub use request::decode_request;
pub use store::{MemoryObjectStore, ObjectStore, S3ObjectStore};
pub use types::{ArchivalOutcome, PassKind, PassState, TweetRecord};
