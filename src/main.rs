use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tweet_archiver::{
  Archiver, ArchiverConfig, EnvSecretToken, HttpMediaSource, HttpSocialGraph, S3ObjectStore,
  SecretsManagerToken, TokenProvider,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let payload = match std::env::args().nth(1) {
    Some(arg) => arg,
    None => {
      let mut buf = String::new();
      tokio::io::stdin().read_to_string(&mut buf).await?;
      buf
    },
  };

  let config = ArchiverConfig::from_env()?;
  info!(bucket = %config.bucket, api = %config.api_url, "starting");

  let tokens: Arc<dyn TokenProvider> = match &config.secret_arn {
    Some(arn) => Arc::new(SecretsManagerToken::from_env(arn.clone()).await),
    None => Arc::new(EnvSecretToken::new(config.token_secret_var.clone())),
  };

  let media_client = reqwest::Client::builder()
    .timeout(config.http_timeout)
    .build()?;
  let archiver = Archiver::new(
    &config,
    Arc::new(HttpSocialGraph::new(&config)?),
    tokens,
    Arc::new(S3ObjectStore::from_env(config.bucket.clone()).await),
    Arc::new(HttpMediaSource::new(media_client)),
  );

  let outcome = match archiver.handle_request(&payload).await {
    Ok(outcome) => outcome,
    Err(e) => {
      error!(error = %e, "request rejected");
      std::process::exit(2);
    },
  };
  println!("{}", serde_json::to_string_pretty(&outcome)?);

  // a skipped tweet (deleted, protected) is not an error
  if !outcome.success && outcome.skipped_reason.is_none() {
    std::process::exit(1);
  }
  Ok(())
}
