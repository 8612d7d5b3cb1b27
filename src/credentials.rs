use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::Client as SecretsClient;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::ArchiveError;

/// hands out the bearer token for the social graph api
#[async_trait]
pub trait TokenProvider: Send + Sync {
  async fn get_token(&self) -> Result<String, ArchiveError>;
}

/// a token known up front
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
  async fn get_token(&self) -> Result<String, ArchiveError> {
    if self.0.is_empty() {
      return Err(ArchiveError::CredentialUnavailable("token is empty".to_string()));
    }
    Ok(self.0.clone())
  }
}

/// reads the secret from an env var each time a token is needed
#[derive(Debug, Clone)]
pub struct EnvSecretToken {
  var: String,
}

impl EnvSecretToken {
  pub fn new(var: impl Into<String>) -> Self {
    Self { var: var.into() }
  }
}

#[async_trait]
impl TokenProvider for EnvSecretToken {
  async fn get_token(&self) -> Result<String, ArchiveError> {
    let secret = std::env::var(&self.var)
      .map_err(|_| ArchiveError::CredentialUnavailable(format!("{} is not set", self.var)))?;
    token_from_secret(&secret)
  }
}

/// reads the secret from aws secrets manager each time a token is needed
#[derive(Debug, Clone)]
pub struct SecretsManagerToken {
  client: SecretsClient,
  secret_id: String,
}

impl SecretsManagerToken {
  /// build a client from the default aws credential/region chain
  pub async fn from_env(secret_id: impl Into<String>) -> Self {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    Self::from_client(SecretsClient::new(&sdk_config), secret_id)
  }

  pub fn from_client(client: SecretsClient, secret_id: impl Into<String>) -> Self {
    Self {
      client,
      secret_id: secret_id.into(),
    }
  }
}

#[async_trait]
impl TokenProvider for SecretsManagerToken {
  #[instrument(skip(self), fields(secret_id = %self.secret_id))]
  async fn get_token(&self) -> Result<String, ArchiveError> {
    let output = self.client.get_secret_value()
      .secret_id(&self.secret_id)
      .send().await
      .map_err(|e| ArchiveError::CredentialUnavailable(format!(
        "reading secret {}: {}", self.secret_id, e.into_service_error()
      )))?;
    debug!(has_string = output.secret_string().is_some(), "secret read");
    let binary = output.secret_binary().map(|blob| blob.clone().into_inner());
    token_from_secret_value(output.secret_string(), binary.as_deref())
  }
}

/// a secrets manager value is either a string or a binary secret. binary
/// secrets hold the base64 text of the json
pub fn token_from_secret_value(string: Option<&str>, binary: Option<&[u8]>) -> Result<String, ArchiveError> {
  match (string, binary) {
    (Some(secret), _) => token_from_secret(secret),
    (None, Some(bytes)) => {
      let secret = std::str::from_utf8(bytes)
        .map_err(|_| ArchiveError::CredentialUnavailable("binary secret is not utf-8".to_string()))?;
      token_from_secret(secret)
    },
    (None, None) => Err(ArchiveError::CredentialUnavailable("secret has no value".to_string())),
  }
}

/// pull the token out of a secret value. secrets are stored either as a json
/// string (`{"token": "..."}`), as base64 of that json (binary secrets), or
/// as the bare token
pub fn token_from_secret(secret: &str) -> Result<String, ArchiveError> {
  let secret = secret.trim();
  if secret.is_empty() {
    return Err(ArchiveError::CredentialUnavailable("secret is empty".to_string()));
  }

  if secret.starts_with('{') {
    let json: Value = serde_json::from_str(secret)
      .map_err(|e| ArchiveError::CredentialUnavailable(format!("secret is not valid json: {}", e)))?;
    return token_field(&json);
  }

  if let Ok(decoded) = STANDARD.decode(secret) {
    if let Ok(json) = serde_json::from_slice::<Value>(&decoded) {
      return token_field(&json);
    }
  }

  Ok(secret.to_string())
}

fn token_field(json: &Value) -> Result<String, ArchiveError> {
  match json["token"].as_str() {
    Some(token) if !token.is_empty() => Ok(token.to_string()),
    _ => Err(ArchiveError::CredentialUnavailable("secret has no `token` field".to_string())),
  }
}
