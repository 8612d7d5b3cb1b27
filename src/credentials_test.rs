use aws_sdk_secretsmanager::{
  config::{BehaviorVersion, Credentials, Region},
  Client as SecretsClient, Config as SecretsConfig,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use wiremock::{
  matchers::{header, method},
  Mock, MockServer, ResponseTemplate,
};
use super::credentials::{token_from_secret, token_from_secret_value, SecretsManagerToken, StaticToken, TokenProvider};
use crate::error::ArchiveError;

const SECRET_ARN: &str = "arn:aws:secretsmanager:us-east-1:123456789012:secret:tweet-token";

#[test]
fn secret_json_string() {
  assert_eq!(token_from_secret(r#"{"token": "abcd1234"}"#).unwrap(), "abcd1234");
}

#[test]
fn secret_base64_json() {
  let encoded = STANDARD.encode(r#"{"token": "abcd1234"}"#);
  assert_eq!(token_from_secret(&encoded).unwrap(), "abcd1234");
}

#[test]
fn secret_bare_token() {
  // bearer tokens contain `%`, so they never decode as base64
  assert_eq!(token_from_secret("AAAA%3Dxyz").unwrap(), "AAAA%3Dxyz");
}

#[test]
fn secret_without_token_field() {
  let result = token_from_secret(r#"{"key": "abcd1234"}"#);
  assert!(matches!(result, Err(ArchiveError::CredentialUnavailable(_))));
}

#[test]
fn secret_empty() {
  assert!(matches!(token_from_secret("  "), Err(ArchiveError::CredentialUnavailable(_))));
}

#[tokio::test]
async fn static_token() {
  assert_eq!(StaticToken("t".to_string()).get_token().await.unwrap(), "t");
  assert!(StaticToken(String::new()).get_token().await.is_err());
}

#[test]
fn secret_value_string_or_binary() {
  assert_eq!(token_from_secret_value(Some(r#"{"token": "abcd1234"}"#), None).unwrap(), "abcd1234");

  // binary secrets carry base64 text of the json
  let binary = STANDARD.encode(r#"{"token": "abcd1234"}"#);
  assert_eq!(token_from_secret_value(None, Some(binary.as_bytes())).unwrap(), "abcd1234");

  assert!(matches!(token_from_secret_value(None, None), Err(ArchiveError::CredentialUnavailable(_))));
  assert!(matches!(
    token_from_secret_value(None, Some(&[0xff, 0xfe][..])),
    Err(ArchiveError::CredentialUnavailable(_))
  ));
}

fn secrets_client(server: &MockServer) -> SecretsClient {
  let config = SecretsConfig::builder()
    .behavior_version(BehaviorVersion::latest())
    .region(Region::new("us-east-1"))
    .credentials_provider(Credentials::new("test", "test", None, None, "test"))
    .endpoint_url(server.uri())
    .build();
  SecretsClient::from_conf(config)
}

#[tokio::test]
async fn secrets_manager_token() {
  println!("SecretsManagerToken::get_token()  //  string secret read from secrets manager");
  let server = MockServer::start().await;
  let body = serde_json::json!({
    "ARN": SECRET_ARN,
    "Name": "tweet-token",
    "SecretString": r#"{"token": "abcd1234"}"#,
  });
  Mock::given(method("POST"))
    .and(header("x-amz-target", "secretsmanager.GetSecretValue"))
    .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/x-amz-json-1.1"))
    .expect(1)
    .mount(&server)
    .await;

  let tokens = SecretsManagerToken::from_client(secrets_client(&server), SECRET_ARN);
  assert_eq!(tokens.get_token().await.unwrap(), "abcd1234");
}

#[tokio::test]
async fn secrets_manager_missing_secret() {
  let server = MockServer::start().await;
  let body = serde_json::json!({
    "__type": "ResourceNotFoundException",
    "Message": "Secrets Manager can't find the specified secret.",
  });
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(400).set_body_raw(body.to_string(), "application/x-amz-json-1.1"))
    .mount(&server)
    .await;

  let tokens = SecretsManagerToken::from_client(secrets_client(&server), SECRET_ARN);
  assert!(matches!(tokens.get_token().await, Err(ArchiveError::CredentialUnavailable(_))));
}
