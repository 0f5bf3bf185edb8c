use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{Result, TranscriptionClientError};
use crate::model::{GetTranscriptResponse, SubmitOptions, SubmitRequestBody, SubmitResponse, UploadResponse};

type HmacSha256 = Hmac<Sha256>;

/// Wraps the external speech-to-text provider (component C2). Stateless
/// and reentrant — safe to share across every submission-worker task and
/// the webhook-timeout poller (spec §5 "Shared resources").
#[derive(Clone)]
pub struct TranscriptionClient {
	http: reqwest::Client,
	base_url: String,
	api_key: String,
	webhook_secret: Option<String>,
}

impl TranscriptionClient {
	#[must_use]
	pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>, webhook_secret: Option<String>) -> Self {
		Self { http, base_url: base_url.into(), api_key: api_key.into(), webhook_secret }
	}

	fn endpoint(&self, path: &str) -> String {
		format!("{}{path}", self.base_url.trim_end_matches('/'))
	}

	async fn classify_error(resp: reqwest::Response) -> TranscriptionClientError {
		let status = resp.status();
		let body = resp.text().await.unwrap_or_default();
		if status.is_server_error() {
			TranscriptionClientError::Provider5xx { status: status.as_u16(), body }
		} else {
			TranscriptionClientError::Provider4xx { status: status.as_u16(), body }
		}
	}

	/// Streams `audio` to the provider's upload endpoint. Non-2xx is an
	/// upload-kind failure (spec §4.2); 5xx is transient, 4xx is permanent.
	#[tracing::instrument(skip(self, audio))]
	pub async fn upload(&self, audio: Vec<u8>) -> Result<String> {
		let resp = self.http.post(self.endpoint("/v2/upload")).header("Authorization", &self.api_key).body(audio).send().await?;

		if !resp.status().is_success() {
			return Err(Self::classify_error(resp).await);
		}

		let parsed: UploadResponse = resp.json().await.map_err(|e| TranscriptionClientError::Protocol(e.to_string()))?;
		Ok(parsed.upload_url)
	}

	/// Submits an uploaded recording for transcription (spec §4.2, §6).
	#[tracing::instrument(skip(self, opts), fields(language = %opts.language_code, speaker_labels = opts.speaker_labels))]
	pub async fn submit(&self, upload_url: &str, opts: &SubmitOptions) -> Result<SubmitResponse> {
		let body = SubmitRequestBody::new(upload_url, opts);
		let resp = self.http.post(self.endpoint("/v2/transcripts")).header("Authorization", &self.api_key).json(&body).send().await?;

		if !resp.status().is_success() {
			return Err(Self::classify_error(resp).await);
		}

		resp.json().await.map_err(|e| TranscriptionClientError::Protocol(e.to_string()))
	}

	/// Fetches the current state of a submitted transcript (spec §4.2, §6).
	#[tracing::instrument(skip(self), fields(external_id))]
	pub async fn get(&self, external_id: &str) -> Result<GetTranscriptResponse> {
		let resp = self.http.get(self.endpoint(&format!("/v2/transcripts/{external_id}"))).header("Authorization", &self.api_key).send().await?;

		if resp.status() == StatusCode::NOT_FOUND {
			return Err(TranscriptionClientError::Provider4xx { status: 404, body: format!("no such transcript: {external_id}") });
		}
		if !resp.status().is_success() {
			return Err(Self::classify_error(resp).await);
		}

		resp.json().await.map_err(|e| TranscriptionClientError::Protocol(e.to_string()))
	}

	/// Verifies the webhook's HMAC-SHA256 signature in constant time (spec
	/// §4.2, §6). When no secret is configured, verification is disabled —
	/// the caller (component C6) decides whether that's acceptable given
	/// its own `verify_webhook` configuration flag.
	#[must_use]
	pub fn verify_webhook(&self, payload: &[u8], signature_hex: Option<&str>) -> bool {
		let Some(secret) = &self.webhook_secret else {
			return true;
		};
		let Some(signature_hex) = signature_hex else {
			return false;
		};
		let Ok(expected_bytes) = hex::decode(signature_hex) else {
			return false;
		};

		let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
			return false;
		};
		mac.update(payload);
		let computed = mac.finalize().into_bytes();

		computed.ct_eq(&expected_bytes).into()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{ProviderStatus, SubmitOptions};

	fn client_with_secret(secret: &str) -> TranscriptionClient {
		TranscriptionClient::new(reqwest::Client::new(), "https://example.invalid", "key", Some(secret.to_string()))
	}

	#[test]
	fn verify_webhook_accepts_matching_signature() {
		let client = client_with_secret("shh");
		let payload = br#"{"id":"tx_A","status":"completed"}"#;

		let mut mac = HmacSha256::new_from_slice(b"shh").unwrap();
		mac.update(payload);
		let sig = hex::encode(mac.finalize().into_bytes());

		assert!(client.verify_webhook(payload, Some(&sig)));
	}

	#[test]
	fn verify_webhook_rejects_mismatched_signature() {
		let client = client_with_secret("shh");
		assert!(!client.verify_webhook(b"payload", Some("deadbeef")));
	}

	#[test]
	fn verify_webhook_disabled_when_no_secret_configured() {
		let client = TranscriptionClient::new(reqwest::Client::new(), "https://example.invalid", "key", None);
		assert!(client.verify_webhook(b"anything", None));
	}

	#[tokio::test]
	async fn upload_returns_upload_url_on_success() {
		let mut server = mockito::Server::new_async().await;
		let mock = server.mock("POST", "/v2/upload").with_status(200).with_body(r#"{"upload_url":"https://cdn.example/blob"}"#).create_async().await;

		let client = TranscriptionClient::new(reqwest::Client::new(), server.url(), "key", None);
		let url = client.upload(vec![1, 2, 3]).await.expect("upload succeeds");
		assert_eq!(url, "https://cdn.example/blob");
		mock.assert_async().await;
	}

	#[tokio::test]
	async fn upload_5xx_is_transient() {
		let mut server = mockito::Server::new_async().await;
		server.mock("POST", "/v2/upload").with_status(503).create_async().await;

		let client = TranscriptionClient::new(reqwest::Client::new(), server.url(), "key", None);
		let err = client.upload(vec![1]).await.expect_err("upload fails");
		assert_eq!(err.kind(), pipeline_types::ErrorKind::TransientNetwork);
	}

	#[tokio::test]
	async fn upload_4xx_is_permanent() {
		let mut server = mockito::Server::new_async().await;
		server.mock("POST", "/v2/upload").with_status(400).create_async().await;

		let client = TranscriptionClient::new(reqwest::Client::new(), server.url(), "key", None);
		let err = client.upload(vec![1]).await.expect_err("upload fails");
		assert_eq!(err.kind(), pipeline_types::ErrorKind::Provider4xx);
	}

	#[tokio::test]
	async fn submit_posts_expected_shape() {
		let mut server = mockito::Server::new_async().await;
		let mock = server
			.mock("POST", "/v2/transcripts")
			.match_body(mockito::Matcher::PartialJson(serde_json::json!({"speaker_labels": true, "language_code": "vi"})))
			.with_status(200)
			.with_body(r#"{"id":"tx_A","status":"queued"}"#)
			.create_async()
			.await;

		let client = TranscriptionClient::new(reqwest::Client::new(), server.url(), "key", None);
		let opts = SubmitOptions { language_code: "vi".to_string(), speaker_labels: true, webhook_url: Some("https://hook".to_string()) };
		let resp = client.submit("https://cdn.example/blob", &opts).await.expect("submit succeeds");

		assert_eq!(resp.id, "tx_A");
		assert_eq!(resp.status, ProviderStatus::Queued);
		mock.assert_async().await;
	}

	#[tokio::test]
	async fn get_missing_transcript_is_permanent_4xx() {
		let mut server = mockito::Server::new_async().await;
		server.mock("GET", "/v2/transcripts/missing").with_status(404).create_async().await;

		let client = TranscriptionClient::new(reqwest::Client::new(), server.url(), "key", None);
		let err = client.get("missing").await.expect_err("lookup fails");
		assert_eq!(err.kind(), pipeline_types::ErrorKind::Provider4xx);
	}
}
