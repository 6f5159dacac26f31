//! # Remote API Module
//!
//! Questo modulo parla con l'API REST remota del marketplace.
//!
//! ## Responsabilità:
//! - Definisce i tipi wire (camelCase) di upload, post e story
//! - Espone il trait `PublishApi`: il boundary iniettabile dell'orchestratore
//!   (i test usano un mock in-memory al posto della rete)
//! - `HttpApi`: implementazione reqwest con bearer token di sessione
//!
//! ## Endpoint consumati (contratti fissi del backend):
//! - `POST {base}/api/v1/upload/multiple`: multipart; risponde `{ files: [...] }`
//! - `POST {base}/api/v1/posts`: JSON; risponde `{ post }` oppure il post nudo,
//!   con id numerico o stringa (entrambe le forme accettate)
//! - `POST {base}/api/payment/promote/:postId`: best effort, risposta ignorata
//! - `POST {base}/api/v1/stories`: multipart con metadati stringificati
//!
//! ## Error surfacing:
//! Le risposte non-2xx espongono il campo `message` del server quando
//! presente, altrimenti un fallback generico con lo status code.

use crate::config::Config;
use crate::editor::{Overlay, TrimRange};
use crate::error::PublishError;
use crate::media::MediaFiles;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Stored file descriptor returned by the upload endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMedia {
    pub file_path: String,
    pub file_type: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    files: Vec<StoredMedia>,
}

/// Post creation payload; `media` is filled in by the orchestrator after
/// the raw files have been uploaded.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub media: Vec<StoredMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_tier: Option<String>,
}

/// Server-confirmed post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPost {
    pub id: String,
}

/// Story creation payload; metadata travels as stringified multipart fields
#[derive(Debug, Clone, Default)]
pub struct StoryPayload {
    pub text: Option<String>,
    pub media_file: Option<PathBuf>,
    pub filter: Option<String>,
    pub trim: Option<TrimRange>,
    pub overlays: Vec<Overlay>,
}

/// Boundary to the remote marketplace API
#[async_trait]
pub trait PublishApi: Send + Sync {
    /// Upload raw media files, returning stored descriptors in order
    async fn upload_multiple(&self, files: &[PathBuf]) -> Result<Vec<StoredMedia>, PublishError>;

    /// Submit the post payload to the creation endpoint
    async fn create_post(&self, payload: &PostPayload) -> Result<CreatedPost, PublishError>;

    /// Best-effort promotion of a created post to a paid tier
    async fn promote_post(&self, post_id: &str, tier: &str) -> Result<(), PublishError>;

    /// Submit a story (text or media with trim/overlay/filter metadata)
    async fn create_story(&self, payload: &StoryPayload) -> Result<(), PublishError>;
}

/// reqwest-backed implementation of `PublishApi`
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(config: &Config, token: Option<String>) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn rejection_message(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        extract_server_message(status.as_u16(), &body)
    }

    async fn file_part(path: &PathBuf) -> Result<reqwest::multipart::Part, PublishError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media".to_string());
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(MediaFiles::mime_type(path))?;
        Ok(part)
    }
}

#[async_trait]
impl PublishApi for HttpApi {
    async fn upload_multiple(&self, files: &[PathBuf]) -> Result<Vec<StoredMedia>, PublishError> {
        let mut form = reqwest::multipart::Form::new();
        for path in files {
            form = form.part("files", Self::file_part(path).await?);
        }

        debug!("Uploading {} file(s) to /api/v1/upload/multiple", files.len());
        let response = self
            .authorize(self.client.post(self.endpoint("/api/v1/upload/multiple")))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PublishError::Upload(Self::rejection_message(response).await));
        }

        let parsed: UploadResponse = response.json().await?;
        Ok(parsed.files)
    }

    async fn create_post(&self, payload: &PostPayload) -> Result<CreatedPost, PublishError> {
        debug!("Creating post ({} media)", payload.media.len());
        let response = self
            .authorize(self.client.post(self.endpoint("/api/v1/posts")))
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PublishError::Creation(Self::rejection_message(response).await));
        }

        let body: serde_json::Value = response.json().await?;
        parse_created_post(&body)
    }

    async fn promote_post(&self, post_id: &str, tier: &str) -> Result<(), PublishError> {
        let response = self
            .authorize(
                self.client
                    .post(self.endpoint(&format!("/api/payment/promote/{}", post_id))),
            )
            .json(&serde_json::json!({ "tier": tier }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PublishError::Creation(Self::rejection_message(response).await));
        }
        Ok(())
    }

    async fn create_story(&self, payload: &StoryPayload) -> Result<(), PublishError> {
        let mut form = reqwest::multipart::Form::new();

        if let Some(text) = &payload.text {
            form = form.text("text", text.clone());
        }
        if let Some(filter) = &payload.filter {
            form = form.text("filter", filter.clone());
        }
        if let Some(trim) = &payload.trim {
            form = form.text("trim", serde_json::to_string(trim)?);
        }
        if !payload.overlays.is_empty() {
            form = form.text("overlays", serde_json::to_string(&payload.overlays)?);
        }
        if let Some(path) = &payload.media_file {
            form = form.part("file", Self::file_part(path).await?);
        }

        debug!("Creating story (media: {})", payload.media_file.is_some());
        let response = self
            .authorize(self.client.post(self.endpoint("/api/v1/stories")))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PublishError::Creation(Self::rejection_message(response).await));
        }

        // Nothing beyond the OK status is relied upon
        Ok(())
    }
}

/// Surface the server `message` field when the body carries one, otherwise a
/// generic fallback with the status code.
fn extract_server_message(status: u16, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| format!("Request failed with status {}", status))
}

/// The creation endpoint answers either `{ "post": {...} }` or the bare post
/// object, and the id may be a number or a string. Accept all four shapes.
fn parse_created_post(body: &serde_json::Value) -> Result<CreatedPost, PublishError> {
    let post = body.get("post").unwrap_or(body);
    let id = match post.get("id").or_else(|| post.get("_id")) {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    id.map(|id| CreatedPost { id })
        .ok_or_else(|| PublishError::Creation("Server response missing post id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_created_post_wrapped() {
        let body = json!({ "post": { "id": 771, "content": "hi" } });
        assert_eq!(parse_created_post(&body).unwrap().id, "771");
    }

    #[test]
    fn test_parse_created_post_bare_string_id() {
        let body = json!({ "id": "abc-123", "content": "hi" });
        assert_eq!(parse_created_post(&body).unwrap().id, "abc-123");
    }

    #[test]
    fn test_parse_created_post_underscore_id() {
        let body = json!({ "post": { "_id": "64ff00" } });
        assert_eq!(parse_created_post(&body).unwrap().id, "64ff00");
    }

    #[test]
    fn test_parse_created_post_missing_id() {
        let body = json!({ "ok": true });
        assert!(matches!(
            parse_created_post(&body),
            Err(PublishError::Creation(_))
        ));
    }

    #[test]
    fn test_extract_server_message() {
        assert_eq!(
            extract_server_message(422, r#"{"message":"title too short"}"#),
            "title too short"
        );
        assert_eq!(
            extract_server_message(500, "<html>oops</html>"),
            "Request failed with status 500"
        );
        assert_eq!(
            extract_server_message(400, r#"{"error":"nope"}"#),
            "Request failed with status 400"
        );
    }

    #[test]
    fn test_post_payload_wire_names() {
        let payload = PostPayload {
            content: "selling bike".to_string(),
            promotion_tier: Some("gold".to_string()),
            media: vec![StoredMedia {
                file_path: "/u/1.jpg".to_string(),
                file_type: "image".to_string(),
            }],
            ..Default::default()
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["promotionTier"], "gold");
        assert_eq!(json["media"][0]["filePath"], "/u/1.jpg");
        assert_eq!(json["media"][0]["fileType"], "image");
        assert!(json.get("category").is_none());
    }

    #[test]
    fn test_upload_response_shape() {
        let parsed: UploadResponse = serde_json::from_str(
            r#"{"files":[{"filePath":"/s/a.jpg","fileType":"image"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.files.len(), 1);
        assert_eq!(parsed.files[0].file_type, "image");
    }
}
