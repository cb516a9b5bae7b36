//! DriveObjectStore -- [`ObjectStore`] over the Google Drive v3 REST API.
//!
//! Uploads use the `multipart/related` upload type: a JSON metadata part
//! followed by the raw media part, in one request.

use std::time::Duration;

use birdie_core::storage::object_store::{ObjectMetadata, ObjectStore, StoredObject};
use birdie_types::error::StorageError;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;

use super::auth::{ServiceAccountTokens, TokenSource};

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const BOUNDARY: &str = "birdie-drive-upload-boundary";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    thumbnail_link: Option<String>,
}

pub struct DriveObjectStore<T = ServiceAccountTokens> {
    client: reqwest::Client,
    tokens: T,
    api_base: String,
    upload_base: String,
}

impl<T: TokenSource> DriveObjectStore<T> {
    pub fn new(tokens: T) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| StorageError::Request(e.to_string()))?;
        Ok(Self {
            client,
            tokens,
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
            upload_base: "https://www.googleapis.com/upload/drive/v3".to_string(),
        })
    }

    /// Attach a fresh bearer token. Fetched per request so refreshes apply.
    async fn authorized(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, StorageError> {
        let token = self.tokens.bearer().await?;
        Ok(request.bearer_auth(token.expose_secret()))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn parse_file(response: reqwest::Response) -> Result<DriveFile, StorageError> {
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))
    }
}

/// Build a `multipart/related` body: JSON metadata, then the media bytes.
pub(crate) fn related_body(metadata: &serde_json::Value, mime_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 512);
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Public link for a stored file. Images use the direct CDN form so the
/// chat client can render them inline.
pub(crate) fn link_for(id: &str, mime_type: &str) -> String {
    if mime_type.starts_with("image/") {
        format!("https://lh3.googleusercontent.com/d/{id}=w1080?authuser=0")
    } else {
        format!("https://drive.google.com/uc?id={id}&export=download")
    }
}

impl<T: TokenSource> ObjectStore for DriveObjectStore<T> {
    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<StoredObject, StorageError> {
        let mut metadata = json!({ "name": name, "mimeType": FOLDER_MIME });
        if !parent_id.is_empty() {
            metadata["parents"] = json!([parent_id]);
        }
        let request = self.client.post(format!("{}/files", self.api_base));
        let response = self
            .authorized(request)
            .await?
            .query(&[("fields", "id,name,mimeType")])
            .json(&metadata)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        let file = Self::parse_file(response).await?;
        tracing::debug!(folder_id = %file.id, name, "created folder");
        Ok(StoredObject {
            link: self.folder_link(&file.id),
            id: file.id,
            name: file.name,
        })
    }

    async fn upload(
        &self,
        parent_id: &str,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredObject, StorageError> {
        let metadata = json!({ "name": name, "parents": [parent_id] });
        let size = bytes.len();
        let body = related_body(&metadata, mime_type, &bytes);

        let request = self.client.post(format!("{}/files", self.upload_base));
        let response = self
            .authorized(request)
            .await?
            .query(&[("uploadType", "multipart"), ("fields", "id,name,mimeType")])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={BOUNDARY}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        let file = Self::parse_file(response).await?;
        tracing::info!(file_id = %file.id, name, size, "uploaded file");

        let mime = if file.mime_type.is_empty() {
            mime_type
        } else {
            file.mime_type.as_str()
        };
        Ok(StoredObject {
            link: link_for(&file.id, mime),
            id: file.id,
            name: file.name,
        })
    }

    async fn metadata(&self, object_id: &str) -> Result<ObjectMetadata, StorageError> {
        let request = self.client.get(format!("{}/files/{object_id}", self.api_base));
        let response = self
            .authorized(request)
            .await?
            .query(&[("fields", "id,thumbnailLink")])
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        let file = Self::parse_file(response).await?;
        Ok(ObjectMetadata {
            id: file.id,
            thumbnail_link: file.thumbnail_link,
        })
    }

    async fn delete(&self, object_id: &str) -> Result<(), StorageError> {
        let request = self.client.delete(format!("{}/files/{object_id}", self.api_base));
        let response = self
            .authorized(request)
            .await?
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }

    fn folder_link(&self, folder_id: &str) -> String {
        format!("https://drive.google.com/drive/folders/{folder_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Hands out a new token on every call, like a provider after refresh.
    #[derive(Default)]
    struct RotatingTokens(AtomicUsize);

    impl TokenSource for RotatingTokens {
        async fn bearer(&self) -> Result<SecretString, StorageError> {
            let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(SecretString::from(format!("tok-{n}")))
        }
    }

    struct FailingTokens;

    impl TokenSource for FailingTokens {
        async fn bearer(&self) -> Result<SecretString, StorageError> {
            Err(StorageError::Auth("key revoked".into()))
        }
    }

    #[test]
    fn test_related_body_layout() {
        let body = related_body(&json!({"name": "a.mp4"}), "video/mp4", b"BYTES");
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with(&format!("--{BOUNDARY}\r\n")));
        assert!(text.contains("{\"name\":\"a.mp4\"}"));
        assert!(text.contains("Content-Type: video/mp4\r\n\r\nBYTES\r\n"));
        assert!(text.ends_with(&format!("--{BOUNDARY}--\r\n")));
    }

    #[test]
    fn test_links_by_mime_type() {
        assert_eq!(
            link_for("abc", "video/mp4"),
            "https://drive.google.com/uc?id=abc&export=download"
        );
        assert_eq!(
            link_for("abc", "image/jpeg"),
            "https://lh3.googleusercontent.com/d/abc=w1080?authuser=0"
        );
    }

    #[test]
    fn test_folder_link() {
        let store = DriveObjectStore::new(RotatingTokens::default()).unwrap();
        assert_eq!(
            store.folder_link("f1"),
            "https://drive.google.com/drive/folders/f1"
        );
    }

    #[tokio::test]
    async fn test_each_request_carries_a_fresh_token() {
        let store = DriveObjectStore::new(RotatingTokens::default()).unwrap();
        let mut seen = Vec::new();
        for _ in 0..2 {
            let request = store
                .authorized(store.client.get("https://drive.test/files"))
                .await
                .unwrap()
                .build()
                .unwrap();
            seen.push(request.headers()[reqwest::header::AUTHORIZATION].to_str().unwrap().to_string());
        }
        assert_eq!(seen, vec!["Bearer tok-1", "Bearer tok-2"]);
    }

    #[tokio::test]
    async fn test_token_failure_aborts_request() {
        let store = DriveObjectStore::new(FailingTokens).unwrap();
        let err = store.delete("x").await.unwrap_err();
        assert!(matches!(err, StorageError::Auth(_)));
    }

    #[test]
    fn test_drive_file_parses_thumbnail_link() {
        let file: DriveFile =
            serde_json::from_str(r#"{"id":"x","thumbnailLink":"https://thumb"}"#).unwrap();
        assert_eq!(file.thumbnail_link.as_deref(), Some("https://thumb"));
        assert!(file.mime_type.is_empty());
    }
}
